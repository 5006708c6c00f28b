//! HTTP sync client for the inventory backend.
//!
//! Holds a local cached copy of all items and keeps it synchronized with
//! the backend, minimizing perceived latency with optimistic updates and
//! recovering deterministically on failure: a failed optimistic stock
//! update reloads ground truth instead of patching back.

use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use super::{SyncError, SyncState};
use crate::models::Item;
use crate::protocol::{Action, ActionRequest, ApiResponse, Status};

/// Substrings in a backend error message that reveal a stale deployment.
const STALE_SIGNATURES: [&str; 2] = ["getDataRange", "null"];

/// Sync client holding the endpoint URL and the local item cache.
///
/// The endpoint is passed in explicitly; there is no ambient global
/// configuration lookup.
#[derive(Debug)]
pub struct SyncClient {
    base_url: String,
    http: reqwest::Client,
    items: Vec<Item>,
    states: HashMap<String, SyncState>,
    has_threshold_column: bool,
}

impl SyncClient {
    /// Creates a client for the given endpoint URL.
    ///
    /// Returns [`SyncError::NotConfigured`] for an empty or placeholder URL;
    /// nothing works until a real endpoint is configured.
    pub fn new(server_url: impl Into<String>) -> Result<Self, SyncError> {
        let base_url = server_url.into();
        if !Self::is_configured(&base_url) {
            return Err(SyncError::NotConfigured);
        }
        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
            items: Vec::new(),
            states: HashMap::new(),
            has_threshold_column: false,
        })
    }

    /// A URL is usable once it is non-empty and no longer the placeholder.
    pub fn is_configured(url: &str) -> bool {
        !url.trim().is_empty() && !url.contains("PLACEHOLDER")
    }

    /// The cached item list, in server row order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Cached items currently below their reorder threshold.
    pub fn alerts(&self) -> Vec<&Item> {
        self.items.iter().filter(|i| i.is_low_stock()).collect()
    }

    /// Whether the backend table has a threshold column (known after the
    /// first successful load).
    pub fn has_threshold_column(&self) -> bool {
        self.has_threshold_column
    }

    /// Sync state of one item; unknown names read as `Clean`.
    pub fn state(&self, name: &str) -> SyncState {
        self.states.get(name).copied().unwrap_or_default()
    }

    /// Fetches all items and replaces the local cache.
    pub async fn load(&mut self) -> Result<(), SyncError> {
        let response = self
            .http
            .get(&self.base_url)
            .query(&[("action", "read")])
            .send()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        let response: ApiResponse = response
            .json()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        match (response.status, response.items) {
            (Status::Success, Some(items)) => {
                self.items = items;
                self.has_threshold_column = response.has_threshold_column.unwrap_or(false);
                self.states.clear();
                Ok(())
            }
            (Status::Success, None) => Err(SyncError::Transport(
                "read response carried no items".to_string(),
            )),
            (Status::Error, _) => Err(classify_backend_error(
                response
                    .message
                    .unwrap_or_else(|| "failed to fetch inventory".to_string()),
            )),
        }
    }

    /// Updates an item's stock: optimistic local write first, then the
    /// backend call. On any failure the optimistic value is discarded by
    /// reloading the full list - no partial patch-back.
    pub async fn set_stock(&mut self, name: &str, value: f64) -> Result<(), SyncError> {
        if let Some(item) = self.items.iter_mut().find(|i| i.name == name) {
            item.stock = value;
            self.states
                .insert(name.to_string(), SyncState::PendingOptimistic);
        }

        let request = ActionRequest {
            action: Some(Action::Update),
            name: Some(name.to_string()),
            stock: Some(value),
            ..Default::default()
        };

        match self.post_expect_success(&request).await {
            Ok(_) => {
                self.states.insert(name.to_string(), SyncState::Clean);
                Ok(())
            }
            Err(e) => {
                self.states.insert(name.to_string(), SyncState::Reverting);
                // Reload replaces the cache and clears all states.
                let _ = self.load().await;
                Err(e)
            }
        }
    }

    /// Updates an item's reorder threshold, optimistically. Unlike stock, a
    /// failure surfaces the error without reloading: threshold failures are
    /// configuration-related (usually a missing column) and the local value
    /// is kept for the user to see.
    pub async fn set_threshold(&mut self, name: &str, value: f64) -> Result<(), SyncError> {
        if let Some(item) = self.items.iter_mut().find(|i| i.name == name) {
            item.threshold = value;
            self.states
                .insert(name.to_string(), SyncState::PendingOptimistic);
        }

        let request = ActionRequest {
            action: Some(Action::UpdateThreshold),
            name: Some(name.to_string()),
            threshold: Some(value),
            ..Default::default()
        };

        let result = self.post_expect_success(&request).await.map(|_| ());
        self.states.insert(name.to_string(), SyncState::Clean);
        result
    }

    /// Updates free-form detail cells. No optimism: the local cache changes
    /// only after the backend confirms. `_newName` in the update set renames
    /// the item and is stripped before the merge into local details. On
    /// failure the error is surfaced and ground truth reloaded.
    pub async fn set_details(
        &mut self,
        name: &str,
        updates: BTreeMap<String, Value>,
    ) -> Result<(), SyncError> {
        let request = ActionRequest {
            action: Some(Action::UpdateDetails),
            name: Some(name.to_string()),
            updates: Some(updates.clone()),
            ..Default::default()
        };

        match self.post_expect_success(&request).await {
            Ok(_) => {
                apply_details(&mut self.items, name, updates);
                Ok(())
            }
            Err(e) => {
                let _ = self.load().await;
                Err(e)
            }
        }
    }

    /// Adds a new item. No optimism: waits for backend confirmation, then
    /// reloads fully to pick up server-assigned row order and defaults.
    pub async fn add(
        &mut self,
        name: &str,
        stock: f64,
        threshold: f64,
        details: BTreeMap<String, Value>,
    ) -> Result<(), SyncError> {
        let request = ActionRequest {
            action: Some(Action::Add),
            name: Some(name.to_string()),
            stock: Some(stock),
            threshold: Some(threshold),
            details: Some(details),
            ..Default::default()
        };

        self.post_expect_success(&request).await?;
        self.load().await
    }

    /// Deletes an item. On success it is removed locally; a backend-reported
    /// error propagates for display without reloading.
    pub async fn remove(&mut self, name: &str) -> Result<(), SyncError> {
        let request = ActionRequest {
            action: Some(Action::Delete),
            name: Some(name.to_string()),
            ..Default::default()
        };

        self.post_expect_success(&request).await?;
        self.items.retain(|i| i.name != name);
        self.states.remove(name);
        Ok(())
    }

    /// POSTs a mutation and maps backend-reported errors to [`SyncError`].
    async fn post_expect_success(
        &self,
        request: &ActionRequest,
    ) -> Result<ApiResponse, SyncError> {
        let body =
            serde_json::to_string(request).map_err(|e| SyncError::Transport(e.to_string()))?;

        let response = self
            .http
            .post(&self.base_url)
            .header(CONTENT_TYPE, "text/plain;charset=utf-8")
            .body(body)
            .send()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        let response: ApiResponse = response
            .json()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        if is_stale_response(request.action, &response) {
            return Err(SyncError::StaleBackend);
        }

        match response.status {
            Status::Success => Ok(response),
            Status::Error => Err(classify_backend_error(
                response
                    .message
                    .unwrap_or_else(|| "backend reported an error".to_string()),
            )),
        }
    }
}

/// A non-read action answered with an item list means the deployed backend
/// predates action dispatch: treat it as stale rather than trusting it.
fn is_stale_response(action: Option<Action>, response: &ApiResponse) -> bool {
    response.items.is_some() && action != Some(Action::Read) && action.is_some()
}

/// Rewrites recognizable stale-deployment signatures into the actionable
/// [`SyncError::StaleBackend`]; everything else stays a backend error.
fn classify_backend_error(message: String) -> SyncError {
    if STALE_SIGNATURES.iter().any(|s| message.contains(s)) {
        SyncError::StaleBackend
    } else {
        SyncError::Backend(message)
    }
}

/// Merges confirmed detail updates into the local cache, handling the
/// `_newName` rename sentinel.
fn apply_details(items: &mut [Item], name: &str, mut updates: BTreeMap<String, Value>) {
    let Some(item) = items.iter_mut().find(|i| i.name == name) else {
        return;
    };
    if let Some(new_name) = updates.remove("_newName") {
        if let Value::String(s) = new_name {
            item.name = s;
        }
    }
    item.details.extend(updates);
}
