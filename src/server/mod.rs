//! The inventory backend: a single action-dispatched JSON endpoint over the
//! row store adapter.
//!
//! `GET /?action=read` returns the full item list; mutations are POSTed as
//! a JSON body with `Content-Type: text/plain` (the shape browser clients
//! can send without a CORS preflight). Every response is HTTP 200 and
//! carries the authoritative `status` field; adapter errors become
//! structured `error` responses, never transport failures.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use stocksheet_core::protocol::{Action, ActionRequest, ApiResponse};
use stocksheet_core::{RowStore, StoreError};

/// Server configuration, environment-only.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on.
    pub port: u16,
    /// Path of the CSV file backing the inventory table.
    pub sheet_path: PathBuf,
}

impl ServerConfig {
    /// Load configuration from environment variables:
    /// `STOCKSHEET_PORT` (default 8080) and `STOCKSHEET_SHEET` (default
    /// `<data dir>/stocksheet/inventory.csv`).
    pub fn from_env() -> Self {
        let port = std::env::var("STOCKSHEET_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let sheet_path = std::env::var("STOCKSHEET_SHEET")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("stocksheet")
                    .join("inventory.csv")
            });

        Self { port, sheet_path }
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RowStore>,
}

/// Builds the router: the action endpoint at `/` plus `/health`.
pub fn router(store: Arc<RowStore>) -> Router {
    Router::new()
        .route("/", get(handle_read).post(handle_action))
        .route("/health", get(health))
        .with_state(AppState { store })
        .layer(TraceLayer::new_for_http())
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET always reads, whatever the `action` query says; mutations must POST.
async fn handle_read(State(state): State<AppState>) -> Json<ApiResponse> {
    Json(read_items(&state.store).await)
}

/// POST dispatch. The body is parsed as JSON regardless of content type;
/// an absent action falls back to read, an unknown one is a structured
/// error.
async fn handle_action(State(state): State<AppState>, body: String) -> Json<ApiResponse> {
    let request: ActionRequest = match serde_json::from_str(&body) {
        Ok(req) => req,
        Err(e) => {
            tracing::warn!("unparseable request body: {}", e);
            return Json(ApiResponse::error(format!("invalid request body: {}", e)));
        }
    };

    Json(dispatch(&state.store, request).await)
}

async fn dispatch(store: &RowStore, request: ActionRequest) -> ApiResponse {
    let Some(action) = request.action else {
        return read_items(store).await;
    };

    let result = match action {
        Action::Read => return read_items(store).await,
        Action::Add => {
            let name = request.name.unwrap_or_default();
            store
                .add(
                    &name,
                    request.stock.unwrap_or(0.0),
                    request.threshold.unwrap_or(0.0),
                    &request.details.unwrap_or_default(),
                )
                .await
                .map(|_| "item added")
        }
        Action::Update => {
            let name = request.name.unwrap_or_default();
            let Some(stock) = request.stock else {
                return ApiResponse::error("stock value is required");
            };
            store.update_stock(&name, stock).await.map(|_| "stock updated")
        }
        Action::UpdateThreshold => {
            let name = request.name.unwrap_or_default();
            let Some(threshold) = request.threshold else {
                return ApiResponse::error("threshold value is required");
            };
            store
                .update_threshold(&name, threshold)
                .await
                .map(|_| "threshold updated")
        }
        Action::UpdateDetails => {
            let name = request.name.unwrap_or_default();
            store
                .update_details(&name, &request.updates.unwrap_or_default())
                .await
                .map(|_| "details updated")
        }
        Action::Delete => {
            let name = request.name.unwrap_or_default();
            store.delete(&name).await.map(|_| "item deleted")
        }
    };

    match result {
        Ok(message) => ApiResponse::success(message),
        Err(e) => {
            if let StoreError::Sheet(ref inner) = e {
                tracing::error!("sheet access failed: {}", inner);
            }
            ApiResponse::error(e.to_string())
        }
    }
}

async fn read_items(store: &RowStore) -> ApiResponse {
    match store.read().await {
        Ok(result) => ApiResponse::items(result.items, result.has_threshold_column),
        Err(e) => ApiResponse::error(e.to_string()),
    }
}
