//! JSON wire protocol for the single action-dispatched endpoint.
//!
//! Reads go over `GET ?action=read`, mutations over `POST` with a
//! `text/plain` JSON body. Every response is HTTP 200; only the JSON
//! `status` field is authoritative, and `error` responses carry a
//! human-readable `message`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::models::Item;

/// The dispatched action names, as they appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    Read,
    Add,
    Update,
    UpdateThreshold,
    UpdateDetails,
    Delete,
}

/// A request body. Absent action means read.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ActionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<BTreeMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updates: Option<BTreeMap<String, Value>>,
}

/// Wire status. HTTP status codes are not authoritative, this field is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// The single response shape for every action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<Item>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_threshold_column: Option<bool>,
}

impl ApiResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: Status::Success,
            message: Some(message.into()),
            items: None,
            has_threshold_column: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: Some(message.into()),
            items: None,
            has_threshold_column: None,
        }
    }

    pub fn items(items: Vec<Item>, has_threshold_column: bool) -> Self {
        Self {
            status: Status::Success,
            message: None,
            items: Some(items),
            has_threshold_column: Some(has_threshold_column),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_wire_names() {
        assert_eq!(serde_json::to_string(&Action::Read).unwrap(), "\"read\"");
        assert_eq!(
            serde_json::to_string(&Action::UpdateThreshold).unwrap(),
            "\"updateThreshold\""
        );
        assert_eq!(
            serde_json::to_string(&Action::UpdateDetails).unwrap(),
            "\"updateDetails\""
        );
    }

    #[test]
    fn test_request_parses_mutation_body() {
        let req: ActionRequest = serde_json::from_str(
            r#"{"action":"update","name":"Stylo","stock":4}"#,
        )
        .unwrap();
        assert_eq!(req.action, Some(Action::Update));
        assert_eq!(req.name.as_deref(), Some("Stylo"));
        assert_eq!(req.stock, Some(4.0));
        assert!(req.updates.is_none());
    }

    #[test]
    fn test_response_wire_shape() {
        let json =
            serde_json::to_value(ApiResponse::items(vec![Item::new("A", 1.0, 0.0)], true)).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["hasThresholdColumn"], true);
        assert_eq!(json["items"][0]["name"], "A");
        assert!(json.get("message").is_none());

        let json = serde_json::to_value(ApiResponse::error("boom")).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "boom");
        assert!(json.get("items").is_none());
    }
}
