/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration and login
/// - `organisations`: Organisation listing, lookup, creation and membership
/// - `users`: User lookup

pub mod auth;
pub mod health;
pub mod organisations;
pub mod users;

use serde::{Deserialize, Serialize};

/// Envelope of every successful response
///
/// ```json
/// { "status": "success", "message": "...", "data": { ... } }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: &str, data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: message.to_string(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// Success with no `data` field
    pub fn message(message: &str) -> Self {
        Self {
            status: "success".to_string(),
            message: message.to_string(),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_shape() {
        let with_data = serde_json::to_value(ApiResponse::success("ok", json!({ "a": 1 }))).unwrap();
        assert_eq!(with_data, json!({ "status": "success", "message": "ok", "data": { "a": 1 } }));

        let bare = serde_json::to_value(ApiResponse::message("done")).unwrap();
        assert_eq!(bare, json!({ "status": "success", "message": "done" }));
    }
}
