//! API response types
//!
//! Success bodies are wrapped as `{ "success": true, "data": ... }`, errors as
//! `{ "success": false, "error": { "code", "message" } }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Standard success response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Standard error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an error response with details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            success: false,
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Pair this body with a status code
    pub fn with_status(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope() {
        let json = serde_json::to_value(ApiResponse::success(json!({"run_id": "gw_1"}))).unwrap();
        assert_eq!(json, json!({"success": true, "data": {"run_id": "gw_1"}}));
    }

    #[tokio::test]
    async fn test_success_response_is_ok_json() {
        let response = ApiResponse::success(json!({"state": "running"})).into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[axum::http::header::CONTENT_TYPE],
            "application/json"
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, json!({"success": true, "data": {"state": "running"}}));
    }

    #[test]
    fn test_error_envelope_omits_empty_details() {
        let json = serde_json::to_value(ErrorResponse::new("VALIDATION_ERROR", "bad")).unwrap();
        assert_eq!(
            json,
            json!({"success": false, "error": {"code": "VALIDATION_ERROR", "message": "bad"}})
        );

        let detailed = ErrorResponse::with_details("ENGINE_ERROR", "x", json!({"status": 500}));
        assert_eq!(serde_json::to_value(detailed).unwrap()["error"]["details"]["status"], 500);
    }
}
