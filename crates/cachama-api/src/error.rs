//! API error types and JSON error response formatting.
//!
//! Every error leaves the server as `{ "error": "<message>" }` with a matching
//! status code. Internal detail is logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;

use cachama_chat::ChatError;

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - unparseable request body.
    BadRequest(String),
    /// 500 Internal Server Error - the generator could not start a reply.
    Internal(String),
}

impl ApiError {
    /// A failed chat turn, reported to the caller only as `public_message`.
    ///
    /// Every pipeline failure is an inference failure by the time it gets
    /// here, so all of them map to 500.
    pub fn from_chat(err: &ChatError, public_message: &str) -> Self {
        error!(error = %err, "Chat request failed");
        ApiError::Internal(public_message.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let resp = ApiError::BadRequest("cuerpo inválido".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(resp).await,
            serde_json::json!({ "error": "cuerpo inválido" })
        );
    }

    #[tokio::test]
    async fn test_inference_failure_hides_detail() {
        let err = ChatError::InferenceStatus {
            status: 401,
            body: "invalid token abc123".to_string(),
        };
        let resp = ApiError::from_chat(&err, "Error interno").into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(resp).await,
            serde_json::json!({ "error": "Error interno" })
        );
    }

    #[tokio::test]
    async fn test_every_chat_error_is_internal_with_public_message() {
        let errors = [
            ChatError::StoreUnavailable("locked".to_string()),
            ChatError::Inference("bad header".to_string()),
            ChatError::Transport("reset".to_string()),
        ];
        for err in &errors {
            let resp = ApiError::from_chat(err, "Algo salió mal").into_response();
            assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(
                body_json(resp).await,
                serde_json::json!({ "error": "Algo salió mal" })
            );
        }
    }
}
