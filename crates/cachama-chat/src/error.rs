//! Error types for the chat relay.

use cachama_core::error::CachamaError;

/// Errors from the chat pipeline.
///
/// Store failures never leave the retriever; only inference and transport
/// failures reach the HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("context store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("inference error: {0}")]
    Inference(String),
    #[error("inference service returned {status}: {body}")]
    InferenceStatus { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<CachamaError> for ChatError {
    fn from(err: CachamaError) -> Self {
        match err {
            CachamaError::Storage(msg) => ChatError::StoreUnavailable(msg),
            other => ChatError::Inference(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        let err = ChatError::StoreUnavailable("locked".to_string());
        assert_eq!(err.to_string(), "context store unavailable: locked");

        let err = ChatError::InferenceStatus {
            status: 503,
            body: "overloaded".to_string(),
        };
        assert_eq!(err.to_string(), "inference service returned 503: overloaded");

        let err = ChatError::Transport("connection reset".to_string());
        assert_eq!(err.to_string(), "transport error: connection reset");
    }

    #[test]
    fn test_storage_error_maps_to_store_unavailable() {
        let err: ChatError = CachamaError::Storage("disk I/O error".to_string()).into();
        assert!(matches!(err, ChatError::StoreUnavailable(ref m) if m == "disk I/O error"));
    }

    #[test]
    fn test_other_errors_map_to_inference() {
        let err: ChatError = CachamaError::Config("bad endpoint".to_string()).into();
        assert!(matches!(err, ChatError::Inference(_)));
        assert!(err.to_string().contains("bad endpoint"));
    }
}
