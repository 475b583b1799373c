//! Consumer side of `/api/chat`: streams a reply and renders it as it grows.

use std::pin::Pin;

use futures::{Stream, StreamExt};
use serde::Deserialize;
use tracing::{debug, warn};

use cachama_core::types::{ChatMessage, ChatRequest};

use crate::decoder::decode_stream;
use crate::error::ChatError;
use crate::render::RenderedText;

/// Snapshots of the reply, one per text increment.
pub type RenderedStream = Pin<Box<dyn Stream<Item = Result<RenderedText, ChatError>> + Send>>;

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP client for a running chat server.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    base_url: String,
}

impl ChatClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Send `history` and stream the rendered reply.
    ///
    /// Dropping the returned stream closes the connection.
    pub async fn stream(&self, history: Vec<ChatMessage>) -> Result<RenderedStream, ChatError> {
        let url = format!("{}/api/chat", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&ChatRequest { messages: history })
            .send()
            .await
            .map_err(|e| ChatError::Transport(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        debug!(status = %status, url = %url, "Chat response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or(body);
            warn!(status = %status, error = %message, "Chat request failed");
            return Err(ChatError::InferenceStatus {
                status: status.as_u16(),
                body: message,
            });
        }

        let mut rendered = RenderedText::new();
        let increments = decode_stream(response.bytes_stream())
            .map(move |item| match item {
                Ok(text) => {
                    rendered.push(&text);
                    Ok(rendered.clone())
                }
                Err(e) => Err(ChatError::Transport(e.to_string())),
            });
        Ok(Box::pin(increments))
    }
}
