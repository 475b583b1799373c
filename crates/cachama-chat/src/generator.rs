//! HTTP client for a hosted model runner that streams `data:` frames.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use tracing::{debug, warn};

use cachama_core::config::InferenceConfig;

use crate::error::ChatError;
use crate::relay::{ByteStream, GenerationRequest, TextGenerator};

/// Streaming generator backed by `POST {endpoint}/{model}`.
#[derive(Debug, Clone)]
pub struct HttpTextGenerator {
    client: reqwest::Client,
    url: String,
}

impl HttpTextGenerator {
    /// Build a client from the inference section. The bearer token, when set,
    /// is attached to every request.
    pub fn new(config: &InferenceConfig) -> Result<Self, ChatError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = config.api_token.as_deref().filter(|t| !t.is_empty()) {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| ChatError::Inference(format!("invalid API token header value: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChatError::Inference(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: format!("{}/{}", config.endpoint.trim_end_matches('/'), config.model),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl TextGenerator for HttpTextGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<ByteStream, ChatError> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| ChatError::Transport(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        debug!(status = %status, "Generation response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Generator rejected request");
            return Err(ChatError::InferenceStatus {
                status: status.as_u16(),
                body,
            });
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| ChatError::Transport(e.to_string())));
        Ok(Box::pin(stream))
    }
}
