//! Inference relay: hands the assembled messages to a streaming text
//! generator and passes its byte stream through untouched.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use serde::Serialize;
use tracing::{error, info};

use cachama_core::types::ChatMessage;

use crate::error::ChatError;

/// Raw bytes as produced by the generator, unparsed.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ChatError>> + Send>>;

/// One generation call.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GenerationRequest {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub stream: bool,
}

/// A streaming text generator.
///
/// The returned stream carries `data: {"response": ...}` frames; callers
/// must not assume anything about how frames align with chunks.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<ByteStream, ChatError>;
}

/// Forwards one request per call to the configured generator.
#[derive(Clone)]
pub struct InferenceRelay {
    generator: Arc<dyn TextGenerator>,
    max_tokens: u32,
}

impl InferenceRelay {
    pub fn new(generator: Arc<dyn TextGenerator>, max_tokens: u32) -> Self {
        Self {
            generator,
            max_tokens,
        }
    }

    /// Start a streamed generation. No retries; a failure is reported once.
    pub async fn invoke(&self, messages: Vec<ChatMessage>) -> Result<ByteStream, ChatError> {
        let request = GenerationRequest {
            messages,
            max_tokens: self.max_tokens,
            stream: true,
        };

        match self.generator.generate(&request).await {
            Ok(stream) => {
                info!(
                    messages = request.messages.len(),
                    max_tokens = request.max_tokens,
                    "Generation stream opened"
                );
                Ok(stream)
            }
            Err(e) => {
                error!(error = %e, "Generation request failed");
                Err(e)
            }
        }
    }
}
