//! One chat turn: retrieve context, assemble the prompt, relay generation.

use std::sync::Arc;

use tracing::debug;

use cachama_core::config::{CachamaConfig, PersonaConfig};
use cachama_core::types::ChatMessage;

use crate::error::ChatError;
use crate::prompt::PromptAssembler;
use crate::relay::{ByteStream, InferenceRelay, TextGenerator};
use crate::retriever::{ContextRetriever, ContextStore};

/// Stateless per-request pipeline shared by all handlers.
pub struct ChatPipeline {
    retriever: ContextRetriever,
    assembler: PromptAssembler,
    relay: InferenceRelay,
}

impl ChatPipeline {
    pub fn new(
        retriever: ContextRetriever,
        assembler: PromptAssembler,
        relay: InferenceRelay,
    ) -> Self {
        Self {
            retriever,
            assembler,
            relay,
        }
    }

    /// Wire the pipeline from configuration and the two capabilities.
    pub fn from_config(
        config: &CachamaConfig,
        store: Arc<dyn ContextStore>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        let retriever = ContextRetriever::new(
            store,
            &config.retrieval,
            config.persona.unavailable_notice.clone(),
        );
        let assembler = PromptAssembler::new(config.persona.clone());
        let relay = InferenceRelay::new(generator, config.inference.max_tokens);
        Self::new(retriever, assembler, relay)
    }

    pub fn persona(&self) -> &PersonaConfig {
        self.assembler.persona()
    }

    /// Answer `history` with the generator's raw stream.
    ///
    /// Retrieval problems degrade the context; only the generator can fail
    /// the turn.
    pub async fn respond(&self, history: &[ChatMessage]) -> Result<ByteStream, ChatError> {
        let retrieval = self.retriever.lookup_history(history).await;
        debug!(
            records = retrieval.records().len(),
            fallback = retrieval.is_fallback(),
            "Context retrieved"
        );
        let messages = self.assembler.build(history, &retrieval);
        self.relay.invoke(messages).await
    }
}
