//! Retrieval-augmented streaming chat relay.
//!
//! Looks up catalog context for a conversation, assembles the single system
//! prompt, relays the generator's byte stream untouched, and on the consuming
//! side decodes `data:` frames into text increments and renders them.

pub mod client;
pub mod decoder;
pub mod error;
pub mod generator;
pub mod pipeline;
pub mod prompt;
pub mod relay;
pub mod render;
pub mod retriever;

pub use client::{ChatClient, RenderedStream};
pub use decoder::{decode_stream, StreamDecoder, StreamFrame};
pub use error::ChatError;
pub use generator::HttpTextGenerator;
pub use pipeline::ChatPipeline;
pub use prompt::PromptAssembler;
pub use relay::{ByteStream, GenerationRequest, InferenceRelay, TextGenerator};
pub use render::{render, RenderedText};
pub use retriever::{ContextRetriever, ContextStore, RetrievalResult};
