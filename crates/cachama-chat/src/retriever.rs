//! Context retrieval: turns the latest user message into at most five
//! catalog records, with a deterministic fallback when nothing matches.
//!
//! Store failures are absorbed here. The conversation proceeds with a
//! placeholder context instead of failing the request.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use cachama_core::config::{PersonaConfig, RetrievalConfig};
use cachama_core::types::{latest_user_query, ChatMessage, ContextRecord, MAX_CONTEXT_RECORDS};
use cachama_storage::Catalog;

use crate::error::ChatError;

// =============================================================================
// ContextStore
// =============================================================================

/// Queryable record source the retriever reads from.
#[async_trait]
pub trait ContextStore: Send + Sync {
    /// Records whose name, category or description contains `pattern`
    /// (case-insensitive), in store order, at most `limit`.
    async fn search(&self, pattern: &str, limit: usize) -> Result<Vec<ContextRecord>, ChatError>;

    /// The first `limit` records in store order.
    async fn list_first(&self, limit: usize) -> Result<Vec<ContextRecord>, ChatError>;
}

// rusqlite calls block on the connection mutex, so they run on the
// blocking pool rather than an executor thread.
#[async_trait]
impl ContextStore for Catalog {
    async fn search(&self, pattern: &str, limit: usize) -> Result<Vec<ContextRecord>, ChatError> {
        let catalog = self.clone();
        let pattern = pattern.to_string();
        run_blocking(move || catalog.search(&pattern, limit)).await
    }

    async fn list_first(&self, limit: usize) -> Result<Vec<ContextRecord>, ChatError> {
        let catalog = self.clone();
        run_blocking(move || catalog.list_first(limit)).await
    }
}

async fn run_blocking<F>(query: F) -> Result<Vec<ContextRecord>, ChatError>
where
    F: FnOnce() -> Result<Vec<ContextRecord>, cachama_core::error::CachamaError> + Send + 'static,
{
    tokio::task::spawn_blocking(query)
        .await
        .map_err(|e| ChatError::StoreUnavailable(format!("Catalog task failed: {}", e)))?
        .map_err(ChatError::from)
}

// =============================================================================
// RetrievalResult
// =============================================================================

/// Outcome of a lookup. Record lists never exceed [`MAX_CONTEXT_RECORDS`].
#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalResult {
    /// Records matching the query.
    Exact(Vec<ContextRecord>),
    /// Nothing matched; the first records in store order instead.
    Fallback(Vec<ContextRecord>),
    /// The store could not be queried; carries the placeholder context.
    Unavailable(String),
}

impl RetrievalResult {
    pub fn exact(mut records: Vec<ContextRecord>) -> Self {
        records.truncate(MAX_CONTEXT_RECORDS);
        RetrievalResult::Exact(records)
    }

    pub fn fallback(mut records: Vec<ContextRecord>) -> Self {
        records.truncate(MAX_CONTEXT_RECORDS);
        RetrievalResult::Fallback(records)
    }

    /// Records carried by this result; empty when unavailable.
    pub fn records(&self) -> &[ContextRecord] {
        match self {
            RetrievalResult::Exact(records) | RetrievalResult::Fallback(records) => records,
            RetrievalResult::Unavailable(_) => &[],
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, RetrievalResult::Fallback(_))
    }

    /// Text embedded verbatim into the system prompt.
    ///
    /// Records are serialized as a JSON array behind the persona's label for
    /// the result kind.
    pub fn to_context(&self, persona: &PersonaConfig) -> String {
        match self {
            RetrievalResult::Exact(records) => {
                format!("{}{}", persona.exact_label, records_json(records))
            }
            RetrievalResult::Fallback(records) => {
                format!("{}{}", persona.fallback_label, records_json(records))
            }
            RetrievalResult::Unavailable(notice) => notice.clone(),
        }
    }
}

fn records_json(records: &[ContextRecord]) -> String {
    serde_json::to_string(records).unwrap_or_else(|_| "[]".to_string())
}

// =============================================================================
// ContextRetriever
// =============================================================================

/// Looks up catalog context for a conversation.
pub struct ContextRetriever {
    store: Arc<dyn ContextStore>,
    max_results: usize,
    fallback_results: usize,
    unavailable_notice: String,
}

impl ContextRetriever {
    /// Create a retriever over `store`. Limits are clamped to five records.
    pub fn new(
        store: Arc<dyn ContextStore>,
        config: &RetrievalConfig,
        unavailable_notice: impl Into<String>,
    ) -> Self {
        Self {
            store,
            max_results: config.effective_max_results(),
            fallback_results: config.effective_fallback_results(),
            unavailable_notice: unavailable_notice.into(),
        }
    }

    /// Look up context for the latest user message of `history`.
    pub async fn lookup_history(&self, history: &[ChatMessage]) -> RetrievalResult {
        self.lookup(&latest_user_query(history)).await
    }

    /// Look up context for a raw query. Never fails.
    pub async fn lookup(&self, query: &str) -> RetrievalResult {
        let query = query.to_lowercase();
        match self.try_lookup(&query).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "Catalog lookup failed, continuing with placeholder context");
                RetrievalResult::Unavailable(self.unavailable_notice.clone())
            }
        }
    }

    async fn try_lookup(&self, query: &str) -> Result<RetrievalResult, ChatError> {
        let matched = self.store.search(query, self.max_results).await?;
        if !matched.is_empty() {
            debug!(matched = matched.len(), "Catalog lookup matched");
            return Ok(RetrievalResult::exact(matched));
        }

        let suggestions = self.store.list_first(self.fallback_results).await?;
        debug!(fallback = suggestions.len(), "No catalog match, using suggestions");
        Ok(RetrievalResult::fallback(suggestions))
    }
}

// =============================================================================
// Tests
// =============================================================================
