//! Route handler functions for all API endpoints.

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use cachama_core::types::ChatRequest;

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

// =============================================================================
// Chat
// =============================================================================

/// POST /api/chat - stream a reply to the given history.
///
/// The generator's bytes are relayed as they arrive. A missing `messages`
/// field is an empty history; a body that is not JSON is rejected with 400.
pub async fn chat(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let request: ChatRequest = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "Rejected chat request body");
        ApiError::BadRequest(format!("Invalid request body: {e}"))
    })?;

    info!(messages = request.messages.len(), "Chat request");

    let stream = state
        .pipeline
        .respond(&request.messages)
        .await
        .map_err(|e| ApiError::from_chat(&e, &state.config.persona.error_message))?;

    let stream = stream.inspect(|chunk| {
        if let Err(e) = chunk {
            warn!(error = %e, "Generation stream interrupted");
        }
    });

    Ok((
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/event-stream; charset=utf-8"),
            ),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}

// =============================================================================
// Page and health
// =============================================================================

/// GET / - the persona-themed chat page.
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    Html(cachama_ui::render_page(&state.config.persona))
}

/// GET /health - liveness and uptime.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}
