//! Router setup with all API routes and middleware.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use cachama_core::config::CachamaConfig;
use cachama_core::error::CachamaError;

use crate::handlers;
use crate::state::AppState;

/// Create the axum Router with all routes and middleware.
///
/// Paths the API does not own fall through to the configured assets
/// directory, which is where dish photos live (`/fotos/<id>.png`).
pub fn create_router(state: AppState) -> Router {
    let server = &state.config.server;

    // Same-origin pages only: the configured host plus localhost on that port.
    let origins: Vec<HeaderValue> = [
        format!("http://{}:{}", server.host, server.port),
        format!("http://127.0.0.1:{}", server.port),
        format!("http://localhost:{}", server.port),
    ]
    .iter()
    .filter_map(|origin| HeaderValue::from_str(origin).ok())
    .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    let assets = ServeDir::new(&server.assets_dir);
    let body_limit = server.max_body_bytes;

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/chat", post(handlers::chat))
        .fallback_service(assets)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn start_server(config: &CachamaConfig, state: AppState) -> Result<(), CachamaError> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CachamaError::Api(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!(addr = %addr, "API server listening");
    tracing::info!("Chat page at http://{}/", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| CachamaError::Api(format!("Server error: {e}")))?;

    tracing::info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
}
