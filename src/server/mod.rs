//! HTTP surface for the chat pipeline
//!
//! - GET  /api/status       - health check
//! - POST /api/chat/stream  - SSE streaming chat

mod handlers;

pub use handlers::ChatStreamEvent;

use std::sync::Arc;

use anyhow::Result;
use axum::{
    http::{HeaderValue, Method, header},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::chat::ChatService;
use crate::config::CONFIG;

/// API version for capability detection
pub const API_VERSION: &str = "2026.8.1";

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ChatService>,
}

/// Create the router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);
    let cors = match CONFIG.cors_origin.as_str() {
        "*" => cors.allow_origin(Any),
        origin => match origin.parse::<HeaderValue>() {
            Ok(origin) => cors.allow_origin(origin),
            Err(_) => {
                tracing::warn!("GABAI_CORS_ORIGIN '{origin}' is not a valid origin, allowing any");
                cors.allow_origin(Any)
            }
        },
    };

    // API version header on all responses
    let version_header = SetResponseHeaderLayer::if_not_present(
        header::HeaderName::from_static("x-api-version"),
        HeaderValue::from_static(API_VERSION),
    );

    Router::new()
        .route("/api/status", get(handlers::status_handler))
        .route("/api/chat/stream", post(handlers::chat_stream_handler))
        .layer(version_header)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP server until shutdown
pub async fn run(state: AppState, host: &str, port: u16) -> Result<()> {
    let app = create_router(state);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("server listening on http://{addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
