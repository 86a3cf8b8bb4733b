// src/relay/mod.rs
// HTTP relay server: one streaming chat endpoint plus a health probe.
//
// Requests are independent; the only shared state is the upstream
// capability handle, so the runtime's native concurrency model applies
// with no extra coordination.

pub mod capability;
pub mod error;
mod stream;

use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::gemini::Generator;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Upstream generation capability.
    pub generator: Arc<dyn Generator>,
}

/// Create the router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/chat", post(stream::chat_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// Run the relay server until shutdown.
pub async fn run(config: Config, generator: Arc<dyn Generator>) -> Result<()> {
    let state = AppState { generator };
    let app = create_router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("relay listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
