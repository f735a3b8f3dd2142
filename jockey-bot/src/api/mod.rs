//! HTTP surface for jockey-bot
//!
//! Three routes: liveness, process status, and the command ingress the
//! chat gateway posts into. Command rejections are ordinary replies, not
//! transport errors, so the ingress always answers 200 with a payload.

pub mod handlers;

use crate::router::CommandRouter;
use crate::session::registry::SessionRegistry;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppContext {
    /// Command router
    pub router: Arc<CommandRouter>,
    /// Session registry (status reporting)
    pub registry: Arc<SessionRegistry>,
    /// Process start instant (uptime reporting)
    pub started_at: Instant,
    /// Server port
    pub port: u16,
}

/// Create the API router
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/status", get(handlers::status))
        .route("/commands", post(handlers::command))
        .with_state(ctx)
        .layer(CorsLayer::permissive())
}
