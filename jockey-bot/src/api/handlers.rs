//! HTTP handlers

use crate::api::AppContext;
use axum::{extract::State, response::Json};
use jockey_common::api::CommandRequest;
use jockey_common::time::format_uptime;
use jockey_common::Reply;
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
}

/// Process status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    pub uptime_secs: u64,
    pub uptime: String,
    pub active_rooms: usize,
    pub port: u16,
}

/// GET /health
///
/// Liveness for uptime monitoring; answers regardless of session state.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "jockey-bot".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /status
pub async fn status(State(ctx): State<AppContext>) -> Json<StatusResponse> {
    let uptime_secs = ctx.started_at.elapsed().as_secs();
    Json(StatusResponse {
        status: "online".to_string(),
        module: "jockey-bot".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs,
        uptime: format_uptime(uptime_secs),
        active_rooms: ctx.registry.active_rooms(),
        port: ctx.port,
    })
}

/// POST /commands
///
/// One inbound chat command in, one reply payload out.
pub async fn command(
    State(ctx): State<AppContext>,
    Json(request): Json<CommandRequest>,
) -> Json<Reply> {
    Json(ctx.router.dispatch(&request).await)
}
