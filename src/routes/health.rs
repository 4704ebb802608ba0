//! Health check endpoints
//!
//! - /health - liveness check with store backend and uptime
//! - /version - build information for deployment verification

use futures_util::FutureExt;
use hyper::StatusCode;
use serde::Serialize;
use std::sync::Arc;

use super::{json_response, HandlerFuture, RequestContext};
use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub status: &'static str,
    pub version: &'static str,
    /// Seconds since the server state was built
    pub uptime: u64,
    pub timestamp: String,
    pub node_id: String,
    /// Drink store backend in use
    pub store: &'static str,
}

fn build_health_response(state: &AppState) -> HealthResponse {
    HealthResponse {
        healthy: true,
        status: "online",
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.started_at.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        node_id: state.args.node_id.to_string(),
        store: state.store.backend(),
    }
}

/// GET /health
pub fn health_check(state: Arc<AppState>, _ctx: RequestContext) -> HandlerFuture {
    let response = build_health_response(&state);
    async move { Ok(json_response(StatusCode::OK, &response)) }.boxed()
}

#[derive(Serialize)]
pub struct VersionResponse {
    pub version: &'static str,
    /// Git commit hash (short)
    pub commit: &'static str,
    pub commit_full: &'static str,
    pub build_time: &'static str,
    pub service: &'static str,
}

/// GET /version
pub fn version_info(_state: Arc<AppState>, _ctx: RequestContext) -> HandlerFuture {
    let response = VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
        commit: option_env!("GIT_COMMIT_SHORT").unwrap_or("unknown"),
        commit_full: option_env!("GIT_COMMIT_FULL").unwrap_or("unknown"),
        build_time: option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
        service: env!("CARGO_PKG_NAME"),
    };
    async move { Ok(json_response(StatusCode::OK, &response)) }.boxed()
}
