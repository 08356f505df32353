//! Liveness endpoint
//!
//! `/health` sits outside the API prefix and needs no token. It reports
//! build information and which store backend is serving requests.

use hyper::StatusCode;
use serde::Serialize;
use std::sync::Arc;

use crate::db::schemas::timestamp;
use crate::routes::helpers::{json_response, HttpResponse};
use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub service: &'static str,
    pub version: &'static str,
    pub commit: &'static str,
    pub build_time: &'static str,
    /// "mongodb" or "memory"
    pub store: &'static str,
    pub dev_mode: bool,
    /// Uptime in seconds
    pub uptime: u64,
    pub timestamp: String,
}

pub fn health_check(state: &Arc<AppState>) -> HttpResponse {
    let response = HealthResponse {
        healthy: true,
        service: "fra-connect",
        version: env!("CARGO_PKG_VERSION"),
        commit: option_env!("GIT_COMMIT_SHORT").unwrap_or("unknown"),
        build_time: option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
        store: state.stores.backend().as_str(),
        dev_mode: state.args.dev_mode,
        uptime: state.started_at.elapsed().as_secs(),
        timestamp: timestamp::format(&timestamp::now()),
    };

    json_response(StatusCode::OK, &response)
}
