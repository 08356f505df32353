//! POST /init-sample-data
//!
//! Seeds the demo admin account, villages and claims. No authentication;
//! deployments that must not expose it set `SAMPLE_DATA_ENABLED=false`.

use hyper::StatusCode;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::routes::helpers::{json_response, HttpResponse};
use crate::server::AppState;
use crate::services::{seed, SeedReport};
use crate::types::{FraError, Result};

#[derive(Debug, Serialize)]
struct SeedResponse {
    message: String,
    #[serde(flatten)]
    report: SeedReport,
}

pub async fn handle_init_sample_data(state: Arc<AppState>) -> Result<HttpResponse> {
    if !state.args.sample_data_enabled {
        return Err(FraError::Forbidden("Sample data seeding is disabled".into()));
    }

    let report = seed(&state.stores).await?;
    let message = if report == SeedReport::default() {
        "Sample data already present".to_string()
    } else {
        "Sample data initialized successfully".to_string()
    };
    info!("{}", message);

    Ok(json_response(StatusCode::OK, &SeedResponse { message, report }))
}
