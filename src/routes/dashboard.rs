//! GET /dashboard/stats

use hyper::body::Incoming;
use hyper::{Request, StatusCode};
use std::sync::Arc;

use crate::routes::helpers::{get_auth_header, json_response, HttpResponse};
use crate::server::AppState;
use crate::services::dashboard_stats;
use crate::types::Result;

pub async fn handle_dashboard_stats(req: Request<Incoming>, state: Arc<AppState>) -> Result<HttpResponse> {
    state.users.authenticate(get_auth_header(&req)).await?;

    let stats = dashboard_stats(&state.stores, &state.args.dashboard).await?;
    Ok(json_response(StatusCode::OK, &stats))
}
