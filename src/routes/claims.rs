//! Claim routes
//!
//! - GET  /claims               - List (jurisdiction scoped), newest first
//! - POST /claims               - Create (admin, officer, verifier)
//! - GET  /claims/geojson       - FeatureCollection, optional bbox
//! - GET  /claims/{id}          - One claim
//! - PUT  /claims/{id}/status   - Change status (admin, officer)

use hyper::body::Incoming;
use hyper::{Request, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::schemas::{ClaimDoc, ClaimStatus};
use crate::routes::helpers::{
    get_auth_header, json_response, non_empty, parse_bbox, parse_json_body, parse_query,
    HttpResponse,
};
use crate::server::AppState;
use crate::services::{to_feature_collection, ClaimCreate, ClaimQuery, StatusUpdate};
use crate::types::Result;

#[derive(Debug, Default, Deserialize)]
struct ClaimParams {
    status: Option<String>,
    village_id: Option<String>,
    bbox: Option<String>,
}

impl ClaimParams {
    /// Unknown status values are rejected rather than matching nothing
    fn to_query(&self) -> Result<ClaimQuery> {
        Ok(ClaimQuery {
            status: non_empty(self.status.clone())
                .map(|s| s.parse::<ClaimStatus>())
                .transpose()?,
            village_id: non_empty(self.village_id.clone()),
        })
    }
}

#[derive(Debug, Serialize)]
struct StatusUpdateResponse {
    message: String,
    claim: ClaimDoc,
}

pub async fn handle_list_claims(req: Request<Incoming>, state: Arc<AppState>) -> Result<HttpResponse> {
    let caller = state.users.authenticate(get_auth_header(&req)).await?;
    let params: ClaimParams = parse_query(req.uri().query())?;

    let claims = state.claims.list(&params.to_query()?, &caller).await?;
    Ok(json_response(StatusCode::OK, &claims))
}

pub async fn handle_create_claim(req: Request<Incoming>, state: Arc<AppState>) -> Result<HttpResponse> {
    let caller = state.users.authenticate(get_auth_header(&req)).await?;
    let body: ClaimCreate = parse_json_body(req.into_body(), state.args.max_body_bytes).await?;

    let claim = state.claims.create(body, &caller).await?;
    Ok(json_response(StatusCode::OK, &claim))
}

pub async fn handle_claims_geojson(req: Request<Incoming>, state: Arc<AppState>) -> Result<HttpResponse> {
    let caller = state.users.authenticate(get_auth_header(&req)).await?;
    let params: ClaimParams = parse_query(req.uri().query())?;
    let bbox = parse_bbox(params.bbox.clone())?;

    let claims = state.claims.list(&params.to_query()?, &caller).await?;
    let collection = to_feature_collection(&claims, bbox.as_ref())?;
    Ok(json_response(StatusCode::OK, &collection))
}

pub async fn handle_get_claim(req: Request<Incoming>, state: Arc<AppState>, id: &str) -> Result<HttpResponse> {
    let caller = state.users.authenticate(get_auth_header(&req)).await?;

    let claim = state.claims.get(id, &caller).await?;
    Ok(json_response(StatusCode::OK, &claim))
}

pub async fn handle_update_claim_status(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: &str,
) -> Result<HttpResponse> {
    let caller = state.users.authenticate(get_auth_header(&req)).await?;
    let body: StatusUpdate = parse_json_body(req.into_body(), state.args.max_body_bytes).await?;

    let claim = state.claims.update_status(id, body, &caller).await?;
    Ok(json_response(
        StatusCode::OK,
        &StatusUpdateResponse {
            message: format!("Claim status updated to {}", claim.status),
            claim,
        },
    ))
}
