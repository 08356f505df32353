//! Village routes
//!
//! - GET  /villages                 - List, filtered by state/district
//! - POST /villages                 - Create (admin, officer)
//! - GET  /villages/geojson         - FeatureCollection, optional bbox
//! - GET  /villages/spatial/stats   - Aggregates inside a required bbox

use hyper::body::Incoming;
use hyper::{Request, StatusCode};
use serde::Deserialize;
use std::sync::Arc;

use crate::routes::helpers::{
    get_auth_header, json_response, non_empty, parse_bbox, parse_json_body, parse_query,
    HttpResponse,
};
use crate::server::AppState;
use crate::services::{spatial_stats, to_feature_collection, VillageCreate, VillageQuery};
use crate::types::{FraError, Result};

#[derive(Debug, Default, Deserialize)]
struct VillageGeoParams {
    bbox: Option<String>,
    state: Option<String>,
    district: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SpatialStatsParams {
    bbox: Option<String>,
}

pub async fn handle_list_villages(req: Request<Incoming>, state: Arc<AppState>) -> Result<HttpResponse> {
    state.users.authenticate(get_auth_header(&req)).await?;
    let query: VillageQuery = parse_query(req.uri().query())?;

    let villages = state.villages.list(&query).await?;
    Ok(json_response(StatusCode::OK, &villages))
}

pub async fn handle_create_village(req: Request<Incoming>, state: Arc<AppState>) -> Result<HttpResponse> {
    let caller = state.users.authenticate(get_auth_header(&req)).await?;
    let body: VillageCreate = parse_json_body(req.into_body(), state.args.max_body_bytes).await?;

    let village = state.villages.create(body, &caller).await?;
    Ok(json_response(StatusCode::OK, &village))
}

pub async fn handle_villages_geojson(req: Request<Incoming>, state: Arc<AppState>) -> Result<HttpResponse> {
    state.users.authenticate(get_auth_header(&req)).await?;
    let params: VillageGeoParams = parse_query(req.uri().query())?;
    let bbox = parse_bbox(params.bbox)?;

    let villages = state
        .villages
        .list(&VillageQuery {
            state: non_empty(params.state),
            district: non_empty(params.district),
        })
        .await?;

    let collection = to_feature_collection(&villages, bbox.as_ref())?;
    Ok(json_response(StatusCode::OK, &collection))
}

pub async fn handle_spatial_stats(req: Request<Incoming>, state: Arc<AppState>) -> Result<HttpResponse> {
    state.users.authenticate(get_auth_header(&req)).await?;
    let params: SpatialStatsParams = parse_query(req.uri().query())?;

    let bbox = parse_bbox(params.bbox)?
        .ok_or_else(|| FraError::Validation("bbox query parameter is required".into()))?;

    let stats = spatial_stats(&state.stores, &bbox).await?;
    Ok(json_response(StatusCode::OK, &stats))
}
