//! Dashboard summary

use serde::{Deserialize, Serialize};

use crate::config::DashboardArgs;
use crate::db::schemas::ClaimStatus;
use crate::db::{Filter, Stores};
use crate::types::Result;

/// Fields reported from configuration rather than computed
pub const STATIC_FIELDS: [&str; 3] = ["ocr_accuracy", "schemes_integrated", "total_budget_linked"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_villages: u64,
    pub total_claims: u64,
    pub pending_claims: u64,
    pub approved_claims: u64,
    pub disputed_claims: u64,
    pub ocr_accuracy: f64,
    pub schemes_integrated: u32,
    pub total_budget_linked: f64,
    pub static_fields: Vec<String>,
}

pub async fn dashboard_stats(stores: &Stores, figures: &DashboardArgs) -> Result<DashboardStats> {
    let claims_with = |status: ClaimStatus| Filter::new().eq("status", status.as_str());

    Ok(DashboardStats {
        total_villages: stores.villages.count(&Filter::new()).await?,
        total_claims: stores.claims.count(&Filter::new()).await?,
        pending_claims: stores.claims.count(&claims_with(ClaimStatus::Pending)).await?,
        approved_claims: stores.claims.count(&claims_with(ClaimStatus::Approved)).await?,
        disputed_claims: stores.claims.count(&claims_with(ClaimStatus::Disputed)).await?,
        ocr_accuracy: figures.ocr_accuracy,
        schemes_integrated: figures.schemes_integrated,
        total_budget_linked: figures.total_budget_linked,
        static_fields: STATIC_FIELDS.iter().map(|f| f.to_string()).collect(),
    })
}
