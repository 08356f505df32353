//! Claim lifecycle
//!
//! Creates claims with a generated claim number, moves them between
//! statuses, and scopes what non-admin callers can see to the villages of
//! their own district.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

use crate::auth::{require_role, Operation};
use crate::db::schemas::{
    timestamp, AiRecommendation, ClaimDoc, ClaimStatus, ClaimType, Geometry, UserDoc, VillageDoc,
};
use crate::db::{Filter, RecordStore, Sort};
use crate::types::{FraError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct ClaimCreate {
    pub claim_type: ClaimType,
    pub village_id: String,
    #[serde(default)]
    pub village_name: String,
    pub beneficiary_name: String,
    #[serde(default)]
    pub beneficiary_father_name: String,
    pub area_claimed: f64,
    pub coordinates: Geometry,
    #[serde(default)]
    pub linked_schemes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdate {
    pub status: ClaimStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub ai_recommendation: Option<AiRecommendation>,
}

/// Listing filters. `status` is parsed by the route so unknown values are a 400.
#[derive(Debug, Default, Clone)]
pub struct ClaimQuery {
    pub status: Option<ClaimStatus>,
    pub village_id: Option<String>,
}

impl ClaimQuery {
    fn to_filter(&self) -> Filter {
        Filter::new()
            .eq_opt("status", self.status.map(|s| s.as_str()))
            .eq_opt("village_id", self.village_id.as_deref().filter(|v| !v.is_empty()))
    }
}

/// `FRA-YYYYMMDD-XXXXXXXX`: UTC date plus the first 8 hex digits of a fresh UUID
pub fn generate_claim_number(now: DateTime<Utc>) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string()[..8].to_uppercase();
    format!("FRA-{}-{}", now.format("%Y%m%d"), suffix)
}

/// Which claims a caller may see
enum Visibility {
    All,
    Villages(HashSet<String>),
}

impl Visibility {
    fn allows(&self, claim: &ClaimDoc) -> bool {
        match self {
            Visibility::All => true,
            Visibility::Villages(ids) => ids.contains(&claim.village_id),
        }
    }
}

#[derive(Clone)]
pub struct ClaimService {
    claims: Arc<dyn RecordStore<ClaimDoc>>,
    villages: Arc<dyn RecordStore<VillageDoc>>,
    enforce_transitions: bool,
}

impl ClaimService {
    pub fn new(
        claims: Arc<dyn RecordStore<ClaimDoc>>,
        villages: Arc<dyn RecordStore<VillageDoc>>,
        enforce_transitions: bool,
    ) -> Self {
        Self {
            claims,
            villages,
            enforce_transitions,
        }
    }

    pub async fn create(&self, request: ClaimCreate, caller: &UserDoc) -> Result<ClaimDoc> {
        require_role(Operation::CreateClaim, caller.role)?;

        if request.village_id.trim().is_empty() || request.beneficiary_name.trim().is_empty() {
            return Err(FraError::Validation(
                "Missing required fields: village_id, beneficiary_name".into(),
            ));
        }
        if !request.area_claimed.is_finite() || request.area_claimed <= 0.0 {
            return Err(FraError::Validation(
                "area_claimed must be a positive number".into(),
            ));
        }

        let now = timestamp::now();
        let claim = ClaimDoc {
            id: uuid::Uuid::new_v4().to_string(),
            claim_type: request.claim_type,
            claim_number: generate_claim_number(now),
            village_id: request.village_id,
            village_name: request.village_name,
            beneficiary_name: request.beneficiary_name,
            beneficiary_father_name: request.beneficiary_father_name,
            area_claimed: request.area_claimed,
            coordinates: request.coordinates,
            status: ClaimStatus::Pending,
            submitted_date: now,
            last_updated: now,
            assigned_officer: Some(caller.id.clone()),
            ai_recommendation: None,
            notes: None,
            ocr_documents: Vec::new(),
            linked_schemes: request.linked_schemes,
        };

        self.claims.insert(&claim).await?;
        info!(
            claim_number = %claim.claim_number,
            village_id = %claim.village_id,
            created_by = %caller.username,
            "Created claim"
        );
        Ok(claim)
    }

    /// Claims visible to `caller`, newest submission first
    pub async fn list(&self, query: &ClaimQuery, caller: &UserDoc) -> Result<Vec<ClaimDoc>> {
        let mut filter = query.to_filter();

        if let Visibility::Villages(ids) = self.visibility(caller).await? {
            filter = filter.one_of("village_id", ids);
        }

        self.claims
            .find_sorted(&filter, Sort::desc("submitted_date"))
            .await
    }

    /// A claim outside the caller's district is reported as missing
    pub async fn get(&self, id: &str, caller: &UserDoc) -> Result<ClaimDoc> {
        let claim = self
            .claims
            .find_one(&Filter::new().eq("id", id))
            .await?
            .ok_or_else(|| claim_not_found(id))?;

        if !self.visibility(caller).await?.allows(&claim) {
            debug!(claim_id = id, caller = %caller.username, "Claim outside jurisdiction");
            return Err(claim_not_found(id));
        }

        Ok(claim)
    }

    /// Set a new status. Last writer wins unless transitions are enforced.
    pub async fn update_status(
        &self,
        id: &str,
        update: StatusUpdate,
        caller: &UserDoc,
    ) -> Result<ClaimDoc> {
        require_role(Operation::UpdateClaimStatus, caller.role)?;

        if let Some(recommendation) = &update.ai_recommendation {
            recommendation.validate()?;
        }

        let current = self.get(id, caller).await?;

        if self.enforce_transitions && !current.status.can_transition_to(update.status) {
            return Err(FraError::Validation(format!(
                "Cannot move claim from {} to {}",
                current.status, update.status
            )));
        }

        // Strictly after the previous update even within one clock tick
        let mut now = timestamp::now();
        if now <= current.last_updated {
            now = current.last_updated + ChronoDuration::microseconds(1);
        }

        let mut fields = Map::new();
        fields.insert("status".into(), Value::String(update.status.as_str().into()));
        fields.insert("last_updated".into(), timestamp::to_value(&now));
        if let Some(notes) = update.notes {
            fields.insert("notes".into(), Value::String(notes));
        }
        if let Some(recommendation) = update.ai_recommendation {
            let value = serde_json::to_value(recommendation)
                .map_err(|e| FraError::Internal(format!("Failed to encode recommendation: {}", e)))?;
            fields.insert("ai_recommendation".into(), value);
        }

        // With the table enforced, only apply the move to the status it was checked against
        let mut target = Filter::new().eq("id", id);
        if self.enforce_transitions {
            target = target.eq("status", current.status.as_str());
        }

        if !self.claims.update_matching(&target, fields).await? {
            if self.enforce_transitions && self.claims.count(&Filter::new().eq("id", id)).await? > 0 {
                return Err(FraError::Validation(format!(
                    "Claim {} changed status from {} concurrently; reload and retry",
                    id, current.status
                )));
            }
            return Err(claim_not_found(id));
        }

        info!(
            claim_id = id,
            from = %current.status,
            to = %update.status,
            updated_by = %caller.username,
            "Updated claim status"
        );

        self.claims
            .find_one(&Filter::new().eq("id", id))
            .await?
            .ok_or_else(|| claim_not_found(id))
    }

    async fn visibility(&self, caller: &UserDoc) -> Result<Visibility> {
        let district = match caller.district.as_deref() {
            Some(district) if !caller.is_admin() => district,
            _ => return Ok(Visibility::All),
        };

        let ids = self
            .villages
            .find(&Filter::new().eq("district", district))
            .await?
            .into_iter()
            .map(|village| village.id)
            .collect();

        Ok(Visibility::Villages(ids))
    }
}

fn claim_not_found(id: &str) -> FraError {
    FraError::NotFound(format!("Claim {} not found", id))
}
