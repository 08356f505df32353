//! Forest rights claim document schema
//!
//! A claim moves through a single `status` field. Whether moves are checked
//! against [`ClaimStatus::can_transition_to`] is a deployment setting.

use bson::{doc, Document};
use chrono::{DateTime, Utc};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::db::mongo::IntoIndexes;
use crate::db::schemas::geometry::{Geometry, Located};
use crate::db::schemas::timestamp;
use crate::db::store::Record;
use crate::types::FraError;

/// Collection name for claims
pub const CLAIM_COLLECTION: &str = "claims";

/// Individual or community forest rights
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClaimType {
    #[serde(rename = "IFR")]
    Ifr,
    #[serde(rename = "CFR")]
    Cfr,
}

/// Claim status
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    #[default]
    Pending,
    UnderReview,
    Approved,
    Rejected,
    Disputed,
}

impl ClaimStatus {
    pub const ALL: [ClaimStatus; 5] = [
        ClaimStatus::Pending,
        ClaimStatus::UnderReview,
        ClaimStatus::Approved,
        ClaimStatus::Rejected,
        ClaimStatus::Disputed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "pending",
            ClaimStatus::UnderReview => "under_review",
            ClaimStatus::Approved => "approved",
            ClaimStatus::Rejected => "rejected",
            ClaimStatus::Disputed => "disputed",
        }
    }

    /// Whether moving from `self` to `next` is a recognised step.
    /// Staying put is always allowed.
    pub fn can_transition_to(&self, next: ClaimStatus) -> bool {
        use ClaimStatus::*;

        if *self == next {
            return true;
        }
        matches!(
            (self, next),
            (Pending, UnderReview)
                | (Pending, Rejected)
                | (UnderReview, Approved)
                | (UnderReview, Rejected)
                | (UnderReview, Disputed)
                | (Disputed, UnderReview)
        )
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimStatus {
    type Err = FraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClaimStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| FraError::Validation(format!("Unknown claim status '{}'", s)))
    }
}

/// Advisory verdict attached during review
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AiRecommendation {
    pub decision: String,
    /// 0.0 to 1.0
    pub confidence: f64,
    #[serde(default)]
    pub reasons: Vec<String>,
}

impl AiRecommendation {
    pub fn validate(&self) -> Result<(), FraError> {
        if self.decision.trim().is_empty() {
            return Err(FraError::Validation(
                "ai_recommendation.decision must not be empty".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(FraError::Validation(
                "ai_recommendation.confidence must be between 0 and 1".into(),
            ));
        }
        Ok(())
    }
}

/// Reference to a scanned supporting document
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DocumentRef {
    pub document_id: String,
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Claim document as stored
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ClaimDoc {
    pub id: String,
    pub claim_type: ClaimType,
    /// `FRA-YYYYMMDD-XXXXXXXX`, never changes
    pub claim_number: String,
    pub village_id: String,
    pub village_name: String,
    pub beneficiary_name: String,
    pub beneficiary_father_name: String,
    /// Hectares
    pub area_claimed: f64,
    pub coordinates: Geometry,
    pub status: ClaimStatus,
    #[serde(with = "timestamp")]
    pub submitted_date: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub assigned_officer: Option<String>,
    #[serde(default)]
    pub ai_recommendation: Option<AiRecommendation>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub ocr_documents: Vec<DocumentRef>,
    #[serde(default)]
    pub linked_schemes: Vec<String>,
}

impl Located for ClaimDoc {
    fn geometry(&self) -> &Geometry {
        &self.coordinates
    }
}

impl Record for ClaimDoc {
    const COLLECTION: &'static str = CLAIM_COLLECTION;
    const UNIQUE_FIELDS: &'static [&'static str] = &["id", "claim_number"];

    fn record_id(&self) -> &str {
        &self.id
    }
}

impl IntoIndexes for ClaimDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("id_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "claim_number": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("claim_number_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "status": 1, "submitted_date": -1 },
                Some(
                    IndexOptions::builder()
                        .name("status_submitted_index".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "village_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("village_id_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ClaimStatus::*;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_string(&UnderReview).unwrap(), "\"under_review\"");
        assert_eq!("disputed".parse::<ClaimStatus>().unwrap(), Disputed);
        assert!(matches!(
            "closed".parse::<ClaimStatus>(),
            Err(FraError::Validation(_))
        ));
    }

    #[test]
    fn test_transition_table() {
        assert!(Pending.can_transition_to(UnderReview));
        assert!(Pending.can_transition_to(Rejected));
        assert!(UnderReview.can_transition_to(Approved));
        assert!(UnderReview.can_transition_to(Disputed));
        assert!(Disputed.can_transition_to(UnderReview));

        assert!(!Pending.can_transition_to(Approved));
        assert!(!Approved.can_transition_to(Pending));
        assert!(!Rejected.can_transition_to(UnderReview));

        for status in ClaimStatus::ALL {
            assert!(status.can_transition_to(status));
        }
    }

    #[test]
    fn test_ai_recommendation_bounds() {
        let mut rec = AiRecommendation {
            decision: "approve".into(),
            confidence: 0.92,
            reasons: vec!["Boundary matches survey".into()],
        };
        assert!(rec.validate().is_ok());

        rec.confidence = 1.2;
        assert!(rec.validate().is_err());

        rec.confidence = 0.5;
        rec.decision = " ".into();
        assert!(rec.validate().is_err());
    }

    #[test]
    fn test_claim_type_wire_names() {
        assert_eq!(serde_json::to_string(&ClaimType::Cfr).unwrap(), "\"CFR\"");
        assert_eq!(serde_json::from_str::<ClaimType>("\"IFR\"").unwrap(), ClaimType::Ifr);
    }
}
