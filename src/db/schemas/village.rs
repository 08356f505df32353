//! Village document schema

use bson::{doc, Document};
use chrono::{DateTime, Utc};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;
use crate::db::schemas::geometry::{Geometry, Located};
use crate::db::schemas::timestamp;
use crate::db::store::Record;

/// Collection name for villages
pub const VILLAGE_COLLECTION: &str = "villages";

/// Village document. Immutable once created.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct VillageDoc {
    pub id: String,
    pub name: String,
    pub state: String,
    pub district: String,
    pub tehsil: String,
    pub village_code: String,
    /// Hectares
    pub total_area: f64,
    /// Hectares
    pub forest_area: f64,
    pub coordinates: Geometry,
    pub population: u64,
    pub tribal_population: u64,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Located for VillageDoc {
    fn geometry(&self) -> &Geometry {
        &self.coordinates
    }
}

impl Record for VillageDoc {
    const COLLECTION: &'static str = VILLAGE_COLLECTION;
    const UNIQUE_FIELDS: &'static [&'static str] = &["id"];

    fn record_id(&self) -> &str {
        &self.id
    }
}

impl IntoIndexes for VillageDoc {
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
            // Listing and jurisdiction lookups filter on these
            (
                doc! { "state": 1, "district": 1 },
                Some(
                    IndexOptions::builder()
                        .name("state_district_index".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "district": 1 },
                Some(
                    IndexOptions::builder()
                        .name("district_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}
