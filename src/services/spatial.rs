//! GeoJSON export and bounding-box statistics
//!
//! There is no spatial index. Filtering loads every candidate record and
//! tests its representative point against the box.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use crate::db::schemas::{ClaimDoc, ClaimStatus, Geometry, Located, VillageDoc};
use crate::db::store::to_json;
use crate::db::{Filter, Stores};
use crate::types::{FraError, Result};

/// Axis-aligned lon/lat rectangle, inclusive on every edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn contains(&self, [lon, lat]: [f64; 2]) -> bool {
        (self.min_lon..=self.max_lon).contains(&lon) && (self.min_lat..=self.max_lat).contains(&lat)
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.min_lon, self.min_lat, self.max_lon, self.max_lat]
    }
}

impl FromStr for BoundingBox {
    type Err = FraError;

    /// Parse `min_lon,min_lat,max_lon,max_lat`
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || {
            FraError::Validation(
                "Invalid bbox, expected min_lon,min_lat,max_lon,max_lat".to_string(),
            )
        };

        let values = s
            .split(',')
            .map(|part| part.trim().parse::<f64>().map_err(|_| invalid()))
            .collect::<Result<Vec<f64>>>()?;

        let [min_lon, min_lat, max_lon, max_lat] = <[f64; 4]>::try_from(values).map_err(|_| invalid())?;

        if values_not_finite(&[min_lon, min_lat, max_lon, max_lat]) {
            return Err(invalid());
        }
        if min_lon > max_lon || min_lat > max_lat {
            return Err(FraError::Validation(
                "Invalid bbox, minimum exceeds maximum".to_string(),
            ));
        }

        Ok(Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        })
    }
}

fn values_not_finite(values: &[f64]) -> bool {
    values.iter().any(|v| !v.is_finite())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: String,
    pub geometry: Geometry,
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: String,
    pub features: Vec<Feature>,
}

/// One point feature per record, optionally clipped to `bbox`
///
/// Properties carry the record's scalar fields; nested values such as the
/// source geometry are left out.
pub fn to_feature_collection<T>(records: &[T], bbox: Option<&BoundingBox>) -> Result<FeatureCollection>
where
    T: Located + Serialize,
{
    let mut features = Vec::with_capacity(records.len());

    for record in records {
        let [lon, lat] = record.geometry().representative_point();
        if let Some(bbox) = bbox {
            if !bbox.contains([lon, lat]) {
                continue;
            }
        }

        let properties = match to_json(record)? {
            Value::Object(fields) => fields
                .into_iter()
                .filter(|(_, value)| !matches!(value, Value::Object(_) | Value::Array(_)))
                .collect(),
            _ => Map::new(),
        };

        features.push(Feature {
            kind: "Feature".to_string(),
            geometry: Geometry::point(lon, lat),
            properties,
        });
    }

    Ok(FeatureCollection {
        kind: "FeatureCollection".to_string(),
        features,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialStats {
    pub bbox: [f64; 4],
    pub village_count: u64,
    pub claim_count: u64,
    pub total_forest_area: f64,
    pub total_population: u64,
    pub total_tribal_population: u64,
    pub claims_by_status: BTreeMap<ClaimStatus, u64>,
    pub states: Vec<String>,
    pub districts: Vec<String>,
}

/// Aggregate the villages and claims whose location falls inside `bbox`
pub fn aggregate(bbox: &BoundingBox, villages: &[VillageDoc], claims: &[ClaimDoc]) -> SpatialStats {
    let inside = |geometry: &Geometry| bbox.contains(geometry.representative_point());

    let mut stats = SpatialStats {
        bbox: bbox.as_array(),
        village_count: 0,
        claim_count: 0,
        total_forest_area: 0.0,
        total_population: 0,
        total_tribal_population: 0,
        claims_by_status: ClaimStatus::ALL.into_iter().map(|s| (s, 0)).collect(),
        states: Vec::new(),
        districts: Vec::new(),
    };
    let mut states = BTreeSet::new();
    let mut districts = BTreeSet::new();

    for village in villages.iter().filter(|v| inside(v.geometry())) {
        stats.village_count += 1;
        stats.total_forest_area += village.forest_area;
        stats.total_population = stats.total_population.saturating_add(village.population);
        stats.total_tribal_population = stats
            .total_tribal_population
            .saturating_add(village.tribal_population);
        states.insert(village.state.clone());
        districts.insert(village.district.clone());
    }

    for claim in claims.iter().filter(|c| inside(c.geometry())) {
        stats.claim_count += 1;
        *stats.claims_by_status.entry(claim.status).or_insert(0) += 1;
    }

    stats.states = states.into_iter().collect();
    stats.districts = districts.into_iter().collect();
    stats
}

/// Full scan of both collections
pub async fn spatial_stats(stores: &Stores, bbox: &BoundingBox) -> Result<SpatialStats> {
    let villages = stores.villages.find(&Filter::new()).await?;
    let claims = stores.claims.find(&Filter::new()).await?;
    Ok(aggregate(bbox, &villages, &claims))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{claim, village};

    #[test]
    fn test_parse_bbox() {
        let bbox: BoundingBox = "85.0,23.0,85.2,23.2".parse().unwrap();
        assert_eq!(bbox.as_array(), [85.0, 23.0, 85.2, 23.2]);

        let spaced: BoundingBox = " 85.0, 23.0 ,85.2,23.2 ".parse().unwrap();
        assert_eq!(spaced, bbox);

        for bad in ["", "85,23,86", "85,23,86,24,1", "a,b,c,d", "86,23,85,24", "85,24,86,23", "NaN,23,86,24"] {
            assert!(
                matches!(bad.parse::<BoundingBox>(), Err(FraError::Validation(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_contains_is_inclusive() {
        let bbox: BoundingBox = "85.0,23.0,85.2,23.2".parse().unwrap();
        assert!(bbox.contains([85.0, 23.0]));
        assert!(bbox.contains([85.2, 23.2]));
        assert!(bbox.contains([85.1, 23.1]));
        assert!(!bbox.contains([85.2000001, 23.1]));
        assert!(!bbox.contains([85.1, 22.9999]));
    }

    #[test]
    fn test_feature_collection() {
        let villages = vec![
            village("Khunti Tola", "Ranchi", 85.1, 23.1),
            village("Edge", "Ranchi", 85.2, 23.2),
            village("Similipal Pada", "Mayurbhanj", 86.33, 21.93),
        ];
        let bbox: BoundingBox = "85.0,23.0,85.2,23.2".parse().unwrap();

        let collection = to_feature_collection(&villages, Some(&bbox)).unwrap();
        assert_eq!(collection.kind, "FeatureCollection");
        assert_eq!(collection.features.len(), 2);

        let feature = &collection.features[0];
        assert_eq!(feature.kind, "Feature");
        assert_eq!(feature.geometry, Geometry::point(85.1, 23.1));
        assert_eq!(feature.properties["name"], "Khunti Tola");
        assert_eq!(feature.properties["id"], villages[0].id.as_str());
        assert!(feature.properties.get("coordinates").is_none());

        let everything = to_feature_collection(&villages, None).unwrap();
        assert_eq!(everything.features.len(), 3);
    }

    #[test]
    fn test_aggregate() {
        let ranchi = village("Khunti Tola", "Ranchi", 85.1, 23.1);
        let khunti = village("Bandgaon", "Khunti", 85.15, 23.05);
        let far = village("Similipal Pada", "Mayurbhanj", 86.33, 21.93);
        let claims = vec![
            claim(&ranchi, ClaimStatus::Pending),
            claim(&ranchi, ClaimStatus::Approved),
            claim(&far, ClaimStatus::Disputed),
        ];
        let bbox: BoundingBox = "85.0,23.0,85.2,23.2".parse().unwrap();

        let stats = aggregate(&bbox, &[ranchi.clone(), khunti.clone(), far], &claims);
        assert_eq!(stats.village_count, 2);
        assert_eq!(stats.claim_count, 2);
        assert_eq!(stats.total_population, ranchi.population + khunti.population);
        assert_eq!(stats.total_forest_area, ranchi.forest_area + khunti.forest_area);
        assert_eq!(stats.claims_by_status[&ClaimStatus::Pending], 1);
        assert_eq!(stats.claims_by_status[&ClaimStatus::Approved], 1);
        assert_eq!(stats.claims_by_status[&ClaimStatus::Disputed], 0);
        assert_eq!(stats.states, vec!["Jharkhand".to_string()]);
        assert_eq!(stats.districts, vec!["Khunti".to_string(), "Ranchi".to_string()]);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["claims_by_status"]["under_review"], 0);
    }

    #[test]
    fn test_aggregate_population_saturates() {
        let mut crowded = village("Khunti Tola", "Ranchi", 85.1, 23.1);
        crowded.population = u64::MAX;
        crowded.tribal_population = u64::MAX;
        let mut small = village("Bandgaon", "Khunti", 85.15, 23.05);
        small.population = 10;
        small.tribal_population = 5;
        let bbox: BoundingBox = "85.0,23.0,85.2,23.2".parse().unwrap();

        let stats = aggregate(&bbox, &[crowded, small], &[]);
        assert_eq!(stats.village_count, 2);
        assert_eq!(stats.total_population, u64::MAX);
        assert_eq!(stats.total_tribal_population, u64::MAX);
    }
}
