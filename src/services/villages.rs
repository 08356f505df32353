//! Village registry

use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::auth::{require_role, Operation};
use crate::db::schemas::{timestamp, Geometry, UserDoc, VillageDoc};
use crate::db::{Filter, RecordStore};
use crate::types::{FraError, Result};

/// Largest population both store backends can hold (BSON integers are signed)
pub const MAX_POPULATION: u64 = i64::MAX as u64;

#[derive(Debug, Clone, Deserialize)]
pub struct VillageCreate {
    pub name: String,
    pub state: String,
    pub district: String,
    #[serde(default)]
    pub tehsil: String,
    #[serde(default)]
    pub village_code: String,
    pub total_area: f64,
    pub forest_area: f64,
    pub coordinates: Geometry,
    pub population: u64,
    pub tribal_population: u64,
}

impl VillageCreate {
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty()
            || self.state.trim().is_empty()
            || self.district.trim().is_empty()
        {
            return Err(FraError::Validation(
                "Missing required fields: name, state, district".into(),
            ));
        }
        for (field, value) in [("total_area", self.total_area), ("forest_area", self.forest_area)] {
            if !value.is_finite() || value < 0.0 {
                return Err(FraError::Validation(format!(
                    "{} must be a non-negative number",
                    field
                )));
            }
        }
        if self.forest_area > self.total_area {
            return Err(FraError::Validation(
                "forest_area cannot exceed total_area".into(),
            ));
        }
        if self.population > MAX_POPULATION {
            return Err(FraError::Validation(format!(
                "population must not exceed {}",
                MAX_POPULATION
            )));
        }
        if self.tribal_population > self.population {
            return Err(FraError::Validation(
                "tribal_population cannot exceed population".into(),
            ));
        }
        Ok(())
    }
}

/// Exact-match listing filters. Blank values are ignored.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct VillageQuery {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
}

impl VillageQuery {
    pub fn to_filter(&self) -> Filter {
        Filter::new()
            .eq_opt("state", present(&self.state))
            .eq_opt("district", present(&self.district))
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[derive(Clone)]
pub struct VillageService {
    villages: Arc<dyn RecordStore<VillageDoc>>,
}

impl VillageService {
    pub fn new(villages: Arc<dyn RecordStore<VillageDoc>>) -> Self {
        Self { villages }
    }

    pub async fn create(&self, request: VillageCreate, caller: &UserDoc) -> Result<VillageDoc> {
        require_role(Operation::CreateVillage, caller.role)?;
        request.validate()?;

        let village = VillageDoc {
            id: uuid::Uuid::new_v4().to_string(),
            name: request.name.trim().to_string(),
            state: request.state.trim().to_string(),
            district: request.district.trim().to_string(),
            tehsil: request.tehsil,
            village_code: request.village_code,
            total_area: request.total_area,
            forest_area: request.forest_area,
            coordinates: request.coordinates,
            population: request.population,
            tribal_population: request.tribal_population,
            created_at: timestamp::now(),
        };

        self.villages.insert(&village).await?;
        info!(
            village_id = %village.id,
            district = %village.district,
            created_by = %caller.username,
            "Created village"
        );
        Ok(village)
    }

    pub async fn list(&self, query: &VillageQuery) -> Result<Vec<VillageDoc>> {
        self.villages.find(&query.to_filter()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::db::MemoryStore;
    use crate::services::testing::caller;

    fn request(name: &str, district: &str) -> VillageCreate {
        VillageCreate {
            name: name.into(),
            state: "Jharkhand".into(),
            district: district.into(),
            tehsil: "Namkum".into(),
            village_code: "JH-RAN-101".into(),
            total_area: 500.0,
            forest_area: 300.0,
            coordinates: Geometry::point(85.1, 23.1),
            population: 1000,
            tribal_population: 800,
        }
    }

    fn service() -> VillageService {
        VillageService::new(Arc::new(MemoryStore::<VillageDoc>::new()))
    }

    #[tokio::test]
    async fn test_create_and_list_by_district() {
        let service = service();
        let admin = caller(Role::Admin, None);

        let created = service.create(request("Khunti Tola", "Ranchi"), &admin).await.unwrap();
        service.create(request("Jashipur", "Mayurbhanj"), &admin).await.unwrap();

        let listed = service
            .list(&VillageQuery {
                state: None,
                district: Some("Ranchi".into()),
            })
            .await
            .unwrap();
        assert_eq!(listed, vec![created]);

        let all = service
            .list(&VillageQuery {
                state: Some(String::new()),
                district: None,
            })
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_role_gate() {
        let service = service();
        for role in [Role::Verifier, Role::Viewer] {
            let result = service.create(request("Khunti Tola", "Ranchi"), &caller(role, None)).await;
            assert!(matches!(result, Err(FraError::Forbidden(_))));
        }
        assert!(service
            .create(request("Khunti Tola", "Ranchi"), &caller(Role::Officer, None))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_area_and_population_checks() {
        let service = service();
        let admin = caller(Role::Admin, None);

        let mut too_much_forest = request("A", "Ranchi");
        too_much_forest.forest_area = 600.0;
        assert!(matches!(
            service.create(too_much_forest, &admin).await,
            Err(FraError::Validation(_))
        ));

        let mut too_many_tribal = request("B", "Ranchi");
        too_many_tribal.tribal_population = 1001;
        assert!(matches!(
            service.create(too_many_tribal, &admin).await,
            Err(FraError::Validation(_))
        ));

        let mut huge = request("D", "Ranchi");
        huge.population = u64::MAX;
        huge.tribal_population = u64::MAX;
        assert!(matches!(
            service.create(huge, &admin).await,
            Err(FraError::Validation(_))
        ));

        let mut largest = request("E", "Ranchi");
        largest.population = MAX_POPULATION;
        assert!(service.create(largest, &admin).await.is_ok());

        let mut negative = request("C", "Ranchi");
        negative.total_area = -1.0;
        assert!(service.create(negative, &admin).await.is_err());

        let listed = service.list(&VillageQuery::default()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "E");
    }
}
