//! Demo data seeding
//!
//! Each part is only created when missing, so seeding twice is harmless:
//! the admin account when no `admin` user exists, the villages when the
//! village collection is empty, the claims when the claim collection is empty.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{hash_password, Role};
use crate::db::schemas::{
    timestamp, ClaimDoc, ClaimStatus, ClaimType, Geometry, UserDoc, VillageDoc,
};
use crate::db::{Filter, Stores};
use crate::services::claims::generate_claim_number;
use crate::types::Result;

pub const SAMPLE_ADMIN_USERNAME: &str = "admin";
pub const SAMPLE_ADMIN_PASSWORD: &str = "admin123";

/// What a seeding run created
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeedReport {
    pub users_created: u64,
    pub villages_created: u64,
    pub claims_created: u64,
}

struct SampleVillage {
    name: &'static str,
    state: &'static str,
    district: &'static str,
    tehsil: &'static str,
    village_code: &'static str,
    total_area: f64,
    forest_area: f64,
    lon: f64,
    lat: f64,
    population: u64,
    tribal_population: u64,
}

const SAMPLE_VILLAGES: [SampleVillage; 3] = [
    SampleVillage {
        name: "Khunti Tola",
        state: "Jharkhand",
        district: "Ranchi",
        tehsil: "Namkum",
        village_code: "JH-RAN-001",
        total_area: 1250.5,
        forest_area: 820.0,
        lon: 85.10,
        lat: 23.10,
        population: 2450,
        tribal_population: 1980,
    },
    SampleVillage {
        name: "Bundu Basti",
        state: "Jharkhand",
        district: "Ranchi",
        tehsil: "Bundu",
        village_code: "JH-RAN-002",
        total_area: 980.0,
        forest_area: 610.25,
        lon: 85.58,
        lat: 23.17,
        population: 1830,
        tribal_population: 1422,
    },
    SampleVillage {
        name: "Similipal Pada",
        state: "Odisha",
        district: "Mayurbhanj",
        tehsil: "Jashipur",
        village_code: "OD-MAY-001",
        total_area: 2100.0,
        forest_area: 1675.0,
        lon: 86.33,
        lat: 21.93,
        population: 3120,
        tribal_population: 2874,
    },
];

struct SampleClaim {
    village_code: &'static str,
    claim_type: ClaimType,
    beneficiary_name: &'static str,
    beneficiary_father_name: &'static str,
    area_claimed: f64,
    status: ClaimStatus,
    days_ago: i64,
    linked_schemes: &'static [&'static str],
}

const SAMPLE_CLAIMS: [SampleClaim; 3] = [
    SampleClaim {
        village_code: "JH-RAN-001",
        claim_type: ClaimType::Ifr,
        beneficiary_name: "Sukra Oraon",
        beneficiary_father_name: "Budhu Oraon",
        area_claimed: 2.5,
        status: ClaimStatus::Pending,
        days_ago: 30,
        linked_schemes: &["PM-KISAN"],
    },
    SampleClaim {
        village_code: "JH-RAN-002",
        claim_type: ClaimType::Cfr,
        beneficiary_name: "Bundu Gram Sabha",
        beneficiary_father_name: "",
        area_claimed: 145.0,
        status: ClaimStatus::Approved,
        days_ago: 15,
        linked_schemes: &["MGNREGA", "Jal Jeevan Mission"],
    },
    SampleClaim {
        village_code: "OD-MAY-001",
        claim_type: ClaimType::Ifr,
        beneficiary_name: "Mangal Hansda",
        beneficiary_father_name: "Rupa Hansda",
        area_claimed: 3.75,
        status: ClaimStatus::Disputed,
        days_ago: 3,
        linked_schemes: &[],
    },
];

/// Create whatever part of the demo data set is missing
pub async fn seed(stores: &Stores) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    let admin_exists = stores
        .users
        .find_one(&Filter::new().eq("username", SAMPLE_ADMIN_USERNAME))
        .await?
        .is_some();
    if !admin_exists {
        stores.users.insert(&sample_admin()?).await?;
        report.users_created += 1;
    }

    if stores.villages.count(&Filter::new()).await? == 0 {
        for sample in &SAMPLE_VILLAGES {
            stores.villages.insert(&village_from(sample)).await?;
            report.villages_created += 1;
        }
    }

    if stores.claims.count(&Filter::new()).await? == 0 {
        let now = timestamp::now();
        for sample in &SAMPLE_CLAIMS {
            // Claims attach to the sample villages by code; skip any that were replaced
            let Some(village) = stores
                .villages
                .find_one(&Filter::new().eq("village_code", sample.village_code))
                .await?
            else {
                continue;
            };

            let submitted = now - Duration::days(sample.days_ago);
            stores.claims.insert(&claim_from(sample, &village, submitted)).await?;
            report.claims_created += 1;
        }
    }

    info!(
        users = report.users_created,
        villages = report.villages_created,
        claims = report.claims_created,
        "Sample data seeded"
    );
    Ok(report)
}

fn sample_admin() -> Result<UserDoc> {
    Ok(UserDoc {
        id: uuid::Uuid::new_v4().to_string(),
        username: SAMPLE_ADMIN_USERNAME.to_string(),
        email: "admin@fra.gov.in".to_string(),
        full_name: "System Administrator".to_string(),
        role: Role::Admin,
        department: "Ministry of Tribal Affairs".to_string(),
        state: None,
        district: None,
        is_active: true,
        created_at: timestamp::now(),
        password_hash: hash_password(SAMPLE_ADMIN_PASSWORD)?,
    })
}

fn village_from(sample: &SampleVillage) -> VillageDoc {
    VillageDoc {
        id: uuid::Uuid::new_v4().to_string(),
        name: sample.name.to_string(),
        state: sample.state.to_string(),
        district: sample.district.to_string(),
        tehsil: sample.tehsil.to_string(),
        village_code: sample.village_code.to_string(),
        total_area: sample.total_area,
        forest_area: sample.forest_area,
        coordinates: Geometry::point(sample.lon, sample.lat),
        population: sample.population,
        tribal_population: sample.tribal_population,
        created_at: timestamp::now(),
    }
}

fn claim_from(
    sample: &SampleClaim,
    village: &VillageDoc,
    submitted: chrono::DateTime<chrono::Utc>,
) -> ClaimDoc {
    ClaimDoc {
        id: uuid::Uuid::new_v4().to_string(),
        claim_type: sample.claim_type,
        claim_number: generate_claim_number(submitted),
        village_id: village.id.clone(),
        village_name: village.name.clone(),
        beneficiary_name: sample.beneficiary_name.to_string(),
        beneficiary_father_name: sample.beneficiary_father_name.to_string(),
        area_claimed: sample.area_claimed,
        coordinates: village.coordinates.clone(),
        status: sample.status,
        submitted_date: submitted,
        last_updated: submitted,
        assigned_officer: None,
        ai_recommendation: None,
        notes: None,
        ocr_documents: Vec::new(),
        linked_schemes: sample.linked_schemes.iter().map(|s| s.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_password;
    use crate::db::Sort;

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let stores = Stores::in_memory();

        let first = seed(&stores).await.unwrap();
        assert_eq!(
            first,
            SeedReport {
                users_created: 1,
                villages_created: 3,
                claims_created: 3,
            }
        );

        let second = seed(&stores).await.unwrap();
        assert_eq!(second, SeedReport::default());

        assert_eq!(stores.users.count(&Filter::new()).await.unwrap(), 1);
        assert_eq!(stores.villages.count(&Filter::new()).await.unwrap(), 3);
        assert_eq!(stores.claims.count(&Filter::new()).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_seeded_admin_credentials() {
        let stores = Stores::in_memory();
        seed(&stores).await.unwrap();

        let admin = stores
            .users
            .find_one(&Filter::new().eq("username", "admin"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert!(verify_password(SAMPLE_ADMIN_PASSWORD, &admin.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_seeded_claims() {
        let stores = Stores::in_memory();
        seed(&stores).await.unwrap();

        let claims = stores
            .claims
            .find_sorted(&Filter::new(), Sort::desc("submitted_date"))
            .await
            .unwrap();
        let statuses: Vec<ClaimStatus> = claims.iter().map(|c| c.status).collect();
        assert_eq!(
            statuses,
            vec![ClaimStatus::Disputed, ClaimStatus::Approved, ClaimStatus::Pending]
        );

        let ranchi = stores
            .villages
            .find(&Filter::new().eq("district", "Ranchi"))
            .await
            .unwrap();
        assert_eq!(ranchi.len(), 2);
        assert!(claims
            .iter()
            .filter(|c| c.status != ClaimStatus::Disputed)
            .all(|c| ranchi.iter().any(|v| v.id == c.village_id)));

        for sample in &SAMPLE_VILLAGES {
            assert!(sample.forest_area <= sample.total_area);
            assert!(sample.tribal_population <= sample.population);
        }
    }
}
