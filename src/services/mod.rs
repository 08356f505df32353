//! Domain services
//!
//! Each service owns the rules for one resource and reaches storage only
//! through [`crate::db::RecordStore`].

pub mod claims;
pub mod dashboard;
pub mod sample_data;
pub mod spatial;
pub mod users;
pub mod villages;

pub use claims::{generate_claim_number, ClaimCreate, ClaimQuery, ClaimService, StatusUpdate};
pub use dashboard::{dashboard_stats, DashboardStats};
pub use sample_data::{seed, SeedReport};
pub use spatial::{spatial_stats, to_feature_collection, BoundingBox, FeatureCollection, SpatialStats};
pub use users::{LoginRequest, LoginResponse, RegisterRequest, UserService};
pub use villages::{VillageCreate, VillageQuery, VillageService};
