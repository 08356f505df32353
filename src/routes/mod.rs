//! HTTP routes for FRA-Connect

pub mod auth_routes;
pub mod claims;
pub mod dashboard;
pub mod health;
pub mod helpers;
pub mod seed;
pub mod villages;

pub use auth_routes::{handle_login, handle_me, handle_register};
pub use claims::{
    handle_claims_geojson, handle_create_claim, handle_get_claim, handle_list_claims,
    handle_update_claim_status,
};
pub use dashboard::handle_dashboard_stats;
pub use health::health_check;
pub use helpers::{empty_response, error_response, error_with_code, json_response, HttpResponse};
pub use seed::handle_init_sample_data;
pub use villages::{
    handle_create_village, handle_list_villages, handle_spatial_stats, handle_villages_geojson,
};
