//! FRA-Connect - Forest Rights Atlas API
//!
//! Case management for claims under the Forest Rights Act, 2006: villages
//! with their boundaries, individual and community claims moving through a
//! review workflow, and map overlays served as GeoJSON.
//!
//! ## Layers
//!
//! - **routes**: HTTP handlers, one module per resource
//! - **services**: Validation, authorization and workflow rules
//! - **db**: Record stores over MongoDB or process memory
//! - **auth**: Password hashing, JWT and role checks

pub mod auth;
pub mod config;
pub mod db;
pub mod routes;
pub mod server;
pub mod services;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{FraError, Result};
