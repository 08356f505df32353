//! Shared types

mod error;

pub use error::{FraError, Result};
