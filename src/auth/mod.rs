//! Authentication and authorization
//!
//! Provides:
//! - JWT token issue and validation
//! - Password hashing with Argon2
//! - Roles and the role-gated operation table

pub mod jwt;
pub mod password;
pub mod permissions;

pub use jwt::{extract_token_from_header, Claims, IssuedToken, JwtValidator, DEFAULT_TOKEN_TTL};
pub use password::{hash_password, verify_password, MIN_PASSWORD_LEN};
pub use permissions::{is_operation_allowed, require_role, Operation, Role};
