//! Roles and the operation whitelist
//!
//! Only a handful of mutating operations are gated by role. Anything not in
//! [`Operation`] is open to every authenticated caller.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::FraError;

/// User roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Officer,
    Verifier,
    #[default]
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Officer => "officer",
            Role::Verifier => "verifier",
            Role::Viewer => "viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role-gated operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateVillage,
    CreateClaim,
    UpdateClaimStatus,
}

impl Operation {
    /// Roles allowed to perform this operation
    pub fn allowed_roles(&self) -> &'static [Role] {
        match self {
            Operation::CreateVillage => &[Role::Admin, Role::Officer],
            Operation::CreateClaim => &[Role::Admin, Role::Officer, Role::Verifier],
            Operation::UpdateClaimStatus => &[Role::Admin, Role::Officer],
        }
    }

    /// Human-readable description for logs and error messages
    pub fn description(&self) -> &'static str {
        match self {
            Operation::CreateVillage => "create village",
            Operation::CreateClaim => "create claim",
            Operation::UpdateClaimStatus => "update claim status",
        }
    }
}

/// Check if an operation is allowed for the given role
pub fn is_operation_allowed(operation: Operation, role: Role) -> bool {
    operation.allowed_roles().contains(&role)
}

/// Like [`is_operation_allowed`], but as a `Forbidden` error
pub fn require_role(operation: Operation, role: Role) -> Result<(), FraError> {
    if is_operation_allowed(operation, role) {
        Ok(())
    } else {
        Err(FraError::Forbidden(format!(
            "Role '{}' may not {}",
            role,
            operation.description()
        )))
    }
}
