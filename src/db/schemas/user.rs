//! User document schema
//!
//! Stores credentials, role and jurisdiction for dashboard users.

use bson::{doc, Document};
use chrono::{DateTime, Utc};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::auth::Role;
use crate::db::mongo::IntoIndexes;
use crate::db::schemas::timestamp;
use crate::db::store::Record;

/// Collection name for users
pub const USER_COLLECTION: &str = "users";

/// User document as stored
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct UserDoc {
    pub id: String,

    pub username: String,

    pub email: String,

    pub full_name: String,

    #[serde(default)]
    pub role: Role,

    #[serde(default)]
    pub department: String,

    /// Jurisdiction scope
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Jurisdiction scope; non-admins with a district only see its claims
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,

    #[serde(default = "default_true")]
    pub is_active: bool,

    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,

    /// Argon2id PHC string
    pub password_hash: String,
}

fn default_true() -> bool {
    true
}

/// User as returned by the API (no password hash)
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub department: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    pub is_active: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl UserDoc {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Public view of this user
    pub fn public(&self) -> UserResponse {
        UserResponse {
            id: self.id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            role: self.role,
            department: self.department.clone(),
            state: self.state.clone(),
            district: self.district.clone(),
            is_active: self.is_active,
            created_at: self.created_at,
        }
    }
}

impl Record for UserDoc {
    const COLLECTION: &'static str = USER_COLLECTION;
    const UNIQUE_FIELDS: &'static [&'static str] = &["id", "username", "email"];

    fn record_id(&self) -> &str {
        &self.id
    }
}

impl IntoIndexes for UserDoc {
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
            (
                doc! { "username": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("username_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "email": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("email_unique".to_string())
                        .build(),
                ),
            ),
        ]
    }
}
