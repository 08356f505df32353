//! Registration, login and caller resolution
//!
//! Tokens only carry the username. Every authenticated request re-reads the
//! user record, so deactivating a user locks them out immediately.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::auth::{
    extract_token_from_header, hash_password, verify_password, JwtValidator, Role,
    MIN_PASSWORD_LEN,
};
use crate::db::schemas::{timestamp, UserDoc, UserResponse};
use crate::db::{Filter, RecordStore};
use crate::types::{FraError, Result};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    /// Self-selected on the open endpoint, including `admin`; defaults to viewer
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    /// Seconds until the token expires
    pub expires_in: u64,
    pub user: UserResponse,
}

/// Credential handling over the users collection
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn RecordStore<UserDoc>>,
    jwt: JwtValidator,
    token_ttl: Duration,
}

impl UserService {
    pub fn new(users: Arc<dyn RecordStore<UserDoc>>, jwt: JwtValidator, token_ttl: Duration) -> Self {
        Self {
            users,
            jwt,
            token_ttl,
        }
    }

    /// Create a user. Duplicate username or email is a `Conflict`.
    pub async fn register(&self, request: RegisterRequest) -> Result<UserResponse> {
        let username = request.username.trim();
        let email = request.email.trim();

        if username.is_empty() || email.is_empty() || request.full_name.trim().is_empty() {
            return Err(FraError::Validation(
                "Missing required fields: username, email, full_name".into(),
            ));
        }
        if !email.contains('@') {
            return Err(FraError::Validation("Invalid email address".into()));
        }
        if request.password.len() < MIN_PASSWORD_LEN {
            return Err(FraError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let taken = self
            .users
            .find_one(&Filter::new().eq("username", username))
            .await?
            .is_some()
            || self
                .users
                .find_one(&Filter::new().eq("email", email))
                .await?
                .is_some();
        if taken {
            return Err(FraError::Conflict("Username or email already registered".into()));
        }

        let user = UserDoc {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.to_string(),
            email: email.to_string(),
            full_name: request.full_name.trim().to_string(),
            role: request.role,
            department: request.department,
            state: non_blank(request.state),
            district: non_blank(request.district),
            is_active: true,
            created_at: timestamp::now(),
            password_hash: hash_password(&request.password)?,
        };

        // The unique indexes still catch a concurrent registration
        self.users.insert(&user).await.map_err(|e| match e {
            FraError::Conflict(_) => {
                FraError::Conflict("Username or email already registered".into())
            }
            other => other,
        })?;

        info!(username = %user.username, role = %user.role, "Registered user");
        Ok(user.public())
    }

    /// Check credentials and issue a bearer token
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse> {
        let user = self
            .users
            .find_one(&Filter::new().eq("username", request.username.trim()))
            .await?;

        let user = match user {
            Some(user) if verify_password(&request.password, &user.password_hash)? => user,
            _ => {
                warn!(username = %request.username, "Login failed");
                // Same message either way to avoid user enumeration
                return Err(FraError::Unauthenticated("Incorrect username or password".into()));
            }
        };

        if !user.is_active {
            return Err(FraError::BadRequest("Inactive user".into()));
        }

        let issued = self.jwt.issue_token(&user.username, Some(self.token_ttl))?;
        info!(username = %user.username, "User logged in");

        Ok(LoginResponse {
            access_token: issued.token,
            token_type: "bearer".to_string(),
            expires_in: issued.expires_in,
            user: user.public(),
        })
    }

    /// Resolve the caller from an `Authorization` header value
    pub async fn authenticate(&self, auth_header: Option<&str>) -> Result<UserDoc> {
        let token = extract_token_from_header(auth_header)
            .ok_or_else(|| FraError::Unauthenticated("Missing bearer token".into()))?;

        let username = self.jwt.validate_token(token)?;

        let user = self
            .users
            .find_one(&Filter::new().eq("username", username.as_str()))
            .await?
            .ok_or_else(|| FraError::Unauthenticated("User no longer exists".into()))?;

        if !user.is_active {
            return Err(FraError::Unauthenticated("User is inactive".into()));
        }

        Ok(user)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
