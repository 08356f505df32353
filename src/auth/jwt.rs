//! JWT bearer tokens
//!
//! Tokens are HS256-signed and carry only the subject username plus issue
//! and expiry times. Everything else about the caller (role, district) is
//! read from the user record on each request, so role changes take effect
//! without re-issuing tokens.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::types::FraError;

/// Token lifetime used when the caller does not ask for one
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(15 * 60);

/// Shortest secret accepted outside dev mode
pub const MIN_SECRET_LEN: usize = 32;

/// Payload stored in JWT token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// A freshly signed token and its expiry
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: u64,
    pub expires_in: u64,
}

/// JWT issuer and validator
#[derive(Clone)]
pub struct JwtValidator {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtValidator {
    /// Create a new JWT validator
    ///
    /// Returns an error if the secret is empty or too short
    pub fn new(secret: &str) -> Result<Self, FraError> {
        if secret.is_empty() {
            return Err(FraError::Config("JWT_SECRET must not be empty".into()));
        }

        if secret.len() < MIN_SECRET_LEN {
            return Err(FraError::Config(format!(
                "JWT_SECRET must be at least {} characters",
                MIN_SECRET_LEN
            )));
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        })
    }

    /// Issue a token for `subject`, falling back to [`DEFAULT_TOKEN_TTL`]
    pub fn issue_token(&self, subject: &str, ttl: Option<Duration>) -> Result<IssuedToken, FraError> {
        let now = unix_now()?;
        let expires_in = ttl.unwrap_or(DEFAULT_TOKEN_TTL).as_secs();

        let claims = Claims {
            sub: subject.to_string(),
            iat: now,
            exp: now + expires_in,
        };

        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| FraError::Internal(format!("Failed to generate token: {}", e)))?;

        Ok(IssuedToken {
            token,
            expires_at: claims.exp,
            expires_in,
        })
    }

    /// Verify a token and return its subject
    pub fn validate_token(&self, token: &str) -> Result<String, FraError> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|err| {
            use jsonwebtoken::errors::ErrorKind;
            let message = match err.kind() {
                ErrorKind::ExpiredSignature => "Token expired",
                ErrorKind::InvalidSignature => "Invalid signature",
                ErrorKind::MissingRequiredClaim(_) => "Token missing subject",
                _ => "Invalid token",
            };
            FraError::Unauthenticated(message.into())
        })?;

        if data.claims.sub.trim().is_empty() {
            return Err(FraError::Unauthenticated("Token missing subject".into()));
        }

        Ok(data.claims.sub)
    }
}

fn unix_now() -> Result<u64, FraError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| FraError::Internal(format!("System time error: {}", e)))
}

/// Extract token from Authorization header ("Bearer <token>").
pub fn extract_token_from_header(auth_header: Option<&str>) -> Option<&str> {
    let header = auth_header?;

    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))?
        .trim();

    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-that-is-at-least-32-characters-long";

    fn test_validator() -> JwtValidator {
        JwtValidator::new(SECRET).unwrap()
    }

    fn sign_raw<T: Serialize>(claims: &T) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_issue_and_validate() {
        let validator = test_validator();

        let issued = validator
            .issue_token("admin", Some(Duration::from_secs(30 * 60)))
            .unwrap();
        assert_eq!(issued.expires_in, 1800);

        assert_eq!(validator.validate_token(&issued.token).unwrap(), "admin");
    }

    #[test]
    fn test_default_ttl_is_fifteen_minutes() {
        let issued = test_validator().issue_token("officer1", None).unwrap();
        assert_eq!(issued.expires_in, 15 * 60);
    }

    #[test]
    fn test_expired_token_rejected() {
        let now = unix_now().unwrap();
        let token = sign_raw(&Claims {
            sub: "admin".into(),
            iat: now - 7200,
            exp: now - 3600,
        });

        let err = test_validator().validate_token(&token).unwrap_err();
        assert!(matches!(err, FraError::Unauthenticated(ref m) if m == "Token expired"));
    }

    #[test]
    fn test_missing_subject_rejected() {
        #[derive(Serialize)]
        struct NoSubject {
            exp: u64,
        }
        let token = sign_raw(&NoSubject {
            exp: unix_now().unwrap() + 600,
        });

        assert!(test_validator().validate_token(&token).is_err());

        let blank = sign_raw(&Claims {
            sub: "  ".into(),
            iat: 0,
            exp: unix_now().unwrap() + 600,
        });
        assert!(test_validator().validate_token(&blank).is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let other = JwtValidator::new("different-secret-that-is-at-least-32-characters").unwrap();
        let issued = other.issue_token("admin", None).unwrap();

        assert!(test_validator().validate_token(&issued.token).is_err());
        assert!(test_validator().validate_token("not-a-token").is_err());
    }

    #[test]
    fn test_secret_validation() {
        assert!(JwtValidator::new("short").is_err());
        assert!(JwtValidator::new("").is_err());
        assert!(JwtValidator::new(SECRET).is_ok());
    }

    #[test]
    fn test_extract_token_from_header() {
        assert_eq!(extract_token_from_header(Some("Bearer abc123")), Some("abc123"));
        assert_eq!(extract_token_from_header(Some("bearer abc123")), Some("abc123"));
        assert_eq!(extract_token_from_header(None), None);
        assert_eq!(extract_token_from_header(Some("")), None);
        assert_eq!(extract_token_from_header(Some("Bearer ")), None);
        assert_eq!(extract_token_from_header(Some("Basic abc123")), None);
    }
}
