//! Error types for FRA-Connect
//!
//! Every failure a request can hit maps onto one variant here, and every
//! variant maps onto one HTTP status and one machine-readable code.

use hyper::StatusCode;

/// Main error type for FRA-Connect operations
#[derive(Debug, thiserror::Error)]
pub enum FraError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Duplicate username/email or other unique-key clash
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Missing, malformed or expired bearer token
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Valid token, insufficient role
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Record store unreachable or failing
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl FraError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            // Registration clashes are reported as 400, not 409
            Self::Conflict(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code carried in the JSON error body
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::Unauthenticated(_) => "UNAUTHENTICATED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Convert to status code and body tuple for HTTP response
    pub fn into_status_code_and_body(self) -> (StatusCode, String) {
        let status = self.status_code();
        let body = self.to_string();
        (status, body)
    }
}

impl From<std::io::Error> for FraError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for FraError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<mongodb::error::Error> for FraError {
    fn from(err: mongodb::error::Error) -> Self {
        use mongodb::error::ErrorKind;

        let message = err.to_string();
        match *err.kind {
            // Input that cannot be expressed as BSON, e.g. integers past i64
            ErrorKind::BsonSerialization(_) => {
                Self::Validation(format!("Record cannot be stored: {}", message))
            }
            ErrorKind::BsonDeserialization(_) => {
                Self::Internal(format!("Stored document is unreadable: {}", message))
            }
            _ if message.contains("E11000") || message.contains("duplicate key") => {
                Self::Conflict(message)
            }
            _ => Self::StoreUnavailable(message),
        }
    }
}

impl From<bson::ser::Error> for FraError {
    fn from(err: bson::ser::Error) -> Self {
        Self::Internal(format!("BSON encoding error: {}", err))
    }
}

/// Result type alias for FRA-Connect operations
pub type Result<T> = std::result::Result<T, FraError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            FraError::Unauthenticated("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            FraError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            FraError::Conflict("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            FraError::StoreUnavailable("x".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_body_carries_message() {
        let (status, body) = FraError::NotFound("Claim abc".into()).into_status_code_and_body();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "Not found: Claim abc");
    }

    #[test]
    fn test_bson_errors_are_not_store_outages() {
        let too_big = bson::to_bson(&u64::MAX).unwrap_err();
        let err = FraError::from(mongodb::error::Error::from(too_big));
        assert!(matches!(err, FraError::Validation(_)));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        #[derive(Debug, serde::Deserialize)]
        struct Named {
            #[allow(dead_code)]
            name: String,
        }
        let unreadable = bson::from_document::<Named>(bson::doc! { "name": 7 }).unwrap_err();
        let err = FraError::from(mongodb::error::Error::from(unreadable));
        assert!(matches!(err, FraError::Internal(_)));
    }
}
