//! Configuration for FRA-Connect
//!
//! CLI arguments and environment variable handling using clap. Every value
//! has a default that is only suitable for local development.

use clap::Parser;
use std::net::SocketAddr;

use crate::auth::jwt::MIN_SECRET_LEN;

/// Development-only signing secret, used when DEV_MODE is on and no
/// JWT_SECRET is configured.
const DEV_JWT_SECRET: &str = "fra-connect-dev-secret-not-for-production";

/// FRA-Connect - Forest Rights Atlas API
#[derive(Parser, Debug, Clone)]
#[command(name = "fra-connect")]
#[command(about = "Forest rights claim management API with GeoJSON map overlays")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8001")]
    pub listen: SocketAddr,

    /// Path prefix for all API routes
    #[arg(long, env = "API_PREFIX", default_value = "/api")]
    pub api_prefix: String,

    /// MongoDB connection URI
    #[arg(long, env = "MONGO_URL", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "DB_NAME", default_value = "fra_db")]
    pub mongodb_db: String,

    /// JWT secret for token signing (required outside dev mode)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// Lifetime of tokens issued at login, in minutes
    #[arg(long, env = "ACCESS_TOKEN_EXPIRE_MINUTES", default_value = "30")]
    pub access_token_expire_minutes: u64,

    /// Comma-separated list of allowed CORS origins ("*" allows any)
    #[arg(long, env = "CORS_ORIGINS", default_value = "*")]
    pub cors_origins: String,

    /// Enable development mode (dev signing secret, in-memory store fallback)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Reject claim status changes outside the allowed transition table
    #[arg(long, env = "ENFORCE_STATUS_TRANSITIONS", default_value = "false")]
    pub enforce_status_transitions: bool,

    /// Allow POST /init-sample-data
    #[arg(long, env = "SAMPLE_DATA_ENABLED", default_value = "true", action = clap::ArgAction::Set)]
    pub sample_data_enabled: bool,

    /// Dashboard figures that are not derived from stored data
    #[command(flatten)]
    pub dashboard: DashboardArgs,

    /// Maximum accepted request body size in bytes
    #[arg(long, env = "MAX_BODY_BYTES", default_value = "1048576")]
    pub max_body_bytes: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,
}

/// Static dashboard figures
///
/// These are reported alongside the live counts but come from configuration,
/// not from the record store.
#[derive(clap::Args, Debug, Clone)]
pub struct DashboardArgs {
    /// OCR accuracy percentage shown on the dashboard
    #[arg(long, env = "OCR_ACCURACY", default_value = "87.5")]
    pub ocr_accuracy: f64,

    /// Number of integrated welfare schemes shown on the dashboard
    #[arg(long, env = "SCHEMES_INTEGRATED", default_value = "4")]
    pub schemes_integrated: u32,

    /// Total linked budget shown on the dashboard
    #[arg(long, env = "TOTAL_BUDGET_LINKED", default_value = "125000000.0")]
    pub total_budget_linked: f64,
}

impl Args {
    /// Get effective JWT secret (uses default in dev mode)
    pub fn jwt_secret(&self) -> Option<String> {
        match (&self.jwt_secret, self.dev_mode) {
            (Some(secret), _) => Some(secret.clone()),
            (None, true) => Some(DEV_JWT_SECRET.to_string()),
            (None, false) => None,
        }
    }

    /// Token lifetime for the login flow, in seconds
    pub fn access_token_ttl_secs(&self) -> u64 {
        self.access_token_expire_minutes * 60
    }

    /// Allowed CORS origins, `None` meaning any origin
    pub fn cors_origin_list(&self) -> Option<Vec<String>> {
        let origins: Vec<String> = self
            .cors_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            None
        } else {
            Some(origins)
        }
    }

    /// Normalised API prefix without a trailing slash ("" for root)
    pub fn api_prefix(&self) -> &str {
        self.api_prefix.trim_end_matches('/')
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        match (&self.jwt_secret, self.dev_mode) {
            (None, false) => {
                return Err("JWT_SECRET is required in production mode".to_string());
            }
            (Some(secret), false) if secret.len() < MIN_SECRET_LEN => {
                return Err(format!(
                    "JWT_SECRET must be at least {} characters",
                    MIN_SECRET_LEN
                ));
            }
            _ => {}
        }

        if !self.api_prefix.is_empty() && !self.api_prefix.starts_with('/') {
            return Err("API_PREFIX must start with '/'".to_string());
        }

        if self.access_token_expire_minutes == 0 {
            return Err("ACCESS_TOKEN_EXPIRE_MINUTES must be greater than zero".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["fra-connect"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_production_requires_secret() {
        let args = parse(&[]);
        if args.jwt_secret.is_none() && !args.dev_mode {
            assert!(args.validate().is_err());
            assert!(args.jwt_secret().is_none());
        }
    }

    #[test]
    fn test_short_secret_rejected_outside_dev_mode() {
        let short = parse(&["--jwt-secret", "too-short"]);
        assert!(short.validate().is_err());

        let long = parse(&["--jwt-secret", "0123456789abcdef0123456789abcdef"]);
        assert!(long.validate().is_ok());
    }

    #[test]
    fn test_dev_mode_falls_back_to_dev_secret() {
        let args = parse(&["--dev-mode"]);
        assert!(args.validate().is_ok());
        assert!(args.jwt_secret().is_some());
    }

    #[test]
    fn test_cors_origin_list() {
        let args = parse(&["--dev-mode", "--cors-origins", "http://a.test, http://b.test"]);
        assert_eq!(
            args.cors_origin_list(),
            Some(vec!["http://a.test".to_string(), "http://b.test".to_string()])
        );

        let any = parse(&["--dev-mode", "--cors-origins", "*"]);
        assert_eq!(any.cors_origin_list(), None);
    }

    #[test]
    fn test_api_prefix_normalised() {
        let args = parse(&["--dev-mode", "--api-prefix", "/api/"]);
        assert_eq!(args.api_prefix(), "/api");
        assert!(args.validate().is_ok());

        let bad = parse(&["--dev-mode", "--api-prefix", "api"]);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_token_ttl() {
        let args = parse(&["--dev-mode", "--access-token-expire-minutes", "30"]);
        assert_eq!(args.access_token_ttl_secs(), 1800);
    }
}
