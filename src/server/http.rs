//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo, one task per connection. Routing is a
//! plain match on method and path segments below the API prefix.

use hyper::body::Incoming;
use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, ALLOW, ORIGIN, VARY,
};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::auth::JwtValidator;
use crate::config::Args;
use crate::db::Stores;
use crate::routes::{self, HttpResponse};
use crate::services::{ClaimService, UserService, VillageService};
use crate::types::{FraError, Result};

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub stores: Stores,
    pub users: UserService,
    pub villages: VillageService,
    pub claims: ClaimService,
    pub started_at: Instant,
}

impl AppState {
    /// Wire services onto the given stores
    pub fn new(args: Args, stores: Stores) -> Result<Self> {
        let secret = args
            .jwt_secret()
            .ok_or_else(|| FraError::Config("JWT_SECRET is required in production mode".into()))?;
        let jwt = JwtValidator::new(&secret)?;
        let token_ttl = Duration::from_secs(args.access_token_ttl_secs());

        Ok(Self {
            users: UserService::new(stores.users.clone(), jwt, token_ttl),
            villages: VillageService::new(stores.villages.clone()),
            claims: ClaimService::new(
                stores.claims.clone(),
                stores.villages.clone(),
                args.enforce_status_transitions,
            ),
            stores,
            args,
            started_at: Instant::now(),
        })
    }
}

/// Bind the configured address and serve until Ctrl-C
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "FRA-Connect listening on {} (prefix '{}', store: {})",
        state.args.listen,
        state.args.api_prefix(),
        state.stores.backend().as_str()
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - do not use in production");
    }
    if state.args.enforce_status_transitions {
        info!("Claim status transitions are enforced");
    }

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received, no longer accepting connections");
    };

    serve(listener, state, shutdown).await
}

/// Accept connections on `listener` until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => return Ok(()),
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    let state = Arc::clone(&state);
                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);

                        let service = service_fn(move |req| {
                            let state = Arc::clone(&state);
                            async move { handle_request(state, addr, req).await }
                        });

                        if let Err(err) = http1::Builder::new()
                            .preserve_header_case(true)
                            .title_case_headers(true)
                            .serve_connection(io, service)
                            .await
                        {
                            debug!("Error serving connection from {}: {:?}", addr, err);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {:?}", e);
                }
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<HttpResponse, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let origin = req
        .headers()
        .get(ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    info!("[{}] {} {}", addr, method, path);

    let mut response = if method == Method::OPTIONS {
        preflight_response()
    } else {
        dispatch(req, &state, &method, &path).await
    };

    debug!("[{}] {} {} -> {}", addr, method, path, response.status());

    apply_cors(&mut response, origin.as_deref(), &state.args);
    Ok(response)
}

async fn dispatch(
    req: Request<Incoming>,
    state: &Arc<AppState>,
    method: &Method,
    path: &str,
) -> HttpResponse {
    if path == "/health" || path == "/healthz" {
        return match *method {
            Method::GET => routes::health_check(state),
            _ => method_not_allowed("GET"),
        };
    }

    let Some(rest) = strip_api_prefix(path, state.args.api_prefix()) else {
        return not_found_response(path);
    };
    let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
    let state = Arc::clone(state);

    let result = match (method, segments.as_slice()) {
        (&Method::POST, ["auth", "register"]) => routes::handle_register(req, state).await,
        (&Method::POST, ["auth", "login"]) => routes::handle_login(req, state).await,
        (&Method::GET, ["auth", "me"]) => routes::handle_me(req, state).await,

        (&Method::GET, ["dashboard", "stats"]) => routes::handle_dashboard_stats(req, state).await,

        (&Method::GET, ["villages"]) => routes::handle_list_villages(req, state).await,
        (&Method::POST, ["villages"]) => routes::handle_create_village(req, state).await,
        (&Method::GET, ["villages", "geojson"]) => routes::handle_villages_geojson(req, state).await,
        (&Method::GET, ["villages", "spatial", "stats"]) => {
            routes::handle_spatial_stats(req, state).await
        }

        (&Method::GET, ["claims"]) => routes::handle_list_claims(req, state).await,
        (&Method::POST, ["claims"]) => routes::handle_create_claim(req, state).await,
        (&Method::GET, ["claims", "geojson"]) => routes::handle_claims_geojson(req, state).await,
        (&Method::GET, ["claims", id]) => {
            let id = id.to_string();
            routes::handle_get_claim(req, state, &id).await
        }
        (&Method::PUT, ["claims", id, "status"]) => {
            let id = id.to_string();
            routes::handle_update_claim_status(req, state, &id).await
        }

        (&Method::POST, ["init-sample-data"]) => routes::handle_init_sample_data(state).await,

        (_, segments) => {
            return match allowed_methods(segments) {
                Some(allowed) => method_not_allowed(allowed),
                None => not_found_response(path),
            }
        }
    };

    result.unwrap_or_else(routes::error_response)
}

/// Path below the prefix, or `None` when the request is outside it
fn strip_api_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    if prefix.is_empty() {
        return Some(path);
    }
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}

/// Methods served on a known path, for 405 responses
fn allowed_methods(segments: &[&str]) -> Option<&'static str> {
    match segments {
        ["auth", "register"] | ["auth", "login"] | ["init-sample-data"] => Some("POST"),
        ["auth", "me"]
        | ["dashboard", "stats"]
        | ["villages", "geojson"]
        | ["villages", "spatial", "stats"]
        | ["claims", _] => Some("GET"),
        ["villages"] | ["claims"] => Some("GET, POST"),
        ["claims", _, "status"] => Some("PUT"),
        _ => None,
    }
}

fn apply_cors(response: &mut HttpResponse, origin: Option<&str>, args: &Args) {
    let allowed = match (args.cors_origin_list(), origin) {
        (None, _) => Some(HeaderValue::from_static("*")),
        (Some(list), Some(origin)) if list.iter().any(|o| o == origin) => {
            HeaderValue::from_str(origin).ok()
        }
        _ => None,
    };

    let headers = response.headers_mut();
    if let Some(value) = allowed {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, value);
        if args.cors_origin_list().is_some() {
            headers.insert(VARY, HeaderValue::from_static("Origin"));
        }
    }
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, OPTIONS"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
}

/// CORS preflight response
fn preflight_response() -> HttpResponse {
    let mut response = routes::empty_response(StatusCode::NO_CONTENT);
    response
        .headers_mut()
        .insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("86400"));
    response
}

fn not_found_response(path: &str) -> HttpResponse {
    routes::error_with_code(
        StatusCode::NOT_FOUND,
        format!("No route for {}", path),
        "NOT_FOUND",
    )
}

fn method_not_allowed(allowed: &'static str) -> HttpResponse {
    let mut response = routes::error_with_code(
        StatusCode::METHOD_NOT_ALLOWED,
        "Method not allowed",
        "METHOD_NOT_ALLOWED",
    );
    response
        .headers_mut()
        .insert(ALLOW, HeaderValue::from_static(allowed));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_api_prefix() {
        assert_eq!(strip_api_prefix("/api/claims", "/api"), Some("/claims"));
        assert_eq!(strip_api_prefix("/api", "/api"), Some(""));
        assert_eq!(strip_api_prefix("/apiclaims", "/api"), None);
        assert_eq!(strip_api_prefix("/claims", "/api"), None);
        assert_eq!(strip_api_prefix("/claims", ""), Some("/claims"));
    }

    #[test]
    fn test_allowed_methods() {
        assert_eq!(allowed_methods(&["villages"]), Some("GET, POST"));
        assert_eq!(allowed_methods(&["claims", "abc", "status"]), Some("PUT"));
        assert_eq!(allowed_methods(&["claims", "abc"]), Some("GET"));
        assert_eq!(allowed_methods(&["unknown"]), None);
    }
}
