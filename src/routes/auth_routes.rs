//! HTTP routes for authentication
//!
//! - POST /auth/register - Create a user
//! - POST /auth/login    - Check credentials and get a bearer token
//! - GET  /auth/me       - Current user from the token

use hyper::body::Incoming;
use hyper::{Request, StatusCode};
use std::sync::Arc;

use crate::routes::helpers::{
    error_with_code, get_auth_header, json_response, parse_json_body, HttpResponse,
};
use crate::server::AppState;
use crate::services::{LoginRequest, RegisterRequest};
use crate::types::{FraError, Result};

/// POST /auth/register
///
/// Returns 201 with the public user. A taken username or email is a 400
/// with code `USER_EXISTS`.
pub async fn handle_register(req: Request<Incoming>, state: Arc<AppState>) -> Result<HttpResponse> {
    let body: RegisterRequest = parse_json_body(req.into_body(), state.args.max_body_bytes).await?;

    match state.users.register(body).await {
        Ok(user) => Ok(json_response(StatusCode::CREATED, &user)),
        Err(FraError::Conflict(message)) => Ok(error_with_code(
            StatusCode::BAD_REQUEST,
            message,
            "USER_EXISTS",
        )),
        Err(e) => Err(e),
    }
}

/// POST /auth/login
pub async fn handle_login(req: Request<Incoming>, state: Arc<AppState>) -> Result<HttpResponse> {
    let body: LoginRequest = parse_json_body(req.into_body(), state.args.max_body_bytes).await?;
    let response = state.users.login(body).await?;
    Ok(json_response(StatusCode::OK, &response))
}

/// GET /auth/me
pub async fn handle_me(req: Request<Incoming>, state: Arc<AppState>) -> Result<HttpResponse> {
    let user = state.users.authenticate(get_auth_header(&req)).await?;
    Ok(json_response(StatusCode::OK, &user.public()))
}
