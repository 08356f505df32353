//! Shared request and response plumbing for route handlers

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Request, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{error, warn};

use crate::services::BoundingBox;
use crate::types::{FraError, Result};

pub type HttpResponse = Response<Full<Bytes>>;

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> HttpResponse {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    let mut response = Response::new(Full::new(Bytes::from(json)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

pub fn empty_response(status: StatusCode) -> HttpResponse {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

pub fn error_with_code(status: StatusCode, message: impl Into<String>, code: &str) -> HttpResponse {
    json_response(
        status,
        &ErrorResponse {
            error: message.into(),
            code: code.to_string(),
        },
    )
}

/// Map a service error onto its status and JSON body
pub fn error_response(err: FraError) -> HttpResponse {
    match &err {
        FraError::StoreUnavailable(_) | FraError::Internal(_) | FraError::Config(_) => {
            error!("Request failed: {}", err)
        }
        FraError::Forbidden(_) | FraError::Unauthenticated(_) => warn!("Request denied: {}", err),
        _ => {}
    }

    let code = err.code();
    let (status, message) = err.into_status_code_and_body();
    error_with_code(status, message, code)
}

/// Read and decode a JSON body of at most `max_bytes`
pub async fn parse_json_body<T, B>(body: B, max_bytes: usize) -> Result<T>
where
    T: DeserializeOwned,
    B: Body,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    let collected = Limited::new(body, max_bytes).collect().await.map_err(|e| {
        if e.downcast_ref::<LengthLimitError>().is_some() {
            FraError::BadRequest(format!("Request body exceeds {} bytes", max_bytes))
        } else {
            FraError::BadRequest(format!("Failed to read body: {}", e))
        }
    })?;

    serde_json::from_slice(&collected.to_bytes())
        .map_err(|e| FraError::BadRequest(format!("Invalid JSON: {}", e)))
}

/// Decode the query string, an absent one giving the defaults
pub fn parse_query<T: DeserializeOwned>(query: Option<&str>) -> Result<T> {
    serde_urlencoded::from_str(query.unwrap_or(""))
        .map_err(|e| FraError::BadRequest(format!("Invalid query string: {}", e)))
}

/// Blank query values count as absent
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub fn parse_bbox(raw: Option<String>) -> Result<Option<BoundingBox>> {
    non_empty(raw).map(|raw| raw.parse()).transpose()
}

pub fn get_auth_header<B>(req: &Request<B>) -> Option<&str> {
    req.headers()
        .get(hyper::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Login {
        username: String,
    }

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Params {
        status: Option<String>,
        bbox: Option<String>,
    }

    async fn body_json(response: HttpResponse) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_error_response_shape() {
        let response = error_response(FraError::Forbidden("Role 'viewer' may not create village".into()));
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let json = body_json(response).await;
        assert_eq!(json["code"], "FORBIDDEN");
        assert!(json["error"].as_str().unwrap().contains("viewer"));
    }

    #[tokio::test]
    async fn test_parse_json_body() {
        let login: Login = parse_json_body(Full::new(Bytes::from(r#"{"username":"admin"}"#)), 1024)
            .await
            .unwrap();
        assert_eq!(login.username, "admin");

        let too_big = parse_json_body::<Login, _>(Full::new(Bytes::from(vec![b' '; 64])), 16).await;
        assert!(matches!(too_big, Err(FraError::BadRequest(ref m)) if m.contains("exceeds")));

        let invalid = parse_json_body::<Login, _>(Full::new(Bytes::from("{")), 1024).await;
        assert!(matches!(invalid, Err(FraError::BadRequest(_))));
    }

    #[test]
    fn test_parse_query() {
        let params: Params = parse_query(Some("status=pending&bbox=85,23,86,24")).unwrap();
        assert_eq!(params.status.as_deref(), Some("pending"));
        assert_eq!(params.bbox.as_deref(), Some("85,23,86,24"));

        let empty: Params = parse_query(None).unwrap();
        assert_eq!(empty, Params::default());
    }

    #[test]
    fn test_parse_bbox() {
        assert_eq!(parse_bbox(None).unwrap(), None);
        assert_eq!(parse_bbox(Some(String::new())).unwrap(), None);
        assert!(parse_bbox(Some("85.0,23.0,85.2,23.2".into())).unwrap().is_some());
        assert!(matches!(
            parse_bbox(Some("85.0,23.0".into())),
            Err(FraError::Validation(_))
        ));
    }
}
