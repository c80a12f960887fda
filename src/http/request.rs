//! Request handling and transformation.
//!
//! # Responsibilities
//! - Turn an inbound axum request into the handler-facing [`Request`]
//! - Extract path parameters and query string
//! - Carry the per-request [`RequestContext`]
//!
//! # Design Decisions
//! - Body is fully buffered before the handler runs
//! - Query parsing is lenient: a malformed query string reads as empty
//! - Context is created per dispatch and never shared

use std::collections::HashMap;
use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::extract::{FromRequestParts, Query, RawPathParams};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use http_body_util::LengthLimitError;
use serde::de::DeserializeOwned;

use crate::http::error::{ErrorOptions, HttpError};
use crate::observability::ComponentLogger;

/// An inbound request as seen by route handlers.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    params: HashMap<String, String>,
    query: HashMap<String, String>,
    body: Bytes,
}

impl Request {
    /// Build a request with no headers, parameters or body.
    pub fn new(method: Method, uri: Uri) -> Self {
        let query = parse_query(&uri);
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            params: HashMap::new(),
            query,
            body: Bytes::new(),
        }
    }

    /// Buffer an axum request into a handler request.
    pub async fn from_axum(request: axum::extract::Request) -> Result<Self, HttpError> {
        let (mut parts, body) = request.into_parts();

        let params = match RawPathParams::from_request_parts(&mut parts, &()).await {
            Ok(raw) => raw
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
            Err(_) => HashMap::new(),
        };

        let body = axum::body::to_bytes(body, usize::MAX).await.map_err(|e| {
            if exceeds_length_limit(&e) {
                HttpError::new(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    format!("request body over the size limit: {e}"),
                    ErrorOptions::default().message("Payload Too Large"),
                )
            } else {
                HttpError::bad_request(format!("failed to read request body: {e}"))
            }
        })?;

        let query = parse_query(&parts.uri);
        Ok(Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            params,
            query,
            body,
        })
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A named path parameter, e.g. `id` for `/locations/:id`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// A query string value.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Deserialize the body as JSON, failing with a 400.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| HttpError::bad_request(format!("invalid JSON body: {e}")))
    }
}

fn parse_query(uri: &Uri) -> HashMap<String, String> {
    Query::<HashMap<String, String>>::try_from_uri(uri)
        .map(|Query(query)| query)
        .unwrap_or_default()
}

/// Per-request state handed to every handler invocation.
#[derive(Debug, Clone)]
pub struct RequestContext {
    logger: ComponentLogger,
    timestamp: Instant,
}

impl RequestContext {
    pub fn new(logger: ComponentLogger, timestamp: Instant) -> Self {
        Self { logger, timestamp }
    }

    /// The request-scoped logger (`request:<id>`).
    pub fn logger(&self) -> &ComponentLogger {
        &self.logger
    }

    /// When the request was received.
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    pub fn elapsed(&self) -> Duration {
        self.timestamp.elapsed()
    }
}

/// Whether a body read failed because a size limit cut it off.
fn exceeds_length_limit(error: &axum::Error) -> bool {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(error);
    while let Some(error) = current {
        if error.is::<LengthLimitError>() {
            return true;
        }
        current = error.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_query_parsing() {
        let request = Request::new(Method::GET, "/locations?q=lon&limit=5".parse().unwrap());
        assert_eq!(request.query("q"), Some("lon"));
        assert_eq!(request.query("limit"), Some("5"));
        assert_eq!(request.query("offset"), None);
    }

    #[test]
    fn test_no_query_string() {
        let request = Request::new(Method::GET, "/locations".parse().unwrap());
        assert_eq!(request.query("q"), None);
    }

    #[tokio::test]
    async fn test_from_axum_buffers_body() {
        let inbound = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/things?x=1")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"name":"pie"}"#))
            .unwrap();

        let request = Request::from_axum(inbound).await.unwrap();
        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.query("x"), Some("1"));
        assert_eq!(request.headers()["content-type"], "application/json");

        let value: serde_json::Value = request.json().unwrap();
        assert_eq!(value["name"], "pie");
    }

    #[test]
    fn test_invalid_json_is_bad_request() {
        let request = Request::new(Method::POST, "/".parse().unwrap()).with_body("{nope");
        let err = request.json::<serde_json::Value>().unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_oversized_body_is_payload_too_large() {
        let limited = http_body_util::Limited::new(Body::from("far too long"), 3);
        let inbound = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/things")
            .body(Body::new(limited))
            .unwrap();

        let err = Request::from_axum(inbound).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.response(), "Payload Too Large");
    }

    #[tokio::test]
    async fn test_broken_body_is_bad_request() {
        let stream = futures_util::stream::iter(vec![
            Ok::<_, std::io::Error>(Bytes::from_static(b"part")),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
        ]);
        let inbound = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/things")
            .body(Body::from_stream(stream))
            .unwrap();

        let err = Request::from_axum(inbound).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
