//! Response handling and transformation.
//!
//! # Responsibilities
//! - Define the tagged [`Reply`] handlers return
//! - Render replies into axum responses (the transport's default send)
//! - Report the rendered body size for access logging
//!
//! # Design Decisions
//! - No status override means 200 OK
//! - JSON bodies are serialized once, at render time
//! - Headers set on the reply win over the content-type default

use axum::body::Body;
use axum::http::header::{HeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use serde::Serialize;
use serde_json::Value;

/// Body of a [`Reply`].
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyBody {
    Empty,
    Text(String),
    Json(Value),
}

/// What a handler resolves to: a body plus optional status and headers.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    body: ReplyBody,
    status: Option<StatusCode>,
    headers: HeaderMap,
}

impl Reply {
    fn from_body(body: ReplyBody) -> Self {
        Self {
            body,
            status: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn empty() -> Self {
        Self::from_body(ReplyBody::Empty)
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::from_body(ReplyBody::Text(text.into()))
    }

    pub fn json(value: Value) -> Self {
        Self::from_body(ReplyBody::Json(value))
    }

    /// Serialize any value into a JSON reply.
    pub fn serialize<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::json(serde_json::to_value(value)?))
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn body(&self) -> &ReplyBody {
        &self.body
    }

    /// The status override, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Render into an HTTP response.
    pub fn render(self) -> Result<Rendered, serde_json::Error> {
        let (bytes, content_type) = match self.body {
            ReplyBody::Empty => (Vec::new(), None),
            ReplyBody::Text(text) => (text.into_bytes(), Some("text/html; charset=utf-8")),
            ReplyBody::Json(value) => (serde_json::to_vec(&value)?, Some("application/json")),
        };
        let size = bytes.len();

        let mut response = Response::new(Body::from(bytes));
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);

        let headers = response.headers_mut();
        if let Some(content_type) = content_type {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        headers.insert(CONTENT_LENGTH, HeaderValue::from(size));
        for (name, value) in self.headers.iter() {
            headers.insert(name.clone(), value.clone());
        }

        Ok(Rendered {
            response,
            size: Some(size),
        })
    }
}

/// A rendered response along with its body size, when known.
#[derive(Debug)]
pub struct Rendered {
    pub response: Response,
    pub size: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_json_reply_defaults_to_ok() {
        let rendered = Reply::json(json!({"json": "data"})).render().unwrap();
        assert_eq!(rendered.response.status(), StatusCode::OK);
        assert_eq!(
            rendered.response.headers()[CONTENT_TYPE],
            "application/json"
        );
        assert_eq!(rendered.size, Some(15));
        assert_eq!(body_text(rendered.response).await, r#"{"json":"data"}"#);
    }

    #[tokio::test]
    async fn test_status_and_header_overrides() {
        let rendered = Reply::text("made")
            .with_status(StatusCode::CREATED)
            .with_header(
                HeaderName::from_static("x-pie"),
                HeaderValue::from_static("apple"),
            )
            .render()
            .unwrap();

        assert_eq!(rendered.response.status(), StatusCode::CREATED);
        assert_eq!(rendered.response.headers()["x-pie"], "apple");
        assert_eq!(body_text(rendered.response).await, "made");
    }

    #[test]
    fn test_empty_reply() {
        let rendered = Reply::empty().render().unwrap();
        assert_eq!(rendered.size, Some(0));
        assert!(rendered.response.headers().get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_serialize() {
        let reply = Reply::serialize(&vec!["a", "b"]).unwrap();
        assert_eq!(reply.body(), &ReplyBody::Json(json!(["a", "b"])));
        assert_eq!(reply.status(), None);
    }
}
