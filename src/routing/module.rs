//! Route module declarations.
//!
//! A route file declares its exports explicitly through [`RouteModule`]:
//! handlers keyed by verb, and any helper values it wants to expose. The
//! discoverer only registers exports named after a recognized verb whose
//! value is a handler.

use std::future::Future;
use std::sync::Arc;

use axum::http::Method;
use serde_json::Value;

use crate::http::reply::Reply;
use crate::http::request::{Request, RequestContext};
use crate::routing::handler::BoxedHandler;

/// Verb tokens that may name a handler export.
pub const ROUTABLE_METHODS: [&str; 8] = [
    "GET", "HEAD", "POST", "PUT", "PATCH", "DELETE", "OPTIONS", "TRACE",
];

/// Map an export name to an HTTP method, case-sensitively.
pub fn method_for_export(name: &str) -> Option<Method> {
    if ROUTABLE_METHODS.contains(&name) {
        Method::from_bytes(name.as_bytes()).ok()
    } else {
        None
    }
}

/// A single exported binding.
#[derive(Clone)]
pub enum Export {
    Handler(BoxedHandler),
    Value(Value),
}

impl std::fmt::Debug for Export {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Export::Handler(_) => f.write_str("Handler(..)"),
            Export::Value(value) => f.debug_tuple("Value").field(value).finish(),
        }
    }
}

/// The ordered exports of one route file.
#[derive(Clone, Debug, Default)]
pub struct RouteModule {
    exports: Vec<(String, Export)>,
}

impl RouteModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Export a handler under an arbitrary name.
    pub fn export<F, Fut>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Request, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Reply>> + Send + 'static,
    {
        self.exports
            .push((name.into(), Export::Handler(Arc::new(handler))));
        self
    }

    /// Export a plain value; never routed.
    pub fn constant(mut self, name: impl Into<String>, value: Value) -> Self {
        self.exports.push((name.into(), Export::Value(value)));
        self
    }

    pub fn get<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(Request, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Reply>> + Send + 'static,
    {
        self.export("GET", handler)
    }

    pub fn post<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(Request, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Reply>> + Send + 'static,
    {
        self.export("POST", handler)
    }

    pub fn put<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(Request, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Reply>> + Send + 'static,
    {
        self.export("PUT", handler)
    }

    pub fn patch<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(Request, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Reply>> + Send + 'static,
    {
        self.export("PATCH", handler)
    }

    pub fn delete<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(Request, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Reply>> + Send + 'static,
    {
        self.export("DELETE", handler)
    }

    /// Exports in declaration order.
    pub fn exports(&self) -> impl Iterator<Item = (&str, &Export)> {
        self.exports.iter().map(|(name, export)| (name.as_str(), export))
    }

    /// The routable handlers: verb-named exports holding a handler.
    pub fn handlers(&self) -> impl Iterator<Item = (&str, Method, &BoxedHandler)> {
        self.exports().filter_map(|(name, export)| {
            let method = method_for_export(name)?;
            match export {
                Export::Handler(handler) => Some((name, method, handler)),
                Export::Value(_) => None,
            }
        })
    }
}
