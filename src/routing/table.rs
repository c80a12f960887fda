//! Route table and the router collaborator it feeds.
//!
//! # Responsibilities
//! - Hold discovered `(method, pattern, endpoint)` triples in discovery order
//! - Reject a second registration of the same method + pattern
//! - Reject patterns that differ only in parameter names (`/:id` vs `/:name`)
//! - Install the finished table onto any [`HttpRouter`]
//!
//! # Design Decisions
//! - Immutable once discovery returns it
//! - Collisions fail startup instead of silently overriding

use axum::http::Method;
use thiserror::Error;

use crate::http::adapter::Endpoint;

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("duplicate route {method} {pattern}: {first} and {second}")]
    DuplicateRoute {
        method: Method,
        pattern: String,
        first: String,
        second: String,
    },

    #[error("route {pattern} ({source_name}) conflicts with {existing} ({existing_source})")]
    ConflictingRoute {
        pattern: String,
        source_name: String,
        existing: String,
        existing_source: String,
    },

    #[error("method {0} cannot be routed")]
    UnsupportedMethod(Method),

    #[error("invalid route pattern {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Something endpoints can be registered on, one verb at a time.
pub trait HttpRouter {
    fn register(
        &mut self,
        method: Method,
        pattern: &str,
        endpoint: Endpoint,
    ) -> Result<(), RouterError>;
}

/// One entry of the route table.
#[derive(Debug, Clone)]
pub struct Route {
    pub method: Method,
    pub pattern: String,
    pub endpoint: Endpoint,
}

/// Ordered, collision-free collection of routes.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn get(&self, method: &Method, pattern: &str) -> Option<&Route> {
        self.routes
            .iter()
            .find(|route| route.method == *method && route.pattern == pattern)
    }

    /// Register every route, in order, on `router`.
    pub fn install<R: HttpRouter>(&self, router: &mut R) -> Result<(), RouterError> {
        for route in &self.routes {
            router.register(route.method.clone(), &route.pattern, route.endpoint.clone())?;
        }
        Ok(())
    }
}

impl HttpRouter for RouteTable {
    fn register(
        &mut self,
        method: Method,
        pattern: &str,
        endpoint: Endpoint,
    ) -> Result<(), RouterError> {
        if let Some(existing) = self.get(&method, pattern) {
            return Err(RouterError::DuplicateRoute {
                method,
                pattern: pattern.to_string(),
                first: existing.endpoint.source().to_string(),
                second: endpoint.source().to_string(),
            });
        }

        let shape = route_shape(pattern);
        if let Some(existing) = self
            .routes
            .iter()
            .find(|route| route.pattern != pattern && route_shape(&route.pattern) == shape)
        {
            return Err(RouterError::ConflictingRoute {
                pattern: pattern.to_string(),
                source_name: endpoint.source().to_string(),
                existing: existing.pattern.clone(),
                existing_source: existing.endpoint.source().to_string(),
            });
        }

        self.routes.push(Route {
            method,
            pattern: pattern.to_string(),
            endpoint,
        });
        Ok(())
    }
}

/// The pattern with every parameter name erased: `/items/:id` → `/items/:`.
///
/// Two patterns with the same shape match exactly the same paths.
pub fn route_shape(pattern: &str) -> String {
    let mut shape = String::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        shape.push(c);
        if c == ':' {
            while chars
                .peek()
                .is_some_and(|n| n.is_ascii_alphanumeric() || *n == '_')
            {
                chars.next();
            }
        }
    }
    shape
}
