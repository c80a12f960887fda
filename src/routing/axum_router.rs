//! Mounts discovered routes on an axum [`Router`].

use axum::http::Method;
use axum::routing::{on, MethodFilter};
use axum::Router;

use crate::http::adapter::Endpoint;
use crate::routing::table::{route_shape, HttpRouter, RouterError};

/// Convert a `/users/:id` pattern into axum's `/users/{id}` syntax.
///
/// Literal braces are escaped. A segment may hold at most one parameter and
/// may not start with `*`, since axum cannot express either.
pub fn to_axum_path(pattern: &str) -> Result<String, RouterError> {
    let invalid = |reason: &str| RouterError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    };

    let mut path = String::with_capacity(pattern.len() + 8);
    for (index, segment) in pattern.split('/').enumerate() {
        if index > 0 {
            path.push('/');
        }
        if segment.starts_with('*') {
            return Err(invalid("segments cannot start with '*'"));
        }

        let mut params = 0;
        let mut chars = segment.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                ':' if chars.peek().is_some_and(|n| n.is_ascii_alphanumeric() || *n == '_') => {
                    params += 1;
                    if params > 1 {
                        return Err(invalid("at most one parameter per segment"));
                    }
                    path.push('{');
                    while let Some(&n) = chars.peek() {
                        if !(n.is_ascii_alphanumeric() || n == '_') {
                            break;
                        }
                        path.push(n);
                        chars.next();
                    }
                    path.push('}');
                }
                ':' if path.ends_with('/') || path.is_empty() => {
                    return Err(invalid("segments cannot start with a bare ':'"));
                }
                '{' => path.push_str("{{"),
                '}' => path.push_str("}}"),
                other => path.push(other),
            }
        }
    }
    Ok(path)
}

/// [`HttpRouter`] backed by an axum router.
///
/// axum panics on conflicting paths, so conflicts are checked here first.
#[derive(Default)]
pub struct AxumRoutes {
    router: Router,
    mounted: Vec<(String, String)>,
}

impl AxumRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_router(self) -> Router {
        self.router
    }
}

impl HttpRouter for AxumRoutes {
    fn register(
        &mut self,
        method: Method,
        pattern: &str,
        endpoint: Endpoint,
    ) -> Result<(), RouterError> {
        let filter = MethodFilter::try_from(method.clone())
            .map_err(|_| RouterError::UnsupportedMethod(method))?;
        let path = to_axum_path(pattern)?;

        let shape = route_shape(pattern);
        if let Some((existing, existing_source)) = self
            .mounted
            .iter()
            .find(|(mounted, _)| mounted != pattern && route_shape(mounted) == shape)
        {
            return Err(RouterError::ConflictingRoute {
                pattern: pattern.to_string(),
                source_name: endpoint.source().to_string(),
                existing: existing.clone(),
                existing_source: existing_source.clone(),
            });
        }
        self.mounted
            .push((pattern.to_string(), endpoint.source().to_string()));

        let router = std::mem::take(&mut self.router);
        self.router = router.route(
            &path,
            on(filter, move |request: axum::extract::Request| {
                let endpoint = endpoint.clone();
                async move { endpoint.dispatch(request).await }
            }),
        );
        Ok(())
    }
}
