//! Request adapter: turns a route handler into a transport endpoint.
//!
//! # Data Flow
//! ```text
//! axum request
//!     → fresh request:<id> logger + start timestamp
//!     → start line "GET /locations?q=lon"
//!     → handler(request, context)   (errors and panics both captured)
//!         Ok(reply)            → render reply
//!         Err(HttpError)       → status + client message
//!         Err(anything else)   → ErrorFallback decides
//!     → completion line "GET /locations?q=lon: 200 (42 B) after 3ms"
//! ```
//!
//! # Design Decisions
//! - The adapter is the only writer of per-request logs
//! - Unknown errors are never interpreted, only forwarded
//! - Panics inside a handler count as unknown errors
//! - The completion line is written by a drop guard, so cancelled
//!   dispatches are logged too

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use axum::http::{Method, StatusCode};
use axum::response::Response;
use futures_util::FutureExt;

use crate::http::error::HttpError;
use crate::http::fallback::ErrorFallback;
use crate::http::reply::{Rendered, Reply};
use crate::http::request::{Request, RequestContext};
use crate::observability::{ComponentLogger, LoggerFactory};
use crate::routing::handler::BoxedHandler;

/// Wraps handlers into [`Endpoint`]s sharing one logger factory and fallback.
#[derive(Clone)]
pub struct RequestAdapter {
    loggers: LoggerFactory,
    fallback: Arc<dyn ErrorFallback>,
}

impl RequestAdapter {
    pub fn new(loggers: LoggerFactory, fallback: Arc<dyn ErrorFallback>) -> Self {
        Self { loggers, fallback }
    }

    /// Wrap `handler`; `source` identifies it in diagnostics
    /// (e.g. `src/routes/locations.rs:GET()`).
    pub fn adapt(&self, handler: BoxedHandler, source: impl Into<String>) -> Endpoint {
        Endpoint {
            inner: Arc::new(EndpointInner {
                handler,
                source: source.into(),
                loggers: self.loggers.clone(),
                fallback: self.fallback.clone(),
            }),
        }
    }
}

/// A handler ready to be mounted on a router.
#[derive(Clone)]
pub struct Endpoint {
    inner: Arc<EndpointInner>,
}

struct EndpointInner {
    handler: BoxedHandler,
    source: String,
    loggers: LoggerFactory,
    fallback: Arc<dyn ErrorFallback>,
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("source", &self.inner.source)
            .finish()
    }
}

impl Endpoint {
    /// Where the wrapped handler was declared.
    pub fn source(&self) -> &str {
        &self.inner.source
    }

    /// Process one inbound request.
    pub async fn dispatch(&self, request: axum::extract::Request) -> Response {
        let logger = self.inner.loggers.child();
        let timestamp = Instant::now();
        let method = request.method().clone();
        let url = request.uri().to_string();

        tracing::info!(parent: logger.span(), "{method} {url}");
        let mut completion = Completion {
            logger: logger.clone(),
            method,
            url,
            timestamp,
            outcome: None,
        };

        let context = RequestContext::new(logger.clone(), timestamp);
        let reply = match self.invoke(request, context).await {
            Ok(reply) => {
                tracing::trace!(
                    parent: logger.span(),
                    "Handler returned after {}ms",
                    timestamp.elapsed().as_millis()
                );
                reply
            }
            Err(error) => self.recover(error, &logger),
        };

        let rendered = match reply.render() {
            Ok(rendered) => rendered,
            Err(error) => self.render_fallback(anyhow::Error::new(error), &logger),
        };

        completion.outcome = Some((rendered.response.status(), rendered.size));
        rendered.response
    }

    async fn invoke(
        &self,
        request: axum::extract::Request,
        context: RequestContext,
    ) -> anyhow::Result<Reply> {
        let handler = self.inner.handler.clone();
        let source = self.inner.source.clone();

        // The call itself happens inside the caught future so a handler
        // that panics before returning its future is caught as well.
        let invocation = async move {
            tracing::trace!(parent: context.logger().span(), "Using handler {source}");
            let request = Request::from_axum(request).await?;
            handler.call(request, context).await
        };

        match AssertUnwindSafe(invocation).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => Err(anyhow::anyhow!(
                "handler {} panicked: {}",
                self.inner.source,
                panic_message(panic.as_ref())
            )),
        }
    }

    fn recover(&self, error: anyhow::Error, logger: &ComponentLogger) -> Reply {
        tracing::error!(parent: logger.span(), error = %format!("{error:#}"), "Handler failed");
        match error.downcast_ref::<HttpError>() {
            Some(http) => Reply::text(http.response()).with_status(http.status()),
            None => self.inner.fallback.handle(error),
        }
    }

    fn render_fallback(&self, error: anyhow::Error, logger: &ComponentLogger) -> Rendered {
        tracing::error!(parent: logger.span(), error = %error, "Failed to render reply");
        let reply = self.inner.fallback.handle(error);
        match reply.render() {
            Ok(rendered) => rendered,
            Err(_) => {
                let mut response = Response::new(axum::body::Body::empty());
                *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                Rendered {
                    response,
                    size: None,
                }
            }
        }
    }
}

/// Writes the completion line when dropped.
///
/// A dispatch that is cancelled (timeout, client gone) still gets a
/// completion line, marked as aborted since no status was produced.
struct Completion {
    logger: ComponentLogger,
    method: Method,
    url: String,
    timestamp: Instant,
    outcome: Option<(StatusCode, Option<usize>)>,
}

impl Drop for Completion {
    fn drop(&mut self) {
        let duration = self.timestamp.elapsed().as_millis();
        match self.outcome {
            Some((status, size)) => {
                let size = size.map_or_else(|| "null".to_string(), |size| size.to_string());
                tracing::info!(
                    parent: self.logger.span(),
                    "{} {}: {} ({size} B) after {duration}ms",
                    self.method,
                    self.url,
                    status.as_u16(),
                );
            }
            None => {
                tracing::warn!(
                    parent: self.logger.span(),
                    "{} {}: aborted after {duration}ms",
                    self.method,
                    self.url,
                );
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use axum::body::Body;
    use serde_json::json;

    use crate::http::error::ErrorOptions;
    use crate::http::fallback::INTERNAL_ERROR_BODY;
    use crate::observability::logging::capture::CapturedLogs;
    use crate::observability::Palette;
    use crate::routing::handler::{handler, Handler, HandlerFuture};

    /// Records every error it is handed.
    #[derive(Default)]
    struct RecordingFallback {
        errors: Mutex<Vec<String>>,
    }

    impl ErrorFallback for RecordingFallback {
        fn handle(&self, error: anyhow::Error) -> Reply {
            self.errors.lock().unwrap().push(error.to_string());
            Reply::text(INTERNAL_ERROR_BODY).with_status(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }

    fn adapter(fallback: Arc<RecordingFallback>) -> RequestAdapter {
        RequestAdapter::new(Palette::plain().factory("request"), fallback)
    }

    fn inbound(uri: &str) -> axum::extract::Request {
        axum::http::Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_passes_request_and_context() {
        let seen = Arc::new(Mutex::new(None));
        let captured = seen.clone();
        let call_time = Instant::now();

        let endpoint = adapter(Arc::default()).adapt(
            handler(move |request: Request, context: RequestContext| {
                let captured = captured.clone();
                async move {
                    *captured.lock().unwrap() = Some((
                        request.uri().to_string(),
                        context.logger().prefix().to_string(),
                        context.timestamp(),
                    ));
                    Ok(Reply::empty())
                }
            }),
            "test",
        );

        endpoint.dispatch(inbound("/pie?slice=1")).await;

        let (uri, prefix, timestamp) = seen.lock().unwrap().take().unwrap();
        assert_eq!(uri, "/pie?slice=1");
        let id = prefix.strip_prefix("request:").unwrap();
        assert!(!id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(timestamp >= call_time);
    }

    #[tokio::test]
    async fn test_responds_with_returned_data() {
        let fallback = Arc::new(RecordingFallback::default());
        let endpoint = adapter(fallback.clone()).adapt(
            handler(|_, _| async {
                Ok(Reply::json(json!({"json": "data"})))
            }),
            "test",
        );

        let response = endpoint.dispatch(inbound("/")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, r#"{"json":"data"}"#);
        assert!(fallback.errors.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_handles_http_errors() {
        let fallback = Arc::new(RecordingFallback::default());
        let endpoint = adapter(fallback.clone()).adapt(
            handler(|_, _| async {
                Err(HttpError::new(
                    StatusCode::from_u16(314).unwrap(),
                    "Too much pie",
                    ErrorOptions::default()
                        .code("2_MUCH_PI")
                        .message("Sorry user, we ate it all"),
                )
                .into())
            }),
            "test",
        );

        let response = endpoint.dispatch(inbound("/")).await;
        assert_eq!(response.status().as_u16(), 314);
        assert_eq!(
            body_text(response).await,
            "2_MUCH_PI: Sorry user, we ate it all"
        );
        assert!(fallback.errors.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bad_request_error() {
        let endpoint = adapter(Arc::default()).adapt(
            handler(|_, _| async {
                Err(HttpError::bad_request("Bad Request").into())
            }),
            "test",
        );

        let response = endpoint.dispatch(inbound("/")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "Bad Request");
    }

    #[tokio::test]
    async fn test_forwards_unknown_errors_to_fallback() {
        let fallback = Arc::new(RecordingFallback::default());
        let endpoint = adapter(fallback.clone()).adapt(
            handler(|_, _| async {
                Err(anyhow::anyhow!("oh no AAAAAA"))
            }),
            "test",
        );

        let response = endpoint.dispatch(inbound("/")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, INTERNAL_ERROR_BODY);
        assert_eq!(*fallback.errors.lock().unwrap(), vec!["oh no AAAAAA"]);
    }

    struct PanicsOnCall;

    impl Handler for PanicsOnCall {
        fn call(&self, _: Request, _: RequestContext) -> HandlerFuture {
            panic!("exploded before returning a future")
        }
    }

    #[tokio::test]
    async fn test_catches_synchronous_panics() {
        let fallback = Arc::new(RecordingFallback::default());
        let endpoint = adapter(fallback.clone()).adapt(Arc::new(PanicsOnCall), "test");

        let response = endpoint.dispatch(inbound("/")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let errors = fallback.errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("exploded before returning a future"));
    }

    #[tokio::test]
    async fn test_catches_asynchronous_panics() {
        let fallback = Arc::new(RecordingFallback::default());
        let endpoint = adapter(fallback.clone()).adapt(
            handler(|_, _| async {
                if true {
                    panic!("exploded while running");
                }
                Ok(Reply::empty())
            }),
            "test",
        );

        let response = endpoint.dispatch(inbound("/")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(fallback.errors.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_requests_complete_independently() {
        let finished = Arc::new(Mutex::new(Vec::new()));
        let calls = Arc::new(AtomicUsize::new(0));

        let order = finished.clone();
        let counter = calls.clone();
        let endpoint = adapter(Arc::default()).adapt(
            handler(move |request: Request, context: RequestContext| {
                let order = order.clone();
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    let delay: u64 = request.query("delay").unwrap().parse()?;
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    order
                        .lock()
                        .unwrap()
                        .push((delay, context.elapsed(), context.logger().prefix().to_string()));
                    Ok(Reply::text(delay.to_string()))
                }
            }),
            "test",
        );

        let (slow, fast) = tokio::join!(
            endpoint.dispatch(inbound("/?delay=80")),
            endpoint.dispatch(inbound("/?delay=5")),
        );

        assert_eq!(body_text(slow).await, "80");
        assert_eq!(body_text(fast).await, "5");
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let finished = finished.lock().unwrap();
        assert_eq!(finished[0].0, 5);
        assert_eq!(finished[1].0, 80);
        assert!(finished[1].1 >= Duration::from_millis(80));
        assert!(finished[0].1 < finished[1].1);
        assert_ne!(finished[0].2, finished[1].2);
    }

    #[tokio::test]
    async fn test_logs_start_and_completion_lines() {
        let (logs, _guard) = CapturedLogs::install();
        let endpoint = adapter(Arc::default()).adapt(
            handler(|_, _| async { Ok(Reply::json(json!({"json": "data"}))) }),
            "test",
        );

        endpoint.dispatch(inbound("/pie?slice=1")).await;

        let start = logs.find("GET /pie?slice=1").unwrap();
        assert!(start.contains("INFO"));
        assert!(start.trim_end().ends_with("GET /pie?slice=1"));

        let completion = logs.find("GET /pie?slice=1: 200 (15 B) after ").unwrap();
        assert!(completion.trim_end().ends_with("ms"));
        assert!(completion.contains("request:"));
    }

    #[tokio::test]
    async fn test_completion_line_carries_error_status() {
        let (logs, _guard) = CapturedLogs::install();
        let endpoint = adapter(Arc::default()).adapt(
            handler(|_, _| async { Err(HttpError::bad_request("no pie").into()) }),
            "test",
        );

        let response = endpoint.dispatch(inbound("/fail")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        assert!(logs.find("GET /fail: 400 (11 B) after ").is_some());
        let lines = logs.lines();
        let start = lines.iter().position(|l| l.trim_end().ends_with("GET /fail"));
        let end = lines.iter().position(|l| l.contains("GET /fail: 400"));
        assert!(start.unwrap() < end.unwrap());
    }

    #[tokio::test]
    async fn test_cancelled_dispatch_still_logs_completion() {
        let (logs, _guard) = CapturedLogs::install();
        let endpoint = adapter(Arc::default()).adapt(
            handler(|_, _| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(Reply::empty())
            }),
            "test",
        );

        let outcome =
            tokio::time::timeout(Duration::from_millis(20), endpoint.dispatch(inbound("/slow")))
                .await;
        assert!(outcome.is_err());

        let line = logs.find("GET /slow: aborted after ").unwrap();
        assert!(line.contains("WARN"));
    }
}
