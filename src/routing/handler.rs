//! The handler convention every route module follows.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::http::reply::Reply;
use crate::http::request::{Request, RequestContext};

pub type HandlerFuture = BoxFuture<'static, anyhow::Result<Reply>>;

/// One HTTP verb of one route: `(request, context) -> reply`.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, request: Request, context: RequestContext) -> HandlerFuture;
}

impl<F, Fut> Handler for F
where
    F: Fn(Request, RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Reply>> + Send + 'static,
{
    fn call(&self, request: Request, context: RequestContext) -> HandlerFuture {
        Box::pin(self(request, context))
    }
}

pub type BoxedHandler = Arc<dyn Handler>;

/// Box a closure or async fn as a [`BoxedHandler`].
pub fn handler<F, Fut>(handler: F) -> BoxedHandler
where
    F: Fn(Request, RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Reply>> + Send + 'static,
{
    Arc::new(handler)
}
