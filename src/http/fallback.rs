//! Last-resort handling for errors outside the taxonomy.

use axum::http::StatusCode;

use crate::http::reply::Reply;
use crate::observability::ComponentLogger;

/// Body sent for every unrecognized error.
pub const INTERNAL_ERROR_BODY: &str = "Internal Server Error";

/// Decides the response for an error the adapter does not recognize.
pub trait ErrorFallback: Send + Sync {
    fn handle(&self, error: anyhow::Error) -> Reply;
}

/// Logs the error and replies 500 with a fixed body.
#[derive(Debug, Clone)]
pub struct DefaultFallback {
    logger: ComponentLogger,
}

impl DefaultFallback {
    pub fn new(logger: ComponentLogger) -> Self {
        Self { logger }
    }
}

impl ErrorFallback for DefaultFallback {
    fn handle(&self, error: anyhow::Error) -> Reply {
        tracing::error!(parent: self.logger.span(), error = %format!("{error:#}"), "Unhandled error");
        Reply::text(INTERNAL_ERROR_BODY).with_status(StatusCode::INTERNAL_SERVER_ERROR)
    }
}
