//! Client-facing error taxonomy.
//!
//! A handler that fails with an [`HttpError`] gets its status and message
//! sent straight back to the caller. Any other error is treated as
//! unrecognized and handed to the error fallback instead.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Options shared by every taxonomy constructor.
#[derive(Debug, Clone, Default)]
pub struct ErrorOptions {
    /// Short machine-readable token, shown to the client as `<code>: `.
    pub code: Option<String>,
    /// Message shown to the client instead of the variant default.
    pub message: Option<String>,
}

impl ErrorOptions {
    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// An error carrying an HTTP status and a client-safe response body.
///
/// The internal message is only ever used for logs.
#[derive(Debug, Clone, Error)]
#[error("{status}: {internal}")]
pub struct HttpError {
    status: StatusCode,
    code: Option<String>,
    response: String,
    internal: String,
}

impl HttpError {
    /// Build an error with an arbitrary status.
    ///
    /// The client message defaults to "Unexpected Error".
    pub fn new(status: StatusCode, internal: impl Into<String>, options: ErrorOptions) -> Self {
        Self::with_default(status, "Unexpected Error", internal.into(), options)
    }

    fn with_default(
        status: StatusCode,
        default_message: &str,
        internal: String,
        options: ErrorOptions,
    ) -> Self {
        let message = options.message.unwrap_or_else(|| default_message.to_string());
        let response = match &options.code {
            Some(code) => format!("{code}: {message}"),
            None => message,
        };
        Self {
            status,
            code: options.code,
            response,
            internal,
        }
    }

    /// 400 with the body "Bad Request".
    pub fn bad_request(internal: impl Into<String>) -> Self {
        Self::bad_request_with(internal, ErrorOptions::default())
    }

    pub fn bad_request_with(internal: impl Into<String>, options: ErrorOptions) -> Self {
        Self::with_default(StatusCode::BAD_REQUEST, "Bad Request", internal.into(), options)
    }

    /// 404 with the body "Not Found".
    pub fn not_found(internal: impl Into<String>) -> Self {
        Self::not_found_with(internal, ErrorOptions::default())
    }

    pub fn not_found_with(internal: impl Into<String>, options: ErrorOptions) -> Self {
        Self::with_default(StatusCode::NOT_FOUND, "Not Found", internal.into(), options)
    }

    /// 500 with the body "Internal Server Error".
    pub fn internal(internal: impl Into<String>) -> Self {
        Self::internal_with(internal, ErrorOptions::default())
    }

    pub fn internal_with(internal: impl Into<String>, options: ErrorOptions) -> Self {
        Self::with_default(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal Server Error",
            internal.into(),
            options,
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// The body sent to the client.
    pub fn response(&self) -> &str {
        &self.response
    }

    /// The diagnostic message, never sent to the client.
    pub fn internal_message(&self) -> &str {
        &self.internal
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, self.response).into_response()
    }
}
