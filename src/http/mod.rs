//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, limits, timeouts)
//!     → [routing layer picks the Endpoint]
//!     → adapter.rs (per-request logger, error capture)
//!     → request.rs (params, query, buffered body)
//!     → handler
//!     → reply.rs / error.rs / fallback.rs (status + body)
//!     → Send to client
//! ```

pub mod adapter;
pub mod error;
pub mod fallback;
pub mod reply;
pub mod request;
pub mod server;

pub use adapter::{Endpoint, RequestAdapter};
pub use error::{ErrorOptions, HttpError};
pub use fallback::{DefaultFallback, ErrorFallback};
pub use reply::{Reply, ReplyBody};
pub use request::{Request, RequestContext};
pub use server::HttpServer;
