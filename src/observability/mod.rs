//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     LoggingConfig → logging::init (EnvFilter + fmt layer)
//!     Palette → component loggers (routing, errors)
//!             → logger factories (request:<id>, query:<id>)
//!
//! Per request:
//!     adapter mints request:<id> → start line → handler events → completion line
//! ```
//!
//! # Design Decisions
//! - Structured logging through tracing
//! - One span per component logger, prefix recorded as a field
//! - Colour allocation is injectable so tests stay deterministic

pub mod logging;

pub use logging::{ComponentLogger, LoggerFactory, Palette};
