//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Hand out component loggers (`routing`, `request:Ab3xYz`, ...)
//! - Allocate a display colour per component
//!
//! # Design Decisions
//! - Uses tracing spans as the logger handle; the prefix is a span field
//! - Colours come from an explicit `Palette`, never from global state
//! - Per-request and per-query loggers get a short random id

use std::sync::atomic::{AtomicUsize, Ordering};

use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::Span;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// ANSI 256-colour codes assigned to components round-robin.
pub const COMPONENT_COLOURS: [u8; 6] = [28, 31, 172, 174, 208, 210];

/// Length of the random id given to child loggers.
pub const LOGGING_ID_LENGTH: usize = 6;

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init(config: &LoggingConfig) {
    let fallback = format!("waypoint={level},tower_http={level}", level = config.level);
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with(tracing_subscriber::fmt::layer().with_ansi(config.colour))
        .init();
}

/// A colour handed out by a [`Palette`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Colour(Option<u8>);

impl Colour {
    /// A colour that leaves text untouched.
    pub const PLAIN: Colour = Colour(None);

    pub fn paint(&self, text: &str) -> String {
        match self.0 {
            Some(code) => format!("\x1b[38;5;{code}m{text}\x1b[0m"),
            None => text.to_string(),
        }
    }
}

/// Round-robin colour allocator for component loggers.
#[derive(Debug)]
pub struct Palette {
    colours: Vec<u8>,
    next: AtomicUsize,
}

impl Palette {
    /// A palette cycling through [`COMPONENT_COLOURS`].
    pub fn new() -> Self {
        Self::with_colours(COMPONENT_COLOURS.to_vec())
    }

    /// A palette that never colours anything.
    pub fn plain() -> Self {
        Self::with_colours(Vec::new())
    }

    pub fn with_colours(colours: Vec<u8>) -> Self {
        Self {
            colours,
            next: AtomicUsize::new(0),
        }
    }

    /// Build a palette according to the logging configuration.
    pub fn from_config(config: &LoggingConfig) -> Self {
        if config.colour {
            Self::new()
        } else {
            Self::plain()
        }
    }

    /// Take the next colour in sequence.
    pub fn allocate(&self) -> Colour {
        if self.colours.is_empty() {
            return Colour::PLAIN;
        }
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.colours.len();
        Colour(Some(self.colours[index]))
    }

    /// A single named component logger.
    pub fn component(&self, name: &str) -> ComponentLogger {
        ComponentLogger::new(self.allocate().paint(name), None)
    }

    /// A factory of child loggers which all share one colour.
    pub fn factory(&self, name: &str) -> LoggerFactory {
        LoggerFactory {
            name: name.to_string(),
            colour: self.allocate(),
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new()
    }
}

/// A logger handle for one component or one unit of work.
#[derive(Debug, Clone)]
pub struct ComponentLogger {
    prefix: String,
    id: Option<String>,
    span: Span,
}

impl ComponentLogger {
    fn new(prefix: String, id: Option<String>) -> Self {
        let span = tracing::info_span!("component", prefix = %prefix);
        Self { prefix, id, span }
    }

    /// The (possibly coloured) prefix shown on every line.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The random id of a child logger.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Span to use as `parent:` for events emitted through this logger.
    pub fn span(&self) -> &Span {
        &self.span
    }
}

/// Mints child loggers named `<name>:<random id>`.
#[derive(Debug, Clone)]
pub struct LoggerFactory {
    name: String,
    colour: Colour,
}

impl LoggerFactory {
    pub fn new(name: impl Into<String>, colour: Colour) -> Self {
        Self {
            name: name.into(),
            colour,
        }
    }

    pub fn child(&self) -> ComponentLogger {
        let id = random_id(LOGGING_ID_LENGTH);
        let prefix = self.colour.paint(&format!("{}:{}", self.name, id));
        ComponentLogger::new(prefix, Some(id))
    }
}

fn random_id(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
