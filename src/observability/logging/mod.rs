//! Structured logging.
//!
//! # Data Flow
//! ```text
//! Call site (logger.info(..), logger.error(Entry::error(e)))
//!     → logger.rs (dispatch entry, count errors, filter by threshold)
//!     → record.rs (ordered key/value pairs + source location)
//!     → format.rs (JSON line or `$key` template)
//!     → shared writer (stdout by default)
//! ```
//!
//! # Design Decisions
//! - Severities are bits; thresholds are masks (severity.rs)
//! - Errors are wrapped once with the stack of their first wrap (stacktrace.rs)
//! - `tracing` events from libraries reach the same writer through
//!   [`crate::observability::tracing`]

pub mod format;
pub mod logger;
pub mod record;
pub mod severity;
pub mod stacktrace;

pub use format::{Format, JsonFormat, TemplateFormat, QUICK_TEMPLATE};
pub use logger::{Entry, Incrementable, LogFormat, Logger, LoggerBuilder};
pub use record::{Record, SourceLocation, Value};
pub use severity::{allowed, Severity, SeverityMask, UnrecognizedLevel};
pub use stacktrace::{BoxError, StackFrame, Stacktrace, TracedError};
