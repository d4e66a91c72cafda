//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Application code
//!     → logging (structured records, stacktrace-carrying errors)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Library code (tonic, hyper, tower-http)
//!     → tracing events
//!     → tracing.rs (LoggerLayer)
//!     → logging
//!
//! Consumers:
//!     → stdout (one record per line)
//!     → /metrics (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) by default, templates for humans
//! - The logger counts its own error calls into `log_errors_total`
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
pub mod tracing;
