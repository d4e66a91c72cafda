//! HTTP surface.
//!
//! # Data Flow
//! ```text
//! Service listener (LISTEN_HTTP)
//!     → server.rs (TraceLayer → request metrics → route)
//!         /status  → health::registry (dependency checks)
//!         /version → version payload
//!         /metrics → Prometheus exposition
//!
//! Liveness listener (LISTEN_HTTP_LIVENESS)
//!     → health::liveness
//! ```

pub mod server;

pub use server::router;
