//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (coordinator.rs):
//!     Register listeners → start all concurrently → wait grace window
//!     → first failure returned, or Ok
//!
//! Shutdown (shutdown.rs):
//!     Signal received → trigger → every listener drains → join under deadline
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - State is one-way: NotStarted → Started → Stopped
//! - No ordering between listeners, on start or on stop
//! - Shutdown has a timeout: stragglers are aborted after the deadline

pub mod coordinator;
pub mod shutdown;
pub mod signals;

pub use coordinator::{Coordinator, LifecycleError, DEFAULT_SHUTDOWN_TIMEOUT, DEFAULT_STARTUP_GRACE};
pub use shutdown::{Shutdown, ShutdownSignal};
