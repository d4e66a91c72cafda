//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! command line flags + environment variables
//!     → schema.rs (clap: Config)
//!     → validation.rs (addresses, TLS pairs, conflicts)
//!     → Settings (validated, immutable)
//!     → handed to main for wiring
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - Every option has a default except TLS
//! - Validation separates syntactic (clap) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_config_from, ConfigError};
pub use schema::{Config, LogConfig, Settings, TlsPaths};
pub use validation::ValidationError;
