//! Calculator service library.

pub mod calculator;
pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod rpc;
pub mod version;

pub use config::Settings;
pub use lifecycle::{Coordinator, Shutdown};
pub use observability::logging::Logger;
