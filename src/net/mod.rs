//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Lifecycle coordinator
//!     → listener.rs (Serve: bind, serve, drain on shutdown)
//!         → HttpEndpoint (axum, optional rustls)
//!         → RpcEndpoint (tonic, optional TLS)
//!     → tls.rs (certificate loading for either transport)
//! ```
//!
//! # Design Decisions
//! - One trait for every listener so the coordinator never matches on transport
//! - TLS is optional and handled transparently

pub mod listener;
pub mod tls;

pub use listener::{HttpEndpoint, ListenerError, ListenerKind, RpcEndpoint, Serve, ServeFuture};
