//! Health reporting subsystem.
//!
//! # Data Flow
//! ```text
//! Dependency status (registry.rs):
//!     GET /status
//!     → poll every registered StatusProvider
//!     → {"deps": [...], "all_healthy": bool}
//!     → depstatus_unhealthy_deps_total gauge
//!
//! Providers (grpc.rs):
//!     gRPC endpoint → connect with timeout → healthy / error text
//!
//! Liveness (liveness.rs):
//!     GET / → 200 "liveliness probe ok"
//! ```
//!
//! # Design Decisions
//! - The registry is an explicit value shared by `Arc`, not a global
//! - Dependencies are checked on each request, never cached
//! - Liveness says nothing about dependencies; it only proves the process serves

pub mod grpc;
pub mod liveness;
pub mod registry;

pub use grpc::GrpcDependency;
pub use registry::{DependencyStatus, StatusProvider, StatusRegistry, StatusReport};
