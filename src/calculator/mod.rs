//! Calculator service.
//!
//! # Data Flow
//! ```text
//! CalculatorService/Calculate
//!     → grpc.rs (decode operator, metrics, request log)
//!     → service.rs (arithmetic, argument checks)
//!     → CalculateResponse | InvalidArgument
//! ```

pub mod grpc;
pub mod service;

pub use grpc::CalculatorGrpc;
pub use service::{CalcError, Calculator};
