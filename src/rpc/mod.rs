//! gRPC contract of the calculator.
//!
//! # Data Flow
//! ```text
//! messages.rs (prost structs, hand-annotated)
//!     → build.rs (tonic-build manual service definition)
//!     → OUT_DIR/calculator.v1.CalculatorService.rs (client + server stubs)
//!     → client.rs (typed client used by the CLI and other services)
//! ```

pub mod client;
pub mod messages;

pub use client::CalculatorClient;
pub use messages::{CalculateRequest, CalculateResponse, Operands, Operator};

/// Generated stubs for `calculator.v1.CalculatorService`.
#[allow(clippy::all, missing_docs)]
pub mod calculator_v1 {
    include!(concat!(env!("OUT_DIR"), "/calculator.v1.CalculatorService.rs"));
}

pub use calculator_v1::calculator_service_client::CalculatorServiceClient;
pub use calculator_v1::calculator_service_server::{CalculatorService, CalculatorServiceServer};
