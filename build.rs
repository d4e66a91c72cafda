//! Generates the gRPC service stubs for `calculator.v1.CalculatorService`.
//!
//! The message types live in `src/rpc/messages.rs` as hand-annotated prost
//! structs, so the service is described through tonic-build's manual builder
//! and the build does not need `protoc`. Keep this in sync with
//! `proto/calculator/v1/calculator.proto`.

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=proto");

    let calculate = tonic_build::manual::Method::builder()
        .name("calculate")
        .route_name("Calculate")
        .input_type("crate::rpc::CalculateRequest")
        .output_type("crate::rpc::CalculateResponse")
        .codec_path("tonic_prost::ProstCodec")
        .build();

    let service = tonic_build::manual::Service::builder()
        .name("CalculatorService")
        .package("calculator.v1")
        .method(calculate)
        .build();

    tonic_build::manual::Builder::new().compile(&[service]);
}
