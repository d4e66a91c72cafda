//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Install the Prometheus recorder and expose its rendered text
//! - Instrument HTTP handlers and RPC methods
//! - Count logged errors, late listener failures and unhealthy dependencies
//!
//! # Metrics
//! - `http_requests_total` (counter): requests by handler, method, code
//! - `http_request_duration_seconds` (histogram): latency by handler, method, code
//! - `http_in_flight_requests` (gauge): requests currently being served
//! - `grpc_server_handled_total` (counter): RPCs by method and status code
//! - `grpc_server_handling_seconds` (histogram): RPC latency by method
//! - `log_errors_total` (counter): error and critical log calls
//! - `lifecycle_listener_failures_total` (counter): listener failures after startup
//! - `depstatus_unhealthy_deps_total` (gauge): unhealthy dependencies at last check
//!
//! # Design Decisions
//! - One process-wide recorder; installing twice returns the same handle
//! - Duration buckets are fixed so dashboards stay comparable across services

use std::sync::Mutex;
use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Counter};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

/// Latency buckets, in seconds.
pub const DURATION_BUCKETS: &[f64] = &[
    0.001, 0.002, 0.004, 0.008, 0.016, 0.032, 0.064, 0.128, 0.256, 1.0, 2.0, 5.0,
];

static HANDLE: Mutex<Option<PrometheusHandle>> = Mutex::new(None);

/// Install the global Prometheus recorder, or return the one already installed.
pub fn install() -> Result<PrometheusHandle, BuildError> {
    let mut slot = HANDLE.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    if let Some(handle) = slot.as_ref() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Suffix("_seconds".to_string()), DURATION_BUCKETS)?
        .install_recorder()?;
    describe();

    *slot = Some(handle.clone());
    Ok(handle)
}

fn describe() {
    describe_counter!("http_requests_total", "A counter for requests to the wrapped handler.");
    describe_histogram!(
        "http_request_duration_seconds",
        metrics::Unit::Seconds,
        "A histogram of latencies for requests."
    );
    describe_gauge!(
        "http_in_flight_requests",
        "A gauge of requests currently being served by the wrapped handler."
    );
    describe_counter!("grpc_server_handled_total", "Total number of RPCs completed on the server.");
    describe_histogram!(
        "grpc_server_handling_seconds",
        metrics::Unit::Seconds,
        "Histogram of response latency of RPCs handled by the server."
    );
    describe_counter!("log_errors_total", "Number of error and critical log calls.");
    describe_counter!(
        "lifecycle_listener_failures_total",
        "Listener failures observed after the startup grace window."
    );
    describe_gauge!("depstatus_unhealthy_deps_total", "Number of unhealthy deps");
}

/// Record a completed HTTP request.
pub fn record_http_request(handler: &str, method: &str, status: u16, start: Instant) {
    let labels = [
        ("handler", handler.to_string()),
        ("method", method.to_string()),
        ("code", status.to_string()),
    ];
    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

/// Axum middleware recording request count, latency and in-flight gauge.
///
/// The handler label is the matched route template, so path parameters do not
/// explode label cardinality.
pub async fn track_http(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let handler = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let method = request.method().to_string();

    let in_flight = gauge!("http_in_flight_requests", "handler" => handler.clone());
    in_flight.increment(1.0);
    let response = next.run(request).await;
    in_flight.decrement(1.0);

    record_http_request(&handler, &method, response.status().as_u16(), start);
    response
}

/// Record a handled RPC. `code` is the gRPC status code name, `OK` on success.
pub fn record_rpc(method: &str, code: &str, start: Instant) {
    counter!(
        "grpc_server_handled_total",
        "grpc_method" => method.to_string(),
        "grpc_code" => code.to_string()
    )
    .increment(1);
    histogram!("grpc_server_handling_seconds", "grpc_method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Counter handed to the logger as its error counter.
pub fn log_errors_counter() -> Counter {
    counter!("log_errors_total")
}

pub fn record_listener_failure(kind: &str) {
    counter!("lifecycle_listener_failures_total", "kind" => kind.to_string()).increment(1);
}

pub fn set_unhealthy_deps(count: usize) {
    gauge!("depstatus_unhealthy_deps_total").set(count as f64);
}
