//! Calculator service.
//!
//! A gRPC arithmetic service with structured logging, Prometheus metrics,
//! dependency status and coordinated multi-listener lifecycle.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────────────┐
//!                       │                 CALCULATOR SERVICE                    │
//!                       │                                                       │
//!   gRPC :8083          │  ┌─────────────┐    ┌──────────────┐                 │
//!   ────────────────────┼─▶│ RpcEndpoint │───▶│CalculatorGrpc│──▶ Calculator   │
//!                       │  └─────────────┘    └──────────────┘                 │
//!                       │                                                       │
//!   HTTP :8080          │  ┌─────────────┐    /status  /version  /metrics      │
//!   ────────────────────┼─▶│HttpEndpoint │───▶ StatusRegistry, VersionInfo,    │
//!                       │  └─────────────┘     PrometheusHandle                │
//!                       │                                                       │
//!   HTTP :8084          │  ┌─────────────┐                                     │
//!   ────────────────────┼─▶│HttpEndpoint │───▶ liveness probe                  │
//!                       │  └─────────────┘                                     │
//!                       │                                                       │
//!                       │  ┌────────────────────────────────────────────────┐  │
//!                       │  │ Coordinator: concurrent start, grace window,   │  │
//!                       │  │ interrupt, bounded concurrent stop             │  │
//!                       │  └────────────────────────────────────────────────┘  │
//!                       │  ┌────────────────────────────────────────────────┐  │
//!                       │  │ Logger ◀── tracing bridge      metrics recorder │  │
//!                       │  └────────────────────────────────────────────────┘  │
//!                       └──────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use calculator_service::calculator::{Calculator, CalculatorGrpc};
use calculator_service::config::{self, ConfigError, Settings};
use calculator_service::health::{liveness, StatusRegistry};
use calculator_service::lifecycle::Coordinator;
use calculator_service::net::{self, HttpEndpoint, RpcEndpoint};
use calculator_service::observability::logging::{Entry, LogFormat, Logger};
use calculator_service::observability::{metrics, tracing as log_bridge};
use calculator_service::{http, version};
use tonic::service::Routes;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    version::start_time();

    let settings = match config::load_config() {
        Ok(settings) => settings,
        Err(ConfigError::Args(err)) => err.exit(),
        Err(err) => Logger::new(LogFormat::Json, false).critical(Entry::error(err)),
    };

    let logger = init_logger(&settings);
    log_bridge::init(&logger)?;

    let prometheus = match metrics::install() {
        Ok(handle) => Some(handle),
        Err(err) => {
            logger.error(Entry::error_with_context(err, "installing metrics recorder"));
            None
        }
    };
    let logger = logger.with_error_counter(Arc::new(metrics::log_errors_counter()));

    logger.info(format!("{} v{} starting", version::NAME, version::VERSION));
    logger
        .with("http", settings.listen_http)
        .with("grpc", settings.listen_grpc)
        .with("liveness", settings.listen_http_liveness)
        .info("configuration loaded");

    let registry = StatusRegistry::new();
    let calculator = Calculator::new(logger.with_prefix("calculator"));
    let grpc = CalculatorGrpc::new(calculator, logger.clone());

    let (http_tls, rpc_tls) = match &settings.tls {
        Some(paths) => {
            let http_tls = net::tls::load_http_tls(&paths.cert, &paths.key).await;
            let rpc_tls = net::tls::load_rpc_tls(&paths.cert, &paths.key).await;
            match (http_tls, rpc_tls) {
                (Ok(http_tls), Ok(rpc_tls)) => (Some(http_tls), Some(rpc_tls)),
                (Err(err), _) | (_, Err(err)) => logger.critical(Entry::error_with_context(err, "loading TLS material")),
            }
        }
        None => (None, None),
    };

    let service_http = HttpEndpoint::new(settings.listen_http, http::router(registry, prometheus)).with_tls(http_tls);
    let liveness_http = HttpEndpoint::new(settings.listen_http_liveness, liveness::router());
    let rpc = RpcEndpoint::new(settings.listen_grpc, Routes::new(grpc.into_server())).with_tls(rpc_tls);

    let mut coordinator = Coordinator::new()
        .with_logger(logger.with_prefix("lifecycle"))
        .with_startup_grace(settings.startup_grace)
        .with_shutdown_timeout(settings.shutdown_timeout)
        .with_http(service_http)
        .with_http(liveness_http)
        .with_rpc(rpc);

    if let Err(err) = coordinator.run_until_interrupt().await {
        logger.critical(Entry::error_with_context(err, "failed to start HTTP/gRPC servers"));
    }

    logger.info("shutdown complete");
    Ok(())
}

fn init_logger(settings: &Settings) -> Logger {
    let mut logger = Logger::new(LogFormat::parse(&settings.log.format), !settings.log.plain)
        .with("service", settings.service_name.as_str())
        .with("environment", settings.environment.as_str());
    if let Some(level) = &settings.log.level {
        logger.set_level(level);
    }
    logger
}
