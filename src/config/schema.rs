//! Configuration schema definitions.
//!
//! Every option is a command line flag with an environment variable fallback.
//! Addresses stay textual here; validation.rs turns them into socket addresses.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser};

/// Raw configuration as given on the command line and in the environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "calculator-service", version, about = "gRPC calculator service")]
pub struct Config {
    /// Service name attached to log records.
    #[arg(long, env = "SERVICE_NAME", default_value = "calculator-service")]
    pub service_name: String,

    /// Deployment environment (development, staging, production).
    #[arg(long, env = "ENVIRONMENT", default_value = "development")]
    pub environment: String,

    /// Service HTTP listener: /status, /version, /metrics.
    #[arg(long, env = "LISTEN_HTTP", default_value = ":8080")]
    pub listen_http: String,

    /// gRPC listener.
    #[arg(long, env = "LISTEN_GRPC", default_value = ":8083")]
    pub listen_grpc: String,

    /// Liveness probe listener.
    #[arg(long, env = "LISTEN_HTTP_LIVENESS", default_value = ":8084")]
    pub listen_http_liveness: String,

    #[command(flatten)]
    pub log: LogConfig,

    /// How long startup waits for a listener to fail, in milliseconds.
    #[arg(long, env = "STARTUP_GRACE_MS", default_value_t = 2000)]
    pub startup_grace_ms: u64,

    /// How long shutdown waits for listeners to drain, in milliseconds.
    #[arg(long, env = "SHUTDOWN_TIMEOUT_MS", default_value_t = 2000)]
    pub shutdown_timeout_ms: u64,

    /// PEM certificate for the gRPC and service HTTP listeners.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<PathBuf>,

    /// PEM private key matching `tls_cert_path`.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<PathBuf>,
}

/// Logger settings.
#[derive(Debug, Clone, Default, Args)]
pub struct LogConfig {
    /// Minimum severity: debug, info, notice, warn, error, critical.
    #[arg(long = "loglevel", env = "LOGLEVEL")]
    pub level: Option<String>,

    /// `json` (default), `quick`, or a `$key` template.
    #[arg(long = "logfmt", env = "LOGFMT", default_value = "")]
    pub format: String,

    /// Disable colours in template output. Any value except an empty one or a
    /// falsey word (`0`, `false`, `no`, `off`) turns colours off.
    #[arg(long = "logplain", env = "LOGPLAIN", value_parser = clap::builder::FalseyValueParser::new())]
    pub plain: bool,
}

/// TLS material for the listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub service_name: String,
    pub environment: String,
    pub listen_http: SocketAddr,
    pub listen_grpc: SocketAddr,
    pub listen_http_liveness: SocketAddr,
    pub log: LogConfig,
    pub startup_grace: Duration,
    pub shutdown_timeout: Duration,
    pub tls: Option<TlsPaths>,
}
