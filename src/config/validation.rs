//! Configuration validation.
//!
//! # Responsibilities
//! - Resolve listen addresses (`:port` means every interface)
//! - Check that TLS paths come in pairs
//! - Reject listeners sharing one address
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: Config → Result<Settings, Vec<ValidationError>>

use std::net::{Ipv4Addr, SocketAddr, ToSocketAddrs};
use std::time::Duration;

use thiserror::Error;

use super::schema::{Config, Settings, TlsPaths};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid listen address `{value}`: {reason}")]
    InvalidAddress {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("TLS_CERT_PATH and TLS_KEY_PATH must be set together")]
    IncompleteTls,

    #[error("{first} and {second} both listen on {addr}")]
    AddressConflict {
        first: &'static str,
        second: &'static str,
        addr: SocketAddr,
    },
}

/// Resolve `:8080`, `127.0.0.1:8080` or `localhost:8080`.
pub fn parse_listen_address(field: &'static str, value: &str) -> Result<SocketAddr, ValidationError> {
    let invalid = |reason: String| ValidationError::InvalidAddress {
        field,
        value: value.to_string(),
        reason,
    };

    if let Some(port) = value.strip_prefix(':') {
        let port: u16 = port.parse().map_err(|e| invalid(format!("{e}")))?;
        return Ok(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)));
    }
    if let Ok(addr) = value.parse::<SocketAddr>() {
        return Ok(addr);
    }
    value
        .to_socket_addrs()
        .map_err(|e| invalid(e.to_string()))?
        .next()
        .ok_or_else(|| invalid("resolves to no address".to_string()))
}

pub fn validate_config(config: &Config) -> Result<Settings, Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut resolve = |field, value: &str| match parse_listen_address(field, value) {
        Ok(addr) => Some(addr),
        Err(err) => {
            errors.push(err);
            None
        }
    };
    let listen_http = resolve("LISTEN_HTTP", &config.listen_http);
    let listen_grpc = resolve("LISTEN_GRPC", &config.listen_grpc);
    let listen_http_liveness = resolve("LISTEN_HTTP_LIVENESS", &config.listen_http_liveness);

    let named = [
        ("LISTEN_HTTP", listen_http),
        ("LISTEN_GRPC", listen_grpc),
        ("LISTEN_HTTP_LIVENESS", listen_http_liveness),
    ];
    for (i, (first, a)) in named.iter().enumerate() {
        for (second, b) in &named[i + 1..] {
            if let (Some(a), Some(b)) = (a, b) {
                if a == b && a.port() != 0 {
                    errors.push(ValidationError::AddressConflict {
                        first: *first,
                        second: *second,
                        addr: *a,
                    });
                }
            }
        }
    }

    let tls = match (&config.tls_cert_path, &config.tls_key_path) {
        (Some(cert), Some(key)) => Some(TlsPaths {
            cert: cert.clone(),
            key: key.clone(),
        }),
        (None, None) => None,
        _ => {
            errors.push(ValidationError::IncompleteTls);
            None
        }
    };

    match (listen_http, listen_grpc, listen_http_liveness) {
        (Some(listen_http), Some(listen_grpc), Some(listen_http_liveness)) if errors.is_empty() => Ok(Settings {
            service_name: config.service_name.clone(),
            environment: config.environment.clone(),
            listen_http,
            listen_grpc,
            listen_http_liveness,
            log: config.log.clone(),
            startup_grace: Duration::from_millis(config.startup_grace_ms),
            shutdown_timeout: Duration::from_millis(config.shutdown_timeout_ms),
            tls,
        }),
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn config(args: &[&str]) -> Config {
        let mut argv = vec!["calculator-service"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    #[test]
    fn port_only_binds_every_interface() {
        let addr = parse_listen_address("LISTEN_GRPC", ":8083").unwrap();
        assert_eq!(addr, "0.0.0.0:8083".parse().unwrap());
    }

    #[test]
    fn explicit_and_named_hosts_resolve() {
        assert_eq!(
            parse_listen_address("LISTEN_HTTP", "127.0.0.1:9000").unwrap(),
            "127.0.0.1:9000".parse().unwrap()
        );
        assert_eq!(parse_listen_address("LISTEN_HTTP", "localhost:9000").unwrap().port(), 9000);
    }

    #[test]
    fn bad_port_is_reported_with_field() {
        let err = parse_listen_address("LISTEN_HTTP", ":http").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidAddress { field: "LISTEN_HTTP", .. }));
    }

    #[test]
    fn defaults_are_valid() {
        let settings = validate_config(&config(&[])).unwrap();
        assert_eq!(settings.listen_http.port(), 8080);
        assert_eq!(settings.listen_grpc.port(), 8083);
        assert_eq!(settings.listen_http_liveness.port(), 8084);
        assert_eq!(settings.startup_grace, Duration::from_secs(2));
        assert_eq!(settings.shutdown_timeout, Duration::from_secs(2));
        assert!(settings.tls.is_none());
    }

    #[test]
    fn collects_every_error() {
        let errors = validate_config(&config(&[
            "--listen-http",
            ":nope",
            "--listen-grpc",
            ":9000",
            "--listen-http-liveness",
            ":9000",
            "--tls-cert-path",
            "/etc/cert.pem",
        ]))
        .unwrap_err();

        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::IncompleteTls));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::AddressConflict { first: "LISTEN_GRPC", .. })));
    }

    #[test]
    fn ephemeral_ports_never_conflict() {
        let settings = validate_config(&config(&[
            "--listen-http",
            "127.0.0.1:0",
            "--listen-grpc",
            "127.0.0.1:0",
            "--listen-http-liveness",
            "127.0.0.1:0",
        ]));
        assert!(settings.is_ok());
    }
}
