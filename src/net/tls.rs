//! TLS configuration and certificate loading.

use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;
use tonic::transport::{Identity, ServerTlsConfig};

fn ensure_exists(path: &Path, what: &str) -> Result<(), std::io::Error> {
    if path.exists() {
        return Ok(());
    }
    Err(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("{what} file not found: {}", path.display()),
    ))
}

/// Load the rustls configuration used by HTTP listeners.
pub async fn load_http_tls(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, std::io::Error> {
    ensure_exists(cert_path, "Certificate")?;
    ensure_exists(key_path, "Private key")?;
    RustlsConfig::from_pem_file(cert_path, key_path).await
}

/// Load the tonic server TLS configuration used by RPC listeners.
pub async fn load_rpc_tls(cert_path: &Path, key_path: &Path) -> Result<ServerTlsConfig, std::io::Error> {
    ensure_exists(cert_path, "Certificate")?;
    ensure_exists(key_path, "Private key")?;
    let cert = tokio::fs::read(cert_path).await?;
    let key = tokio::fs::read(key_path).await?;
    Ok(ServerTlsConfig::new().identity(Identity::from_pem(cert, key)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_files_are_reported() {
        let err = load_rpc_tls(Path::new("/nonexistent/cert.pem"), Path::new("/nonexistent/key.pem"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
        assert!(err.to_string().contains("Certificate"));

        let err = load_http_tls(Path::new("/nonexistent/cert.pem"), Path::new("/nonexistent/key.pem"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
