//! gRPC endpoint dependency.

use std::time::Duration;

use futures_util::future::BoxFuture;
use tonic::transport::Endpoint;

use super::registry::StatusProvider;
use crate::observability::logging::BoxError;

/// Reports healthy when a connection to the endpoint can be established in time.
#[derive(Debug, Clone)]
pub struct GrpcDependency {
    name: String,
    endpoint: Endpoint,
    timeout: Duration,
}

impl GrpcDependency {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

    pub fn new(name: impl Into<String>, endpoint: Endpoint) -> Self {
        Self {
            name: name.into(),
            endpoint,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl StatusProvider for GrpcDependency {
    fn name(&self) -> &str {
        &self.name
    }

    fn status(&self) -> BoxFuture<'_, Result<(), BoxError>> {
        Box::pin(async move {
            match tokio::time::timeout(self.timeout, self.endpoint.connect()).await {
                Ok(Ok(_channel)) => Ok(()),
                Ok(Err(err)) => Err(format!("connection not ready: {err}").into()),
                Err(_) => Err(format!("connection not ready: no connection within {:?}", self.timeout).into()),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_endpoint_is_unhealthy() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let endpoint = Endpoint::from_shared(format!("http://{addr}")).unwrap();
        let dep = GrpcDependency::new("calculator", endpoint).with_timeout(Duration::from_millis(500));
        assert_eq!(dep.name(), "calculator");

        let err = dep.status().await.unwrap_err();
        assert!(err.to_string().starts_with("connection not ready"));
    }
}
