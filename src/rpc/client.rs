//! Typed calculator client.

use tonic::transport::{Channel, Endpoint};
use tonic::Status;

use super::messages::{CalculateRequest, CalculateResponse, Operator};
use super::CalculatorServiceClient;
use crate::health::{GrpcDependency, StatusRegistry};
use crate::observability::logging::Logger;

/// Name under which the client reports itself in the status registry.
pub const DEPENDENCY_NAME: &str = "calculator";

/// Client for `calculator.v1.CalculatorService`.
///
/// The connection is established lazily on the first call.
#[derive(Debug, Clone)]
pub struct CalculatorClient {
    endpoint: Endpoint,
    inner: CalculatorServiceClient<Channel>,
    logger: Logger,
}

impl CalculatorClient {
    pub fn new(endpoint: Endpoint) -> Self {
        let channel = endpoint.connect_lazy();
        Self {
            endpoint,
            inner: CalculatorServiceClient::new(channel),
            logger: Logger::discard(),
        }
    }

    /// Client for a URI such as `http://127.0.0.1:8083`.
    pub fn from_uri(uri: impl Into<String>) -> Result<Self, tonic::transport::Error> {
        Ok(Self::new(Endpoint::from_shared(uri.into())?))
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger.with("client", DEPENDENCY_NAME);
        self
    }

    /// Report this client's connectivity on `/status`.
    pub fn register_status(&self, registry: &StatusRegistry) {
        registry.register(GrpcDependency::new(DEPENDENCY_NAME, self.endpoint.clone()));
    }

    pub async fn calculate(&self, request: CalculateRequest) -> Result<CalculateResponse, Status> {
        let mut inner = self.inner.clone();
        match inner.calculate(request).await {
            Ok(response) => Ok(response.into_inner()),
            Err(status) => {
                self.logger.debug(format!("calculate failed: {}", status.message()));
                Err(status)
            }
        }
    }

    pub async fn add(&self, a: f64, b: f64) -> Result<f64, Status> {
        self.apply(Operator::Add, a, b).await
    }

    pub async fn subtract(&self, a: f64, b: f64) -> Result<f64, Status> {
        self.apply(Operator::Subtract, a, b).await
    }

    pub async fn multiply(&self, a: f64, b: f64) -> Result<f64, Status> {
        self.apply(Operator::Multiply, a, b).await
    }

    pub async fn divide(&self, a: f64, b: f64) -> Result<f64, Status> {
        self.apply(Operator::Divide, a, b).await
    }

    async fn apply(&self, operator: Operator, a: f64, b: f64) -> Result<f64, Status> {
        let response = self.calculate(CalculateRequest::new(operator, a, b)).await?;
        Ok(response.result)
    }
}
