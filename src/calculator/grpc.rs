//! gRPC transport for the calculator.

use std::sync::Arc;
use std::time::Instant;

use tonic::{Code, Request, Response, Status};

use super::service::{CalcError, Calculator};
use crate::observability::logging::{Logger, Severity, Value};
use crate::observability::metrics;
use crate::rpc::{CalculateRequest, CalculateResponse, CalculatorService, CalculatorServiceServer, Operator};

impl From<CalcError> for Status {
    fn from(err: CalcError) -> Self {
        Status::invalid_argument(err.to_string())
    }
}

/// `calculator.v1.CalculatorService` backed by a [`Calculator`].
#[derive(Debug, Clone)]
pub struct CalculatorGrpc {
    calculator: Arc<Calculator>,
    logger: Logger,
}

impl CalculatorGrpc {
    pub fn new(calculator: Calculator, logger: Logger) -> Self {
        Self {
            calculator: Arc::new(calculator),
            logger,
        }
    }

    pub fn into_server(self) -> CalculatorServiceServer<Self> {
        CalculatorServiceServer::new(self)
    }

    fn finished(&self, method: &str, code: Code, start: Instant) {
        let code_name = format!("{code:?}");
        metrics::record_rpc(method, &code_name, start);

        // Client mistakes are not server failures.
        let severity = match code {
            Code::Ok | Code::InvalidArgument | Code::NotFound | Code::AlreadyExists | Code::Cancelled => {
                Severity::Debug
            }
            Code::Unknown | Code::Internal | Code::DataLoss | Code::Unimplemented => Severity::Warn,
            _ => Severity::Info,
        };
        self.logger.log(
            severity,
            [
                ("message", Value::from("finished unary call")),
                ("grpc.method", Value::from(method)),
                ("grpc.code", Value::from(code_name)),
                ("grpc.time_ms", Value::from(start.elapsed().as_secs_f64() * 1000.0)),
            ],
        );
    }
}

#[tonic::async_trait]
impl CalculatorService for CalculatorGrpc {
    async fn calculate(&self, request: Request<CalculateRequest>) -> Result<Response<CalculateResponse>, Status> {
        let start = Instant::now();
        let request = request.into_inner();
        let operator = Operator::try_from(request.operator).unwrap_or(Operator::Unspecified);

        let result = self
            .calculator
            .calculate(operator, request.operands)
            .map(|result| Response::new(CalculateResponse { result }))
            .map_err(Status::from);

        let code = result.as_ref().map_or_else(Status::code, |_| Code::Ok);
        self.finished("Calculate", code, start);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::Operands;

    fn handler() -> CalculatorGrpc {
        CalculatorGrpc::new(Calculator::new(Logger::discard()), Logger::discard())
    }

    #[tokio::test]
    async fn returns_result() {
        let response = handler()
            .calculate(Request::new(CalculateRequest::new(Operator::Multiply, 2.0, 9.0)))
            .await
            .unwrap();
        assert_eq!(response.into_inner().result, 18.0);
    }

    #[tokio::test]
    async fn unknown_operator_is_invalid_argument() {
        let status = handler()
            .calculate(Request::new(CalculateRequest {
                operator: 99,
                operands: Some(Operands {
                    number_1: 1.0,
                    number_2: 1.0,
                }),
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);
        assert_eq!(status.message(), "some arguments are not supplied");
    }

    #[tokio::test]
    async fn divide_by_zero_is_invalid_argument() {
        let status = handler()
            .calculate(Request::new(CalculateRequest::new(Operator::Divide, 5.0, 0.0)))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);
        assert!(status.message().contains("5.000000"));
    }
}
