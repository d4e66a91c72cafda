//! Arithmetic.

use thiserror::Error;

use crate::observability::logging::Logger;
use crate::rpc::{Operands, Operator};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    /// Operator unspecified or unknown, or operands missing.
    #[error("some arguments are not supplied")]
    MissingArguments,

    #[error("you can not divide {0:.6} by {1:.6}")]
    DivideByZero(f64, f64),
}

/// The four-operation calculator.
#[derive(Debug, Clone)]
pub struct Calculator {
    logger: Logger,
}

impl Calculator {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger: logger.with("component", "calculator"),
        }
    }

    pub fn calculate(&self, operator: Operator, operands: Option<Operands>) -> Result<f64, CalcError> {
        let Some(Operands { number_1, number_2 }) = operands else {
            return Err(CalcError::MissingArguments);
        };

        let result = match operator {
            Operator::Add => Ok(number_1 + number_2),
            Operator::Subtract => Ok(number_1 - number_2),
            Operator::Multiply => Ok(number_1 * number_2),
            Operator::Divide => divide(number_1, number_2),
            Operator::Unspecified => Err(CalcError::MissingArguments),
        };

        if let Ok(value) = result {
            self.logger
                .with("operator", operator.as_str_name())
                .debug(format!("{number_1} and {number_2} gives {value}"));
        }
        result
    }
}

fn divide(dividend: f64, divisor: f64) -> Result<f64, CalcError> {
    if divisor == 0.0 {
        return Err(CalcError::DivideByZero(dividend, divisor));
    }
    Ok(dividend / divisor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn operands(number_1: f64, number_2: f64) -> Option<Operands> {
        Some(Operands { number_1, number_2 })
    }

    #[test]
    fn calculates() {
        let calculator = Calculator::new(Logger::discard());
        let cases = [
            ("addition", Operator::Add, 2.0, 5.0, 7.0),
            ("subtraction", Operator::Subtract, 10.0, 5.0, 5.0),
            ("division", Operator::Divide, 17.0, 4.0, 4.25),
            ("multiplication", Operator::Multiply, 2.0, 9.0, 18.0),
        ];

        for (name, operator, a, b, expected) in cases {
            let result = calculator.calculate(operator, operands(a, b));
            assert_eq!(result, Ok(expected), "{name}");
        }
    }

    #[test]
    fn unspecified_operator_is_rejected() {
        let calculator = Calculator::new(Logger::discard());
        let err = calculator
            .calculate(Operator::Unspecified, operands(1.0, 2.0))
            .unwrap_err();
        assert_eq!(err, CalcError::MissingArguments);
        assert_eq!(err.to_string(), "some arguments are not supplied");
    }

    #[test]
    fn missing_operands_are_rejected() {
        let calculator = Calculator::new(Logger::discard());
        assert_eq!(
            calculator.calculate(Operator::Add, None),
            Err(CalcError::MissingArguments)
        );
    }

    #[test]
    fn division_by_zero_names_both_operands() {
        let calculator = Calculator::new(Logger::discard());
        let err = calculator.calculate(Operator::Divide, operands(3.0, 0.0)).unwrap_err();
        assert_eq!(err, CalcError::DivideByZero(3.0, 0.0));
        assert_eq!(err.to_string(), "you can not divide 3.000000 by 0.000000");
    }

    #[test]
    fn negative_zero_divisor_is_rejected() {
        let calculator = Calculator::new(Logger::discard());
        assert!(calculator.calculate(Operator::Divide, operands(1.0, -0.0)).is_err());
    }
}
