//! Wire messages of `calculator.v1`.
//!
//! Field tags and names match `proto/calculator/v1/calculator.proto`.

/// Arithmetic operation requested by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum Operator {
    Unspecified = 0,
    Add = 1,
    Subtract = 2,
    Multiply = 3,
    Divide = 4,
}

impl Operator {
    /// Name used in the proto definition.
    pub fn as_str_name(self) -> &'static str {
        match self {
            Operator::Unspecified => "OPERATOR_UNSPECIFIED",
            Operator::Add => "OPERATOR_ADD",
            Operator::Subtract => "OPERATOR_SUBTRACT",
            Operator::Multiply => "OPERATOR_MULTIPLY",
            Operator::Divide => "OPERATOR_DIVIDE",
        }
    }
}

#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct Operands {
    #[prost(double, tag = "1")]
    pub number_1: f64,
    #[prost(double, tag = "2")]
    pub number_2: f64,
}

#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct CalculateRequest {
    #[prost(enumeration = "Operator", tag = "1")]
    pub operator: i32,
    #[prost(message, optional, tag = "2")]
    pub operands: Option<Operands>,
}

impl CalculateRequest {
    pub fn new(operator: Operator, number_1: f64, number_2: f64) -> Self {
        Self {
            operator: operator.into(),
            operands: Some(Operands { number_1, number_2 }),
        }
    }
}

#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct CalculateResponse {
    #[prost(double, tag = "1")]
    pub result: f64,
}

#[cfg(test)]
mod tests {
    use prost::Message;

    use super::*;

    #[test]
    fn request_matches_proto_encoding() {
        let request = CalculateRequest::new(Operator::Divide, 17.0, 4.0);
        let bytes = request.encode_to_vec();
        // field 1 varint 4, field 2 length-delimited 18 bytes
        assert_eq!(&bytes[..4], &[0x08, 0x04, 0x12, 0x12]);
        assert_eq!(CalculateRequest::decode(bytes.as_slice()).unwrap(), request);
    }

    #[test]
    fn unknown_operator_reads_as_unspecified() {
        let request = CalculateRequest {
            operator: 42,
            operands: None,
        };
        assert_eq!(request.operator(), Operator::Unspecified);
        assert!(Operator::try_from(42).is_err());
        assert_eq!(Operator::try_from(3), Ok(Operator::Multiply));
    }
}
