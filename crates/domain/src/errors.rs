use crate::record_type::RecordType;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DnsError {
    #[error("Buffer truncated: {0}")]
    Truncated(String),

    #[error("Malformed name: {0}")]
    MalformedName(String),

    #[error("Value {value} does not fit in {field} (max {max})")]
    RangeOverflow {
        field: &'static str,
        value: u64,
        max: u64,
    },

    #[error("Record type is {actual}, not {expected}")]
    TypeMismatch {
        expected: RecordType,
        actual: RecordType,
    },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Timeout waiting for {server}")]
    Timeout { server: String },

    #[error("Resolution exhausted: no nameserver produced an answer")]
    ResolutionExhausted,

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for DnsError {
    fn from(e: std::io::Error) -> Self {
        DnsError::Io(e.to_string())
    }
}
