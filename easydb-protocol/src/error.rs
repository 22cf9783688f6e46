//! Protocol error types.

use crate::frame::{TypeTag, ValueKind};
use crate::message::Status;
use thiserror::Error;

/// Errors raised while encoding requests or decoding responses.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("row has {found} values, table has {expected} columns")]
    Arity { expected: usize, found: usize },

    #[error("column {column}: expected {expected} value, got {found}")]
    ValueType {
        column: usize,
        expected: ValueKind,
        found: ValueKind,
    },

    #[error("string value too large: {0} bytes")]
    ValueTooLarge(usize),

    #[error("scan operator not allowed here: {0}")]
    InvalidOperator(i32),

    #[error("column index out of range: {0}")]
    InvalidColumn(usize),

    #[error("truncated response: need {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("invalid length {length} for {tag} value")]
    BadLength { tag: TypeTag, length: i32 },

    #[error("invalid type tag: {0}")]
    InvalidTag(i32),

    #[error("invalid value count: {0}")]
    InvalidCount(i32),

    #[error("unknown status code: {0}")]
    UnknownStatus(i32),

    #[error("unknown command: {0}")]
    UnknownCommand(i32),

    #[error("invalid UTF-8 in string value")]
    InvalidUtf8,

    #[error("unexpected greeting status: {0}")]
    UnexpectedGreeting(Status),
}

impl ProtocolError {
    /// Returns whether the error was raised on a request before anything was sent.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            ProtocolError::Arity { .. }
                | ProtocolError::ValueType { .. }
                | ProtocolError::ValueTooLarge(_)
                | ProtocolError::InvalidOperator(_)
                | ProtocolError::InvalidColumn(_)
        )
    }
}
