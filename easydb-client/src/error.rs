//! Client error types.

use easydb_protocol::{Command, ProtocolError, Status};
use easydb_schema::{SchemaError, SchemaErrorKind};
use thiserror::Error;

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("unknown table: {0}")]
    UnknownTable(String),

    #[error("unknown column '{column}' in table '{table}'")]
    UnknownColumn { table: String, column: String },

    #[error("invalid scan predicate: {0}")]
    InvalidPredicate(&'static str),

    #[error("invalid foreign reference")]
    InvalidReference,

    #[error("row not found")]
    NotFound,

    #[error("transaction aborted: row version changed")]
    TransactionAbort,

    #[error("server busy")]
    ServerBusy,

    #[error("request rejected by server: {0}")]
    Rejected(Status),

    #[error("unexpected response to {0}")]
    UnexpectedResponse(Command),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connect timeout")]
    Timeout,

    #[error("not connected")]
    NotConnected,

    #[error("connection closed")]
    ConnectionClosed,
}

/// What went wrong, independent of where it was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed table or column declaration.
    Schema,
    /// Repeated table or column name.
    DuplicateName,
    /// Invalid or self-referential foreign key declaration.
    Integrity,
    /// Row length does not match the table.
    Arity,
    /// Row value does not match its column type.
    ValueType,
    /// Request rejected locally: unknown table or column, bad scan predicate.
    InvalidRequest,
    /// Malformed or unexpected server response.
    Protocol,
    /// Server reported BAD_FOREIGN.
    InvalidReference,
    /// Server reported NOT_FOUND.
    NotFound,
    /// Server reported TXN_ABORT.
    TransactionAbort,
    /// Server refused the request with another status.
    Rejected,
    /// Socket failure or closed connection.
    Transport,
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Schema(e) => match e.kind() {
                SchemaErrorKind::Schema => ErrorKind::Schema,
                SchemaErrorKind::DuplicateName => ErrorKind::DuplicateName,
                SchemaErrorKind::Integrity => ErrorKind::Integrity,
            },
            ClientError::Protocol(ProtocolError::Arity { .. }) => ErrorKind::Arity,
            ClientError::Protocol(ProtocolError::ValueType { .. }) => ErrorKind::ValueType,
            ClientError::Protocol(e) if e.is_request_error() => ErrorKind::InvalidRequest,
            ClientError::Protocol(_) | ClientError::UnexpectedResponse(_) => ErrorKind::Protocol,
            ClientError::UnknownTable(_)
            | ClientError::UnknownColumn { .. }
            | ClientError::InvalidPredicate(_) => ErrorKind::InvalidRequest,
            ClientError::InvalidReference => ErrorKind::InvalidReference,
            ClientError::NotFound => ErrorKind::NotFound,
            ClientError::TransactionAbort => ErrorKind::TransactionAbort,
            ClientError::ServerBusy | ClientError::Rejected(_) => ErrorKind::Rejected,
            ClientError::Io(_)
            | ClientError::Timeout
            | ClientError::NotConnected
            | ClientError::ConnectionClosed => ErrorKind::Transport,
        }
    }

    /// Maps a non-OK status to its typed error.
    pub fn from_status(status: Status) -> Self {
        match status {
            Status::NotFound => ClientError::NotFound,
            Status::BadForeign => ClientError::InvalidReference,
            Status::TxnAbort => ClientError::TransactionAbort,
            Status::ServerBusy => ClientError::ServerBusy,
            other => ClientError::Rejected(other),
        }
    }
}
