//! Schema error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building or loading a schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid {entity} name '{name}': {reason}")]
    InvalidName {
        entity: &'static str,
        name: String,
        reason: &'static str,
    },

    #[error("column '{column}' in table '{table}' uses the reserved name 'id'")]
    ReservedColumn { table: String, column: String },

    #[error("duplicate table name: {name}")]
    DuplicateTable { name: String },

    #[error("duplicate column name '{column}' in table '{table}'")]
    DuplicateColumn { table: String, column: String },

    #[error("column '{column}' in table '{table}' references its own table")]
    SelfReference { table: String, column: String },

    #[error("column '{column}' in table '{table}' references unknown table '{target}'")]
    UnknownReference {
        table: String,
        column: String,
        target: String,
    },

    #[error("failed to read schema file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse schema file {0}: {1}")]
    Parse(PathBuf, String),
}

/// Coarse classification of schema failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaErrorKind {
    /// Malformed declaration (bad characters, reserved name, unreadable file).
    Schema,
    /// Repeated table or column name.
    DuplicateName,
    /// Invalid or self-referential foreign reference.
    Integrity,
}

impl SchemaError {
    pub fn kind(&self) -> SchemaErrorKind {
        match self {
            SchemaError::InvalidName { .. }
            | SchemaError::ReservedColumn { .. }
            | SchemaError::Io(..)
            | SchemaError::Parse(..) => SchemaErrorKind::Schema,
            SchemaError::DuplicateTable { .. } | SchemaError::DuplicateColumn { .. } => {
                SchemaErrorKind::DuplicateName
            }
            SchemaError::SelfReference { .. } | SchemaError::UnknownReference { .. } => {
                SchemaErrorKind::Integrity
            }
        }
    }
}
