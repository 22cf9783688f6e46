//! # easydb-schema
//!
//! Schema registry for EasyDB.
//!
//! This crate provides:
//! - Table and column declarations with typed columns
//! - One-shot validation of names, types and foreign references
//! - Table numbering and lookups used by the row codec
//! - Loading schema declarations from YAML or JSON files

pub mod config;
pub mod error;
pub mod schema;

pub use config::{ColumnConfig, SchemaConfig, TableConfig};
pub use error::{SchemaError, SchemaErrorKind};
pub use schema::{Column, ColumnType, ForeignColumn, Schema, SchemaBuilder, Table, RESERVED_COLUMN};
