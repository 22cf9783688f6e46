//! # easydb-protocol
//!
//! Wire protocol implementation for EasyDB.
//!
//! This crate provides:
//! - Type-tagged value frames with 4-byte string padding
//! - Row encoding against a table layout resolved from the schema
//! - Row decoding for GET responses
//! - Request encoding and response decoding for every command
//! - Command, status and scan operator codes
//!
//! All multi-byte integers on the wire are big-endian.

pub mod codec;
pub mod error;
pub mod frame;
pub mod message;

pub use codec::{decode_row, RowLayout};
pub use error::ProtocolError;
pub use frame::{TypeTag, Value, ValueKind, VALUE_HEADER_SIZE};
pub use message::{Command, Operator, Request, Response, Status};
