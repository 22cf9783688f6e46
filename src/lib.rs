//! # easydb
//!
//! Client library for the EasyDB row-oriented database.
//!
//! Re-exports the schema registry, wire protocol and async client:
//!
//! ```no_run
//! use easydb::{Client, ColumnType, ConnectionConfig, Schema, Value};
//!
//! # async fn run() -> Result<(), easydb::ClientError> {
//! let schema = Schema::builder()
//!     .table("Users", [("name", ColumnType::String), ("age", ColumnType::Integer)])
//!     .build()?;
//!
//! let client = Client::connect(schema, &ConnectionConfig::new("127.0.0.1", 8080)).await?;
//! let (id, version) = client
//!     .insert("Users", &[Value::from("Alice"), Value::Integer(30)])
//!     .await?;
//! # let _ = (id, version);
//! client.close().await?;
//! # Ok(())
//! # }
//! ```

pub use easydb_client::{Client, ClientError, Connection, ConnectionConfig, ErrorKind};
pub use easydb_protocol::{Operator, ProtocolError, Status, Value, ValueKind};
pub use easydb_schema::{ColumnType, Schema, SchemaConfig, SchemaError};

pub mod schema {
    pub use easydb_schema::*;
}

pub mod protocol {
    pub use easydb_protocol::*;
}
