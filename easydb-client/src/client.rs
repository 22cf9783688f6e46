//! High-level client API.
//!
//! Every call resolves the table through the schema and validates the row
//! before the connection is touched, so a rejected call never puts bytes on
//! the wire.

use crate::connection::{Connection, ConnectionConfig};
use crate::error::{ClientError, ErrorKind};
use easydb_protocol::codec::is_id_column;
use easydb_protocol::{Command, Operator, Request, Response, RowLayout, Value};
use easydb_schema::Schema;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// High-level client for EasyDB.
pub struct Client<S = TcpStream> {
    schema: Arc<Schema>,
    conn: Mutex<Option<Connection<S>>>,
}

impl Client<TcpStream> {
    /// Connects to the server described by `config`.
    pub async fn connect(
        schema: impl Into<Arc<Schema>>,
        config: &ConnectionConfig,
    ) -> Result<Self, ClientError> {
        let conn = Connection::connect(config).await?;
        Ok(Self::with_connection(schema, conn))
    }
}

impl<S> Client<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a client on top of an established connection.
    pub fn with_connection(schema: impl Into<Arc<Schema>>, conn: Connection<S>) -> Self {
        Self {
            schema: schema.into(),
            conn: Mutex::new(Some(conn)),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns whether the client still holds a connection.
    pub async fn is_connected(&self) -> bool {
        self.conn.lock().await.is_some()
    }

    /// Sends EXIT and drops the connection. Closing twice is a no-op.
    pub async fn close(&self) -> Result<(), ClientError> {
        let conn = self.conn.lock().await.take();
        match conn {
            Some(conn) => conn.close().await,
            None => Ok(()),
        }
    }

    // =========================================================================
    // Helper methods
    // =========================================================================

    fn layout(&self, table: &str) -> Result<RowLayout, ClientError> {
        RowLayout::for_table(&self.schema, table)
            .ok_or_else(|| ClientError::UnknownTable(table.to_string()))
    }

    async fn request(&self, request: Request) -> Result<Response, ClientError> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or(ClientError::NotConnected)?;

        match conn.round_trip(&request).await {
            Ok(Response::Rejected(status)) => {
                tracing::debug!("{} rejected with {}", request.command(), status);
                Err(ClientError::from_status(status))
            }
            Ok(response) => Ok(response),
            Err(e) => {
                if e.kind() == ErrorKind::Transport {
                    tracing::debug!("Dropping connection after transport error: {}", e);
                    *guard = None;
                }
                Err(e)
            }
        }
    }

    // =========================================================================
    // Row operations
    // =========================================================================

    /// Inserts a row and returns its `(id, version)`.
    pub async fn insert(&self, table: &str, values: &[Value]) -> Result<(i64, i64), ClientError> {
        let request = self.layout(table)?.insert(values)?;
        match self.request(request).await? {
            Response::Inserted { id, version } => Ok((id, version)),
            _ => Err(ClientError::UnexpectedResponse(Command::Insert)),
        }
    }

    /// Replaces row `id` and returns its new version.
    ///
    /// With `Some(version)` the server aborts the update if the row has
    /// moved on; `None` updates unconditionally.
    pub async fn update(
        &self,
        table: &str,
        id: i64,
        values: &[Value],
        version: Option<i64>,
    ) -> Result<i64, ClientError> {
        let request = self
            .layout(table)?
            .update(id, version.unwrap_or(0), values)?;
        match self.request(request).await? {
            Response::Updated { version } => Ok(version),
            _ => Err(ClientError::UnexpectedResponse(Command::Update)),
        }
    }

    /// Deletes row `id`.
    pub async fn drop(&self, table: &str, id: i64) -> Result<(), ClientError> {
        let layout = self.layout(table)?;
        let request = Request::Drop {
            table: layout.table_number(),
            id,
        };
        match self.request(request).await? {
            Response::Dropped => Ok(()),
            _ => Err(ClientError::UnexpectedResponse(Command::Drop)),
        }
    }

    /// Fetches row `id` with its version.
    pub async fn get(&self, table: &str, id: i64) -> Result<(Vec<Value>, i64), ClientError> {
        let layout = self.layout(table)?;
        let request = Request::Get {
            table: layout.table_number(),
            id,
        };
        match self.request(request).await? {
            Response::Row { version, values } => {
                if values.len() != layout.column_count() {
                    tracing::warn!(
                        "{} returned {} values for {} ({} columns)",
                        Command::Get,
                        values.len(),
                        table,
                        layout.column_count()
                    );
                }
                Ok((values, version))
            }
            _ => Err(ClientError::UnexpectedResponse(Command::Get)),
        }
    }

    /// Returns the ids of rows in `table` matching `column <op> operand`.
    ///
    /// [`Operator::Al`] matches every row and ignores `column` and `operand`.
    /// The column `id` compares primary keys.
    pub async fn scan(
        &self,
        table: &str,
        op: Operator,
        column: Option<&str>,
        operand: Option<Value>,
    ) -> Result<Vec<i64>, ClientError> {
        let layout = self.layout(table)?;

        let request = if op == Operator::Al {
            layout.scan_all()
        } else {
            let name = column.ok_or(ClientError::InvalidPredicate("missing column name"))?;
            let operand = operand.ok_or(ClientError::InvalidPredicate("missing operand"))?;

            let index = if is_id_column(name) {
                None
            } else {
                let index = self
                    .schema
                    .lookup(table)
                    .and_then(|t| t.column_index(name))
                    .ok_or_else(|| ClientError::UnknownColumn {
                        table: table.to_string(),
                        column: name.to_string(),
                    })?;
                Some(index)
            };

            layout.scan(index, op, &operand)?
        };

        match self.request(request).await? {
            Response::Ids(ids) => Ok(ids),
            _ => Err(ClientError::UnexpectedResponse(Command::Scan)),
        }
    }
}
