//! Connection management.
//!
//! A [`Connection`] owns one byte stream and runs one request at a time:
//! write the request, read a single response chunk, decode it. Any
//! `AsyncRead + AsyncWrite` stream works, which is how tests swap the TCP
//! socket for an in-memory one.

use crate::error::ClientError;
use easydb_protocol::{Command, ProtocolError, Request, Response, Status};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

/// Default server host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default read buffer size (4 KiB). Responses larger than this are truncated.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 4 * 1024;

/// Minimum read buffer size (1 KiB).
pub const MIN_READ_BUFFER_SIZE: usize = 1024;

/// Maximum read buffer size (1 MiB).
pub const MAX_READ_BUFFER_SIZE: usize = 1024 * 1024;

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Server host name or IP address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Upper bound on the size of a single response.
    pub read_buffer_size: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl ConnectionConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout: Duration::from_secs(10),
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.clamp(MIN_READ_BUFFER_SIZE, MAX_READ_BUFFER_SIZE);
        self
    }

    /// Applies `EASYDB_HOST`, `EASYDB_PORT` and `EASYDB_READ_BUFFER` overrides.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`, keyed by environment variable name.
    /// Empty or unparsable values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(host) = lookup("EASYDB_HOST") {
            if !host.is_empty() {
                self.host = host;
            }
        }

        if let Some(port) = lookup("EASYDB_PORT") {
            match port.parse() {
                Ok(parsed) => self.port = parsed,
                Err(_) => tracing::warn!("Ignoring invalid EASYDB_PORT: {}", port),
            }
        }

        if let Some(size) = lookup("EASYDB_READ_BUFFER") {
            match size.parse() {
                Ok(parsed) => self = self.with_read_buffer_size(parsed),
                Err(_) => tracing::warn!("Ignoring invalid EASYDB_READ_BUFFER: {}", size),
            }
        }

        self
    }

    /// Returns the `host:port` address.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// A connection to an EasyDB server.
pub struct Connection<S = TcpStream> {
    stream: S,
    read_buffer: Vec<u8>,
}

impl Connection<TcpStream> {
    /// Connects to the server and waits for its greeting.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self, ClientError> {
        let addr = config.addr();
        tracing::debug!("Connecting to {}...", addr);

        let stream = tokio::time::timeout(config.connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| {
                tracing::debug!("Connection timeout");
                ClientError::Timeout
            })?
            .map_err(|e| {
                tracing::debug!("Connection failed: {}", e);
                ClientError::Io(e)
            })?;

        stream.set_nodelay(true).ok();

        let mut conn = Self::from_stream(stream, config.read_buffer_size);
        conn.handshake().await?;
        tracing::debug!("Connected to {}", addr);
        Ok(conn)
    }
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps an already-open stream. No greeting is read.
    pub fn from_stream(stream: S, read_buffer_size: usize) -> Self {
        Self {
            stream,
            read_buffer: vec![0u8; read_buffer_size.max(1)],
        }
    }

    /// Reads the status the server sends when a client connects.
    pub async fn handshake(&mut self) -> Result<(), ClientError> {
        let n = self.read_chunk().await?;
        match Status::decode(&self.read_buffer[..n])? {
            Status::Ok => Ok(()),
            Status::ServerBusy => {
                tracing::warn!("Server is busy, connection refused");
                Err(ClientError::ServerBusy)
            }
            other => Err(ProtocolError::UnexpectedGreeting(other).into()),
        }
    }

    /// Sends a request and decodes the response.
    pub async fn round_trip(&mut self, request: &Request) -> Result<Response, ClientError> {
        let command = request.command();
        let encoded = request.encode()?;

        tracing::debug!("Sending {} request ({} bytes)", command, encoded.len());
        self.stream.write_all(&encoded).await?;
        self.stream.flush().await?;

        let n = self.read_chunk().await?;
        tracing::debug!("Received {} response ({} bytes)", command, n);

        Ok(Response::decode(command, &self.read_buffer[..n])?)
    }

    /// Sends EXIT and shuts the stream down.
    pub async fn close(mut self) -> Result<(), ClientError> {
        tracing::debug!("Closing connection...");
        let encoded = Request::Exit.encode()?;
        self.stream.write_all(&encoded).await?;
        self.stream.flush().await?;

        // The server acknowledges EXIT; what it sends does not matter.
        match self.read_chunk().await {
            Ok(_) | Err(ClientError::ConnectionClosed) => {}
            Err(e) => tracing::debug!("Ignoring error while waiting for {} ack: {}", Command::Exit, e),
        }

        if let Err(e) = self.stream.shutdown().await {
            tracing::debug!("Ignoring error while shutting down stream: {}", e);
        }
        tracing::debug!("Connection closed");
        Ok(())
    }

    /// Returns the configured response size limit.
    pub fn read_buffer_size(&self) -> usize {
        self.read_buffer.len()
    }

    async fn read_chunk(&mut self) -> Result<usize, ClientError> {
        let n = self.stream.read(&mut self.read_buffer).await?;
        if n == 0 {
            tracing::debug!("Connection closed (0 bytes)");
            return Err(ClientError::ConnectionClosed);
        }
        if n == self.read_buffer.len() {
            tracing::warn!(
                "Response filled the {} byte read buffer and may be truncated",
                n
            );
        }
        Ok(n)
    }
}
