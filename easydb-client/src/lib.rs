//! # easydb-client
//!
//! Client library for EasyDB.
//!
//! This crate provides:
//! - A connection over TCP, or over any async byte stream for testing
//! - A high-level API for INSERT, UPDATE, DROP, GET and SCAN
//! - Client-side row validation before anything is sent
//! - Typed errors for every status the server reports

pub mod client;
pub mod connection;
pub mod error;

pub use client::Client;
pub use connection::{Connection, ConnectionConfig};
pub use error::{ClientError, ErrorKind};
