//! Request and response layouts.
//!
//! Every request starts with `(command: i32, table_number: i32)`; the rest of
//! the layout depends on the command:
//!
//! ```text
//! INSERT  col_count:i32  row
//! UPDATE  id:i64  version:i64  col_count:i32  row
//! DROP    id:i64
//! GET     id:i64
//! SCAN    column:i32  operator:i32  predicate
//! EXIT    (table_number is always 1)
//! ```
//!
//! Every response starts with a status code. A 4-byte response carries the
//! status alone; successful responses continue with:
//!
//! ```text
//! INSERT  id:i64  version:i64
//! UPDATE  version:i64
//! DROP    -
//! GET     version:i64  count:i32  row
//! SCAN    count:i32  count x id:i64
//! ```

use crate::codec::decode_row;
use crate::error::ProtocolError;
use crate::frame::{ensure_remaining, put_null_predicate, Value};
use bytes::{Buf, BufMut, BytesMut};
use std::fmt;

/// Size of the status code that starts every response.
pub const STATUS_SIZE: usize = 4;

/// Offset of the row section in a GET response.
pub const GET_ROW_OFFSET: usize = 16;

/// Table number sent with EXIT.
const EXIT_SENTINEL: u32 = 1;

/// Request commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Command {
    Insert = 1,
    Update = 2,
    Drop = 3,
    Get = 4,
    Scan = 5,
    Exit = 6,
}

impl Command {
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl TryFrom<i32> for Command {
    type Error = ProtocolError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Command::Insert),
            2 => Ok(Command::Update),
            3 => Ok(Command::Drop),
            4 => Ok(Command::Get),
            5 => Ok(Command::Scan),
            6 => Ok(Command::Exit),
            other => Err(ProtocolError::UnknownCommand(other)),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Insert => write!(f, "INSERT"),
            Command::Update => write!(f, "UPDATE"),
            Command::Drop => write!(f, "DROP"),
            Command::Get => write!(f, "GET"),
            Command::Scan => write!(f, "SCAN"),
            Command::Exit => write!(f, "EXIT"),
        }
    }
}

/// Response status codes.
///
/// These codes are fixed by the server and must not be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Status {
    Ok = 1,
    NotFound = 2,
    BadTable = 3,
    BadQuery = 4,
    TxnAbort = 5,
    BadValue = 6,
    BadRow = 7,
    BadRequest = 8,
    BadForeign = 9,
    ServerBusy = 10,
    Unimplemented = 11,
}

impl Status {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }

    /// Reads the status code at the start of a response.
    pub fn decode(buf: &[u8]) -> Result<Self, ProtocolError> {
        ensure_remaining(buf, STATUS_SIZE)?;
        Status::try_from((&buf[..STATUS_SIZE]).get_i32())
    }
}

impl TryFrom<i32> for Status {
    type Error = ProtocolError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Status::Ok),
            2 => Ok(Status::NotFound),
            3 => Ok(Status::BadTable),
            4 => Ok(Status::BadQuery),
            5 => Ok(Status::TxnAbort),
            6 => Ok(Status::BadValue),
            7 => Ok(Status::BadRow),
            8 => Ok(Status::BadRequest),
            9 => Ok(Status::BadForeign),
            10 => Ok(Status::ServerBusy),
            11 => Ok(Status::Unimplemented),
            other => Err(ProtocolError::UnknownStatus(other)),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ok => write!(f, "OK"),
            Status::NotFound => write!(f, "NOT_FOUND"),
            Status::BadTable => write!(f, "BAD_TABLE"),
            Status::BadQuery => write!(f, "BAD_QUERY"),
            Status::TxnAbort => write!(f, "TXN_ABORT"),
            Status::BadValue => write!(f, "BAD_VALUE"),
            Status::BadRow => write!(f, "BAD_ROW"),
            Status::BadRequest => write!(f, "BAD_REQUEST"),
            Status::BadForeign => write!(f, "BAD_FOREIGN"),
            Status::ServerBusy => write!(f, "SERVER_BUSY"),
            Status::Unimplemented => write!(f, "UNIMPLEMENTED"),
        }
    }
}

/// Scan comparison operators, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(i32)]
pub enum Operator {
    /// Matches every row; column and operand are ignored.
    Al = 1,
    Eq = 2,
    Ne = 3,
    Lt = 4,
    Le = 5,
    Gt = 6,
}

impl Operator {
    pub const ALL: [Operator; 6] = [
        Operator::Al,
        Operator::Eq,
        Operator::Ne,
        Operator::Lt,
        Operator::Le,
        Operator::Gt,
    ];

    pub fn code(self) -> i32 {
        self as i32
    }

    /// Whether this operator only tests (in)equality. Foreign keys and ids allow nothing else.
    pub fn is_equality(self) -> bool {
        matches!(self, Operator::Eq | Operator::Ne)
    }
}

impl TryFrom<i32> for Operator {
    type Error = ProtocolError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        if code < Operator::Al.code() || code > Operator::Gt.code() {
            return Err(ProtocolError::InvalidOperator(code));
        }
        Ok(Operator::ALL[(code - Operator::Al.code()) as usize])
    }
}

impl std::str::FromStr for Operator {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "AL" | "ALL" => Ok(Operator::Al),
            "EQ" | "=" | "==" => Ok(Operator::Eq),
            "NE" | "!=" | "<>" => Ok(Operator::Ne),
            "LT" | "<" => Ok(Operator::Lt),
            "LE" | "<=" => Ok(Operator::Le),
            "GT" | ">" => Ok(Operator::Gt),
            _ => Err(ProtocolError::InvalidOperator(-1)),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Al => write!(f, "AL"),
            Operator::Eq => write!(f, "EQ"),
            Operator::Ne => write!(f, "NE"),
            Operator::Lt => write!(f, "LT"),
            Operator::Le => write!(f, "LE"),
            Operator::Gt => write!(f, "GT"),
        }
    }
}

/// A request ready for the wire.
///
/// Row values must already be checked against the table layout
/// (see [`RowLayout::prepare`](crate::codec::RowLayout::prepare)).
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Insert {
        table: u32,
        values: Vec<Value>,
    },
    Update {
        table: u32,
        id: i64,
        version: i64,
        values: Vec<Value>,
    },
    Drop {
        table: u32,
        id: i64,
    },
    Get {
        table: u32,
        id: i64,
    },
    Scan {
        table: u32,
        /// 1-based column position, 0 for `id` or a match-all scan.
        column: u32,
        op: Operator,
        /// `None` sends the match-all predicate.
        operand: Option<Value>,
    },
    Exit,
}

impl Request {
    pub fn command(&self) -> Command {
        match self {
            Request::Insert { .. } => Command::Insert,
            Request::Update { .. } => Command::Update,
            Request::Drop { .. } => Command::Drop,
            Request::Get { .. } => Command::Get,
            Request::Scan { .. } => Command::Scan,
            Request::Exit => Command::Exit,
        }
    }

    /// Encodes the request into its wire form.
    pub fn encode(&self) -> Result<BytesMut, ProtocolError> {
        let mut buf = BytesMut::with_capacity(self.encoded_len_hint());
        buf.put_i32(self.command().code());

        match self {
            Request::Insert { table, values } => {
                buf.put_u32(*table);
                put_row(&mut buf, values)?;
            }
            Request::Update {
                table,
                id,
                version,
                values,
            } => {
                buf.put_u32(*table);
                buf.put_i64(*id);
                buf.put_i64(*version);
                put_row(&mut buf, values)?;
            }
            Request::Drop { table, id } | Request::Get { table, id } => {
                buf.put_u32(*table);
                buf.put_i64(*id);
            }
            Request::Scan {
                table,
                column,
                op,
                operand,
            } => {
                buf.put_u32(*table);
                buf.put_u32(*column);
                buf.put_i32(op.code());
                match operand {
                    Some(value) => value.encode(&mut buf)?,
                    None => put_null_predicate(&mut buf),
                }
            }
            Request::Exit => {
                buf.put_u32(EXIT_SENTINEL);
            }
        }

        Ok(buf)
    }

    fn encoded_len_hint(&self) -> usize {
        let row = |values: &[Value]| 4 + values.iter().map(Value::encoded_len).sum::<usize>();
        8 + match self {
            Request::Insert { values, .. } => row(values),
            Request::Update { values, .. } => 16 + row(values),
            Request::Drop { .. } | Request::Get { .. } => 8,
            Request::Scan { operand, .. } => 8 + operand.as_ref().map_or(12, Value::encoded_len),
            Request::Exit => 0,
        }
    }
}

fn put_row(buf: &mut BytesMut, values: &[Value]) -> Result<(), ProtocolError> {
    buf.put_i32(values.len() as i32);
    for value in values {
        value.encode(buf)?;
    }
    Ok(())
}

/// A decoded response.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Inserted { id: i64, version: i64 },
    Updated { version: i64 },
    Dropped,
    Row { version: i64, values: Vec<Value> },
    Ids(Vec<i64>),
    /// Acknowledgement of EXIT; its content is not interpreted.
    Closed,
    /// The server answered with a status other than OK.
    Rejected(Status),
}

impl Response {
    /// Decodes the response to `command`.
    pub fn decode(command: Command, buf: &[u8]) -> Result<Self, ProtocolError> {
        if command == Command::Exit {
            return Ok(Response::Closed);
        }

        let status = Status::decode(buf)?;
        if !status.is_ok() {
            return Ok(Response::Rejected(status));
        }

        let mut body = &buf[STATUS_SIZE..];
        match command {
            Command::Insert => {
                ensure_remaining(body, 16)?;
                Ok(Response::Inserted {
                    id: body.get_i64(),
                    version: body.get_i64(),
                })
            }
            Command::Update => {
                ensure_remaining(body, 8)?;
                Ok(Response::Updated {
                    version: body.get_i64(),
                })
            }
            Command::Drop => Ok(Response::Dropped),
            Command::Get => {
                ensure_remaining(body, GET_ROW_OFFSET - STATUS_SIZE)?;
                let version = body.get_i64();
                let count = body.get_i32();
                let count =
                    usize::try_from(count).map_err(|_| ProtocolError::InvalidCount(count))?;
                let values = decode_row(&buf[GET_ROW_OFFSET..], count)?;
                Ok(Response::Row { version, values })
            }
            Command::Scan => {
                ensure_remaining(body, 4)?;
                let count = body.get_i32();
                let count =
                    usize::try_from(count).map_err(|_| ProtocolError::InvalidCount(count))?;
                ensure_remaining(body, count.saturating_mul(8))?;
                Ok(Response::Ids((0..count).map(|_| body.get_i64()).collect()))
            }
            Command::Exit => Ok(Response::Closed),
        }
    }
}
