//! Value frames.
//!
//! Every value travels as a type-tagged, length-prefixed frame:
//!
//! ```text
//! +----------+-------------+---------------------------+
//! | type_tag | byte_length | payload                   |
//! | 4 bytes  | 4 bytes     | byte_length bytes         |
//! +----------+-------------+---------------------------+
//! ```
//!
//! Integer, float and foreign payloads are 8 bytes. String payloads are UTF-8,
//! zero-padded to a multiple of 4; `byte_length` is the padded length.

use crate::error::ProtocolError;
use bytes::{Buf, BufMut};
use std::fmt;

/// Size of the (type_tag, byte_length) prefix.
pub const VALUE_HEADER_SIZE: usize = 8;

/// Payload size of integer, float and foreign values.
pub const NUMERIC_PAYLOAD_SIZE: usize = 8;

/// Wire type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum TypeTag {
    /// Only used by the match-all scan predicate.
    Null = 0,
    Integer = 1,
    Float = 2,
    String = 3,
    /// Same payload as `Integer`; the server checks the referenced row exists.
    Foreign = 4,
}

impl TypeTag {
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl TryFrom<i32> for TypeTag {
    type Error = ProtocolError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(TypeTag::Null),
            1 => Ok(TypeTag::Integer),
            2 => Ok(TypeTag::Float),
            3 => Ok(TypeTag::String),
            4 => Ok(TypeTag::Foreign),
            other => Err(ProtocolError::InvalidTag(other)),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Null => write!(f, "NULL"),
            TypeTag::Integer => write!(f, "INTEGER"),
            TypeTag::Float => write!(f, "FLOAT"),
            TypeTag::String => write!(f, "STRING"),
            TypeTag::Foreign => write!(f, "FOREIGN"),
        }
    }
}

/// The kind of a value, as expected by a column or carried by a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Integer,
    Float,
    String,
    Foreign,
}

impl ValueKind {
    pub fn tag(self) -> TypeTag {
        match self {
            ValueKind::Integer => TypeTag::Integer,
            ValueKind::Float => TypeTag::Float,
            ValueKind::String => TypeTag::String,
            ValueKind::Foreign => TypeTag::Foreign,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Integer => write!(f, "int"),
            ValueKind::Float => write!(f, "float"),
            ValueKind::String => write!(f, "str"),
            ValueKind::Foreign => write!(f, "foreign"),
        }
    }
}

/// A typed column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    String(String),
    /// Row id in the referenced table.
    Foreign(i64),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Integer(_) => ValueKind::Integer,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::Foreign(_) => ValueKind::Foreign,
        }
    }

    /// Returns the integer payload of `Integer` and `Foreign` values.
    pub fn as_id(&self) -> Option<i64> {
        match self {
            Value::Integer(v) | Value::Foreign(v) => Some(*v),
            _ => None,
        }
    }

    /// Number of bytes this value occupies as a frame.
    pub fn encoded_len(&self) -> usize {
        VALUE_HEADER_SIZE
            + match self {
                Value::String(s) => padded_len(s.len()),
                _ => NUMERIC_PAYLOAD_SIZE,
            }
    }

    /// Appends this value as a frame.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<(), ProtocolError> {
        match self {
            Value::Integer(v) => {
                buf.put_i32(TypeTag::Integer.code());
                buf.put_i32(NUMERIC_PAYLOAD_SIZE as i32);
                buf.put_i64(*v);
            }
            Value::Foreign(v) => {
                buf.put_i32(TypeTag::Foreign.code());
                buf.put_i32(NUMERIC_PAYLOAD_SIZE as i32);
                buf.put_i64(*v);
            }
            Value::Float(v) => {
                buf.put_i32(TypeTag::Float.code());
                buf.put_i32(NUMERIC_PAYLOAD_SIZE as i32);
                buf.put_f64(*v);
            }
            Value::String(s) => {
                let padded = padded_len(s.len());
                let length =
                    i32::try_from(padded).map_err(|_| ProtocolError::ValueTooLarge(s.len()))?;
                buf.put_i32(TypeTag::String.code());
                buf.put_i32(length);
                buf.put_slice(s.as_bytes());
                buf.put_bytes(0, padded - s.len());
            }
        }
        Ok(())
    }

    /// Reads one frame from the front of `buf`, advancing it past the frame.
    pub fn decode(buf: &mut &[u8]) -> Result<Self, ProtocolError> {
        ensure_remaining(buf, VALUE_HEADER_SIZE)?;
        let tag = TypeTag::try_from(buf.get_i32())?;
        let length = buf.get_i32();
        let payload_len =
            usize::try_from(length).map_err(|_| ProtocolError::BadLength { tag, length })?;
        ensure_remaining(buf, payload_len)?;

        match tag {
            TypeTag::String => {
                let data: &[u8] = *buf;
                let (payload, rest) = data.split_at(payload_len);
                let text = std::str::from_utf8(payload).map_err(|_| ProtocolError::InvalidUtf8)?;
                *buf = rest;
                Ok(Value::String(text.trim_end_matches('\0').to_string()))
            }
            TypeTag::Integer | TypeTag::Float | TypeTag::Foreign => {
                if payload_len != NUMERIC_PAYLOAD_SIZE {
                    return Err(ProtocolError::BadLength { tag, length });
                }
                Ok(match tag {
                    TypeTag::Float => Value::Float(buf.get_f64()),
                    TypeTag::Foreign => Value::Foreign(buf.get_i64()),
                    _ => Value::Integer(buf.get_i64()),
                })
            }
            TypeTag::Null => Err(ProtocolError::InvalidTag(tag.code())),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Foreign(v) => write!(f, "#{}", v),
        }
    }
}

/// Writes the match-all scan predicate: a NULL frame followed by a zero word.
pub fn put_null_predicate(buf: &mut impl BufMut) {
    buf.put_i32(TypeTag::Null.code());
    buf.put_i32(0);
    buf.put_i32(TypeTag::Null.code());
}

/// Rounds a payload length up to the next multiple of 4.
pub fn padded_len(len: usize) -> usize {
    (len + 3) & !3
}

pub(crate) fn ensure_remaining(buf: &[u8], needed: usize) -> Result<(), ProtocolError> {
    if buf.len() < needed {
        return Err(ProtocolError::Truncated {
            needed,
            available: buf.len(),
        });
    }
    Ok(())
}
