//! Row encoding and decoding.
//!
//! A [`RowLayout`] is the wire view of one table: its number and the value
//! kind expected at each column. The table's resolved foreign column is
//! expected as [`ValueKind::Foreign`] and always travels with the FOREIGN tag.

use crate::error::ProtocolError;
use crate::frame::{Value, ValueKind};
use crate::message::{Operator, Request};
use easydb_schema::{ColumnType, Schema, RESERVED_COLUMN};

/// Wire layout of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowLayout {
    table_number: u32,
    kinds: Vec<ValueKind>,
    /// Columns declared as references to another table, resolved or not.
    references: Vec<bool>,
}

impl RowLayout {
    pub fn new(table_number: u32, kinds: Vec<ValueKind>) -> Self {
        let references = kinds.iter().map(|&k| k == ValueKind::Foreign).collect();
        Self {
            table_number,
            kinds,
            references,
        }
    }

    /// Resolves the layout of `table` from the schema.
    ///
    /// Foreign columns other than the one reported by
    /// [`Schema::foreign_column`] are sent as plain integers.
    pub fn for_table(schema: &Schema, table: &str) -> Option<Self> {
        let declared = schema.lookup(table)?;
        let foreign = schema.foreign_column(table).map(|f| f.index);

        let kinds = declared
            .columns()
            .iter()
            .enumerate()
            .map(|(index, column)| match column.column_type() {
                _ if Some(index) == foreign => ValueKind::Foreign,
                ColumnType::Integer | ColumnType::Foreign(_) => ValueKind::Integer,
                ColumnType::Float => ValueKind::Float,
                ColumnType::String => ValueKind::String,
            })
            .collect();

        let references = declared
            .columns()
            .iter()
            .map(|column| column.column_type().referenced_table().is_some())
            .collect();

        Some(Self {
            table_number: declared.number(),
            kinds,
            references,
        })
    }

    pub fn table_number(&self) -> u32 {
        self.table_number
    }

    pub fn kinds(&self) -> &[ValueKind] {
        &self.kinds
    }

    pub fn column_count(&self) -> usize {
        self.kinds.len()
    }

    /// Whether column `index` is declared as a reference to another table.
    pub fn is_reference(&self, index: usize) -> bool {
        self.references.get(index).copied().unwrap_or(false)
    }

    /// Checks a full row against the layout and returns the values to send.
    ///
    /// Integer values supplied for the foreign column become
    /// [`Value::Foreign`].
    pub fn prepare(&self, values: &[Value]) -> Result<Vec<Value>, ProtocolError> {
        if values.len() != self.kinds.len() {
            return Err(ProtocolError::Arity {
                expected: self.kinds.len(),
                found: values.len(),
            });
        }

        self.kinds
            .iter()
            .zip(values)
            .enumerate()
            .map(|(column, (&expected, value))| {
                coerce(column, expected, self.is_reference(column), value)
            })
            .collect()
    }

    /// Builds an INSERT request for `values`.
    pub fn insert(&self, values: &[Value]) -> Result<Request, ProtocolError> {
        Ok(Request::Insert {
            table: self.table_number,
            values: self.prepare(values)?,
        })
    }

    /// Builds an UPDATE request for `values`.
    pub fn update(&self, id: i64, version: i64, values: &[Value]) -> Result<Request, ProtocolError> {
        Ok(Request::Update {
            table: self.table_number,
            id,
            version,
            values: self.prepare(values)?,
        })
    }

    /// Builds a SCAN request comparing column `column` (0-based, `None` for `id`).
    ///
    /// `id` and every column referencing another table only accept
    /// [`Operator::Eq`] and [`Operator::Ne`] with an integer operand.
    /// [`Operator::Al`] ignores both column and operand.
    pub fn scan(
        &self,
        column: Option<usize>,
        op: Operator,
        operand: &Value,
    ) -> Result<Request, ProtocolError> {
        if op == Operator::Al {
            return Ok(self.scan_all());
        }

        let (index, position, expected, reference) = match column {
            None => (0, 0, ValueKind::Foreign, true),
            Some(index) => {
                let kind = *self
                    .kinds
                    .get(index)
                    .ok_or(ProtocolError::InvalidColumn(index))?;
                (index, index as u32 + 1, kind, self.is_reference(index))
            }
        };

        if reference && !op.is_equality() {
            return Err(ProtocolError::InvalidOperator(op.code()));
        }

        Ok(Request::Scan {
            table: self.table_number,
            column: position,
            op,
            operand: Some(coerce(index, expected, reference, operand)?),
        })
    }

    /// Builds a match-all SCAN request.
    pub fn scan_all(&self) -> Request {
        Request::Scan {
            table: self.table_number,
            column: 0,
            op: Operator::Al,
            operand: None,
        }
    }
}

/// `reference` marks columns declared as a reference to another table. Those
/// beyond the resolved one travel as INTEGER frames but still take row ids.
fn coerce(
    column: usize,
    expected: ValueKind,
    reference: bool,
    value: &Value,
) -> Result<Value, ProtocolError> {
    match (expected, value) {
        (ValueKind::Foreign, Value::Integer(id) | Value::Foreign(id)) => Ok(Value::Foreign(*id)),
        (ValueKind::Integer, Value::Foreign(id)) if reference => Ok(Value::Integer(*id)),
        (ValueKind::Integer, Value::Integer(_))
        | (ValueKind::Float, Value::Float(_))
        | (ValueKind::String, Value::String(_)) => Ok(value.clone()),
        _ => Err(ProtocolError::ValueType {
            column,
            expected,
            found: value.kind(),
        }),
    }
}

/// Returns whether `name` refers to the primary key pseudo-column.
pub fn is_id_column(name: &str) -> bool {
    name == RESERVED_COLUMN
}

/// Decodes `count` value frames from the start of `buf`.
pub fn decode_row(buf: &[u8], count: usize) -> Result<Vec<Value>, ProtocolError> {
    let mut cursor = buf;
    let mut values = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        values.push(Value::decode(&mut cursor)?);
    }
    if !cursor.is_empty() {
        tracing::debug!("{} trailing bytes after row", cursor.len());
    }
    Ok(values)
}
