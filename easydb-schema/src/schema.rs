//! Table declarations and the schema registry.
//!
//! A schema is declared once as an ordered list of tables:
//!
//! ```
//! use easydb_schema::{ColumnType, Schema};
//!
//! let schema = Schema::builder()
//!     .table("Users", [("name", ColumnType::String), ("age", ColumnType::Integer)])
//!     .table("Posts", [("author", ColumnType::foreign("Users")), ("title", ColumnType::String)])
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(schema.table_number("Posts"), Some(2));
//! ```
//!
//! Tables are numbered from 1 in declaration order. Validation happens in
//! [`Schema::new`] and either accepts the whole declaration or nothing.

use crate::error::SchemaError;
use std::collections::HashMap;
use std::fmt;

/// Column name reserved for the server-assigned primary key.
pub const RESERVED_COLUMN: &str = "id";

/// Characters never allowed in table names.
const TABLE_FORBIDDEN: &[char] = &[
    '@', '_', '!', '#', '$', '%', '^', '&', '*', '(', ')', '<', '>', '?', '/', '\\', '|', '}',
    '{', '~', ':',
];

/// Characters never allowed in column names. Same as tables, except `_`.
const COLUMN_FORBIDDEN: &[char] = &[
    '@', '!', '#', '$', '%', '^', '&', '*', '(', ')', '<', '>', '?', '/', '\\', '|', '}', '{',
    '~', ':',
];

/// Declared type of a column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Integer,
    Float,
    String,
    /// Row id of another table, named here.
    Foreign(String),
}

impl ColumnType {
    pub fn foreign(table: impl Into<String>) -> Self {
        ColumnType::Foreign(table.into())
    }

    /// Parses a type keyword. Anything that is not a primitive keyword names a table.
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword {
            "int" | "integer" => ColumnType::Integer,
            "float" => ColumnType::Float,
            "str" | "string" => ColumnType::String,
            other => ColumnType::Foreign(other.to_string()),
        }
    }

    /// Returns the referenced table name for foreign columns.
    pub fn referenced_table(&self) -> Option<&str> {
        match self {
            ColumnType::Foreign(table) => Some(table),
            _ => None,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Integer => write!(f, "int"),
            ColumnType::Float => write!(f, "float"),
            ColumnType::String => write!(f, "str"),
            ColumnType::Foreign(table) => write!(f, "{}", table),
        }
    }
}

/// A typed column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
    column_type: ColumnType,
}

impl Column {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> &ColumnType {
        &self.column_type
    }
}

/// A validated table with its wire number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    name: String,
    number: u32,
    columns: Vec<Column>,
}

impl Table {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 1-based table number used on the wire.
    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns the 0-based position of a column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// The foreign column the codec resolves for a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignColumn {
    /// 0-based column position.
    pub index: usize,
    /// Table number of the referenced table.
    pub table_number: u32,
}

/// Immutable registry of declared tables.
#[derive(Debug, Clone)]
pub struct Schema {
    tables: Vec<Table>,
    by_name: HashMap<String, usize>,
    foreign: Vec<Option<ForeignColumn>>,
}

impl Schema {
    /// Starts a declaration.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Validates the declaration and assigns table numbers.
    pub fn new<T, C, N, M>(declaration: T) -> Result<Self, SchemaError>
    where
        T: IntoIterator<Item = (N, C)>,
        C: IntoIterator<Item = (M, ColumnType)>,
        N: Into<String>,
        M: Into<String>,
    {
        let declared: Vec<(String, Vec<(String, ColumnType)>)> = declaration
            .into_iter()
            .map(|(name, columns)| {
                let columns = columns
                    .into_iter()
                    .map(|(col, ty)| (col.into(), ty))
                    .collect();
                (name.into(), columns)
            })
            .collect();

        // Table names first, so columns may reference tables declared later.
        let mut by_name = HashMap::with_capacity(declared.len());
        for (pos, (name, _)) in declared.iter().enumerate() {
            validate_name("table", name, TABLE_FORBIDDEN)?;
            if by_name.insert(name.clone(), pos).is_some() {
                return Err(SchemaError::DuplicateTable { name: name.clone() });
            }
        }

        let mut tables = Vec::with_capacity(declared.len());
        for (pos, (name, columns)) in declared.into_iter().enumerate() {
            let columns = validate_columns(&name, columns, &by_name)?;
            tables.push(Table {
                name,
                number: pos as u32 + 1,
                columns,
            });
        }

        let foreign = tables
            .iter()
            .map(|table| resolve_foreign(table, &tables, &by_name))
            .collect();

        Ok(Self {
            tables,
            by_name,
            foreign,
        })
    }

    /// Looks up a table by name.
    pub fn lookup(&self, table_name: &str) -> Option<&Table> {
        self.by_name.get(table_name).map(|&pos| &self.tables[pos])
    }

    pub fn table_number(&self, table_name: &str) -> Option<u32> {
        self.lookup(table_name).map(Table::number)
    }

    pub fn is_known_table(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Returns the first column of `table_name` that references another table.
    ///
    /// Only one foreign column is resolved per table; later foreign columns
    /// travel as plain integers.
    pub fn foreign_column(&self, table_name: &str) -> Option<ForeignColumn> {
        self.by_name
            .get(table_name)
            .and_then(|&pos| self.foreign[pos])
    }

    /// Tables in table-number order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Incremental declaration of a [`Schema`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    tables: Vec<(String, Vec<(String, ColumnType)>)>,
}

impl SchemaBuilder {
    pub fn table<C, M>(mut self, name: impl Into<String>, columns: C) -> Self
    where
        C: IntoIterator<Item = (M, ColumnType)>,
        M: Into<String>,
    {
        let columns = columns.into_iter().map(|(c, ty)| (c.into(), ty)).collect();
        self.tables.push((name.into(), columns));
        self
    }

    pub fn build(self) -> Result<Schema, SchemaError> {
        Schema::new(self.tables)
    }
}

fn validate_name(
    entity: &'static str,
    name: &str,
    forbidden: &[char],
) -> Result<(), SchemaError> {
    let reason = if name.is_empty() {
        "name is empty"
    } else if name.chars().any(char::is_numeric) {
        "contains a digit"
    } else if name.contains(forbidden) {
        "contains a forbidden character"
    } else {
        return Ok(());
    };

    Err(SchemaError::InvalidName {
        entity,
        name: name.to_string(),
        reason,
    })
}

fn validate_columns(
    table: &str,
    columns: Vec<(String, ColumnType)>,
    tables: &HashMap<String, usize>,
) -> Result<Vec<Column>, SchemaError> {
    let mut validated: Vec<Column> = Vec::with_capacity(columns.len());

    for (name, column_type) in columns {
        if validated.iter().any(|c| c.name == name) {
            return Err(SchemaError::DuplicateColumn {
                table: table.to_string(),
                column: name,
            });
        }
        if name == RESERVED_COLUMN {
            return Err(SchemaError::ReservedColumn {
                table: table.to_string(),
                column: name,
            });
        }
        validate_name("column", &name, COLUMN_FORBIDDEN)?;

        if let Some(target) = column_type.referenced_table() {
            if target == table {
                return Err(SchemaError::SelfReference {
                    table: table.to_string(),
                    column: name,
                });
            }
            if !tables.contains_key(target) {
                return Err(SchemaError::UnknownReference {
                    table: table.to_string(),
                    column: name,
                    target: target.to_string(),
                });
            }
        }

        validated.push(Column { name, column_type });
    }

    Ok(validated)
}

fn resolve_foreign(
    table: &Table,
    tables: &[Table],
    by_name: &HashMap<String, usize>,
) -> Option<ForeignColumn> {
    let mut references = table
        .columns
        .iter()
        .enumerate()
        .filter_map(|(index, column)| {
            let target = column.column_type.referenced_table()?;
            by_name.get(target).map(|&pos| ForeignColumn {
                index,
                table_number: tables[pos].number,
            })
        });

    let first = references.next();
    let extra = references.count();
    if extra > 0 {
        tracing::warn!(
            "table '{}' declares {} additional foreign column(s); only '{}' is checked by the server",
            table.name,
            extra,
            first.map(|f| table.columns[f.index].name.as_str()).unwrap_or_default()
        );
    }
    first
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaErrorKind;
    use proptest::prelude::*;

    fn blog_schema() -> Schema {
        Schema::builder()
            .table(
                "Users",
                [("name", ColumnType::String), ("age", ColumnType::Integer)],
            )
            .table(
                "Posts",
                [
                    ("author", ColumnType::foreign("Users")),
                    ("title", ColumnType::String),
                ],
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_table_numbers_follow_declaration_order() {
        let schema = blog_schema();
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.table_number("Users"), Some(1));
        assert_eq!(schema.table_number("Posts"), Some(2));
        assert_eq!(schema.table_number("Comments"), None);

        let numbers: Vec<u32> = schema.tables().map(Table::number).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn test_lookup() {
        let schema = blog_schema();
        let users = schema.lookup("Users").unwrap();
        assert_eq!(users.name(), "Users");
        assert_eq!(users.column_count(), 2);
        assert_eq!(users.column_index("age"), Some(1));
        assert_eq!(
            users.column("name").unwrap().column_type(),
            &ColumnType::String
        );
        assert!(schema.lookup("users").is_none());
        assert!(schema.is_known_table("Posts"));
        assert!(!schema.is_known_table("Comments"));
    }

    #[test]
    fn test_foreign_column() {
        let schema = blog_schema();
        assert_eq!(schema.foreign_column("Users"), None);
        assert_eq!(
            schema.foreign_column("Posts"),
            Some(ForeignColumn {
                index: 0,
                table_number: 1
            })
        );
        assert_eq!(schema.foreign_column("Missing"), None);
    }

    #[test]
    fn test_foreign_column_first_match_only() {
        let schema = Schema::builder()
            .table("Users", [("name", ColumnType::String)])
            .table("Groups", [("label", ColumnType::String)])
            .table(
                "Membership",
                [
                    ("since", ColumnType::Integer),
                    ("member", ColumnType::foreign("Users")),
                    ("group", ColumnType::foreign("Groups")),
                ],
            )
            .build()
            .unwrap();

        assert_eq!(
            schema.foreign_column("Membership"),
            Some(ForeignColumn {
                index: 1,
                table_number: 1
            })
        );
    }

    #[test]
    fn test_forward_reference_allowed() {
        let schema = Schema::builder()
            .table("Posts", [("author", ColumnType::foreign("Users"))])
            .table("Users", [("name", ColumnType::String)])
            .build()
            .unwrap();

        assert_eq!(
            schema.foreign_column("Posts"),
            Some(ForeignColumn {
                index: 0,
                table_number: 2
            })
        );
    }

    #[test]
    fn test_self_reference_rejected() {
        let err = Schema::builder()
            .table("Users", [("friend", ColumnType::foreign("Users"))])
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::SelfReference { .. }));
        assert_eq!(err.kind(), SchemaErrorKind::Integrity);
    }

    #[test]
    fn test_unknown_reference_rejected() {
        let err = Schema::builder()
            .table("Posts", [("author", ColumnType::foreign("Authors"))])
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            SchemaError::UnknownReference { ref target, .. } if target == "Authors"
        ));
        assert_eq!(err.kind(), SchemaErrorKind::Integrity);
    }

    #[test]
    fn test_duplicate_table() {
        let err = Schema::builder()
            .table("Users", [("name", ColumnType::String)])
            .table("Users", [("age", ColumnType::Integer)])
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateTable { .. }));
        assert_eq!(err.kind(), SchemaErrorKind::DuplicateName);
    }

    #[test]
    fn test_duplicate_column() {
        let err = Schema::builder()
            .table(
                "Users",
                [("name", ColumnType::String), ("name", ColumnType::Integer)],
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateColumn { .. }));
        assert_eq!(err.kind(), SchemaErrorKind::DuplicateName);
    }

    #[test]
    fn test_reserved_column_name() {
        let err = Schema::builder()
            .table("Users", [("id", ColumnType::Integer)])
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::ReservedColumn { .. }));
        assert_eq!(err.kind(), SchemaErrorKind::Schema);
    }

    #[test]
    fn test_underscore_allowed_in_columns_only() {
        assert!(Schema::builder()
            .table("Users", [("first_name", ColumnType::String)])
            .build()
            .is_ok());

        let err = Schema::builder()
            .table("user_accounts", [("name", ColumnType::String)])
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidName { entity: "table", .. }));
    }

    #[test]
    fn test_empty_names_rejected() {
        let err = Schema::builder()
            .table("", [("name", ColumnType::String)])
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), SchemaErrorKind::Schema);

        let err = Schema::builder()
            .table("Users", [("", ColumnType::String)])
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), SchemaErrorKind::Schema);
    }

    #[test]
    fn test_validation_is_all_or_nothing() {
        let result = Schema::builder()
            .table("Users", [("name", ColumnType::String)])
            .table("Posts", [("title", ColumnType::String)])
            .table("Bad", [("x", ColumnType::foreign("Nope"))])
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_column_type_keywords() {
        assert_eq!(ColumnType::from_keyword("int"), ColumnType::Integer);
        assert_eq!(ColumnType::from_keyword("integer"), ColumnType::Integer);
        assert_eq!(ColumnType::from_keyword("float"), ColumnType::Float);
        assert_eq!(ColumnType::from_keyword("str"), ColumnType::String);
        assert_eq!(ColumnType::from_keyword("string"), ColumnType::String);
        assert_eq!(
            ColumnType::from_keyword("Users"),
            ColumnType::foreign("Users")
        );
        assert_eq!(ColumnType::foreign("Users").to_string(), "Users");
        assert_eq!(ColumnType::Float.to_string(), "float");
    }

    proptest! {
        #[test]
        fn prop_table_numbers_are_contiguous(count in 1usize..20) {
            let names: Vec<String> = (0..count)
                .map(|i| format!("T{}", "x".repeat(i + 1)))
                .collect();
            let schema = Schema::new(
                names
                    .iter()
                    .map(|n| (n.clone(), vec![("value", ColumnType::Integer)])),
            )
            .unwrap();

            for (pos, name) in names.iter().enumerate() {
                prop_assert_eq!(schema.table_number(name), Some(pos as u32 + 1));
            }
        }

        #[test]
        fn prop_forbidden_table_characters_rejected(
            prefix in "[a-zA-Z]{0,6}",
            bad in prop::sample::select(TABLE_FORBIDDEN.to_vec()),
            suffix in "[a-zA-Z]{0,6}",
        ) {
            let name = format!("{}{}{}", prefix, bad, suffix);
            let err = Schema::builder()
                .table(name, [("value", ColumnType::Integer)])
                .build()
                .unwrap_err();
            prop_assert_eq!(err.kind(), SchemaErrorKind::Schema);
        }

        #[test]
        fn prop_digits_rejected_in_column_names(
            prefix in "[a-z]{0,6}",
            digit in 0u8..10,
            suffix in "[a-z]{0,6}",
        ) {
            let name = format!("{}{}{}", prefix, digit, suffix);
            let err = Schema::builder()
                .table("Users", [(name, ColumnType::Integer)])
                .build()
                .unwrap_err();
            prop_assert_eq!(err.kind(), SchemaErrorKind::Schema);
        }

        #[test]
        fn prop_plain_names_accepted(table in "[A-Z][a-z]{0,10}", column in "[a-z][a-z_]{0,10}") {
            prop_assume!(column != RESERVED_COLUMN);
            let schema = Schema::builder()
                .table(table, [(column, ColumnType::Float)])
                .build();
            prop_assert!(schema.is_ok());
        }
    }
}
