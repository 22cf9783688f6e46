//! Schema declaration files.
//!
//! A schema can be kept next to the application as YAML or JSON:
//!
//! ```yaml
//! tables:
//!   - name: Users
//!     columns:
//!       - { name: name, type: str }
//!       - { name: age, type: int }
//!   - name: Posts
//!     columns:
//!       - { name: author, type: Users }
//!       - { name: title, type: str }
//! ```
//!
//! Type keywords are `int`/`integer`, `float` and `str`/`string`. Any other
//! type names the referenced table.

use crate::error::SchemaError;
use crate::schema::{ColumnType, Schema};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Serialized form of a schema declaration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaConfig {
    #[serde(default)]
    pub tables: Vec<TableConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<ColumnConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
}

impl SchemaConfig {
    /// Loads a declaration file. `.json` files are parsed as JSON, everything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| SchemaError::Io(path.to_path_buf(), e))?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let config = if is_json {
            serde_json::from_str(&content)
                .map_err(|e| SchemaError::Parse(path.to_path_buf(), e.to_string()))?
        } else {
            serde_yaml::from_str(&content)
                .map_err(|e| SchemaError::Parse(path.to_path_buf(), e.to_string()))?
        };

        tracing::debug!("Loaded schema declaration from {}", path.display());
        Ok(config)
    }

    /// Validates the declaration into a registry.
    pub fn build(&self) -> Result<Schema, SchemaError> {
        Schema::new(self.tables.iter().map(|table| {
            let columns = table
                .columns
                .iter()
                .map(|c| (c.name.clone(), ColumnType::from_keyword(&c.column_type)));
            (table.name.clone(), columns)
        }))
    }
}

impl Schema {
    /// Loads and validates a schema declaration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        SchemaConfig::from_file(path)?.build()
    }

    /// Converts the registry back into its declaration form.
    pub fn to_config(&self) -> SchemaConfig {
        SchemaConfig {
            tables: self
                .tables()
                .map(|table| TableConfig {
                    name: table.name().to_string(),
                    columns: table
                        .columns()
                        .iter()
                        .map(|c| ColumnConfig {
                            name: c.name().to_string(),
                            column_type: c.column_type().to_string(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaErrorKind;
    use std::io::Write;

    const BLOG_YAML: &str = r#"
tables:
  - name: Users
    columns:
      - { name: name, type: str }
      - { name: age, type: int }
  - name: Posts
    columns:
      - { name: author, type: Users }
      - { name: title, type: string }
"#;

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_yaml() {
        let file = write_temp(".yaml", BLOG_YAML);
        let schema = Schema::load(file.path()).unwrap();

        assert_eq!(schema.table_number("Posts"), Some(2));
        let posts = schema.lookup("Posts").unwrap();
        assert_eq!(
            posts.columns()[0].column_type(),
            &ColumnType::foreign("Users")
        );
        assert_eq!(posts.columns()[1].column_type(), &ColumnType::String);
    }

    #[test]
    fn test_load_json() {
        let json = r#"{"tables": [{"name": "Users", "columns": [{"name": "score", "type": "float"}]}]}"#;
        let file = write_temp(".json", json);
        let schema = Schema::load(file.path()).unwrap();

        let users = schema.lookup("Users").unwrap();
        assert_eq!(users.columns()[0].column_type(), &ColumnType::Float);
    }

    #[test]
    fn test_missing_file() {
        let err = Schema::load("/nonexistent/schema.yaml").unwrap_err();
        assert!(matches!(err, SchemaError::Io(..)));
    }

    #[test]
    fn test_parse_error() {
        let file = write_temp(".yaml", "tables: [ {name: ");
        let err = SchemaConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, SchemaError::Parse(..)));
    }

    #[test]
    fn test_validation_errors_surface() {
        let yaml = r#"
tables:
  - name: Users
    columns:
      - { name: friend, type: Users }
"#;
        let file = write_temp(".yml", yaml);
        let err = Schema::load(file.path()).unwrap_err();
        assert_eq!(err.kind(), SchemaErrorKind::Integrity);
    }

    #[test]
    fn test_config_roundtrip() {
        let config: SchemaConfig = serde_yaml::from_str(BLOG_YAML).unwrap();
        let schema = config.build().unwrap();

        let yaml = serde_yaml::to_string(&schema.to_config()).unwrap();
        let reparsed: SchemaConfig = serde_yaml::from_str(&yaml).unwrap();
        let rebuilt = reparsed.build().unwrap();

        assert_eq!(
            rebuilt.lookup("Posts").unwrap(),
            schema.lookup("Posts").unwrap()
        );
        assert_eq!(rebuilt.lookup("Users").unwrap().columns()[1].column_type(), &ColumnType::Integer);
    }
}
