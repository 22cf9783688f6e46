//! Command execution.

use crate::Commands;
use colored::Colorize;
use easydb_client::Client;
use easydb_protocol::{Operator, RowLayout, Value, ValueKind};
use easydb_schema::{Schema, RESERVED_COLUMN};
use serde_json::Value as Json;

/// Executes a command and returns the formatted output.
pub async fn execute(client: &Client, cmd: Commands) -> Result<String, Box<dyn std::error::Error>> {
    match cmd {
        Commands::Tables => Ok(format_tables(client.schema())),

        Commands::Insert { table, values } => {
            let values = parse_row(client.schema(), &table, &values)?;
            let (id, version) = client.insert(&table, &values).await?;
            Ok(format!(
                "{} row {} in {} (version {})",
                "Inserted".green(),
                id.to_string().cyan(),
                table,
                version
            ))
        }

        Commands::Update {
            table,
            id,
            values,
            version,
        } => {
            let values = parse_row(client.schema(), &table, &values)?;
            let version = client.update(&table, id, &values, version).await?;
            Ok(format!(
                "{} row {} in {} (version {})",
                "Updated".green(),
                id.to_string().cyan(),
                table,
                version
            ))
        }

        Commands::Drop { table, id } => {
            client.drop(&table, id).await?;
            Ok(format!(
                "{} row {} from {}",
                "Dropped".green(),
                id.to_string().cyan(),
                table
            ))
        }

        Commands::Get { table, id } => {
            let (values, version) = client.get(&table, id).await?;
            Ok(format_row(client.schema(), &table, id, &values, version))
        }

        Commands::Scan {
            table,
            op,
            column,
            value,
        } => {
            let op: Operator = op.parse().map_err(|_| format!("unknown operator '{}'", op))?;
            let operand = match value {
                Some(raw) => {
                    let kind = column_kind(client.schema(), &table, column.as_deref());
                    Some(to_value(&parse_json_arg(&raw)?, kind)?)
                }
                None => None,
            };

            let ids = client
                .scan(&table, op, column.as_deref(), operand)
                .await?;

            if ids.is_empty() {
                return Ok("No matching rows".yellow().to_string());
            }
            Ok(ids
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join("\n"))
        }
    }
}

/// Lists the schema's tables with their numbers and columns.
pub fn format_tables(schema: &Schema) -> String {
    if schema.is_empty() {
        return "No tables declared".yellow().to_string();
    }

    let mut output = String::new();
    for table in schema.tables() {
        output.push_str(&format!(
            "{} {}\n",
            table.number().to_string().dimmed(),
            table.name().cyan().bold()
        ));
        for column in table.columns() {
            output.push_str(&format!(
                "    {}: {}\n",
                column.name(),
                column.column_type().to_string().yellow()
            ));
        }
    }
    output.trim_end().to_string()
}

fn format_row(schema: &Schema, table: &str, id: i64, values: &[Value], version: i64) -> String {
    let mut output = format!(
        "{} (version {})",
        format!("{} #{}", table, id).cyan().bold(),
        version
    );

    let names: Vec<&str> = schema
        .lookup(table)
        .map(|t| t.columns().iter().map(|c| c.name()).collect())
        .unwrap_or_default();

    for (index, value) in values.iter().enumerate() {
        let name = names.get(index).copied().unwrap_or("?");
        output.push_str(&format!("\n  {}: {}", name, value));
    }
    output
}

/// Returns the wire kind expected for `column` of `table`, if known.
fn column_kind(schema: &Schema, table: &str, column: Option<&str>) -> Option<ValueKind> {
    let column = column?;
    if column == RESERVED_COLUMN {
        return Some(ValueKind::Foreign);
    }
    let index = schema.lookup(table)?.column_index(column)?;
    let layout = RowLayout::for_table(schema, table)?;
    layout.kinds().get(index).copied()
}

/// Parses a JSON array into row values, guided by the table's column kinds.
///
/// Mismatched lengths and types are passed through so the client can report
/// them with its own errors.
fn parse_row(schema: &Schema, table: &str, arg: &str) -> Result<Vec<Value>, Box<dyn std::error::Error>> {
    let json = parse_json_arg(arg)?;
    let items = json
        .as_array()
        .ok_or("row values must be a JSON array")?;

    let kinds = RowLayout::for_table(schema, table)
        .map(|layout| layout.kinds().to_vec())
        .unwrap_or_default();

    items
        .iter()
        .enumerate()
        .map(|(index, item)| to_value(item, kinds.get(index).copied()))
        .collect()
}

/// Converts a JSON scalar into a row value.
///
/// JSON numbers become floats for float columns; elsewhere integral numbers
/// stay integers.
fn to_value(json: &Json, kind: Option<ValueKind>) -> Result<Value, Box<dyn std::error::Error>> {
    match json {
        Json::Number(n) => {
            if kind != Some(ValueKind::Float) {
                if let Some(v) = n.as_i64() {
                    return Ok(Value::Integer(v));
                }
            }
            n.as_f64()
                .map(Value::Float)
                .ok_or_else(|| format!("number out of range: {}", n).into())
        }
        Json::String(s) => Ok(Value::String(s.clone())),
        other => Err(format!("unsupported value: {}", other).into()),
    }
}

/// Parses a JSON argument (either inline JSON or @file.json).
fn parse_json_arg(arg: &str) -> Result<Json, Box<dyn std::error::Error>> {
    if let Some(path) = arg.strip_prefix('@') {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    } else {
        Ok(serde_json::from_str(arg)?)
    }
}
