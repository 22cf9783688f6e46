//! easydb-cli - Command-line interface for EasyDB
//!
//! Runs one operation per invocation against a server, using a schema file
//! to encode rows.

mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use easydb_client::{Client, ConnectionConfig};
use easydb_schema::Schema;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "easydb-cli")]
#[command(about = "Command-line interface for the EasyDB database")]
#[command(version)]
struct Cli {
    /// Server host [default: EASYDB_HOST or 127.0.0.1]
    #[arg(long)]
    host: Option<String>,

    /// Server port [default: EASYDB_PORT or 8080]
    #[arg(short, long)]
    port: Option<u16>,

    /// Schema file (YAML or JSON)
    #[arg(short, long, env = "EASYDB_SCHEMA")]
    schema: PathBuf,

    /// Connection timeout in seconds
    #[arg(long, default_value = "10")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List tables and columns from the schema file
    Tables,

    /// Insert a row
    Insert {
        /// Table name
        table: String,

        /// Row values as a JSON array, e.g. '["Alice", 30]'
        values: String,
    },

    /// Replace a row
    Update {
        /// Table name
        table: String,

        /// Row id
        id: i64,

        /// Row values as a JSON array
        values: String,

        /// Expected row version (update is unconditional if omitted)
        #[arg(short, long)]
        version: Option<i64>,
    },

    /// Delete a row
    Drop {
        /// Table name
        table: String,

        /// Row id
        id: i64,
    },

    /// Fetch a row
    Get {
        /// Table name
        table: String,

        /// Row id
        id: i64,
    },

    /// Find row ids matching a predicate
    Scan {
        /// Table name
        table: String,

        /// Operator: al, eq, ne, lt, le, gt
        #[arg(short, long, default_value = "al")]
        op: String,

        /// Column name (`id` for the primary key)
        #[arg(short, long)]
        column: Option<String>,

        /// Operand as JSON, e.g. 30 or '"Alice"'
        #[arg(short, long)]
        value: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let schema = match Schema::load(&cli.schema) {
        Ok(schema) => schema,
        Err(e) => {
            eprintln!("{}: {}", "Invalid schema".red(), e);
            std::process::exit(1);
        }
    };

    // Schema listing needs no server connection
    if let Commands::Tables = cli.command {
        println!("{}", commands::format_tables(&schema));
        return Ok(());
    }

    // Flags take precedence over EASYDB_HOST, EASYDB_PORT and EASYDB_READ_BUFFER
    let mut config = ConnectionConfig::default()
        .with_env_overrides()
        .with_connect_timeout(std::time::Duration::from_secs(cli.timeout));
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    let client = Client::connect(schema, &config).await.map_err(|e| {
        eprintln!("{}: {}", "Connection failed".red(), e);
        e
    })?;

    match commands::execute(&client, cli.command).await {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            let _ = client.close().await;
            std::process::exit(1);
        }
    }

    client.close().await?;
    Ok(())
}
