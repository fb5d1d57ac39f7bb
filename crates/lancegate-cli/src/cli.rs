//! CLI definition and command dispatch for lancegate.
//!
//! This module defines the command-line interface using `clap` and provides
//! the `run()` function that connects a [`Gateway`] and dispatches commands.
//!
//! ## Configuration Precedence
//!
//! Configuration is resolved with the following precedence (highest to lowest):
//! 1. CLI flags (`--location`, `--backend`, `--metric`)
//! 2. Environment variables (`LANCEGATE_LOCATION`, `LANCEGATE_BACKEND`)
//! 3. Config file (`~/.lancegate/config.yaml` or path from `--config`/`LANCEGATE_CONFIG`)
//! 4. Built-in defaults
//!
//! ## Exit Codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Success |
//! | 1 | Database or configuration failure |
//! | 2 | Invalid input |
//! | 3 | Table not found |

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use lancegate_core::{
    DatabaseErrorKind, Gateway, GatewayConfig, GatewayError, SearchQuery, TableConfig,
    TableInfo, VectorData, VectorMetric,
};

use crate::session;
use crate::ui::{format, table, ColorMode, MessageType, Style};

// ============================================================================
// CLI Definition
// ============================================================================

/// Version string including git commit hash
const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")");

/// lancegate – serialized gateway to an embedded vector store
#[derive(Parser, Debug)]
#[command(name = "lancegate")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, env = "LANCEGATE_VERBOSE")]
    pub verbose: bool,

    /// Path to configuration file (default: ~/.lancegate/config.yaml)
    #[arg(long, global = true, env = "LANCEGATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Store location (overrides LANCEGATE_LOCATION and the config file)
    #[arg(long, global = true)]
    pub location: Option<PathBuf>,

    /// Storage backend: lancedb or simple (overrides LANCEGATE_BACKEND)
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Distance metric: l2, cosine or dot
    #[arg(long, global = true)]
    pub metric: Option<VectorMetric>,

    /// Color output mode
    #[arg(long, global = true, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List tables in the store
    #[command(after_help = r#"EXAMPLES:
    # List tables with dimension and row count
    lancegate tables

    # Names only, as JSON
    lancegate tables --json
"#)]
    Tables {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Create a table, replacing any existing table with the same name
    #[command(after_help = r#"EXAMPLES:
    # Create a table for 384-dimensional embeddings
    lancegate create-table docs --dimension 384
"#)]
    CreateTable {
        /// Table name (letters, digits, '-' and '_')
        name: String,

        /// Vector dimension
        #[arg(long, short)]
        dimension: usize,
    },

    /// Add one vector to a table
    #[command(after_help = r#"EXAMPLES:
    # Add a vector with text
    lancegate add docs --vector 1,0,0 --text "hello"

    # Add a vector with metadata
    lancegate add docs --vector 0.1,0.2,0.3 --metadata '{"source":"manual"}'
"#)]
    Add {
        /// Target table
        table: String,

        /// Comma-separated vector components
        #[arg(long, allow_hyphen_values = true)]
        vector: String,

        /// Text stored with the vector
        #[arg(long)]
        text: Option<String>,

        /// JSON object stored as metadata
        #[arg(long)]
        metadata: Option<String>,
    },

    /// Find the nearest vectors in a table
    #[command(after_help = r#"EXAMPLES:
    # Top 5 neighbours
    lancegate search docs --vector 1,0,0 --limit 5

    # JSON output for scripting
    lancegate search docs --vector 1,0,0 --json | jq '.[0].text'
"#)]
    Search {
        /// Table to search
        table: String,

        /// Comma-separated query vector
        #[arg(long, allow_hyphen_values = true)]
        vector: String,

        /// Maximum number of results
        #[arg(long, short, default_value_t = lancegate_core::constants::DEFAULT_SEARCH_LIMIT)]
        limit: usize,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show dimension and row count of a table
    Describe {
        /// Table name
        table: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Connect and report the gateway status
    Status {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Serve JSON-lines requests from stdin over one connection
    #[command(after_help = r#"EXAMPLES:
    # One request per line, one response per line
    echo '{"op":"list_tables"}' | lancegate session

    # Supported ops: create_table, add_vector, search_vectors,
    # list_tables, describe_table, status
"#)]
    Session,
}

// ============================================================================
// Entry point
// ============================================================================

/// Run the CLI.
///
/// Returns exit code 0 on success, 2 for invalid input, 3 for a missing
/// table and 1 for any other failure.
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine-readable
    let log_level = if cli.verbose { "debug" } else { "warn" };
    let filter = format!(
        "lancegate_core={level},lancegate_db={level},lancegate_cli={level}",
        level = log_level
    );

    tracing_subscriber::fmt()
        .with_env_filter(&filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let style = Style::new(cli.color);

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            let hint = match &cli.config {
                Some(path) => format!("Check your config at {}", path.display()),
                None => "Check ~/.lancegate/config.yaml and LANCEGATE_* variables".to_string(),
            };
            eprintln!(
                "{}",
                style.error_with_context(
                    "Invalid configuration",
                    Some(&format!("{:#}", e)),
                    Some(&hint),
                )
            );
            return ExitCode::FAILURE;
        }
    };

    let gateway = Gateway::new(config);
    let result = gateway
        .connect()
        .map_err(anyhow::Error::from)
        .and_then(|()| dispatch(&style, &gateway, cli.command));

    if let Err(e) = gateway.disconnect() {
        tracing::warn!("Failed to disconnect: {}", e);
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&style, &e);
            ExitCode::from(exit_status(&e))
        }
    }
}

/// Resolve the gateway configuration from file, environment and flags.
fn resolve_config(cli: &Cli) -> anyhow::Result<GatewayConfig> {
    let mut config = match &cli.config {
        Some(path) => GatewayConfig::from_path(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => GatewayConfig::load_default().context("Failed to load user config")?,
    }
    .apply_env_overrides();

    if let Some(location) = &cli.location {
        config.location = location.clone();
    }
    if let Some(backend) = &cli.backend {
        config.backend = backend.clone();
    }
    if let Some(metric) = cli.metric {
        config.metric = metric;
    }

    config.validate()?;
    tracing::debug!("Resolved config: {:?}", config);
    Ok(config)
}

fn dispatch(style: &Style, gateway: &Gateway, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Tables { json } => handle_tables(style, gateway, json),
        Command::CreateTable { name, dimension } => {
            handle_create_table(style, gateway, name, dimension)
        }
        Command::Add {
            table,
            vector,
            text,
            metadata,
        } => handle_add(style, gateway, table, vector, text, metadata),
        Command::Search {
            table,
            vector,
            limit,
            json,
        } => handle_search(style, gateway, table, vector, limit, json),
        Command::Describe { table, json } => handle_describe(style, gateway, table, json),
        Command::Status { json } => handle_status(style, gateway, json),
        Command::Session => handle_session(gateway),
    }
}

// ============================================================================
// Error reporting
// ============================================================================

/// Map an error to the process exit status.
fn exit_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<GatewayError>() {
        Some(GatewayError::Validation { .. }) => 2,
        Some(e) if e.database_kind() == Some(DatabaseErrorKind::TableNotFound) => 3,
        _ => 1,
    }
}

fn report_error(style: &Style, err: &anyhow::Error) {
    let hint = match err.downcast_ref::<GatewayError>() {
        Some(e) => match e.database_kind() {
            Some(DatabaseErrorKind::TableNotFound) => {
                Some("Run `lancegate tables` to list tables")
            }
            Some(DatabaseErrorKind::Connect) => {
                Some("Check --location and that the directory is writable")
            }
            _ => None,
        },
        None => None,
    };

    let cause = err.chain().nth(1).map(|c| c.to_string());
    eprintln!(
        "{}",
        style.error_with_context(&err.to_string(), cause.as_deref(), hint)
    );
}

// ============================================================================
// Argument parsing
// ============================================================================

/// Parse a comma-separated vector such as `1,0,-0.5`.
fn parse_vector(raw: &str) -> Result<Vec<f32>, GatewayError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f32>()
                .map_err(|_| GatewayError::validation(format!("Invalid vector component '{}'", s)))
        })
        .collect()
}

/// Parse `--metadata`, which must be a JSON object.
fn parse_metadata(
    raw: Option<&str>,
) -> Result<Option<serde_json::Map<String, serde_json::Value>>, GatewayError> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Object(map)) => Ok(Some(map)),
        Ok(_) => Err(GatewayError::validation("Metadata must be a JSON object")),
        Err(e) => Err(GatewayError::validation(format!(
            "Metadata is not valid JSON: {}",
            e
        ))),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ============================================================================
// Command handlers
// ============================================================================

fn handle_tables(style: &Style, gateway: &Gateway, json: bool) -> anyhow::Result<()> {
    let names = gateway.list_tables()?;

    if json {
        return print_json(&names);
    }

    if names.is_empty() {
        println!(
            "{}",
            style.message(
                MessageType::Info,
                "No tables found. Run `lancegate create-table` to create one."
            )
        );
        return Ok(());
    }

    let infos = names
        .iter()
        .map(|name| gateway.describe_table(name))
        .collect::<Result<Vec<TableInfo>, _>>()?;

    println!("{}", style.section("TABLES"));
    println!();
    println!("{}", table::render_tables_table(&infos));
    Ok(())
}

fn handle_create_table(
    style: &Style,
    gateway: &Gateway,
    name: String,
    dimension: usize,
) -> anyhow::Result<()> {
    gateway.create_table(&TableConfig::new(&name, dimension))?;
    println!(
        "{}",
        style.message(
            MessageType::Ok,
            &format!(
                "Created table `{}` (dimension {})",
                style.table_name(&name),
                dimension
            )
        )
    );
    Ok(())
}

fn handle_add(
    style: &Style,
    gateway: &Gateway,
    table: String,
    vector: String,
    text: Option<String>,
    metadata: Option<String>,
) -> anyhow::Result<()> {
    let data = VectorData {
        vector: parse_vector(&vector)?,
        text,
        metadata: parse_metadata(metadata.as_deref())?,
    };
    gateway.add_vector(&table, &data)?;

    println!(
        "{}",
        style.message(
            MessageType::Ok,
            &format!("Added vector to `{}`", style.table_name(&table))
        )
    );
    println!(
        "{}",
        style.message_detail("Vector", &format::format_vector(&data.vector, 6))
    );
    Ok(())
}

fn handle_search(
    style: &Style,
    gateway: &Gateway,
    table: String,
    vector: String,
    limit: usize,
    json: bool,
) -> anyhow::Result<()> {
    let query = SearchQuery {
        vector: parse_vector(&vector)?,
        limit,
    };
    let hits = gateway.search_vectors(&table, &query)?;

    if json {
        return print_json(&hits);
    }

    if hits.is_empty() {
        println!(
            "{}",
            style.message(
                MessageType::Info,
                &format!("No vectors in `{}` yet", style.table_name(&table))
            )
        );
        return Ok(());
    }

    println!(
        "{}",
        style.message(
            MessageType::Ok,
            &format!("{} result(s) from `{}`", hits.len(), style.table_name(&table))
        )
    );
    println!();
    println!("{}", table::render_search_table(&hits));
    Ok(())
}

fn handle_describe(
    style: &Style,
    gateway: &Gateway,
    table: String,
    json: bool,
) -> anyhow::Result<()> {
    let info = gateway.describe_table(&table)?;

    if json {
        return print_json(&info);
    }

    println!("{}", style.section(&info.name));
    println!("{}", style.key_value("Dimension", &info.dimension.to_string()));
    println!("{}", style.key_value("Rows", &info.rows.to_string()));
    Ok(())
}

fn handle_status(style: &Style, gateway: &Gateway, json: bool) -> anyhow::Result<()> {
    let status = gateway.status();

    if json {
        return print_json(&status);
    }

    let state = if status.connected {
        "connected"
    } else {
        "disconnected"
    };
    println!("{}", style.section("STATUS"));
    println!("{}", style.key_value("State", state));
    println!("{}", style.key_value("Location", &status.location));
    println!("{}", style.key_value("Backend", &status.backend));
    println!(
        "{}",
        style.key_value("Metric", gateway.config().metric.as_str())
    );
    if let Some(since) = status
        .connected_at
        .as_deref()
        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
    {
        println!(
            "{}",
            style.key_value(
                "Connected",
                &format::format_relative_time(since.with_timezone(&Utc))
            )
        );
    }
    println!(
        "{}",
        style.key_value("Tables", &gateway.list_tables()?.len().to_string())
    );
    Ok(())
}

fn handle_session(gateway: &Gateway) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let summary = session::run_session(gateway, stdin.lock(), stdout.lock())
        .context("Session I/O failed")?;
    tracing::info!(
        "Session served {} requests ({} failed)",
        summary.requests,
        summary.failures
    );
    Ok(())
}
