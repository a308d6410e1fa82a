//! sqlref - a SQL cheat sheet in the terminal
//!
//! Loads the cheat-sheet document once, then answers topic, concept and
//! keyword queries against it.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use sqlref_core::SqlrefConfig;

mod catalog_cli;

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "sqlref",
    about = "Browse and search a SQL cheat sheet",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: catalog_cli::CatalogSubcommand,

    /// Cheat-sheet document to load instead of the built-in one
    #[clap(long, global = true)]
    document: Option<PathBuf>,

    /// Override configuration file path
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Set log level
    #[clap(long, default_value = "warn", global = true, env = "SQLREF_LOG_LEVEL")]
    log_level: LogLevel,

    /// Emit logs as JSON lines
    #[clap(long, global = true)]
    log_json: bool,

    /// Print results as JSON
    #[clap(long, global = true)]
    json: bool,
}

fn initialize_tracing(log_level: &LogLevel, log_json: bool) {
    let mut filter = EnvFilter::new(log_level.to_filter_directive());

    // RUST_LOG directives refine the chosen level
    if let Ok(extra) = std::env::var("RUST_LOG") {
        for directive in extra.split(',').map(str::trim).filter(|d| !d.is_empty()) {
            if let Ok(parsed) = directive.parse() {
                filter = filter.add_directive(parsed);
            }
        }
    }

    // Logs go to stderr; stdout carries command output only
    if log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_tracing(&cli.log_level, cli.log_json);

    let config = SqlrefConfig::discover(cli.config.as_deref())?;
    let document = cli.document.or_else(|| config.document.clone());
    debug!(?document, "Resolved cheat-sheet document");

    let catalog = catalog_cli::load_catalog(document.as_deref())?;
    cli.command.execute(&catalog, &config, cli.json)
}
