//! CLI argument parsing and command definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Caller ID (umode +g) and ACCEPT list engine for IRC servers
#[derive(Parser)]
#[command(
    name = "callerid",
    version,
    about = "Caller ID (umode +g) and ACCEPT list engine for IRC servers",
    long_about = "Processes a stream of IRC server events (connects, nick changes, quits, \
                  private messages, ACCEPT commands) and gates private messages to users \
                  in caller ID mode."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

/// Output encoding for replies and deliveries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    /// One JSON object per line (default)
    #[default]
    Json,
    /// IRC wire lines
    Irc,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Process server events from stdin (alias: serve)
    #[command(alias = "serve")]
    Run {
        /// Output encoding
        #[arg(long, short = 'f', default_value = "json")]
        format: Format,
    },
    /// Generate default configuration file
    Init {
        /// Path where to create the configuration file
        #[arg(long, short = 'p')]
        path: Option<PathBuf>,
    },
    /// Validate configuration file
    Check,
    /// Display version information
    Version,
}
