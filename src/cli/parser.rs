//! CLI argument parsing with clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::Environment;

use super::validation::{
    validate_config_file_path, validate_host_address, validate_port, validate_rollback_steps,
};

/// REST backend for users and their posts
#[derive(Parser, Debug)]
#[command(name = "pghub")]
#[command(about = "REST backend for users and their posts")]
#[command(long_about = "
pghub serves a JSON API for users, posts and post attachments on top of
PostgreSQL (or an in-process store for local runs).

EXAMPLES:
    # Start the server with the layered configuration from ./config
    pghub serve

    # Bind to every interface on port 8080
    pghub serve --host 0.0.0.0 --port 8080

    # Load a single configuration file
    pghub --config /etc/pghub/production.toml serve

    # Check the configuration without starting the server
    pghub serve --dry-run

    # Apply, preview or revert migrations
    pghub migrate
    pghub migrate --dry-run
    pghub migrate --rollback 1
")]
#[command(version = crate::clap_long_version())]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Load this TOML file instead of the layered config directory
    #[arg(short, long, value_name = "FILE", value_parser = validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Override PGHUB_APP_ENV
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,

    /// Log errors only
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start the web server (default)
    Serve {
        /// Host address to bind to
        #[arg(long, value_name = "ADDRESS", value_parser = validate_host_address)]
        host: Option<String>,

        /// Port number to listen on
        #[arg(short, long, value_name = "PORT", value_parser = validate_port)]
        port: Option<u16>,

        /// Log level for this run; wins over --verbose/--quiet
        #[arg(long, value_enum)]
        log_level: Option<LogLevel>,

        /// Validate the configuration and exit
        #[arg(long)]
        dry_run: bool,
    },
    /// Apply, list or revert database migrations
    Migrate {
        /// List pending migrations without applying them
        #[arg(long, conflicts_with = "rollback")]
        dry_run: bool,

        /// Revert this many of the most recent migrations (1-100)
        #[arg(long, value_name = "STEPS", value_parser = validate_rollback_steps)]
        rollback: Option<u32>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}
