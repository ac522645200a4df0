// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Command-line interface.
//!
//! `roombook` with no subcommand behaves like `roombook run`.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

/// roombook - account service for meeting-room booking
///
/// Serves registration, login, token refresh and account administration,
/// with every route guarded by declarative access rules.
#[derive(Parser, Debug)]
#[command(
    name = "roombook",
    author = "Sylvex <contact@sylvex.io>",
    version = crate::VERSION,
    about = "Account service for meeting-room booking",
    propagate_version = true
)]
pub struct Cli {
    /// Config file (YAML, TOML or JSON, chosen by extension)
    #[arg(
        short,
        long,
        default_value = "roombook.yaml",
        env = "ROOMBOOK_CONFIG",
        global = true
    )]
    pub config: PathBuf,

    /// Base log level; RUST_LOG overrides it
    #[arg(
        short,
        long,
        default_value = "info",
        env = "ROOMBOOK_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log line format
    #[arg(long, value_enum, default_value_t, env = "ROOMBOOK_LOG_FORMAT", global = true)]
    pub log_format: LogFormat,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Raise the log level (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand; `run` when omitted.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Serve the HTTP API until SIGINT/SIGTERM
    Run(RunArgs),

    /// Load the config file, report problems and exit
    Validate(ValidateArgs),

    /// Print crate versions and build target
    Version,
}

/// `roombook run` options.
#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// Create the demo roles and accounts before serving
    #[arg(long)]
    pub seed_demo_data: bool,
}

/// `roombook validate` options.
#[derive(Args, Debug, Default, Clone)]
pub struct ValidateArgs {
    /// Also print the parsed configuration (secrets omitted)
    #[arg(short, long)]
    pub show_config: bool,

    /// Report format
    #[arg(short, long, value_enum, default_value_t)]
    pub format: OutputFormat,

    /// Fail when the config produces warnings
    #[arg(long)]
    pub strict: bool,
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Multi-field text with colours on a terminal
    #[default]
    Text,
    /// One JSON object per event
    Json,
    /// Single-line text without targets
    Compact,
}

/// `validate` report format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Summary for humans
    #[default]
    Text,
    /// Machine-readable summary
    Json,
}

impl Cli {
    /// Parses `std::env::args`.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The subcommand to run; `run` when none was given.
    pub fn effective_command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Run(RunArgs::default()))
    }

    /// Log level after applying `-q` / `-v`.
    pub fn effective_log_level(&self) -> &str {
        match (self.quiet, self.verbose) {
            (true, _) => "warn",
            (false, 0) => &self.log_level,
            (false, 1) => "debug",
            (false, _) => "trace",
        }
    }
}
