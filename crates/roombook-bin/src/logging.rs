// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins over `--log-level`. Without it, the chosen level applies
//! to the roombook crates and HTTP plumbing is held at `warn`/`info`.

use std::io::IsTerminal;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use crate::cli::LogFormat;
use crate::error::{BinError, BinResult};

/// Directives appended to the level so dependencies stay quiet.
const DEPENDENCY_DIRECTIVES: &str = "hyper=warn,tower=warn,tower_http=info,axum=info";

/// Installs the global subscriber.
///
/// Fails if one is already installed.
pub fn init_logging(level: &str, format: LogFormat) -> BinResult<()> {
    let ansi = std::io::stdout().is_terminal();

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match format {
        LogFormat::Text => fmt::layer().with_ansi(ansi).boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .with_ansi(ansi)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(build_filter(level))
        .try_init()
        .map_err(|e| BinError::startup(format!("logging: {}", e)))
}

fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| filter_for(level))
}

fn filter_for(level: &str) -> EnvFilter {
    EnvFilter::new(format!("{},{}", parse_level(level), DEPENDENCY_DIRECTIVES))
}

/// Parses a level name, falling back to `info` for anything unknown.
pub fn parse_level(level: &str) -> LevelFilter {
    let level = level.trim();
    if level.is_empty() {
        return LevelFilter::INFO;
    }
    level.parse().unwrap_or(LevelFilter::INFO)
}
