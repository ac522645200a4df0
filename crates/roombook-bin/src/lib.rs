// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # roombook-bin
//!
//! CLI binary for the roombook account service.
//!
//! This crate provides the main binary entry point, including:
//!
//! - CLI argument parsing with clap
//! - Configuration loading (YAML, TOML, JSON) with environment overrides
//! - Service runtime orchestration
//! - Graceful shutdown handling
//! - Logging initialization
//!
//! ## Usage
//!
//! ```bash
//! # Start the service (default command)
//! roombook
//!
//! # Start with custom config
//! roombook -c /etc/roombook/config.yaml
//!
//! # Validate configuration
//! roombook validate
//!
//! # Show version
//! roombook version
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod shutdown;

// =============================================================================
// Re-exports
// =============================================================================

pub use cli::{Cli, Commands};
pub use config::{ConfigError, ConfigFormat, ConfigLoader, RoombookConfig};
pub use error::{BinError, BinResult};
pub use logging::init_logging;
pub use runtime::ServiceRuntime;
pub use shutdown::{ShutdownCoordinator, ShutdownSignal};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
