// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for the `roombook` binary.
//!
//! Every failure maps to a process exit code:
//!
//! | Code | Meaning                                    |
//! |------|--------------------------------------------|
//! | 1    | configuration rejected (or strict warnings) |
//! | 2    | startup failed (logging, state, seeding)   |
//! | 3    | server failed or its task aborted          |
//! | 4    | a report could not be rendered             |

use roombook_api::ApiError;
use roombook_core::SeedError;
use thiserror::Error;

use crate::config::ConfigError;

/// Exit code for configuration failures.
pub const EXIT_CONFIG: i32 = 1;
/// Exit code for startup failures.
pub const EXIT_STARTUP: i32 = 2;
/// Exit code for server failures.
pub const EXIT_SERVER: i32 = 3;
/// Exit code for output failures.
pub const EXIT_OUTPUT: i32 = 4;

/// Result type alias for roombook-bin operations.
pub type BinResult<T> = Result<T, BinError>;

/// Failures of the `roombook` commands.
#[derive(Debug, Error)]
pub enum BinError {
    /// The configuration could not be loaded or is invalid.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// `validate --strict` found warnings.
    #[error("strict mode: {count} warning(s) found")]
    StrictWarnings {
        /// Number of warnings.
        count: usize,
    },

    /// Something needed before serving could not be set up.
    #[error("startup failed: {0}")]
    Startup(String),

    /// Demo data could not be written.
    #[error("seeding demo data failed: {0}")]
    Seed(#[from] SeedError),

    /// The HTTP server (or the state it needs) failed.
    #[error("server error: {0}")]
    Server(#[from] ApiError),

    /// The server task panicked or was cancelled.
    #[error("server task aborted: {0}")]
    Aborted(#[from] tokio::task::JoinError),

    /// A command report could not be serialized.
    #[error("failed to render report: {0}")]
    Render(#[from] serde_json::Error),
}

impl BinError {
    /// Creates a startup error.
    pub fn startup(msg: impl Into<String>) -> Self {
        Self::Startup(msg.into())
    }

    /// Returns the process exit code.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::StrictWarnings { .. } => EXIT_CONFIG,
            Self::Startup(_) | Self::Seed(_) => EXIT_STARTUP,
            Self::Server(_) | Self::Aborted(_) => EXIT_SERVER,
            Self::Render(_) => EXIT_OUTPUT,
        }
    }
}

/// Prints `error` and its causes to stderr, then exits.
pub fn exit_with(error: BinError) -> ! {
    eprintln!("roombook: {}", error);

    let causes = std::iter::successors(std::error::Error::source(&error), |e| e.source());
    for cause in causes {
        eprintln!("  caused by: {}", cause);
    }

    std::process::exit(error.exit_code())
}
