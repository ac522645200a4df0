// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `run` command.

use tracing::{info, warn};

use crate::cli::{Cli, RunArgs};
use crate::config::ConfigLoader;
use crate::error::BinResult;
use crate::runtime::ServiceRuntime;

/// Executes the `run` command to start the service.
pub async fn run(cli: &Cli, args: RunArgs) -> BinResult<()> {
    info!(config = %cli.config.display(), "Loading configuration");

    let mut config = ConfigLoader::new().load_or_default(&cli.config)?;
    if args.seed_demo_data {
        config.seed_demo_data = true;
    }

    for warning in config.warnings() {
        warn!("{}", warning);
    }

    ServiceRuntime::new(config).run().await
}
