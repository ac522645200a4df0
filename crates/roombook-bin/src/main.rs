// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! roombook: account service for meeting-room booking.
//!
//! Main binary entry point.

use roombook_bin::error::exit_with;
use roombook_bin::{commands, init_logging, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    if let Err(e) = init_logging(cli.effective_log_level(), cli.log_format) {
        exit_with(e);
    }

    if let Err(e) = commands::execute(cli).await {
        exit_with(e);
    }
}
