// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `validate` command.

use crate::cli::{Cli, OutputFormat, ValidateArgs};
use crate::config::{ConfigLoader, RoombookConfig};
use crate::error::{BinError, BinResult};

/// Executes the `validate` command to validate configuration.
pub fn validate(cli: &Cli, args: ValidateArgs) -> BinResult<()> {
    let config_path = &cli.config;

    let config = ConfigLoader::new().load(config_path)?;

    let warnings = config.warnings();
    let report = render(&config, &config_path.display().to_string(), &warnings, &args)?;
    println!("{}", report);

    if args.strict && !warnings.is_empty() {
        return Err(BinError::StrictWarnings {
            count: warnings.len(),
        });
    }

    Ok(())
}

fn render(
    config: &RoombookConfig,
    path: &str,
    warnings: &[String],
    args: &ValidateArgs,
) -> BinResult<String> {
    let api = &config.api;

    match args.format {
        OutputFormat::Text => {
            let mut out = String::new();
            out.push_str(&format!("✓ Configuration is valid: {}\n\n", path));
            out.push_str("Summary:\n");
            out.push_str(&format!("  API: {}\n", api.socket_addr()));
            out.push_str(&format!(
                "  Access token TTL: {}s\n",
                api.jwt.access_expiration_secs
            ));
            out.push_str(&format!(
                "  Refresh token TTL: {}s\n",
                api.jwt.refresh_expiration_secs
            ));
            out.push_str(&format!(
                "  Invoke records: {}\n",
                if api.record.enabled { "enabled" } else { "disabled" }
            ));
            out.push_str(&format!(
                "  Demo data: {}\n",
                if config.seed_demo_data { "enabled" } else { "disabled" }
            ));

            if !warnings.is_empty() {
                out.push_str("\nWarnings:\n");
                for warning in warnings {
                    out.push_str(&format!("  ⚠ {}\n", warning));
                }
            }

            if args.show_config {
                let parsed = serde_json::to_string_pretty(config)?;
                out.push_str("\nParsed configuration:\n");
                out.push_str(&parsed);
            }

            Ok(out.trim_end().to_string())
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "valid": true,
                "config_path": path,
                "summary": {
                    "api_host": api.host.to_string(),
                    "api_port": api.port,
                    "access_expiration_secs": api.jwt.access_expiration_secs,
                    "refresh_expiration_secs": api.jwt.refresh_expiration_secs,
                    "record_enabled": api.record.enabled,
                    "seed_demo_data": config.seed_demo_data,
                },
                "warnings": warnings,
                "config": if args.show_config { Some(config) } else { None },
            });
            Ok(serde_json::to_string_pretty(&output)?)
        }
    }
}
