// SPDX-FileCopyrightText: 2026 Outlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `outlay status` command implementation.
//!
//! Checks the server's health endpoint once and reports whether it is up,
//! its version and uptime. An unreachable server is reported, not treated
//! as an error.

use outlay_client::{ClientError, ExpenseClient, HealthReport};
use outlay_config::model::OutlayConfig;
use outlay_core::OutlayError;
use serde::Serialize;

use crate::CommandError;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub running: bool,
    pub status: String,
    pub version: Option<String>,
    pub uptime_secs: Option<u64>,
    pub uptime_human: Option<String>,
    pub base_url: String,
}

impl StatusResponse {
    fn from_health(base_url: &str, health: Result<HealthReport, ClientError>) -> Self {
        match health {
            Ok(health) => Self {
                running: true,
                uptime_human: Some(format_uptime(health.uptime_secs)),
                uptime_secs: Some(health.uptime_secs),
                version: Some(health.version),
                status: health.status,
                base_url: base_url.to_string(),
            },
            Err(e) => Self {
                running: false,
                status: format!("not running ({e})"),
                version: None,
                uptime_secs: None,
                uptime_human: None,
                base_url: base_url.to_string(),
            },
        }
    }
}

/// Format seconds into a human-readable duration string.
fn format_uptime(secs: u64) -> String {
    let days = secs / 86400;
    let hours = (secs % 86400) / 3600;
    let minutes = (secs % 3600) / 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Runs the `outlay status` command.
pub async fn run_status(config: &OutlayConfig, json: bool) -> Result<(), CommandError> {
    let client = ExpenseClient::new(config)?;
    let response = StatusResponse::from_health(&config.client.base_url, client.health().await);

    if json {
        let out = serde_json::to_string_pretty(&response)
            .map_err(|e| OutlayError::Internal(format!("failed to encode status: {e}")))?;
        println!("{out}");
    } else {
        print_status(&response);
    }
    Ok(())
}

fn print_status(response: &StatusResponse) {
    println!();
    println!("  outlay status");
    println!("  {}", "-".repeat(35));
    match (&response.version, &response.uptime_human) {
        (Some(version), Some(uptime)) if response.running => {
            println!("    State:    [OK] {} (uptime: {uptime})", response.status);
            println!("    Version:  {version}");
        }
        _ => println!("    State:    [FAIL] {}", response.status),
    }
    println!("    Endpoint: {}", response.base_url);
    if !response.running {
        println!();
        println!("  Start with: outlay serve");
    }
    println!();
}
