// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `intake status` command implementation.
//!
//! Queries the gateway health endpoint and reports whether the service is
//! up, how long it has been running, and how many conversations are open.

use std::io::IsTerminal;
use std::time::Duration;

use intake_config::IntakeConfig;
use intake_core::IntakeError;
use serde::{Deserialize, Serialize};

/// Health endpoint response from the gateway.
#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
    uptime_secs: u64,
    #[serde(default)]
    sessions: usize,
}

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub running: bool,
    pub status: String,
    pub uptime_secs: Option<u64>,
    pub uptime_human: Option<String>,
    pub sessions: Option<usize>,
    pub endpoint: String,
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

/// Wildcard bind addresses are reached through loopback.
fn probe_host(host: &str) -> &str {
    match host {
        "0.0.0.0" | "::" | "[::]" => "127.0.0.1",
        other => other,
    }
}

/// Run the `intake status` command.
pub async fn run_status(config: &IntakeConfig, json: bool, plain: bool) -> Result<(), IntakeError> {
    let endpoint = format!(
        "http://{}:{}/health",
        probe_host(&config.gateway.host),
        config.gateway.port
    );

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(3))
        .build()
        .map_err(|e| IntakeError::Internal(format!("failed to create HTTP client: {e}")))?;

    let health = match client.get(&endpoint).send().await {
        Ok(resp) if resp.status().is_success() => Some(
            resp.json::<HealthResponse>()
                .await
                .map_err(|e| IntakeError::Internal(format!("failed to parse health response: {e}")))?,
        ),
        _ => None,
    };

    let report = match health {
        Some(h) => StatusResponse {
            running: true,
            status: h.status,
            uptime_secs: Some(h.uptime_secs),
            uptime_human: Some(format_uptime(h.uptime_secs)),
            sessions: Some(h.sessions),
            endpoint,
        },
        None => StatusResponse {
            running: false,
            status: "not running".to_string(),
            uptime_secs: None,
            uptime_human: None,
            sessions: None,
            endpoint,
        },
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        let use_color = !plain && std::io::stdout().is_terminal();
        print_status(&report, use_color);
    }
    Ok(())
}

fn print_status(report: &StatusResponse, use_color: bool) {
    use colored::Colorize;

    println!();
    println!("  intake status");
    println!("  {}", "-".repeat(35));

    if report.running {
        let uptime = report.uptime_human.as_deref().unwrap_or("?");
        if use_color {
            println!(
                "    State:    {} {} (uptime: {})",
                "✓".green(),
                report.status.green(),
                uptime
            );
        } else {
            println!("    State:    [OK] {} (uptime: {uptime})", report.status);
        }
        println!("    Sessions: {}", report.sessions.unwrap_or_default());
    } else {
        if use_color {
            println!("    State:    {} {}", "✗".red(), "not running".red());
        } else {
            println!("    State:    [FAIL] not running");
        }
        println!("    Endpoint: {}", report.endpoint);
        println!();
        println!("  Start with: intake serve");
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_uptime_ranges() {
        assert_eq!(format_uptime(120), "2m");
        assert_eq!(format_uptime(3720), "1h 2m");
        assert_eq!(format_uptime(90060), "1d 1h 1m");
    }

    #[test]
    fn wildcard_hosts_probe_loopback() {
        assert_eq!(probe_host("0.0.0.0"), "127.0.0.1");
        assert_eq!(probe_host("10.0.0.5"), "10.0.0.5");
    }

    #[test]
    fn status_response_serializes() {
        let resp = StatusResponse {
            running: false,
            status: "not running".to_string(),
            uptime_secs: None,
            uptime_human: None,
            sessions: None,
            endpoint: "http://127.0.0.1:3000/health".to_string(),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"running\":false"));
        assert!(json.contains("3000/health"));
    }

    #[test]
    fn health_response_tolerates_missing_sessions() {
        let h: HealthResponse =
            serde_json::from_str(r#"{"status":"ok","uptime_secs":5,"timestamp":"x"}"#).unwrap();
        assert_eq!(h.sessions, 0);
    }
}
