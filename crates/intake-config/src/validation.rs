// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as bind addresses, ticket id format, and non-zero timeouts.

use crate::diagnostic::ConfigError;
use crate::model::IntakeConfig;

/// Widest zero padding accepted for ticket ids.
const MAX_PAD_WIDTH: usize = 12;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &IntakeConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.gateway.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::validation("gateway.host must not be empty"));
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::validation(format!(
                "gateway.host `{host}` is not a valid IP address or hostname"
            )));
        }
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    let prefix = &config.tickets.prefix;
    if prefix.is_empty() {
        errors.push(ConfigError::validation("tickets.prefix must not be empty"));
    } else if prefix.chars().any(|c| c.is_ascii_digit() || c.is_whitespace()) {
        errors.push(ConfigError::validation(format!(
            "tickets.prefix `{prefix}` must not contain digits or whitespace"
        )));
    }

    if !(1..=MAX_PAD_WIDTH).contains(&config.tickets.pad_width) {
        errors.push(ConfigError::validation(format!(
            "tickets.pad_width must be between 1 and {MAX_PAD_WIDTH}, got {}",
            config.tickets.pad_width
        )));
    }

    for (key, value) in [
        (
            "conversation.session_ttl_secs",
            config.conversation.session_ttl_secs,
        ),
        (
            "conversation.reap_interval_secs",
            config.conversation.reap_interval_secs,
        ),
        (
            "conversation.gateway_timeout_secs",
            config.conversation.gateway_timeout_secs,
        ),
        ("sheets.timeout_secs", config.sheets.timeout_secs),
        (
            "service.keep_alive_interval_secs",
            config.service.keep_alive_interval_secs,
        ),
    ] {
        if value == 0 {
            errors.push(ConfigError::validation(format!(
                "{key} must be greater than zero"
            )));
        }
    }

    for (key, url) in [
        ("sheets.webhook_url", config.sheets.webhook_url.as_deref()),
        ("service.keep_alive_url", config.service.keep_alive_url.as_deref()),
        ("whatsapp.api_base_url", Some(config.whatsapp.api_base_url.as_str())),
    ] {
        if let Some(url) = url
            && !(url.starts_with("https://") || url.starts_with("http://"))
        {
            errors.push(ConfigError::validation(format!(
                "{key} must be an http(s) URL, got `{url}`"
            )));
        }
    }

    if config.gateway.bearer_token.as_deref() == Some("") {
        errors.push(ConfigError::validation(
            "gateway.bearer_token must not be empty when set",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
