// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Intake support desk.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Intake configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IntakeConfig {
    /// Process identity, logging, and keep-alive settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Ticket counter database settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Ticket identifier format.
    #[serde(default)]
    pub tickets: TicketsConfig,

    /// Conversation flow settings.
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Spreadsheet web-app ticket store settings.
    #[serde(default)]
    pub sheets: SheetsConfig,

    /// WhatsApp Cloud API settings.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    /// HTTP server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Process-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Name reported in logs and the health endpoint.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Public base URL pinged periodically to keep free-tier hosts awake.
    /// `None` disables the pinger.
    #[serde(default)]
    pub keep_alive_url: Option<String>,

    /// Seconds between keep-alive pings.
    #[serde(default = "default_keep_alive_interval_secs")]
    pub keep_alive_interval_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
            keep_alive_url: None,
            keep_alive_interval_secs: default_keep_alive_interval_secs(),
        }
    }
}

fn default_service_name() -> String {
    "intake".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_keep_alive_interval_secs() -> u64 {
    14 * 60
}

/// Ticket counter storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database holding the counter and reservations.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Legacy JSON counter file (`{"lastTicket": n}`) imported on first open.
    #[serde(default)]
    pub legacy_counter_file: Option<String>,

    /// Legacy JSON reservation file (`{"<user>": "<ticket id>"}`) imported on first open.
    #[serde(default)]
    pub legacy_reservations_file: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            legacy_counter_file: None,
            legacy_reservations_file: None,
        }
    }
}

fn default_database_path() -> String {
    "intake.db".to_string()
}

/// Ticket identifier format configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TicketsConfig {
    /// Fixed prefix of every ticket id.
    #[serde(default = "default_ticket_prefix")]
    pub prefix: String,

    /// Minimum number of digits; larger counters widen naturally.
    #[serde(default = "default_pad_width")]
    pub pad_width: usize,
}

impl Default for TicketsConfig {
    fn default() -> Self {
        Self {
            prefix: default_ticket_prefix(),
            pad_width: default_pad_width(),
        }
    }
}

fn default_ticket_prefix() -> String {
    "ULI".to_string()
}

fn default_pad_width() -> usize {
    4
}

/// Conversation engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConversationConfig {
    /// Sessions idle longer than this are reaped and their reservations released.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,

    /// How often the reaper runs.
    #[serde(default = "default_reap_interval_secs")]
    pub reap_interval_secs: u64,

    /// Upper bound on every ticket gateway call.
    #[serde(default = "default_gateway_timeout_secs")]
    pub gateway_timeout_secs: u64,

    /// Brand shown in greetings and farewells.
    #[serde(default = "default_brand_name")]
    pub brand_name: String,

    /// Phone number offered for urgent assistance.
    #[serde(default = "default_support_phone")]
    pub support_phone: String,

    /// Email address offered after a ticket is created.
    #[serde(default = "default_support_email")]
    pub support_email: String,

    /// Image sent with the welcome caption. `None` sends the caption as text.
    #[serde(default)]
    pub intro_image_path: Option<String>,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: default_session_ttl_secs(),
            reap_interval_secs: default_reap_interval_secs(),
            gateway_timeout_secs: default_gateway_timeout_secs(),
            brand_name: default_brand_name(),
            support_phone: default_support_phone(),
            support_email: default_support_email(),
            intro_image_path: None,
        }
    }
}

fn default_session_ttl_secs() -> u64 {
    30 * 60
}

fn default_reap_interval_secs() -> u64 {
    60
}

fn default_gateway_timeout_secs() -> u64 {
    20
}

fn default_brand_name() -> String {
    "Ulipsu Support".to_string()
}

fn default_support_phone() -> String {
    "+91 88848 19888".to_string()
}

fn default_support_email() -> String {
    "support@ulipsu.com".to_string()
}

/// Spreadsheet web-app configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SheetsConfig {
    /// Deployed web-app URL. Required by `serve`.
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_sheets_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_secs: default_sheets_timeout_secs(),
        }
    }
}

fn default_sheets_timeout_secs() -> u64 {
    15
}

/// WhatsApp Cloud API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhatsAppConfig {
    /// Permanent or system-user access token.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Phone number id messages are sent from.
    #[serde(default)]
    pub phone_number_id: Option<String>,

    /// Token echoed back during the webhook verification handshake.
    #[serde(default)]
    pub verify_token: Option<String>,

    /// App secret for `X-Hub-Signature-256` verification. `None` skips verification.
    #[serde(default)]
    pub app_secret: Option<String>,

    /// Graph API base URL including version.
    #[serde(default = "default_whatsapp_api_base")]
    pub api_base_url: String,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            phone_number_id: None,
            verify_token: None,
            app_secret: None,
            api_base_url: default_whatsapp_api_base(),
        }
    }
}

fn default_whatsapp_api_base() -> String {
    "https://graph.facebook.com/v21.0".to_string()
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bearer token required on webhook and `/v1` routes. `None` leaves them open.
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
            bearer_token: None,
        }
    }
}

fn default_gateway_host() -> String {
    "0.0.0.0".to_string()
}

fn default_gateway_port() -> u16 {
    3000
}
