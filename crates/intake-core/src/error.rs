// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Intake support desk.

use thiserror::Error;

/// The primary error type used across all Intake adapter traits and core operations.
#[derive(Debug, Error)]
pub enum IntakeError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, corrupt counter state).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Chat channel errors (delivery failure, media download, webhook payloads).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Remote ticket store errors (network failure, non-success status, bad payload).
    #[error("ticket gateway error: {message}")]
    Gateway {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Adapter health check failed.
    #[error("health check failed for {name}: {source}")]
    HealthCheckFailed {
        name: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntakeError {
    /// Shorthand for a storage error carrying only a message.
    pub fn storage(message: impl Into<String>) -> Self {
        IntakeError::Storage {
            source: message.into().into(),
        }
    }

    /// Shorthand for a gateway error without an underlying source.
    pub fn gateway(message: impl Into<String>) -> Self {
        IntakeError::Gateway {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a channel error without an underlying source.
    pub fn channel(message: impl Into<String>) -> Self {
        IntakeError::Channel {
            message: message.into(),
            source: None,
        }
    }

    /// Returns `true` for errors raised by a bounded wait expiring.
    pub fn is_timeout(&self) -> bool {
        matches!(self, IntakeError::Timeout { .. })
    }
}
