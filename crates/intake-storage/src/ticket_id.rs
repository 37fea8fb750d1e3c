// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket identifier formatting: a fixed prefix plus a zero-padded counter.

use intake_config::model::TicketsConfig;

/// How counter values are rendered as ticket ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketIdFormat {
    prefix: String,
    pad_width: usize,
}

impl TicketIdFormat {
    pub fn new(prefix: impl Into<String>, pad_width: usize) -> Self {
        Self {
            prefix: prefix.into(),
            pad_width,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// `ULI` + `7` renders as `ULI0007`; values wider than the padding are kept whole.
    pub fn format(&self, number: u64) -> String {
        format!("{}{:0width$}", self.prefix, number, width = self.pad_width)
    }

    /// Numeric suffix of an id carrying this prefix.
    pub fn parse(&self, ticket_id: &str) -> Option<u64> {
        let digits = ticket_id.strip_prefix(&self.prefix)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }
}

impl Default for TicketIdFormat {
    fn default() -> Self {
        Self::from(&TicketsConfig::default())
    }
}

impl From<&TicketsConfig> for TicketIdFormat {
    fn from(config: &TicketsConfig) -> Self {
        Self::new(config.prefix.clone(), config.pad_width)
    }
}
