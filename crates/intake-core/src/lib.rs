// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Intake support desk.
//!
//! This crate provides the trait definitions, error type, and common types
//! shared by the conversation engine and its external collaborators: the
//! chat channel, the remote ticket store, and the ticket counter.

pub mod error;
pub mod traits;
pub mod types;

pub use error::IntakeError;
pub use types::{
    AdapterType, HealthStatus, InboundMessage, MediaPayload, MessageId, NewTicket, ReleaseOutcome,
    Reservation, ResolutionNotice, SessionSnapshot, TicketDetails, TicketStatus, TicketSummary,
    UserId, sheet_timestamp,
};

pub use traits::{
    ChannelAdapter, ConversationControl, PluginAdapter, StorageAdapter, TicketCounter,
    TicketGateway,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intake_error_has_all_variants() {
        let _config = IntakeError::Config("test".into());
        let _storage = IntakeError::storage("test");
        let _channel = IntakeError::channel("test");
        let _gateway = IntakeError::gateway("test");
        let _health = IntakeError::HealthCheckFailed {
            name: "test".into(),
            source: Box::new(std::io::Error::other("test")),
        };
        let timeout = IntakeError::Timeout {
            duration: std::time::Duration::from_secs(20),
        };
        assert!(timeout.is_timeout());
        assert_eq!(timeout.to_string(), "operation timed out after 20s");
        let _internal = IntakeError::Internal("test".into());
    }

    #[test]
    fn adapter_type_round_trips_through_strings() {
        use std::str::FromStr;

        for variant in [
            AdapterType::Channel,
            AdapterType::Storage,
            AdapterType::TicketGateway,
        ] {
            let parsed = AdapterType::from_str(&variant.to_string()).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_channel_adapter<T: ChannelAdapter>() {}
        fn _assert_ticket_gateway<T: TicketGateway>() {}
        fn _assert_ticket_counter<T: TicketCounter>() {}
        fn _assert_storage_adapter<T: StorageAdapter>() {}
        fn _assert_control<T: ConversationControl>() {}
    }
}
