// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket gateway trait for the remote ticket-of-record store.

use async_trait::async_trait;

use crate::error::IntakeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{NewTicket, TicketDetails, TicketStatus, TicketSummary, UserId};

/// Adapter for the external store that owns ticket records.
///
/// Every operation either succeeds or returns an [`IntakeError::Gateway`];
/// callers decide whether a failure is user visible.
#[async_trait]
pub trait TicketGateway: PluginAdapter {
    /// Records a completed ticket.
    async fn create(&self, ticket: &NewTicket) -> Result<(), IntakeError>;

    /// Moves a ticket to `status`. `resolution` may be empty.
    async fn update_status(
        &self,
        ticket_id: &str,
        status: &TicketStatus,
        resolution: &str,
    ) -> Result<(), IntakeError>;

    /// Appends the user's reason for reopening a ticket.
    async fn append_reopen_reason(
        &self,
        ticket_id: &str,
        reason: &str,
        timestamp: &str,
    ) -> Result<(), IntakeError>;

    /// Appends a resolution comment written by the support team.
    async fn append_resolution(&self, ticket_id: &str, resolution: &str)
    -> Result<(), IntakeError>;

    /// Lists every ticket raised by `user`, in the store's order.
    async fn list_tickets_for_user(&self, user: &UserId)
    -> Result<Vec<TicketSummary>, IntakeError>;

    /// Fetches a ticket's details, or `None` when the store has no such ticket.
    async fn get_details(&self, ticket_id: &str) -> Result<Option<TicketDetails>, IntakeError>;
}
