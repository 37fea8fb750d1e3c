// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket counter trait: durable id issuance with per-user reservations.

use async_trait::async_trait;

use crate::error::IntakeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ReleaseOutcome, Reservation, UserId};

/// Durable source of ticket identifiers.
///
/// Implementations must persist the counter and the reservation table
/// together before any method returns, and serialize all mutations.
#[async_trait]
pub trait TicketCounter: PluginAdapter {
    /// Consumes the user's reservation if one exists, otherwise issues the
    /// next id and records it as the user's reservation.
    async fn reserve_or_issue(&self, user: &UserId) -> Result<String, IntakeError>;

    /// Drops the user's reservation. The counter is rolled back only when the
    /// reserved id is the most recently issued one.
    async fn release(&self, user: &UserId) -> Result<ReleaseOutcome, IntakeError>;

    /// Drops the user's reservation without touching the counter.
    ///
    /// Returns `false` when there was nothing to finalize.
    async fn finalize(&self, user: &UserId) -> Result<bool, IntakeError>;

    /// Current counter value.
    async fn last_issued(&self) -> Result<u64, IntakeError>;

    /// The user's outstanding reservation, if any.
    async fn reservation_for(&self, user: &UserId) -> Result<Option<String>, IntakeError>;

    /// All outstanding reservations, oldest first.
    async fn list_reservations(&self) -> Result<Vec<Reservation>, IntakeError>;
}
