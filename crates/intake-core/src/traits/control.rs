// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hooks the HTTP surface uses to reach the conversation engine.

use async_trait::async_trait;

use crate::error::IntakeError;
use crate::types::{ResolutionNotice, SessionSnapshot};

/// Out-of-band entry points into the conversation engine.
#[async_trait]
pub trait ConversationControl: Send + Sync + 'static {
    /// Tells the user their ticket was resolved and waits for them to
    /// confirm or reopen it.
    async fn ingest_resolution(&self, notice: ResolutionNotice) -> Result<(), IntakeError>;

    /// Conversations currently in flight.
    async fn active_sessions(&self) -> Result<Vec<SessionSnapshot>, IntakeError>;
}
