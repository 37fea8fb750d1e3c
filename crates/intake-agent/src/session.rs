// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user conversation sessions and the stores that hold them.
//!
//! A session exists only while a user is inside a flow. "Start" is the
//! absence of a session.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use intake_core::{IntakeError, SessionSnapshot, TicketSummary, UserId};

/// Where a user is in the conversation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    /// Welcome sent, waiting for yes/no.
    ConfirmStart,
    AwaitSchoolCode,
    AwaitStudentPin,
    /// Accumulating the issue description and optional media.
    AwaitDetailsAndMedia,
    /// Greeted a user who still has active tickets.
    ExistingTicketChoice,
    AwaitCloseSelection,
    /// The user typed a stop word.
    AwaitStopChoice,
    /// Support resolved a ticket; waiting for 1 (resolved) or 2 (reopen).
    AwaitNumericConfirmation,
    AwaitReopenReason,
}

impl Stage {
    /// Stages of the intake flow that hold a freshly issued ticket id.
    pub fn holds_reservation(self) -> bool {
        matches!(
            self,
            Stage::AwaitSchoolCode | Stage::AwaitStudentPin | Stage::AwaitDetailsAndMedia
        )
    }
}

/// Ticket fields collected during the intake flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketDraft {
    pub school_code: String,
    pub student_id: String,
    pub issue_description: String,
    /// `data:` URL of the attached media, empty when none.
    pub screenshot_url: String,
    pub user_comments: String,
}

/// Status recorded for tickets created through the chat flow.
pub const NEW_TICKET_STATUS: &str = "In Progress";

/// One user's conversation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub stage: Stage,
    pub ticket_id: Option<String>,
    /// Mirror of the ticket status sent on creation.
    pub status: Option<String>,
    pub details: TicketDraft,
    /// Active tickets shown in the greeting menu.
    pub existing_tickets: Vec<TicketSummary>,
    /// Stage and details at the moment the user stopped. Kept, not yet used.
    pub previous_stage: Option<Stage>,
    pub previous_details: Option<TicketDraft>,
    /// Resolution text from support, for closing the ticket.
    pub resolution: Option<String>,
    pub touched_at: Instant,
}

impl Session {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            ticket_id: None,
            status: None,
            details: TicketDraft::default(),
            existing_tickets: Vec::new(),
            previous_stage: None,
            previous_details: None,
            resolution: None,
            touched_at: Instant::now(),
        }
    }

    /// A fresh intake flow for `ticket_id`, asking for the school code.
    pub fn drafting(ticket_id: String) -> Self {
        Self {
            ticket_id: Some(ticket_id),
            status: Some(NEW_TICKET_STATUS.to_string()),
            ..Self::new(Stage::AwaitSchoolCode)
        }
    }

    pub fn choosing(existing_tickets: Vec<TicketSummary>) -> Self {
        Self {
            existing_tickets,
            ..Self::new(Stage::ExistingTicketChoice)
        }
    }

    /// The stop menu, remembering what the user was doing.
    pub fn stopped(previous: Option<&Session>) -> Self {
        Self {
            previous_stage: previous.map(|s| s.stage),
            previous_details: Some(previous.map(|s| s.details.clone()).unwrap_or_default()),
            ..Self::new(Stage::AwaitStopChoice)
        }
    }

    pub fn awaiting_confirmation(ticket_id: String, resolution: String) -> Self {
        Self {
            ticket_id: Some(ticket_id),
            resolution: Some(resolution),
            ..Self::new(Stage::AwaitNumericConfirmation)
        }
    }

    pub fn idle_for(&self) -> Duration {
        self.touched_at.elapsed()
    }

    pub fn snapshot(&self, user: &UserId) -> SessionSnapshot {
        SessionSnapshot {
            user: user.clone(),
            stage: self.stage.to_string(),
            ticket_id: self.ticket_id.clone(),
            idle_secs: self.idle_for().as_secs(),
        }
    }
}

/// Where sessions live between messages.
///
/// The engine serializes access per user, so implementations only need to
/// be safe across different users.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    async fn get(&self, user: &UserId) -> Result<Option<Session>, IntakeError>;

    /// Insert or replace, refreshing `touched_at`.
    async fn put(&self, user: &UserId, session: Session) -> Result<(), IntakeError>;

    async fn delete(&self, user: &UserId) -> Result<Option<Session>, IntakeError>;

    /// Refresh `touched_at` without changing anything else.
    async fn touch(&self, user: &UserId) -> Result<(), IntakeError>;

    /// Users whose sessions have been idle for at least `ttl`.
    async fn idle_users(&self, ttl: Duration) -> Result<Vec<UserId>, IntakeError>;

    /// Remove the session only if it is still idle for at least `ttl`.
    async fn remove_if_idle(
        &self,
        user: &UserId,
        ttl: Duration,
    ) -> Result<Option<Session>, IntakeError>;

    async fn snapshot(&self) -> Result<Vec<SessionSnapshot>, IntakeError>;

    async fn len(&self) -> Result<usize, IntakeError>;
}

/// Process-local session store. Lost on restart.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: DashMap<UserId, Session>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, user: &UserId) -> Result<Option<Session>, IntakeError> {
        Ok(self.sessions.get(user).map(|s| s.value().clone()))
    }

    async fn put(&self, user: &UserId, mut session: Session) -> Result<(), IntakeError> {
        session.touched_at = Instant::now();
        self.sessions.insert(user.clone(), session);
        Ok(())
    }

    async fn delete(&self, user: &UserId) -> Result<Option<Session>, IntakeError> {
        Ok(self.sessions.remove(user).map(|(_, s)| s))
    }

    async fn touch(&self, user: &UserId) -> Result<(), IntakeError> {
        if let Some(mut session) = self.sessions.get_mut(user) {
            session.touched_at = Instant::now();
        }
        Ok(())
    }

    async fn idle_users(&self, ttl: Duration) -> Result<Vec<UserId>, IntakeError> {
        Ok(self
            .sessions
            .iter()
            .filter(|entry| entry.value().idle_for() >= ttl)
            .map(|entry| entry.key().clone())
            .collect())
    }

    async fn remove_if_idle(
        &self,
        user: &UserId,
        ttl: Duration,
    ) -> Result<Option<Session>, IntakeError> {
        Ok(self
            .sessions
            .remove_if(user, |_, session| session.idle_for() >= ttl)
            .map(|(_, s)| s))
    }

    async fn snapshot(&self) -> Result<Vec<SessionSnapshot>, IntakeError> {
        let mut all: Vec<SessionSnapshot> = self
            .sessions
            .iter()
            .map(|entry| entry.value().snapshot(entry.key()))
            .collect();
        all.sort_by(|a, b| a.user.cmp(&b.user));
        Ok(all)
    }

    async fn len(&self) -> Result<usize, IntakeError> {
        Ok(self.sessions.len())
    }
}
