// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end conversation tests.
//!
//! `TestHarness` assembles a complete engine with mock channel and gateway
//! adapters and a real SQLite ticket counter in a temp directory.

use std::sync::Arc;
use std::time::Duration;

use intake_agent::{ConversationEngine, EngineSettings, Session, Stage};
use intake_config::model::{ConversationConfig, StorageConfig, TicketsConfig};
use intake_core::{InboundMessage, IntakeError, MediaPayload, TicketCounter, UserId};
use intake_storage::SqliteTicketCounter;

use crate::mock_channel::MockChannel;
use crate::mock_gateway::MockTicketGateway;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    conversation: ConversationConfig,
    tickets: TicketsConfig,
    gateway_timeout: Option<Duration>,
    session_ttl: Option<Duration>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            conversation: ConversationConfig::default(),
            tickets: TicketsConfig::default(),
            gateway_timeout: None,
            session_ttl: None,
        }
    }

    pub fn with_conversation(mut self, conversation: ConversationConfig) -> Self {
        self.conversation = conversation;
        self
    }

    pub fn with_tickets(mut self, tickets: TicketsConfig) -> Self {
        self.tickets = tickets;
        self
    }

    pub fn with_gateway_timeout(mut self, timeout: Duration) -> Self {
        self.gateway_timeout = Some(timeout);
        self
    }

    /// TTL below the one-second config granularity, for reaper tests.
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = Some(ttl);
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, IntakeError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| IntakeError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("intake-test.db");

        let storage = StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            legacy_counter_file: None,
            legacy_reservations_file: None,
        };
        let counter = Arc::new(SqliteTicketCounter::open(storage, &self.tickets).await?);
        let channel = Arc::new(MockChannel::new());
        let gateway = Arc::new(MockTicketGateway::new());

        let mut settings = EngineSettings::from(&self.conversation);
        if let Some(timeout) = self.gateway_timeout {
            settings.gateway_timeout = timeout;
        }
        if let Some(ttl) = self.session_ttl {
            settings.session_ttl = ttl;
        }

        let engine = ConversationEngine::new(
            channel.clone(),
            gateway.clone(),
            counter.clone(),
            &self.conversation,
        )
        .with_settings(settings);

        Ok(TestHarness {
            engine: Arc::new(engine),
            channel,
            gateway,
            counter,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete conversation stack for driving flows in tests.
pub struct TestHarness {
    pub engine: Arc<ConversationEngine>,
    pub channel: Arc<MockChannel>,
    pub gateway: Arc<MockTicketGateway>,
    pub counter: Arc<SqliteTicketCounter>,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// A harness with default configuration.
    pub async fn new() -> Result<Self, IntakeError> {
        Self::builder().build().await
    }

    /// Deliver a text message from `user` and wait for it to be handled.
    pub async fn send(&self, user: &str, text: &str) -> Result<(), IntakeError> {
        self.engine
            .handle_message(InboundMessage::text(user, text))
            .await
    }

    /// Deliver a message carrying media with `caption` as its body.
    pub async fn send_media(&self, user: &str, caption: &str) -> Result<(), IntakeError> {
        let mut msg = InboundMessage::text(user, caption);
        msg.has_media = true;
        msg.media_ref = Some(format!("media-{}", msg.id.0));
        self.engine.handle_message(msg).await
    }

    /// Make the next media downloads succeed with a small PNG.
    pub async fn media_available(&self) {
        self.channel
            .set_download(Some(MediaPayload {
                mime_type: "image/png".into(),
                data: "iVBORw0KGgo=".into(),
                filename: Some("shot.png".into()),
            }))
            .await;
    }

    pub async fn session(&self, user: &str) -> Option<Session> {
        self.engine
            .sessions()
            .get(&UserId::from(user))
            .await
            .ok()
            .flatten()
    }

    pub async fn stage(&self, user: &str) -> Option<Stage> {
        self.session(user).await.map(|s| s.stage)
    }

    pub async fn replies(&self, user: &str) -> Vec<String> {
        self.channel.texts_to(&UserId::from(user)).await
    }

    pub async fn last_reply(&self, user: &str) -> Option<String> {
        self.channel.last_text_to(&UserId::from(user)).await
    }

    pub async fn reservation(&self, user: &str) -> Option<String> {
        self.counter
            .reservation_for(&UserId::from(user))
            .await
            .ok()
            .flatten()
    }

    pub async fn last_issued(&self) -> u64 {
        self.counter.last_issued().await.unwrap_or_default()
    }

    /// Walk `user` from greeting to the description step and return the ticket id.
    pub async fn start_ticket(&self, user: &str) -> Result<String, IntakeError> {
        self.send(user, "Hi").await?;
        self.send(user, "yes").await?;
        self.send(user, "abc123").await?;
        self.send(user, "98765").await?;
        self.session(user)
            .await
            .and_then(|s| s.ticket_id)
            .ok_or_else(|| IntakeError::Internal("no ticket id after start".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn harness_builds_with_defaults() {
        let harness = TestHarness::new().await.unwrap();
        assert_eq!(harness.last_issued().await, 0);
        assert!(harness.stage("a@c.us").await.is_none());
    }

    #[tokio::test]
    async fn start_ticket_reaches_details_step() {
        let harness = TestHarness::new().await.unwrap();
        let id = harness.start_ticket("a@c.us").await.unwrap();
        assert_eq!(id, "ULI0001");
        assert_eq!(
            harness.stage("a@c.us").await,
            Some(Stage::AwaitDetailsAndMedia)
        );
        let session = harness.session("a@c.us").await.unwrap();
        assert_eq!(session.details.school_code, "ABC123");
        assert_eq!(session.details.student_id, "98765");
    }
}
