// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter for deterministic testing.
//!
//! `MockChannel` implements `ChannelAdapter` with injectable inbound messages
//! and captured outbound messages for assertion in tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use intake_core::{
    AdapterType, ChannelAdapter, HealthStatus, InboundMessage, IntakeError, MediaPayload,
    MessageId, PluginAdapter, UserId,
};

/// One message delivered through the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub to: UserId,
    /// Text body, or the caption for media.
    pub text: String,
    pub media: Option<MediaPayload>,
}

/// A mock messaging channel for testing.
///
/// Provides two queues:
/// - **inbound**: Messages injected via `inject_message()` are returned by `receive()`
/// - **sent**: Texts and media sent by the engine, retrievable via `sent_messages()`
pub struct MockChannel {
    inbound: Arc<Mutex<VecDeque<InboundMessage>>>,
    sent: Arc<Mutex<Vec<SentMessage>>>,
    notify: Arc<Notify>,
    download: Mutex<Option<MediaPayload>>,
    fail_sends: AtomicBool,
    closed: AtomicBool,
    next_id: AtomicU64,
}

impl MockChannel {
    /// Create a new mock channel with empty queues.
    pub fn new() -> Self {
        Self {
            inbound: Arc::new(Mutex::new(VecDeque::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            notify: Arc::new(Notify::new()),
            download: Mutex::new(None),
            fail_sends: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
        }
    }

    /// Inject an inbound message into the receive queue.
    pub async fn inject_message(&self, msg: InboundMessage) {
        self.inbound.lock().await.push_back(msg);
        self.notify.notify_one();
    }

    /// Make `receive()` report a closed channel once the queue is empty.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    /// Media returned by `download_media()`. `None` makes downloads fail.
    pub async fn set_download(&self, media: Option<MediaPayload>) {
        *self.download.lock().await = media;
    }

    /// Make every send fail with a channel error.
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub async fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    /// Texts (and media captions) sent to `user`, in order.
    pub async fn texts_to(&self, user: &UserId) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|m| &m.to == user)
            .map(|m| m.text.clone())
            .collect()
    }

    pub async fn last_text_to(&self, user: &UserId) -> Option<String> {
        self.texts_to(user).await.pop()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }

    async fn record(&self, msg: SentMessage) -> Result<MessageId, IntakeError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(IntakeError::channel("mock delivery failure"));
        }
        self.sent.lock().await.push(msg);
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        Ok(MessageId(format!("mock-msg-{n}")))
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, IntakeError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), IntakeError> {
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    async fn connect(&mut self) -> Result<(), IntakeError> {
        Ok(())
    }

    async fn send_text(&self, to: &UserId, text: &str) -> Result<MessageId, IntakeError> {
        self.record(SentMessage {
            to: to.clone(),
            text: text.to_string(),
            media: None,
        })
        .await
    }

    async fn send_media(
        &self,
        to: &UserId,
        media: &MediaPayload,
        caption: &str,
    ) -> Result<MessageId, IntakeError> {
        self.record(SentMessage {
            to: to.clone(),
            text: caption.to_string(),
            media: Some(media.clone()),
        })
        .await
    }

    async fn download_media(&self, _msg: &InboundMessage) -> Result<MediaPayload, IntakeError> {
        self.download
            .lock()
            .await
            .clone()
            .ok_or_else(|| IntakeError::channel("mock media unavailable"))
    }

    async fn receive(&self) -> Result<InboundMessage, IntakeError> {
        loop {
            {
                let mut queue = self.inbound.lock().await;
                if let Some(msg) = queue.pop_front() {
                    return Ok(msg);
                }
            }
            if self.closed.load(Ordering::SeqCst) {
                return Err(IntakeError::channel("mock channel closed"));
            }
            self.notify.notified().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn receive_returns_injected_messages_in_order() {
        let channel = MockChannel::new();
        channel
            .inject_message(InboundMessage::text("a@c.us", "first"))
            .await;
        channel
            .inject_message(InboundMessage::text("a@c.us", "second"))
            .await;

        assert_eq!(channel.receive().await.unwrap().body, "first");
        assert_eq!(channel.receive().await.unwrap().body, "second");
    }

    #[tokio::test]
    async fn receive_waits_for_injection() {
        let channel = Arc::new(MockChannel::new());
        let channel_clone = channel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            channel_clone
                .inject_message(InboundMessage::text("a@c.us", "delayed"))
                .await;
        });

        let received = tokio::time::timeout(Duration::from_secs(2), channel.receive())
            .await
            .expect("receive timed out")
            .unwrap();
        assert_eq!(received.body, "delayed");
    }

    #[tokio::test]
    async fn close_ends_receive_after_queue_drains() {
        let channel = MockChannel::new();
        channel
            .inject_message(InboundMessage::text("a@c.us", "last"))
            .await;
        channel.close();
        assert!(channel.receive().await.is_ok());
        let err = channel.receive().await.unwrap_err();
        assert!(err.to_string().contains("closed"));
    }

    #[tokio::test]
    async fn sends_are_captured_per_user() {
        let channel = MockChannel::new();
        let a = UserId::from("a@c.us");
        let b = UserId::from("b@c.us");
        channel.send_text(&a, "one").await.unwrap();
        channel.send_text(&b, "two").await.unwrap();
        let media = MediaPayload {
            mime_type: "image/png".into(),
            data: "AA==".into(),
            filename: None,
        };
        channel.send_media(&a, &media, "caption").await.unwrap();

        assert_eq!(channel.texts_to(&a).await, vec!["one", "caption"]);
        assert_eq!(channel.last_text_to(&b).await.as_deref(), Some("two"));
        assert_eq!(channel.sent_count().await, 3);
        channel.clear_sent().await;
        assert_eq!(channel.sent_count().await, 0);
    }

    #[tokio::test]
    async fn failing_sends_and_downloads() {
        let channel = MockChannel::new();
        let msg = InboundMessage::text("a@c.us", "");
        assert!(channel.download_media(&msg).await.is_err());

        channel.fail_sends(true);
        assert!(channel.send_text(&msg.from, "x").await.is_err());
        assert_eq!(channel.sent_count().await, 0);
    }
}
