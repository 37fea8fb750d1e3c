// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for the chat network the service listens on.

use async_trait::async_trait;

use crate::error::IntakeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{InboundMessage, MediaPayload, MessageId, UserId};

/// Adapter for bidirectional chat integrations.
///
/// The conversation engine only needs to send text, send media with a
/// caption, fetch media attached to an inbound message, and receive the
/// next inbound message.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Establishes a connection to the messaging platform.
    async fn connect(&mut self) -> Result<(), IntakeError>;

    /// Sends a plain text message.
    async fn send_text(&self, to: &UserId, text: &str) -> Result<MessageId, IntakeError>;

    /// Sends a media attachment with a caption.
    async fn send_media(
        &self,
        to: &UserId,
        media: &MediaPayload,
        caption: &str,
    ) -> Result<MessageId, IntakeError>;

    /// Downloads the media attached to an inbound message.
    async fn download_media(&self, msg: &InboundMessage) -> Result<MediaPayload, IntakeError>;

    /// Receives the next inbound message from the channel.
    async fn receive(&self) -> Result<InboundMessage, IntakeError>;
}
