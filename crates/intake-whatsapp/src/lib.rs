// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp channel adapter.
//!
//! Implements [`ChannelAdapter`] over the WhatsApp Cloud API: outbound
//! messages go through the Graph API, inbound messages arrive on a webhook
//! served by the HTTP gateway and are queued for [`ChannelAdapter::receive`].

pub mod api;
pub mod types;
pub mod webhook;

use async_trait::async_trait;
use axum::Router;
use intake_config::model::WhatsAppConfig;
use intake_core::{
    AdapterType, ChannelAdapter, HealthStatus, InboundMessage, IntakeError, MediaPayload,
    MessageId, PluginAdapter, UserId,
};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info};

use crate::api::CloudApiClient;
use crate::types::recipient_for;
use crate::webhook::WebhookState;

/// WhatsApp Cloud API channel adapter.
pub struct WhatsAppChannel {
    api: CloudApiClient,
    config: WhatsAppConfig,
    inbound_tx: mpsc::Sender<InboundMessage>,
    inbound_rx: Mutex<mpsc::Receiver<InboundMessage>>,
}

impl WhatsAppChannel {
    /// Creates the adapter. Requires `access_token` and `phone_number_id`.
    pub fn new(config: WhatsAppConfig) -> Result<Self, IntakeError> {
        let token = required(config.access_token.as_deref(), "whatsapp.access_token")?;
        let phone_id = required(config.phone_number_id.as_deref(), "whatsapp.phone_number_id")?;
        let api = CloudApiClient::new(token, phone_id, &config.api_base_url)?;
        let (inbound_tx, inbound_rx) = mpsc::channel(256);

        Ok(Self {
            api,
            config,
            inbound_tx,
            inbound_rx: Mutex::new(inbound_rx),
        })
    }

    /// Router for the inbound webhook, to be merged into the HTTP gateway.
    pub fn webhook_router(&self) -> Router {
        webhook::router(WebhookState {
            inbound_tx: self.inbound_tx.clone(),
            verify_token: self.config.verify_token.clone(),
            app_secret: self.config.app_secret.clone(),
        })
    }
}

fn required<'a>(value: Option<&'a str>, key: &str) -> Result<&'a str, IntakeError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(IntakeError::Config(format!(
            "{key} is required for the WhatsApp adapter"
        ))),
    }
}

#[async_trait]
impl PluginAdapter for WhatsAppChannel {
    fn name(&self) -> &str {
        "whatsapp"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, IntakeError> {
        match self.api.ping().await {
            Ok(()) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "WhatsApp Cloud API unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), IntakeError> {
        debug!("WhatsApp channel shutting down");
        self.inbound_rx.lock().await.close();
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for WhatsAppChannel {
    async fn connect(&mut self) -> Result<(), IntakeError> {
        if self.config.verify_token.is_none() {
            tracing::warn!("whatsapp.verify_token is not set, webhook subscription cannot be verified");
        }
        if self.config.app_secret.is_none() {
            tracing::warn!("whatsapp.app_secret is not set, webhook signatures are not checked");
        }
        info!(path = webhook::WEBHOOK_PATH, "WhatsApp channel ready for webhook deliveries");
        Ok(())
    }

    async fn send_text(&self, to: &UserId, text: &str) -> Result<MessageId, IntakeError> {
        self.api.send_text(recipient_for(to), text).await
    }

    async fn send_media(
        &self,
        to: &UserId,
        media: &MediaPayload,
        caption: &str,
    ) -> Result<MessageId, IntakeError> {
        self.api.send_image(recipient_for(to), media, caption).await
    }

    async fn download_media(&self, msg: &InboundMessage) -> Result<MediaPayload, IntakeError> {
        let media_id = msg
            .media_ref
            .as_deref()
            .ok_or_else(|| IntakeError::channel("message has no media reference"))?;
        self.api.download(media_id).await
    }

    async fn receive(&self) -> Result<InboundMessage, IntakeError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv()
            .await
            .ok_or_else(|| IntakeError::channel("whatsapp inbound channel closed"))
    }
}
