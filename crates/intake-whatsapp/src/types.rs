// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cloud API webhook payloads and their mapping to [`InboundMessage`].

use intake_core::{InboundMessage, MessageId, UserId};
use serde::Deserialize;
use tracing::debug;

/// Suffix the rest of the service uses for one-to-one chat ids.
pub const CHAT_SUFFIX: &str = "@c.us";

/// Top-level webhook notification.
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub changes: Vec<Change>,
}

#[derive(Debug, Deserialize)]
pub struct Change {
    #[serde(default)]
    pub field: String,
    pub value: ChangeValue,
}

/// Delivery receipts arrive here too, under `statuses`; they are ignored.
#[derive(Debug, Deserialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub messages: Vec<CloudMessage>,
}

#[derive(Debug, Deserialize)]
pub struct CloudMessage {
    pub from: String,
    pub id: String,
    /// Unix seconds, as a string.
    #[serde(default)]
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<TextBody>,
    #[serde(default)]
    pub image: Option<MediaObject>,
    #[serde(default)]
    pub document: Option<MediaObject>,
    #[serde(default)]
    pub video: Option<MediaObject>,
    #[serde(default)]
    pub audio: Option<MediaObject>,
    #[serde(default)]
    pub sticker: Option<MediaObject>,
}

#[derive(Debug, Deserialize)]
pub struct TextBody {
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct MediaObject {
    pub id: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
}

impl CloudMessage {
    fn media(&self) -> Option<&MediaObject> {
        match self.kind.as_str() {
            "image" => self.image.as_ref(),
            "document" => self.document.as_ref(),
            "video" => self.video.as_ref(),
            "audio" => self.audio.as_ref(),
            "sticker" => self.sticker.as_ref(),
            _ => None,
        }
    }

    /// Converts to the engine's message type. Kinds without text or media
    /// (reactions, locations, contacts) yield `None`.
    pub fn to_inbound(&self) -> Option<InboundMessage> {
        let (body, media_ref) = match (self.kind.as_str(), self.media()) {
            ("text", _) => (self.text.as_ref()?.body.clone(), None),
            (_, Some(media)) => (
                media.caption.clone().unwrap_or_default(),
                Some(media.id.clone()),
            ),
            (kind, None) => {
                debug!(kind, msg_id = %self.id, "ignoring unsupported message kind");
                return None;
            }
        };

        Some(InboundMessage {
            id: MessageId(self.id.clone()),
            from: user_id_for(&self.from),
            body,
            has_media: media_ref.is_some(),
            media_ref,
            is_status: false,
            timestamp: rfc3339_from_unix(&self.timestamp),
        })
    }
}

impl WebhookPayload {
    /// Every supported message in the notification, in delivery order.
    pub fn inbound_messages(&self) -> Vec<InboundMessage> {
        self.entry
            .iter()
            .flat_map(|e| e.changes.iter())
            .filter(|c| c.field.is_empty() || c.field == "messages")
            .flat_map(|c| c.value.messages.iter())
            .filter_map(CloudMessage::to_inbound)
            .collect()
    }
}

/// Maps a Cloud API phone number to the service's chat id form.
pub fn user_id_for(wa_id: &str) -> UserId {
    UserId(format!("{wa_id}{CHAT_SUFFIX}"))
}

/// The bare phone number the Cloud API addresses messages to.
pub fn recipient_for(user: &UserId) -> &str {
    user.as_str()
        .strip_suffix(CHAT_SUFFIX)
        .unwrap_or(user.as_str())
}

fn rfc3339_from_unix(ts: &str) -> String {
    ts.parse::<i64>()
        .ok()
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .unwrap_or_else(chrono::Utc::now)
        .to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(messages: serde_json::Value) -> WebhookPayload {
        serde_json::from_value(serde_json::json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "id": "1234",
                "changes": [{
                    "field": "messages",
                    "value": {
                        "messaging_product": "whatsapp",
                        "metadata": {"phone_number_id": "555"},
                        "messages": messages
                    }
                }]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn text_message_maps_to_chat_id() {
        let p = payload(serde_json::json!([{
            "from": "919800000000",
            "id": "wamid.A",
            "timestamp": "1767225600",
            "type": "text",
            "text": {"body": "Hi"}
        }]));
        let msgs = p.inbound_messages();
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].from.as_str(), "919800000000@c.us");
        assert_eq!(msgs[0].body, "Hi");
        assert!(!msgs[0].has_media);
        assert!(msgs[0].timestamp.starts_with("2026-01-01T00:00:00"));
    }

    #[test]
    fn image_caption_becomes_body() {
        let p = payload(serde_json::json!([{
            "from": "919800000000",
            "id": "wamid.B",
            "timestamp": "1767225600",
            "type": "image",
            "image": {"id": "media-1", "mime_type": "image/jpeg", "caption": "login page error"}
        }]));
        let msg = &p.inbound_messages()[0];
        assert!(msg.has_media);
        assert_eq!(msg.media_ref.as_deref(), Some("media-1"));
        assert_eq!(msg.body, "login page error");
    }

    #[test]
    fn media_without_caption_has_empty_body() {
        let p = payload(serde_json::json!([{
            "from": "1", "id": "wamid.C", "type": "document",
            "document": {"id": "media-2", "mime_type": "application/pdf"}
        }]));
        let msg = &p.inbound_messages()[0];
        assert_eq!(msg.body, "");
        assert!(msg.has_media);
    }

    #[test]
    fn unsupported_kinds_and_receipts_are_skipped() {
        let p = payload(serde_json::json!([
            {"from": "1", "id": "wamid.D", "type": "reaction"},
            {"from": "1", "id": "wamid.E", "type": "location"}
        ]));
        assert!(p.inbound_messages().is_empty());

        let receipts: WebhookPayload = serde_json::from_value(serde_json::json!({
            "entry": [{"changes": [{"field": "messages", "value": {"statuses": [{"id": "x"}]}}]}]
        }))
        .unwrap();
        assert!(receipts.inbound_messages().is_empty());
    }

    #[test]
    fn recipient_strips_chat_suffix() {
        assert_eq!(recipient_for(&UserId::from("919800000000@c.us")), "919800000000");
        assert_eq!(recipient_for(&UserId::from("919800000000")), "919800000000");
    }
}
