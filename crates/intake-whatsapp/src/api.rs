// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graph API client for outbound messages and media.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use intake_core::{IntakeError, MediaPayload, MessageId};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    messages: Vec<SentRef>,
}

#[derive(Debug, Deserialize)]
struct SentRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MediaInfo {
    url: String,
    #[serde(default)]
    mime_type: Option<String>,
}

/// Authenticated client for one business phone number.
#[derive(Debug, Clone)]
pub struct CloudApiClient {
    client: reqwest::Client,
    base_url: String,
    phone_number_id: String,
}

impl CloudApiClient {
    pub fn new(
        access_token: &str,
        phone_number_id: &str,
        base_url: &str,
    ) -> Result<Self, IntakeError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {access_token}")).map_err(|e| {
                IntakeError::Config(format!("invalid whatsapp.access_token header value: {e}"))
            })?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| IntakeError::Channel {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            phone_number_id: phone_number_id.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// Sends a text message to a bare phone number.
    pub async fn send_text(&self, to: &str, body: &str) -> Result<MessageId, IntakeError> {
        let payload = json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": to,
            "type": "text",
            "text": { "preview_url": false, "body": body },
        });
        self.send_message(&payload).await
    }

    /// Uploads `media` and sends it as an image with `caption`.
    pub async fn send_image(
        &self,
        to: &str,
        media: &MediaPayload,
        caption: &str,
    ) -> Result<MessageId, IntakeError> {
        let media_id = self.upload(media).await?;
        let payload = json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": to,
            "type": "image",
            "image": { "id": media_id, "caption": caption },
        });
        self.send_message(&payload).await
    }

    async fn send_message(&self, payload: &serde_json::Value) -> Result<MessageId, IntakeError> {
        let response = self
            .client
            .post(self.url(&format!("{}/messages", self.phone_number_id)))
            .json(payload)
            .send()
            .await
            .map_err(|e| request_error("send message", e))?;
        let response = check_status(response, "send message").await?;
        let sent: SendResponse = parse_json(response).await?;
        let id = sent
            .messages
            .into_iter()
            .next()
            .map(|m| m.id)
            .unwrap_or_default();
        Ok(MessageId(id))
    }

    async fn upload(&self, media: &MediaPayload) -> Result<String, IntakeError> {
        let bytes = STANDARD.decode(&media.data).map_err(|e| IntakeError::Channel {
            message: format!("media payload is not valid base64: {e}"),
            source: Some(Box::new(e)),
        })?;
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(media.filename.clone().unwrap_or_else(|| "upload".into()))
            .mime_str(&media.mime_type)
            .map_err(|e| IntakeError::Channel {
                message: format!("invalid media type {}: {e}", media.mime_type),
                source: Some(Box::new(e)),
            })?;
        let form = reqwest::multipart::Form::new()
            .text("messaging_product", "whatsapp")
            .text("type", media.mime_type.clone())
            .part("file", part);

        let response = self
            .client
            .post(self.url(&format!("{}/media", self.phone_number_id)))
            .multipart(form)
            .send()
            .await
            .map_err(|e| request_error("upload media", e))?;
        let response = check_status(response, "upload media").await?;
        let uploaded: UploadResponse = parse_json(response).await?;
        debug!(media_id = %uploaded.id, "uploaded media");
        Ok(uploaded.id)
    }

    /// Resolves a media id to its download URL and fetches the bytes.
    pub async fn download(&self, media_id: &str) -> Result<MediaPayload, IntakeError> {
        let response = self
            .client
            .get(self.url(media_id))
            .send()
            .await
            .map_err(|e| request_error("media lookup", e))?;
        let response = check_status(response, "media lookup").await?;
        let info: MediaInfo = parse_json(response).await?;

        let response = self
            .client
            .get(&info.url)
            .send()
            .await
            .map_err(|e| request_error("media download", e))?;
        let response = check_status(response, "media download").await?;
        let header_mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| request_error("media download", e))?;

        debug!(media_id, size = bytes.len(), "downloaded media");
        Ok(MediaPayload {
            mime_type: info
                .mime_type
                .or(header_mime)
                .unwrap_or_else(|| "application/octet-stream".into()),
            data: STANDARD.encode(&bytes),
            filename: None,
        })
    }

    /// Fetches the phone number record, to check the token still works.
    pub async fn ping(&self) -> Result<(), IntakeError> {
        let response = self
            .client
            .get(self.url(&self.phone_number_id))
            .send()
            .await
            .map_err(|e| request_error("phone number lookup", e))?;
        check_status(response, "phone number lookup").await?;
        Ok(())
    }
}

fn request_error(what: &str, e: reqwest::Error) -> IntakeError {
    IntakeError::Channel {
        message: format!("{what} failed: {e}"),
        source: Some(Box::new(e)),
    }
}

async fn check_status(
    response: reqwest::Response,
    what: &str,
) -> Result<reqwest::Response, IntakeError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(IntakeError::channel(format!(
        "{what} returned {status}: {body}"
    )))
}

async fn parse_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, IntakeError> {
    response.json::<T>().await.map_err(|e| IntakeError::Channel {
        message: format!("failed to parse Graph API response: {e}"),
        source: Some(Box::new(e)),
    })
}
