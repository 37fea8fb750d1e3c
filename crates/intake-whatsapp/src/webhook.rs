// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook endpoint the Cloud API delivers inbound messages to.
//!
//! `GET` answers the subscription handshake; `POST` carries notifications,
//! signed with `X-Hub-Signature-256` when an app secret is configured.

use std::collections::HashMap;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use hmac::{Hmac, Mac};
use intake_core::InboundMessage;
use sha2::Sha256;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::types::WebhookPayload;

type HmacSha256 = Hmac<Sha256>;

/// Path the webhook is served on.
pub const WEBHOOK_PATH: &str = "/webhook/whatsapp";

const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Shared state for the webhook handlers.
#[derive(Clone)]
pub struct WebhookState {
    pub inbound_tx: mpsc::Sender<InboundMessage>,
    pub verify_token: Option<String>,
    pub app_secret: Option<String>,
}

impl std::fmt::Debug for WebhookState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookState")
            .field("verify_token", &self.verify_token.as_ref().map(|_| "[redacted]"))
            .field("app_secret", &self.app_secret.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

/// Builds the webhook router with its state applied, ready to merge.
pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route(WEBHOOK_PATH, get(verify_subscription).post(receive_notification))
        .with_state(state)
}

/// Checks a `sha256=<hex>` signature over the raw request body.
pub fn verify_signature(secret: &[u8], body: &[u8], signature: &str) -> bool {
    let hex_sig = signature.strip_prefix("sha256=").unwrap_or(signature);
    let Ok(expected) = hex::decode(hex_sig) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// GET handshake: echo `hub.challenge` when the token matches.
async fn verify_subscription(
    State(state): State<WebhookState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let mode = params.get("hub.mode").map(String::as_str);
    let token = params.get("hub.verify_token").map(String::as_str);
    let challenge = params.get("hub.challenge");

    match (mode, token, challenge, state.verify_token.as_deref()) {
        (Some("subscribe"), Some(token), Some(challenge), Some(expected)) if token == expected => {
            debug!("whatsapp webhook subscription verified");
            (StatusCode::OK, challenge.clone()).into_response()
        }
        _ => {
            warn!("whatsapp webhook verification rejected");
            StatusCode::FORBIDDEN.into_response()
        }
    }
}

/// POST notification: verify, parse, and queue every message for the engine.
async fn receive_notification(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if let Some(ref secret) = state.app_secret {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !verify_signature(secret.as_bytes(), &body, signature) {
            warn!("whatsapp webhook signature mismatch");
            return StatusCode::UNAUTHORIZED;
        }
    }

    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "malformed whatsapp webhook payload");
            return StatusCode::BAD_REQUEST;
        }
    };

    for msg in payload.inbound_messages() {
        debug!(msg_id = %msg.id.0, user = %msg.from, has_media = msg.has_media, "queueing inbound message");
        if state.inbound_tx.send(msg).await.is_err() {
            warn!("inbound channel closed, dropping message");
            return StatusCode::SERVICE_UNAVAILABLE;
        }
    }
    StatusCode::OK
}
