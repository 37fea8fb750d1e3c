// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use intake_core::{ResolutionNotice, SessionSnapshot};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::server::GatewayState;

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    /// RFC 3339 server time.
    pub timestamp: String,
    pub uptime_secs: u64,
    /// Conversations currently in flight.
    pub sessions: usize,
}

/// Request body for POST /webhook/support-resolution.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportResolutionRequest {
    pub ticket_id: String,
    #[serde(default)]
    pub resolution: String,
}

/// Success body for the webhooks.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response body for GET /v1/sessions.
#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionSnapshot>,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn internal_error(error: impl Into<String>) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    let sessions = state
        .control
        .active_sessions()
        .await
        .map(|s| s.len())
        .unwrap_or_default();
    Json(HealthResponse {
        status: "ok".to_string(),
        service: state.health.service.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
        sessions,
    })
}

/// POST /webhook/ticket-resolved
///
/// Notifies the user and waits for them to confirm or reopen.
pub async fn post_ticket_resolved(
    State(state): State<GatewayState>,
    Json(notice): Json<ResolutionNotice>,
) -> Response {
    let ticket_id = notice.ticket_id.clone();
    match state.control.ingest_resolution(notice).await {
        Ok(()) => {
            info!(%ticket_id, "resolution delivered");
            Json(SuccessResponse {
                success: true,
                message: None,
            })
            .into_response()
        }
        Err(e) => {
            error!(%ticket_id, error = %e, "resolution webhook failed");
            internal_error(e.to_string())
        }
    }
}

/// POST /webhook/support-resolution
///
/// Appends a support-authored resolution note to the ticket record.
pub async fn post_support_resolution(
    State(state): State<GatewayState>,
    Json(body): Json<SupportResolutionRequest>,
) -> Response {
    match state
        .gateway
        .append_resolution(&body.ticket_id, &body.resolution)
        .await
    {
        Ok(()) => Json(SuccessResponse {
            success: true,
            message: Some("Support resolution added successfully".to_string()),
        })
        .into_response(),
        Err(e) => {
            error!(ticket_id = %body.ticket_id, error = %e, "support resolution failed");
            internal_error("Failed to add support resolution")
        }
    }
}

/// GET /v1/sessions
pub async fn get_sessions(State(state): State<GatewayState>) -> Response {
    match state.control.active_sessions().await {
        Ok(sessions) => Json(SessionListResponse { sessions }).into_response(),
        Err(e) => internal_error(e.to_string()),
    }
}
