// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use intake_config::model::GatewayConfig;
use intake_core::{ConversationControl, IntakeError, TicketGateway};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{AuthConfig, auth_middleware};
use crate::handlers;

/// Health state for the unauthenticated health endpoint.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
    /// Service name reported by the probe.
    pub service: String,
}

impl HealthState {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            start_time: std::time::Instant::now(),
            service: service.into(),
        }
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new("intake")
    }
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Entry points into the conversation engine.
    pub control: Arc<dyn ConversationControl>,
    /// Remote ticket store, for support-authored resolution notes.
    pub gateway: Arc<dyn TicketGateway>,
    /// Authentication configuration.
    pub auth: AuthConfig,
    /// Health state for unauthenticated endpoints.
    pub health: HealthState,
}

/// Gateway server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

impl From<&GatewayConfig> for ServerConfig {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
        }
    }
}

/// Builds the application router.
///
/// Routes:
/// - GET /health (public)
/// - POST /webhook/ticket-resolved (auth)
/// - POST /webhook/support-resolution (auth)
/// - GET /v1/sessions (auth)
///
/// `channel_routes` (the chat network's own webhook) is merged as-is; it
/// authenticates its callers itself.
pub fn build_router(state: GatewayState, channel_routes: Option<Router>) -> Router {
    let auth_state = state.auth.clone();

    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/webhook/ticket-resolved", post(handlers::post_ticket_resolved))
        .route(
            "/webhook/support-resolution",
            post(handlers::post_support_resolution),
        )
        .route("/v1/sessions", get(handlers::get_sessions))
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ))
        .with_state(state);

    let mut app = Router::new().merge(public_routes).merge(protected_routes);
    if let Some(routes) = channel_routes {
        app = app.merge(routes);
    }

    app.layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Binds and serves until `cancel` fires.
pub async fn start_server(
    config: &ServerConfig,
    app: Router,
    cancel: CancellationToken,
) -> Result<(), IntakeError> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| IntakeError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .map_err(|e| IntakeError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway stopped");
    Ok(())
}
