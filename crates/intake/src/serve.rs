// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `intake serve` command implementation.
//!
//! Opens the ticket counter, connects the WhatsApp channel and the sheets
//! gateway, starts the HTTP gateway, and runs the conversation engine until
//! a shutdown signal arrives.

use std::sync::Arc;
use std::time::Duration;

use intake_agent::ConversationEngine;
use intake_agent::shutdown;
use intake_config::IntakeConfig;
use intake_core::{ChannelAdapter, HealthStatus, IntakeError, PluginAdapter};
use intake_gateway::{AuthConfig, GatewayState, HealthState, ServerConfig, build_router, start_server};
use intake_sheets::SheetsTicketGateway;
use intake_storage::SqliteTicketCounter;
use intake_whatsapp::WhatsAppChannel;
use tracing::{error, info, warn};

use crate::keepalive::spawn_keep_alive;

/// Runs the `intake serve` command.
pub async fn run_serve(config: IntakeConfig) -> Result<(), IntakeError> {
    init_tracing(&config.service.log_level);

    info!(service = %config.service.name, "starting intake serve");

    let counter = Arc::new(SqliteTicketCounter::open(config.storage.clone(), &config.tickets).await?);
    let gateway = Arc::new(SheetsTicketGateway::new(&config.sheets).inspect_err(|_| {
        eprintln!("error: sheets.webhook_url must be set to the deployed spreadsheet web app");
    })?);

    let mut channel = WhatsAppChannel::new(config.whatsapp.clone()).inspect_err(|_| {
        eprintln!(
            "error: WhatsApp credentials required. Set whatsapp.access_token and \
             whatsapp.phone_number_id (or INTAKE_WHATSAPP_ACCESS_TOKEN / INTAKE_WHATSAPP_PHONE_NUMBER_ID)"
        );
    })?;
    channel.connect().await?;
    let channel_routes = channel.webhook_router();
    let channel = Arc::new(channel);

    for adapter in [
        gateway.as_ref() as &dyn PluginAdapter,
        channel.as_ref() as &dyn PluginAdapter,
    ] {
        report_health(adapter).await;
    }

    let engine = Arc::new(ConversationEngine::new(
        channel.clone(),
        gateway.clone(),
        counter.clone(),
        &config.conversation,
    ));

    let cancel = shutdown::install_signal_handler();

    let app = build_router(
        GatewayState {
            control: engine.clone(),
            gateway: gateway.clone(),
            auth: AuthConfig {
                bearer_token: config.gateway.bearer_token.clone(),
            },
            health: HealthState::new(config.service.name.clone()),
        },
        Some(channel_routes),
    );
    let server_config = ServerConfig::from(&config.gateway);
    let server_cancel = cancel.clone();
    let server = tokio::spawn(async move { start_server(&server_config, app, server_cancel).await });

    let keep_alive = config.service.keep_alive_url.as_deref().map(|url| {
        spawn_keep_alive(
            url,
            Duration::from_secs(config.service.keep_alive_interval_secs),
            cancel.clone(),
        )
    });

    let run_result = engine.run(cancel.clone()).await;
    // The loop can also end on a closed channel; take everything else down too.
    cancel.cancel();

    match server.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "gateway server failed"),
        Err(e) => error!(error = %e, "gateway server task panicked"),
    }
    if let Some(handle) = keep_alive {
        let _ = handle.await;
    }

    for adapter in [
        channel.as_ref() as &dyn PluginAdapter,
        gateway.as_ref() as &dyn PluginAdapter,
        counter.as_ref() as &dyn PluginAdapter,
    ] {
        if let Err(e) = adapter.shutdown().await {
            warn!(adapter = adapter.name(), error = %e, "adapter shutdown failed");
        }
    }

    run_result?;
    info!("intake serve shutdown complete");
    Ok(())
}

/// Logs an adapter's startup health. Unhealthy adapters are not fatal: the
/// remote side may recover, and the engine degrades per call.
async fn report_health(adapter: &dyn PluginAdapter) {
    match adapter.health_check().await {
        Ok(HealthStatus::Healthy) => info!(adapter = adapter.name(), "adapter healthy"),
        Ok(HealthStatus::Degraded(reason)) | Ok(HealthStatus::Unhealthy(reason)) => {
            warn!(adapter = adapter.name(), %reason, "adapter not healthy at startup")
        }
        Err(e) => warn!(adapter = adapter.name(), error = %e, "adapter health check failed"),
    }
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("intake={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
