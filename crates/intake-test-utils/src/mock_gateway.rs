// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock ticket gateway that records every call.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use intake_core::{
    AdapterType, HealthStatus, IntakeError, NewTicket, PluginAdapter, TicketDetails,
    TicketGateway, TicketStatus, TicketSummary, UserId,
};

/// A call observed by [`MockTicketGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    Create(NewTicket),
    UpdateStatus {
        ticket_id: String,
        status: TicketStatus,
        resolution: String,
    },
    AppendReopenReason {
        ticket_id: String,
        reason: String,
        timestamp: String,
    },
    AppendResolution {
        ticket_id: String,
        resolution: String,
    },
    ListTickets(UserId),
    GetDetails(String),
}

/// In-memory ticket gateway with canned listings and switchable failures.
#[derive(Default)]
pub struct MockTicketGateway {
    calls: Mutex<Vec<GatewayCall>>,
    tickets: Mutex<HashMap<UserId, Vec<TicketSummary>>>,
    details: Mutex<HashMap<String, TicketDetails>>,
    failing: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl MockTicketGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listing returned for `user`.
    pub async fn set_tickets(&self, user: &UserId, tickets: Vec<TicketSummary>) {
        self.tickets.lock().await.insert(user.clone(), tickets);
    }

    pub async fn set_details(&self, ticket_id: &str, details: TicketDetails) {
        self.details
            .lock()
            .await
            .insert(ticket_id.to_string(), details);
    }

    /// Make every call fail with a gateway error. Calls are still recorded.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Sleep this long inside every call, to exercise timeouts.
    pub async fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().await = delay;
    }

    pub async fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().await.clone()
    }

    pub async fn created(&self) -> Vec<NewTicket> {
        self.calls
            .lock()
            .await
            .iter()
            .filter_map(|c| match c {
                GatewayCall::Create(t) => Some(t.clone()),
                _ => None,
            })
            .collect()
    }

    /// `(ticket id, status, resolution)` for every status update.
    pub async fn status_updates(&self) -> Vec<(String, TicketStatus, String)> {
        self.calls
            .lock()
            .await
            .iter()
            .filter_map(|c| match c {
                GatewayCall::UpdateStatus {
                    ticket_id,
                    status,
                    resolution,
                } => Some((ticket_id.clone(), status.clone(), resolution.clone())),
                _ => None,
            })
            .collect()
    }

    async fn enter(&self, call: GatewayCall) -> Result<(), IntakeError> {
        self.calls.lock().await.push(call);
        let delay = *self.delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(IntakeError::gateway("mock gateway failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for MockTicketGateway {
    fn name(&self) -> &str {
        "mock-gateway"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::TicketGateway
    }

    async fn health_check(&self) -> Result<HealthStatus, IntakeError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), IntakeError> {
        Ok(())
    }
}

#[async_trait]
impl TicketGateway for MockTicketGateway {
    async fn create(&self, ticket: &NewTicket) -> Result<(), IntakeError> {
        self.enter(GatewayCall::Create(ticket.clone())).await
    }

    async fn update_status(
        &self,
        ticket_id: &str,
        status: &TicketStatus,
        resolution: &str,
    ) -> Result<(), IntakeError> {
        self.enter(GatewayCall::UpdateStatus {
            ticket_id: ticket_id.to_string(),
            status: status.clone(),
            resolution: resolution.to_string(),
        })
        .await
    }

    async fn append_reopen_reason(
        &self,
        ticket_id: &str,
        reason: &str,
        timestamp: &str,
    ) -> Result<(), IntakeError> {
        self.enter(GatewayCall::AppendReopenReason {
            ticket_id: ticket_id.to_string(),
            reason: reason.to_string(),
            timestamp: timestamp.to_string(),
        })
        .await
    }

    async fn append_resolution(
        &self,
        ticket_id: &str,
        resolution: &str,
    ) -> Result<(), IntakeError> {
        self.enter(GatewayCall::AppendResolution {
            ticket_id: ticket_id.to_string(),
            resolution: resolution.to_string(),
        })
        .await
    }

    async fn list_tickets_for_user(
        &self,
        user: &UserId,
    ) -> Result<Vec<TicketSummary>, IntakeError> {
        self.enter(GatewayCall::ListTickets(user.clone())).await?;
        Ok(self
            .tickets
            .lock()
            .await
            .get(user)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_details(&self, ticket_id: &str) -> Result<Option<TicketDetails>, IntakeError> {
        self.enter(GatewayCall::GetDetails(ticket_id.to_string()))
            .await?;
        Ok(self.details.lock().await.get(ticket_id).cloned())
    }
}
