// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Spreadsheet-backed ticket gateway.
//!
//! Implements [`TicketGateway`] over the spreadsheet web app's single
//! endpoint: lookups are `GET` requests selected by an `action` query
//! parameter, writes are JSON `POST`s carrying an `action` field.

pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use intake_config::model::SheetsConfig;
use intake_core::{
    AdapterType, HealthStatus, IntakeError, NewTicket, PluginAdapter, TicketDetails,
    TicketGateway, TicketStatus, TicketSummary, UserId, sheet_timestamp,
};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::types::{DetailsResponse, SheetAction, TicketsResponse};

/// HTTP client for the spreadsheet web app.
#[derive(Debug, Clone)]
pub struct SheetsTicketGateway {
    client: reqwest::Client,
    endpoint: Url,
}

impl SheetsTicketGateway {
    /// Creates a gateway for `config.webhook_url`.
    ///
    /// Requests are bounded by `config.timeout_secs`.
    pub fn new(config: &SheetsConfig) -> Result<Self, IntakeError> {
        let url = config.webhook_url.as_deref().ok_or_else(|| {
            IntakeError::Config("sheets.webhook_url is required for the ticket gateway".into())
        })?;
        let endpoint = Url::parse(url)
            .map_err(|e| IntakeError::Config(format!("invalid sheets.webhook_url: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| IntakeError::Gateway {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self { client, endpoint })
    }

    /// The web-app URL requests are sent to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn query<T: DeserializeOwned>(
        &self,
        params: &[(&str, &str)],
    ) -> Result<T, IntakeError> {
        let url = Url::parse_with_params(self.endpoint.as_str(), params)
            .map_err(|e| IntakeError::gateway(format!("invalid query url: {e}")))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error("GET", e))?;
        let status = response.status();
        debug!(status = %status, action = params[0].1, "sheets lookup response");
        if !status.is_success() {
            return Err(status_error(status, response).await);
        }

        response.json::<T>().await.map_err(|e| IntakeError::Gateway {
            message: format!("failed to parse sheets response: {e}"),
            source: Some(Box::new(e)),
        })
    }

    async fn post(&self, action: SheetAction<'_>) -> Result<(), IntakeError> {
        let name = action.name();
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&action)
            .send()
            .await
            .map_err(|e| transport_error("POST", e))?;
        let status = response.status();
        debug!(status = %status, action = name, "sheets write response");
        if !status.is_success() {
            let err = status_error(status, response).await;
            warn!(action = name, error = %err, "sheets write rejected");
            return Err(err);
        }
        Ok(())
    }
}

fn transport_error(method: &str, e: reqwest::Error) -> IntakeError {
    let message = if e.is_timeout() {
        format!("{method} to sheets timed out")
    } else {
        format!("{method} to sheets failed: {e}")
    };
    IntakeError::Gateway {
        message,
        source: Some(Box::new(e)),
    }
}

async fn status_error(status: StatusCode, response: reqwest::Response) -> IntakeError {
    let body = response.text().await.unwrap_or_default();
    IntakeError::gateway(format!("sheets returned {status}: {body}"))
}

#[async_trait]
impl PluginAdapter for SheetsTicketGateway {
    fn name(&self) -> &str {
        "sheets"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::TicketGateway
    }

    /// Any HTTP answer counts as reachable; the web app has no health action.
    async fn health_check(&self) -> Result<HealthStatus, IntakeError> {
        match self.client.get(self.endpoint.clone()).send().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "sheets endpoint unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), IntakeError> {
        debug!("sheets gateway shutting down");
        Ok(())
    }
}

#[async_trait]
impl TicketGateway for SheetsTicketGateway {
    async fn create(&self, ticket: &NewTicket) -> Result<(), IntakeError> {
        self.post(SheetAction::Create { ticket }).await
    }

    async fn update_status(
        &self,
        ticket_id: &str,
        status: &TicketStatus,
        resolution: &str,
    ) -> Result<(), IntakeError> {
        let closure_date = if *status == TicketStatus::Closed {
            sheet_timestamp()
        } else {
            String::new()
        };
        self.post(SheetAction::UpdateStatus {
            ticket_id,
            status: status.as_str(),
            closure_date,
            resolution,
        })
        .await
    }

    async fn append_reopen_reason(
        &self,
        ticket_id: &str,
        reason: &str,
        timestamp: &str,
    ) -> Result<(), IntakeError> {
        self.post(SheetAction::AddReopenReason {
            ticket_id,
            reopen_reason: reason,
            reopen_date: timestamp,
        })
        .await
    }

    async fn append_resolution(
        &self,
        ticket_id: &str,
        resolution: &str,
    ) -> Result<(), IntakeError> {
        self.post(SheetAction::AddSupportResolution {
            ticket_id,
            resolution,
        })
        .await
    }

    async fn list_tickets_for_user(
        &self,
        user: &UserId,
    ) -> Result<Vec<TicketSummary>, IntakeError> {
        let response: TicketsResponse = self
            .query(&[("action", "checkTickets"), ("user", user.as_str())])
            .await?;
        Ok(response.tickets)
    }

    async fn get_details(&self, ticket_id: &str) -> Result<Option<TicketDetails>, IntakeError> {
        let response: DetailsResponse = self
            .query(&[("action", "getTicketDetails"), ("ticketId", ticket_id)])
            .await?;
        Ok(response.details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway_for(server: &MockServer) -> SheetsTicketGateway {
        SheetsTicketGateway::new(&SheetsConfig {
            webhook_url: Some(format!("{}/exec", server.uri())),
            timeout_secs: 2,
        })
        .unwrap()
    }

    fn ticket() -> NewTicket {
        NewTicket {
            ticket_id: "ULI0042".into(),
            raised_by: UserId::from("919800000000@c.us"),
            reporting_date: "5/6/2026, 14:03:09".into(),
            school_code: "GV1".into(),
            student_pin: "1234".into(),
            issue_description: "Attendance page shows an error".into(),
            screenshot_url: "data:image/png;base64,AA==".into(),
            status: "In Progress".into(),
        }
    }

    #[test]
    fn new_requires_webhook_url() {
        let err = SheetsTicketGateway::new(&SheetsConfig {
            webhook_url: None,
            timeout_secs: 5,
        })
        .unwrap_err();
        assert!(matches!(err, IntakeError::Config(_)));
    }

    #[tokio::test]
    async fn list_tickets_sends_user_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("action", "checkTickets"))
            .and(query_param("user", "919800000000@c.us"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "tickets": [
                    {"ticketId": "ULI0001", "status": "Open", "reportingDate": "1/1/2026, 10:00:00"},
                    {"ticketId": "ULI0002", "status": "Closed"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tickets = gateway_for(&server)
            .list_tickets_for_user(&UserId::from("919800000000@c.us"))
            .await
            .unwrap();
        assert_eq!(tickets.len(), 2);
        assert_eq!(tickets[0].status, TicketStatus::Open);
        assert_eq!(tickets[1].status, TicketStatus::Closed);
    }

    #[tokio::test]
    async fn list_tickets_without_field_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let tickets = gateway_for(&server)
            .list_tickets_for_user(&UserId::from("a@c.us"))
            .await
            .unwrap();
        assert!(tickets.is_empty());
    }

    #[tokio::test]
    async fn get_details_found_and_missing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("action", "getTicketDetails"))
            .and(query_param("ticketId", "ULI0001"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "details": {
                    "schoolName": "Green Valley",
                    "schoolCode": "GV1",
                    "studentPin": "1234",
                    "issueDescription": "Cannot log in"
                }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("ticketId", "ULI0404"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"details": null})),
            )
            .mount(&server)
            .await;

        let gateway = gateway_for(&server);
        let details = gateway.get_details("ULI0001").await.unwrap().unwrap();
        assert_eq!(details.school_name.as_deref(), Some("Green Valley"));
        assert_eq!(details.student_pin, "1234");
        assert!(gateway.get_details("ULI0404").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_posts_ticket_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "action": "create",
                "ticketId": "ULI0042",
                "raisedBy": "919800000000@c.us",
                "schoolCode": "GV1",
                "studentPin": "1234",
                "status": "In Progress"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        gateway_for(&server).create(&ticket()).await.unwrap();
    }

    #[tokio::test]
    async fn create_fails_on_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("script error"))
            .mount(&server)
            .await;

        let err = gateway_for(&server).create(&ticket()).await.unwrap_err();
        let text = err.to_string();
        assert!(text.contains("500"), "got: {text}");
        assert!(text.contains("script error"), "got: {text}");
    }

    #[tokio::test]
    async fn closing_sends_closure_date() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "action": "updateStatus",
                "ticketId": "ULI0003",
                "status": "Closed",
                "resolution": "Closed by user via WhatsApp"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = gateway_for(&server);
        gateway
            .update_status(
                "ULI0003",
                &TicketStatus::Closed,
                "Closed by user via WhatsApp",
            )
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert!(!body["closureDate"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn reopening_sends_empty_closure_date() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "action": "updateStatus",
                "status": "Reopened",
                "closureDate": ""
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        gateway_for(&server)
            .update_status("ULI0003", &TicketStatus::Reopened, "")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn comment_actions_post_expected_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "action": "addReopenReason",
                "ticketId": "ULI0003",
                "reopenReason": "still failing",
                "reopenDate": "2/2/2026, 08:00:00"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "action": "addSupportResolution",
                "ticketId": "ULI0003",
                "resolution": "Password reset"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = gateway_for(&server);
        gateway
            .append_reopen_reason("ULI0003", "still failing", "2/2/2026, 08:00:00")
            .await
            .unwrap();
        gateway
            .append_resolution("ULI0003", "Password reset")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn slow_endpoint_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"tickets": []}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let gateway = SheetsTicketGateway::new(&SheetsConfig {
            webhook_url: Some(server.uri()),
            timeout_secs: 1,
        })
        .unwrap();
        let err = gateway
            .list_tickets_for_user(&UserId::from("a@c.us"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out"), "got: {err}");
    }

    #[tokio::test]
    async fn health_check_reports_unreachable() {
        let gateway = SheetsTicketGateway::new(&SheetsConfig {
            webhook_url: Some("http://127.0.0.1:9/exec".into()),
            timeout_secs: 1,
        })
        .unwrap();
        assert!(matches!(
            gateway.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));
    }
}
