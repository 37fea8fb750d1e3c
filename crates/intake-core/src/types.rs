// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Intake service.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// `strftime` pattern for dates recorded in the ticket sheet (`D/M/YYYY, HH:mm:ss`).
pub const SHEET_TIMESTAMP_FORMAT: &str = "%-d/%-m/%Y, %H:%M:%S";

/// Current local time in the ticket sheet's date format.
pub fn sheet_timestamp() -> String {
    chrono::Local::now().format(SHEET_TIMESTAMP_FORMAT).to_string()
}

/// Chat identity of the person talking to the service (e.g. `919876543210@c.us`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        UserId(value.to_string())
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        UserId(value)
    }
}

/// Unique identifier for a delivered or received message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Storage,
    TicketGateway,
}

/// Sender suffix used by the chat network for group conversations.
const GROUP_SUFFIX: &str = "@g.us";

/// Pseudo-sender that carries status broadcasts.
const STATUS_BROADCAST: &str = "status@broadcast";

/// An inbound chat message delivered by a channel adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Channel-assigned message id.
    pub id: MessageId,
    /// Who sent the message.
    pub from: UserId,
    /// Text body, or the caption when media is attached. May be empty.
    #[serde(default)]
    pub body: String,
    /// Whether the message carries downloadable media.
    #[serde(default)]
    pub has_media: bool,
    /// Channel-specific handle used to download the media.
    #[serde(default)]
    pub media_ref: Option<String>,
    /// Set by the channel when the message is a status update.
    #[serde(default)]
    pub is_status: bool,
    /// RFC 3339 receive timestamp.
    pub timestamp: String,
}

impl InboundMessage {
    /// Convenience constructor for a plain text message.
    pub fn text(from: impl Into<UserId>, body: impl Into<String>) -> Self {
        Self {
            id: MessageId(format!("in-{}", next_local_id())),
            from: from.into(),
            body: body.into(),
            has_media: false,
            media_ref: None,
            is_status: false,
            timestamp: String::new(),
        }
    }

    /// Group chats, the status broadcast pseudo-sender, and status updates are
    /// never part of a support conversation.
    pub fn is_group_or_broadcast_or_status(&self) -> bool {
        self.is_status
            || self.from.as_str().contains(GROUP_SUFFIX)
            || self.from.as_str() == STATUS_BROADCAST
    }
}

fn next_local_id() -> u64 {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Downloaded media, base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaPayload {
    /// MIME type reported by the channel (e.g. `image/jpeg`).
    pub mime_type: String,
    /// Standard base64 payload without line breaks.
    pub data: String,
    /// Optional file name, used when uploading.
    #[serde(default)]
    pub filename: Option<String>,
}

impl MediaPayload {
    /// Embeds the payload as a `data:` URL for storage in the ticket record.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Lifecycle status of a ticket in the remote store.
///
/// Unrecognized remote values are preserved in [`TicketStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TicketStatus {
    Open,
    InProgress,
    Closed,
    Reopened,
    Other(String),
}

impl TicketStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TicketStatus::Open => "Open",
            TicketStatus::InProgress => "In Progress",
            TicketStatus::Closed => "Closed",
            TicketStatus::Reopened => "Reopened",
            TicketStatus::Other(s) => s,
        }
    }

    /// Open, In Progress and Reopened tickets still need attention.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            TicketStatus::Open | TicketStatus::InProgress | TicketStatus::Reopened
        )
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for TicketStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Open" => TicketStatus::Open,
            "In Progress" => TicketStatus::InProgress,
            "Closed" => TicketStatus::Closed,
            "Reopened" => TicketStatus::Reopened,
            _ => TicketStatus::Other(value),
        }
    }
}

impl From<TicketStatus> for String {
    fn from(value: TicketStatus) -> Self {
        match value {
            TicketStatus::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

/// One row of a user's ticket listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketSummary {
    pub ticket_id: String,
    pub status: TicketStatus,
    #[serde(default)]
    pub reporting_date: String,
}

/// Ticket fields shown back to the user when support resolves it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TicketDetails {
    pub school_name: Option<String>,
    pub school_code: String,
    pub student_pin: String,
    pub issue_description: String,
}

/// Payload for recording a newly completed ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTicket {
    pub ticket_id: String,
    pub raised_by: UserId,
    pub reporting_date: String,
    pub school_code: String,
    pub student_pin: String,
    pub issue_description: String,
    pub screenshot_url: String,
    pub status: String,
}

/// Out-of-band notice that support has resolved a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionNotice {
    pub ticket_id: String,
    pub user_phone: UserId,
    #[serde(default)]
    pub resolution: String,
}

/// A durable per-user ticket id reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub user: UserId,
    pub ticket_id: String,
    /// RFC 3339 timestamp of when the id was issued.
    pub reserved_at: String,
}

/// Result of releasing a user's reservation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseOutcome {
    /// The ticket id that was reserved, if any.
    pub released: Option<String>,
    /// Whether the counter was rolled back to make the id reissuable.
    pub counter_decremented: bool,
}

/// Read-only view of an in-flight conversation, for operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub user: UserId,
    pub stage: String,
    pub ticket_id: Option<String>,
    pub idle_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_timestamp_has_day_month_year_and_time() {
        let fixed = chrono::NaiveDate::from_ymd_opt(2026, 3, 7)
            .unwrap()
            .and_hms_opt(9, 5, 2)
            .unwrap();
        assert_eq!(
            fixed.format(SHEET_TIMESTAMP_FORMAT).to_string(),
            "7/3/2026, 09:05:02"
        );

        let now = sheet_timestamp();
        assert!(now.contains(", "), "got: {now}");
        assert_eq!(now.split('/').count(), 3);
    }

    #[test]
    fn group_broadcast_and_status_are_filtered() {
        let mut msg = InboundMessage::text("12345-678@g.us", "hi");
        assert!(msg.is_group_or_broadcast_or_status());

        msg.from = UserId::from("status@broadcast");
        assert!(msg.is_group_or_broadcast_or_status());

        msg.from = UserId::from("919876543210@c.us");
        assert!(!msg.is_group_or_broadcast_or_status());

        msg.is_status = true;
        assert!(msg.is_group_or_broadcast_or_status());
    }

    #[test]
    fn ticket_status_parses_remote_spelling() {
        let parsed: TicketStatus = serde_json::from_str("\"In Progress\"").unwrap();
        assert_eq!(parsed, TicketStatus::InProgress);
        assert!(parsed.is_active());

        let odd: TicketStatus = serde_json::from_str("\"Escalated\"").unwrap();
        assert_eq!(odd, TicketStatus::Other("Escalated".into()));
        assert!(!odd.is_active());
        assert_eq!(serde_json::to_string(&odd).unwrap(), "\"Escalated\"");
        assert!(!TicketStatus::Closed.is_active());
    }

    #[test]
    fn ticket_summary_uses_camel_case() {
        let json = r#"{"ticketId":"ULI0007","status":"Reopened","reportingDate":"3/4/2025, 10:00:00"}"#;
        let summary: TicketSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.ticket_id, "ULI0007");
        assert_eq!(summary.status, TicketStatus::Reopened);
    }

    #[test]
    fn ticket_details_tolerates_missing_fields() {
        let details: TicketDetails = serde_json::from_str(r#"{"schoolCode":"ABC"}"#).unwrap();
        assert_eq!(details.school_code, "ABC");
        assert!(details.school_name.is_none());
        assert!(details.student_pin.is_empty());
    }

    #[test]
    fn media_payload_data_url() {
        let media = MediaPayload {
            mime_type: "image/png".into(),
            data: "iVBORw0KGgo=".into(),
            filename: None,
        };
        assert_eq!(media.to_data_url(), "data:image/png;base64,iVBORw0KGgo=");
    }
}
