// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the spreadsheet web-app endpoint.

use intake_core::{NewTicket, TicketDetails, TicketSummary};
use serde::{Deserialize, Serialize};

/// Body of a `POST` to the web app. The `action` field selects the handler.
#[derive(Debug, Serialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SheetAction<'a> {
    Create {
        #[serde(flatten)]
        ticket: &'a NewTicket,
    },
    UpdateStatus {
        ticket_id: &'a str,
        status: &'a str,
        /// Set only when the ticket is closed, empty otherwise.
        closure_date: String,
        resolution: &'a str,
    },
    AddReopenReason {
        ticket_id: &'a str,
        reopen_reason: &'a str,
        reopen_date: &'a str,
    },
    AddSupportResolution {
        ticket_id: &'a str,
        resolution: &'a str,
    },
}

impl SheetAction<'_> {
    /// The `action` value, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            SheetAction::Create { .. } => "create",
            SheetAction::UpdateStatus { .. } => "updateStatus",
            SheetAction::AddReopenReason { .. } => "addReopenReason",
            SheetAction::AddSupportResolution { .. } => "addSupportResolution",
        }
    }
}

/// Response to `?action=checkTickets`.
#[derive(Debug, Default, Deserialize)]
pub struct TicketsResponse {
    #[serde(default)]
    pub tickets: Vec<TicketSummary>,
}

/// Response to `?action=getTicketDetails`. A missing ticket comes back as
/// `null` or without the field at all.
#[derive(Debug, Default, Deserialize)]
pub struct DetailsResponse {
    #[serde(default)]
    pub details: Option<TicketDetails>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use intake_core::{TicketStatus, UserId};

    #[test]
    fn create_flattens_ticket_fields() {
        let ticket = NewTicket {
            ticket_id: "ULI0007".into(),
            raised_by: UserId::from("919800000000@c.us"),
            reporting_date: "3/2/2026, 09:05:01".into(),
            school_code: "GV1".into(),
            student_pin: "1234".into(),
            issue_description: "Cannot log in to the portal".into(),
            screenshot_url: String::new(),
            status: "In Progress".into(),
        };
        let json = serde_json::to_value(SheetAction::Create { ticket: &ticket }).unwrap();
        assert_eq!(json["action"], "create");
        assert_eq!(json["ticketId"], "ULI0007");
        assert_eq!(json["raisedBy"], "919800000000@c.us");
        assert_eq!(json["studentPin"], "1234");
        assert_eq!(json["status"], "In Progress");
    }

    #[test]
    fn update_status_uses_camel_case_fields() {
        let json = serde_json::to_value(SheetAction::UpdateStatus {
            ticket_id: "ULI0001",
            status: "Reopened",
            closure_date: String::new(),
            resolution: "",
        })
        .unwrap();
        assert_eq!(json["action"], "updateStatus");
        assert_eq!(json["ticketId"], "ULI0001");
        assert_eq!(json["closureDate"], "");
    }

    #[test]
    fn reopen_reason_field_names() {
        let action = SheetAction::AddReopenReason {
            ticket_id: "ULI0001",
            reopen_reason: "still broken",
            reopen_date: "1/1/2026, 10:00:00",
        };
        assert_eq!(action.name(), "addReopenReason");
        let json = serde_json::to_value(action).unwrap();
        assert_eq!(json["reopenReason"], "still broken");
        assert_eq!(json["reopenDate"], "1/1/2026, 10:00:00");
    }

    #[test]
    fn tickets_response_tolerates_missing_fields() {
        let parsed: TicketsResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.tickets.is_empty());

        let parsed: TicketsResponse = serde_json::from_str(
            r#"{"tickets":[{"ticketId":"ULI0002","status":"Awaiting Parts"}]}"#,
        )
        .unwrap();
        assert_eq!(
            parsed.tickets[0].status,
            TicketStatus::Other("Awaiting Parts".into())
        );
        assert_eq!(parsed.tickets[0].reporting_date, "");
    }

    #[test]
    fn details_response_null_is_none() {
        let parsed: DetailsResponse = serde_json::from_str(r#"{"details":null}"#).unwrap();
        assert!(parsed.details.is_none());
    }
}
