// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User-facing reply texts.

use intake_config::model::ConversationConfig;
use intake_core::{TicketDetails, TicketSummary};

use crate::session::TicketDraft;

/// Longest issue excerpt echoed back in the creation summary.
const SUMMARY_ISSUE_CHARS: usize = 100;

const STOP_HINT: &str = "💡 Type 'stop' to cancel or 'restart' to begin again.";
const ANYTIME_HINT: &str = "💡 You can type 'stop' anytime to cancel or 'restart' to begin again.";

/// Renders every reply the engine sends, with the brand and contact details
/// taken from configuration.
#[derive(Debug, Clone)]
pub struct Replies {
    brand: String,
    phone: String,
    email: String,
}

impl Replies {
    pub fn new(config: &ConversationConfig) -> Self {
        Self {
            brand: config.brand_name.clone(),
            phone: config.support_phone.clone(),
            email: config.support_email.clone(),
        }
    }

    pub fn instructions(&self) -> String {
        format!(
            "👋 Hello! Please type 'Hi' or 'Hello' to start using {}.\n\n📞 For urgent assistance: {}",
            self.brand, self.phone
        )
    }

    pub fn intro_caption(&self) -> String {
        format!(
            "🎯 Welcome to {}!\n\nWould you like to open a new support ticket?\n\n\
             Reply 'Yes' to proceed or 'No' to cancel.",
            self.brand
        )
    }

    pub fn active_ticket_menu(&self, tickets: &[TicketSummary]) -> String {
        let list = numbered_list(tickets);
        format!(
            "🎯 Welcome to {}!\n\nYou have {} active ticket(s):\n{list}\n\n\
             Please choose an option:\n1️⃣ Open a new ticket\n2️⃣ Close an existing ticket\n\
             3️⃣ View status of existing tickets\n\n📞 For urgent help: {}",
            self.brand,
            tickets.len(),
            self.phone
        )
    }

    pub fn ticket_started(&self, ticket_id: &str) -> String {
        format!(
            "🎫 Your Ticket ID: {ticket_id}\n\nStep 1 of 3: Please enter your School Code:\n\n{ANYTIME_HINT}"
        )
    }

    pub fn ticket_started_from_menu(&self, ticket_id: &str) -> String {
        format!(
            "🎫 New Ticket Created: {ticket_id}\n\nStep 1 of 3: Please enter your School Code:\n\n{ANYTIME_HINT}"
        )
    }

    pub fn restarted(&self, ticket_id: &str) -> String {
        format!(
            "🔄 Process restarted!\n\n🎫 Your New Ticket ID: {ticket_id}\n\n\
             Step 1 of 3: Please enter your School Code:\n\n{ANYTIME_HINT}"
        )
    }

    pub fn declined(&self) -> String {
        format!(
            "👍 No problem! You can start again anytime by typing 'Hi'.\n\n📞 For urgent assistance: {}",
            self.phone
        )
    }

    pub fn confirm_reprompt(&self) -> &'static str {
        "Please reply 'Yes' to proceed with creating a ticket or 'No' to cancel."
    }

    pub fn school_code_empty(&self) -> String {
        format!("⚠️ School Code cannot be empty. Please enter a valid School Code:\n\n{STOP_HINT}")
    }

    pub fn ask_student_pin(&self) -> String {
        format!("Step 2 of 3: Please enter Student PIN(s):\n\n{STOP_HINT}")
    }

    pub fn student_pin_empty(&self) -> String {
        format!("⚠️ Student PIN cannot be empty. Please enter a valid Student PIN:\n\n{STOP_HINT}")
    }

    pub fn ask_details(&self) -> String {
        format!(
            "Step 3 of 3: Please provide:\n\n📝 Detailed description of the issue\n\
             📷 Screenshot or video (optional but recommended)\n\n\
             You can either share the image/video with the description in the caption, \
             or send the media first and follow up with the description separately\
             —whichever is easier for you.\n\n{STOP_HINT}"
        )
    }

    pub fn media_received(&self) -> &'static str {
        "📷 Media received successfully!"
    }

    pub fn media_failed(&self) -> &'static str {
        "⚠️ Error processing media. Continuing with text description only."
    }

    pub fn description_too_short(&self) -> String {
        format!(
            "⚠️ Please provide a more detailed description of the issue (minimum 10 characters). \
             This helps our support team understand and resolve your problem faster.\n\n{STOP_HINT}"
        )
    }

    pub fn ticket_created(&self, ticket_id: &str, draft: &TicketDraft) -> String {
        let issue: String = draft
            .issue_description
            .chars()
            .take(SUMMARY_ISSUE_CHARS)
            .collect();
        let ellipsis = if draft.issue_description.chars().count() > SUMMARY_ISSUE_CHARS {
            "..."
        } else {
            ""
        };
        let media = if draft.screenshot_url.is_empty() {
            "Not provided"
        } else {
            "Attached"
        };
        format!(
            "✅ Ticket {ticket_id} created successfully!\n\n📋 Summary:\n\
             🏫 School Code: {}\n👤 Student PIN: {}\n📝 Issue: {issue}{ellipsis}\n📷 Media: {media}\n\n\
             🔄 Our support team will review your request and update you shortly.\n\
             For urgent assistance please write us at: {}",
            draft.school_code, draft.student_id, self.email
        )
    }

    pub fn ticket_create_failed(&self, ticket_id: &str) -> String {
        format!(
            "❌ Failed to create ticket. Please try again later or contact support directly at {}.\n\n\
             Your ticket details have been saved locally: {ticket_id}",
            self.phone
        )
    }

    pub fn close_list(&self, tickets: &[TicketSummary]) -> String {
        let list = numbered_list(tickets);
        format!(
            "🔒 Select the ticket number you want to close:\n\n{list}\n\n\
             Please reply with the number (1, 2, 3, etc.)\n\n💡 Type 'stop' to cancel this action."
        )
    }

    pub fn status_report(&self, tickets: &[TicketSummary]) -> String {
        let mut reply = String::from("📊 Support Ticket Status:\n\n");
        for (i, t) in tickets.iter().enumerate() {
            reply.push_str(&format!(
                "{}. Ticket ID: {}\n   Status: {}\n   Created: {}\n\n",
                i + 1,
                t.ticket_id,
                t.status,
                t.reporting_date
            ));
        }
        reply.push_str(&format!("📞 For urgent assistance: {}", self.phone));
        reply
    }

    pub fn existing_choice_reprompt(&self) -> &'static str {
        "❌ Invalid choice. Please reply with '1', '2', or '3'."
    }

    pub fn close_selection_reprompt(&self) -> &'static str {
        "❌ Invalid number. Please select a valid ticket number from the list above."
    }

    pub fn ticket_closed(&self, ticket_id: &str) -> String {
        format!(
            "✅ Ticket {ticket_id} has been closed successfully.\n\n\
             Thank you for using {}!\n📞 For urgent help: {}",
            self.brand, self.phone
        )
    }

    pub fn stop_menu(&self) -> &'static str {
        "🛑 Current process stopped.\n\nWhat would you like to do?\n\
         1️⃣ Restart - Begin a new ticket\n2️⃣ Exit - End conversation\n\n\
         Reply with '1' to restart or '2' to exit."
    }

    pub fn stop_choice_reprompt(&self) -> &'static str {
        "❌ Invalid choice. Please reply:\n1️⃣ Restart - Begin a new ticket\n2️⃣ Exit - End conversation"
    }

    pub fn farewell(&self) -> String {
        format!(
            "👋 Thank you for using {}!\n\nYou can start again anytime by typing 'Hi'.\n\
             📞 For urgent assistance: {}",
            self.brand, self.phone
        )
    }

    pub fn resolution_notice(
        &self,
        ticket_id: &str,
        details: Option<&TicketDetails>,
        resolution: &str,
    ) -> String {
        let na = "N/A";
        let (school_name, school_code, student_pin, issue) = match details {
            Some(d) => (
                d.school_name.as_deref().filter(|s| !s.is_empty()).unwrap_or(na),
                or_na(&d.school_code),
                or_na(&d.student_pin),
                or_na(&d.issue_description),
            ),
            None => (na, na, na, na),
        };
        format!(
            "Dear User,\n\nYour ticket has been marked as resolved by the support team. \
             Below are the details of your ticket:\n\n\
             Ticket ID: {ticket_id}\nSchool Name: {school_name}\nSchool Code: {school_code}\n\
             Student PIN: {student_pin}\nIssue: {issue}\nResolution message from support:\n{resolution}\n\n\
             Please reply with *1* if your issue is resolved or *2* to Reopen for further support."
        )
    }

    pub fn resolution_confirmed(&self) -> &'static str {
        "Thank you for confirming. Your ticket has been closed successfully."
    }

    pub fn ask_reopen_reason(&self) -> &'static str {
        "Your ticket has been reopened. Please describe the specific issue or concern that remains unresolved:\n\n\
         💡 You can type 'stop' to cancel or 'restart' for a new ticket."
    }

    pub fn numeric_confirmation_reprompt(&self) -> &'static str {
        "Invalid input. Please reply:\n*1* - Issue is resolved (close ticket)\n*2* - Issue not resolved (reopen ticket)"
    }

    pub fn reopen_reason_empty(&self) -> &'static str {
        "⚠️ Please describe what is still unresolved so our team can follow up."
    }

    pub fn reopen_recorded(&self) -> String {
        format!(
            "Your concern has been recorded and the ticket has been reopened. \
             Our support team will review your feedback and get back to you shortly.\n\n\
             For urgent assistance, please call {}.",
            self.phone
        )
    }

    /// Sent when a status or comment update for an existing ticket fails.
    /// The stage is kept so the user can answer again.
    pub fn update_failed(&self, ticket_id: &str) -> String {
        format!(
            "⚠️ We couldn't update ticket {ticket_id} right now. Please send your reply again in a moment.\n\n\
             📞 For urgent assistance: {}",
            self.phone
        )
    }
}

fn numbered_list(tickets: &[TicketSummary]) -> String {
    tickets
        .iter()
        .enumerate()
        .map(|(i, t)| format!("{}) Ticket ID: {} – Status: {}", i + 1, t.ticket_id, t.status))
        .collect::<Vec<_>>()
        .join("\n")
}

fn or_na(value: &str) -> &str {
    if value.trim().is_empty() { "N/A" } else { value }
}
