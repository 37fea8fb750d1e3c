// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classification of raw message text into intents.

use crate::session::Stage;

const STOP_WORDS: &[&str] = &["stop", "cancel", "quit", "exit", "abort", "end"];
const RESTART_WORDS: &[&str] = &["restart", "reset", "start over", "begin again", "new"];
const GREETING_WORDS: &[&str] = &["hi", "hello", "hey"];
const AFFIRM_WORDS: &[&str] = &["yes", "y", "ok", "sure", "proceed"];
const DECLINE_WORDS: &[&str] = &["no", "n", "cancel", "stop"];

/// What a message means, independent of what it will cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// A stop word while a session is active.
    Stop,
    /// A restart word while a session is active.
    Restart,
    /// A greeting word with no session.
    Greeting,
    /// Yes-like answer while confirming a new ticket.
    Affirm,
    /// No-like answer while confirming a new ticket.
    Decline,
    /// An unsigned decimal number.
    Choice(u32),
    /// Nothing but whitespace.
    Empty,
    /// Anything else.
    Text,
}

/// Lowercased, trimmed form used for every keyword comparison.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Classify `text` for a user whose session is at `stage` (`None` when there
/// is no session).
///
/// Stop and restart words win over everything else once a session exists.
pub fn classify(stage: Option<Stage>, text: &str) -> Intent {
    let normalized = normalize(text);
    let word = normalized.as_str();

    let Some(stage) = stage else {
        return if GREETING_WORDS.contains(&word) {
            Intent::Greeting
        } else if word.is_empty() {
            Intent::Empty
        } else {
            Intent::Text
        };
    };

    if STOP_WORDS.contains(&word) {
        return Intent::Stop;
    }
    if RESTART_WORDS.contains(&word) {
        return Intent::Restart;
    }
    if word.is_empty() {
        return Intent::Empty;
    }
    if stage == Stage::ConfirmStart {
        if AFFIRM_WORDS.contains(&word) {
            return Intent::Affirm;
        }
        if DECLINE_WORDS.contains(&word) {
            return Intent::Decline;
        }
    }
    if word.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(n) = word.parse::<u32>() {
            return Intent::Choice(n);
        }
    }
    Intent::Text
}
