// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation engine for the Intake support desk.
//!
//! The [`ConversationEngine`] is the central coordinator that:
//! - Receives messages from a channel adapter
//! - Classifies them and routes them through the stage machine
//! - Reserves, releases and finalizes ticket ids
//! - Records tickets and status changes through the ticket gateway
//! - Reaps abandoned sessions and drains handlers on shutdown

pub mod engine;
pub mod intent;
pub mod locks;
pub mod machine;
pub mod messages;
pub mod session;
pub mod shutdown;

pub use engine::{ConversationEngine, EngineSettings, MIN_DESCRIPTION_CHARS, USER_CLOSE_RESOLUTION};
pub use intent::{Intent, classify};
pub use machine::{Action, Origin, route};
pub use messages::Replies;
pub use session::{MemorySessionStore, Session, SessionStore, Stage, TicketDraft};
