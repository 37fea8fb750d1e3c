// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the Intake service.
//!
//! External collaborators extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod channel;
pub mod control;
pub mod counter;
pub mod gateway;
pub mod storage;

pub use adapter::PluginAdapter;
pub use channel::ChannelAdapter;
pub use control::ConversationControl;
pub use counter::TicketCounter;
pub use gateway::TicketGateway;
pub use storage::StorageAdapter;
