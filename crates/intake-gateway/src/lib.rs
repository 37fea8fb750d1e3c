// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Intake support desk.
//!
//! Serves the health probe, the resolution webhooks the support team's
//! sheet calls, an operator session listing, and whatever webhook routes
//! the chat channel contributes.

pub mod auth;
pub mod handlers;
pub mod server;

pub use auth::AuthConfig;
pub use server::{GatewayState, HealthState, ServerConfig, build_router, start_server};
