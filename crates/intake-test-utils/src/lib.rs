// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Intake integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockChannel`] - Mock chat channel with message injection and capture
//! - [`MockTicketGateway`] - Mock ticket store recording every call
//! - [`TestHarness`] - Engine wired to both mocks and a temp SQLite counter

pub mod harness;
pub mod mock_channel;
pub mod mock_gateway;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_channel::{MockChannel, SentMessage};
pub use mock_gateway::{GatewayCall, MockTicketGateway};
