// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite ticket counter and reservation store for the Intake support desk.
//!
//! Provides WAL-mode SQLite storage with embedded migrations and a
//! single-writer concurrency model via `tokio-rusqlite`. The counter and the
//! reservation table are always mutated inside the same transaction.

pub mod adapter;
pub mod database;
pub mod legacy;
pub mod migrations;
pub mod queries;
pub mod ticket_id;

pub use adapter::SqliteTicketCounter;
pub use database::Database;
pub use ticket_id::TicketIdFormat;
