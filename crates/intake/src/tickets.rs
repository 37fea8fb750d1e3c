// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `intake tickets` command implementation.
//!
//! Works directly on the counter database, so it can be used while the
//! service is stopped to inspect or clear stuck reservations.

use intake_config::IntakeConfig;
use intake_core::{IntakeError, Reservation, StorageAdapter, TicketCounter, UserId};
use intake_storage::SqliteTicketCounter;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct CounterReport {
    last_issued: u64,
    last_issued_id: Option<String>,
    reservations: Vec<Reservation>,
}

async fn open(config: &IntakeConfig) -> Result<SqliteTicketCounter, IntakeError> {
    SqliteTicketCounter::open(config.storage.clone(), &config.tickets).await
}

/// Prints the counter and every outstanding reservation.
pub async fn run_list(config: &IntakeConfig, json: bool) -> Result<(), IntakeError> {
    let counter = open(config).await?;
    let last_issued = counter.last_issued().await?;
    let report = CounterReport {
        last_issued,
        last_issued_id: (last_issued > 0).then(|| counter.format().format(last_issued)),
        reservations: counter.list_reservations().await?,
    };
    counter.close().await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
        );
        return Ok(());
    }

    println!();
    println!("  ticket counter ({})", config.storage.database_path);
    println!("  {}", "-".repeat(35));
    println!(
        "    Last issued:  {}",
        report.last_issued_id.as_deref().unwrap_or("none")
    );
    if report.reservations.is_empty() {
        println!("    Reservations: none");
    } else {
        println!("    Reservations:");
        for r in &report.reservations {
            println!("      {}  {}  (since {})", r.ticket_id, r.user, r.reserved_at);
        }
    }
    println!();
    Ok(())
}

/// Releases `user`'s reservation.
pub async fn run_release(config: &IntakeConfig, user: &str) -> Result<(), IntakeError> {
    let counter = open(config).await?;
    let outcome = counter.release(&UserId::from(user)).await?;
    counter.close().await?;

    match outcome.released {
        Some(ticket_id) if outcome.counter_decremented => {
            println!("released {ticket_id} for {user}; it will be issued again next")
        }
        Some(ticket_id) => println!("released {ticket_id} for {user}"),
        None => println!("{user} has no reservation"),
    }
    Ok(())
}
