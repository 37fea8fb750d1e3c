// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Counter and reservation operations.
//!
//! Each operation runs as one IMMEDIATE transaction on the writer thread, so
//! the counter and the reservation table can never disagree.

use intake_core::{IntakeError, ReleaseOutcome, Reservation, UserId};
use rusqlite::{OptionalExtension, TransactionBehavior, params};

use crate::database::{Database, map_tr_err};
use crate::ticket_id::TicketIdFormat;

/// What `reserve_or_issue` handed out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issued {
    pub ticket_id: String,
    /// `true` when an existing reservation was consumed instead of a new id issued.
    pub reused: bool,
}

fn read_counter(conn: &rusqlite::Connection) -> Result<i64, rusqlite::Error> {
    conn.query_row(
        "SELECT last_issued FROM ticket_counter WHERE id = 1",
        [],
        |row| row.get(0),
    )
}

/// Consume the user's reservation, or issue and reserve the next id.
pub async fn reserve_or_issue(
    db: &Database,
    user: &UserId,
    format: &TicketIdFormat,
) -> Result<Issued, IntakeError> {
    let user = user.as_str().to_string();
    let format = format.clone();
    db.connection()
        .call(move |conn| -> Result<Issued, rusqlite::Error> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let existing: Option<String> = tx
                .query_row(
                    "SELECT ticket_id FROM ticket_reservations WHERE user_id = ?1",
                    params![user],
                    |row| row.get(0),
                )
                .optional()?;

            if let Some(ticket_id) = existing {
                tx.execute(
                    "DELETE FROM ticket_reservations WHERE user_id = ?1",
                    params![user],
                )?;
                tx.commit()?;
                return Ok(Issued {
                    ticket_id,
                    reused: true,
                });
            }

            tx.execute(
                "UPDATE ticket_counter SET last_issued = last_issued + 1,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = 1",
                [],
            )?;
            let number = read_counter(&tx)?;
            let ticket_id = format.format(number as u64);
            tx.execute(
                "INSERT INTO ticket_reservations (user_id, ticket_id, ticket_number)
                 VALUES (?1, ?2, ?3)",
                params![user, ticket_id, number],
            )?;
            tx.commit()?;

            Ok(Issued {
                ticket_id,
                reused: false,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Drop the user's reservation, rolling the counter back only at the tail.
pub async fn release(db: &Database, user: &UserId) -> Result<ReleaseOutcome, IntakeError> {
    let user = user.as_str().to_string();
    db.connection()
        .call(move |conn| -> Result<ReleaseOutcome, rusqlite::Error> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let reserved: Option<(String, i64)> = tx
                .query_row(
                    "SELECT ticket_id, ticket_number FROM ticket_reservations WHERE user_id = ?1",
                    params![user],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let Some((ticket_id, number)) = reserved else {
                tx.commit()?;
                return Ok(ReleaseOutcome::default());
            };

            let counter_decremented = number == read_counter(&tx)? && number > 0;
            if counter_decremented {
                tx.execute(
                    "UPDATE ticket_counter SET last_issued = last_issued - 1,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE id = 1",
                    [],
                )?;
            }
            tx.execute(
                "DELETE FROM ticket_reservations WHERE user_id = ?1",
                params![user],
            )?;
            tx.commit()?;

            Ok(ReleaseOutcome {
                released: Some(ticket_id),
                counter_decremented,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Drop the user's reservation, leaving the counter alone.
pub async fn finalize(db: &Database, user: &UserId) -> Result<bool, IntakeError> {
    let user = user.as_str().to_string();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let removed = conn.execute(
                "DELETE FROM ticket_reservations WHERE user_id = ?1",
                params![user],
            )?;
            Ok(removed > 0)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn last_issued(db: &Database) -> Result<u64, IntakeError> {
    db.connection()
        .call(|conn| -> Result<i64, rusqlite::Error> { read_counter(conn) })
        .await
        .map(|n| n as u64)
        .map_err(map_tr_err)
}

pub async fn reservation_for(db: &Database, user: &UserId) -> Result<Option<String>, IntakeError> {
    let user = user.as_str().to_string();
    db.connection()
        .call(move |conn| -> Result<Option<String>, rusqlite::Error> {
            conn.query_row(
                "SELECT ticket_id FROM ticket_reservations WHERE user_id = ?1",
                params![user],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// All outstanding reservations, oldest first.
pub async fn list_reservations(db: &Database) -> Result<Vec<Reservation>, IntakeError> {
    db.connection()
        .call(|conn| -> Result<Vec<Reservation>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT user_id, ticket_id, reserved_at FROM ticket_reservations
                 ORDER BY reserved_at ASC, ticket_number ASC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(Reservation {
                    user: UserId(row.get(0)?),
                    ticket_id: row.get(1)?,
                    reserved_at: row.get(2)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Seed an empty store with state carried over from another deployment.
///
/// Returns `false` and changes nothing when the store has already issued ids
/// or holds reservations.
pub async fn seed(
    db: &Database,
    last_issued: u64,
    reservations: Vec<(String, String, u64)>,
) -> Result<bool, IntakeError> {
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let current = read_counter(&tx)?;
            let outstanding: i64 =
                tx.query_row("SELECT COUNT(*) FROM ticket_reservations", [], |row| row.get(0))?;
            if current != 0 || outstanding != 0 {
                tx.commit()?;
                return Ok(false);
            }

            tx.execute(
                "UPDATE ticket_counter SET last_issued = ?1,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = 1",
                params![last_issued as i64],
            )?;
            for (user, ticket_id, number) in reservations {
                tx.execute(
                    "INSERT OR IGNORE INTO ticket_reservations (user_id, ticket_id, ticket_number)
                     VALUES (?1, ?2, ?3)",
                    params![user, ticket_id, number as i64],
                )?;
            }
            tx.commit()?;
            Ok(true)
        })
        .await
        .map_err(map_tr_err)
}
