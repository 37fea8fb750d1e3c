// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-time import of the JSON counter files used by earlier deployments.
//!
//! `ticket-counter.json` holds `{"lastTicket": n}` and
//! `reserved-tickets.json` maps user ids to reserved ticket ids.

use std::collections::BTreeMap;
use std::path::Path;

use intake_core::IntakeError;
use serde::Deserialize;
use tracing::{info, warn};

use crate::database::Database;
use crate::queries;
use crate::ticket_id::TicketIdFormat;

#[derive(Debug, Deserialize)]
struct LegacyCounter {
    #[serde(rename = "lastTicket", default)]
    last_ticket: u64,
}

/// State read from the legacy files.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct LegacyState {
    pub last_issued: u64,
    /// `(user, ticket id, number)` triples.
    pub reservations: Vec<(String, String, u64)>,
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Option<T>, IntakeError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path).map_err(|e| IntakeError::Storage {
        source: Box::new(e),
    })?;
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| IntakeError::storage(format!("{}: {e}", path.display())))
}

/// Read whichever legacy files exist. Reservations whose id does not carry
/// the configured prefix are skipped.
pub fn read_legacy_state(
    counter_file: Option<&Path>,
    reservations_file: Option<&Path>,
    format: &TicketIdFormat,
) -> Result<Option<LegacyState>, IntakeError> {
    let counter: Option<LegacyCounter> = match counter_file {
        Some(path) => read_json(path)?,
        None => None,
    };
    let reserved: Option<BTreeMap<String, String>> = match reservations_file {
        Some(path) => read_json(path)?,
        None => None,
    };

    if counter.is_none() && reserved.is_none() {
        return Ok(None);
    }

    let mut state = LegacyState {
        last_issued: counter.map(|c| c.last_ticket).unwrap_or_default(),
        reservations: Vec::new(),
    };
    for (user, ticket_id) in reserved.unwrap_or_default() {
        match format.parse(&ticket_id) {
            Some(number) => {
                state.last_issued = state.last_issued.max(number);
                state.reservations.push((user, ticket_id, number));
            }
            None => warn!(%user, %ticket_id, "skipping legacy reservation with foreign id"),
        }
    }
    Ok(Some(state))
}

/// Import legacy state into an empty store. Returns whether anything was imported.
pub async fn import_if_fresh(
    db: &Database,
    counter_file: Option<&Path>,
    reservations_file: Option<&Path>,
    format: &TicketIdFormat,
) -> Result<bool, IntakeError> {
    let Some(state) = read_legacy_state(counter_file, reservations_file, format)? else {
        return Ok(false);
    };
    let last_issued = state.last_issued;
    let count = state.reservations.len();
    let imported = queries::counter::seed(db, last_issued, state.reservations).await?;
    if imported {
        info!(last_issued, reservations = count, "imported legacy ticket counter");
    }
    Ok(imported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn reads_both_files() {
        let dir = tempdir().unwrap();
        let counter = dir.path().join("ticket-counter.json");
        let reserved = dir.path().join("reserved-tickets.json");
        std::fs::write(&counter, r#"{"lastTicket":12}"#).unwrap();
        std::fs::write(&reserved, r#"{"9198@c.us":"ULI0012","9199@c.us":"XYZ1"}"#).unwrap();

        let state = read_legacy_state(Some(&counter), Some(&reserved), &TicketIdFormat::default())
            .unwrap()
            .unwrap();
        assert_eq!(state.last_issued, 12);
        assert_eq!(
            state.reservations,
            vec![("9198@c.us".to_string(), "ULI0012".to_string(), 12)]
        );
    }

    #[test]
    fn missing_files_yield_none() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        let state =
            read_legacy_state(Some(&missing), None, &TicketIdFormat::default()).unwrap();
        assert!(state.is_none());
    }

    #[test]
    fn reservation_above_counter_raises_it() {
        let dir = tempdir().unwrap();
        let reserved = dir.path().join("reserved-tickets.json");
        std::fs::write(&reserved, r#"{"a@c.us":"ULI0030"}"#).unwrap();
        let state = read_legacy_state(None, Some(&reserved), &TicketIdFormat::default())
            .unwrap()
            .unwrap();
        assert_eq!(state.last_issued, 30);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let counter = dir.path().join("ticket-counter.json");
        std::fs::write(&counter, "not json").unwrap();
        assert!(read_legacy_state(Some(&counter), None, &TicketIdFormat::default()).is_err());
    }
}
