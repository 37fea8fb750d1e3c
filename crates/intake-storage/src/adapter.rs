// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter and TicketCounter traits.

use std::path::Path;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use intake_config::model::{StorageConfig, TicketsConfig};
use intake_core::{
    AdapterType, HealthStatus, IntakeError, PluginAdapter, ReleaseOutcome, Reservation,
    StorageAdapter, TicketCounter, UserId,
};

use crate::database::{Database, map_tr_err};
use crate::legacy;
use crate::queries;
use crate::ticket_id::TicketIdFormat;

/// SQLite-backed ticket counter.
///
/// The database is opened on [`StorageAdapter::initialize`]; every other
/// call fails until then.
pub struct SqliteTicketCounter {
    config: StorageConfig,
    format: TicketIdFormat,
    db: OnceCell<Database>,
}

impl SqliteTicketCounter {
    pub fn new(config: StorageConfig, tickets: &TicketsConfig) -> Self {
        Self {
            config,
            format: TicketIdFormat::from(tickets),
            db: OnceCell::new(),
        }
    }

    /// Create and initialize in one step.
    pub async fn open(config: StorageConfig, tickets: &TicketsConfig) -> Result<Self, IntakeError> {
        let counter = Self::new(config, tickets);
        counter.initialize().await?;
        Ok(counter)
    }

    pub fn format(&self) -> &TicketIdFormat {
        &self.format
    }

    fn db(&self) -> Result<&Database, IntakeError> {
        self.db
            .get()
            .ok_or_else(|| IntakeError::storage("storage not initialized -- call initialize() first"))
    }
}

#[async_trait]
impl PluginAdapter for SqliteTicketCounter {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, IntakeError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), IntakeError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteTicketCounter {
    async fn initialize(&self) -> Result<(), IntakeError> {
        let db = Database::open(&self.config.database_path).await?;

        let imported = legacy::import_if_fresh(
            &db,
            self.config.legacy_counter_file.as_deref().map(Path::new),
            self.config.legacy_reservations_file.as_deref().map(Path::new),
            &self.format,
        )
        .await?;

        self.db
            .set(db)
            .map_err(|_| IntakeError::storage("storage already initialized"))?;
        info!(
            path = %self.config.database_path,
            legacy_imported = imported,
            "ticket counter store initialized"
        );
        Ok(())
    }

    async fn close(&self) -> Result<(), IntakeError> {
        self.db()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl TicketCounter for SqliteTicketCounter {
    async fn reserve_or_issue(&self, user: &UserId) -> Result<String, IntakeError> {
        let issued = queries::counter::reserve_or_issue(self.db()?, user, &self.format).await?;
        if issued.reused {
            debug!(%user, ticket_id = %issued.ticket_id, "consumed existing reservation");
        } else {
            debug!(%user, ticket_id = %issued.ticket_id, "issued ticket id");
        }
        Ok(issued.ticket_id)
    }

    async fn release(&self, user: &UserId) -> Result<ReleaseOutcome, IntakeError> {
        let outcome = queries::counter::release(self.db()?, user).await?;
        if let Some(ticket_id) = &outcome.released {
            info!(
                %user,
                %ticket_id,
                reclaimed = outcome.counter_decremented,
                "released reserved ticket"
            );
        }
        Ok(outcome)
    }

    async fn finalize(&self, user: &UserId) -> Result<bool, IntakeError> {
        queries::counter::finalize(self.db()?, user).await
    }

    async fn last_issued(&self) -> Result<u64, IntakeError> {
        queries::counter::last_issued(self.db()?).await
    }

    async fn reservation_for(&self, user: &UserId) -> Result<Option<String>, IntakeError> {
        queries::counter::reservation_for(self.db()?, user).await
    }

    async fn list_reservations(&self) -> Result<Vec<Reservation>, IntakeError> {
        queries::counter::list_reservations(self.db()?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &Path) -> StorageConfig {
        StorageConfig {
            database_path: path.to_str().unwrap().to_string(),
            legacy_counter_file: None,
            legacy_reservations_file: None,
        }
    }

    #[tokio::test]
    async fn implements_plugin_adapter() {
        let dir = tempdir().unwrap();
        let counter = SqliteTicketCounter::new(
            make_config(&dir.path().join("t.db")),
            &TicketsConfig::default(),
        );
        assert_eq!(counter.name(), "sqlite");
        assert_eq!(counter.version(), semver::Version::new(0, 1, 0));
        assert_eq!(counter.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn calls_fail_before_initialize() {
        let dir = tempdir().unwrap();
        let counter = SqliteTicketCounter::new(
            make_config(&dir.path().join("t.db")),
            &TicketsConfig::default(),
        );
        assert!(counter.health_check().await.is_err());
        assert!(counter.reserve_or_issue(&UserId::from("u")).await.is_err());
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let counter = SqliteTicketCounter::new(
            make_config(&dir.path().join("t.db")),
            &TicketsConfig::default(),
        );
        counter.initialize().await.unwrap();
        assert!(counter.initialize().await.is_err());
        assert_eq!(counter.health_check().await.unwrap(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn legacy_files_are_imported_once() {
        let dir = tempdir().unwrap();
        let counter_file = dir.path().join("ticket-counter.json");
        let reserved_file = dir.path().join("reserved-tickets.json");
        std::fs::write(&counter_file, r#"{"lastTicket":41}"#).unwrap();
        std::fs::write(&reserved_file, r#"{"a@c.us":"ULI0041"}"#).unwrap();

        let mut config = make_config(&dir.path().join("t.db"));
        config.legacy_counter_file = Some(counter_file.to_str().unwrap().to_string());
        config.legacy_reservations_file = Some(reserved_file.to_str().unwrap().to_string());

        let counter = SqliteTicketCounter::open(config.clone(), &TicketsConfig::default())
            .await
            .unwrap();
        assert_eq!(counter.last_issued().await.unwrap(), 41);
        assert_eq!(
            counter.reservation_for(&UserId::from("a@c.us")).await.unwrap(),
            Some("ULI0041".to_string())
        );
        assert_eq!(
            counter.reserve_or_issue(&UserId::from("b@c.us")).await.unwrap(),
            "ULI0042"
        );
        counter.shutdown().await.unwrap();
        drop(counter);

        // The legacy files are still there, but the store is no longer fresh.
        std::fs::write(&counter_file, r#"{"lastTicket":5}"#).unwrap();
        let reopened = SqliteTicketCounter::open(config, &TicketsConfig::default())
            .await
            .unwrap();
        assert_eq!(reopened.last_issued().await.unwrap(), 42);
    }
}
