//! # Database State
//!
//! Wraps the `Database` connection for use in commands.
//!
//! The `Database` holds a `SqlitePool`, so commands can share one
//! `DbState` without locking.
//!
//! ```rust,ignore
//! pub async fn list_patients(db: &DbState) -> Result<Vec<Patient>, ApiError> {
//!     Ok(db.inner().patients().list_patients().await?)
//! }
//! ```

use tracing::info;

use clinic_db::{Database, DbConfig};

use crate::error::ApiError;
use crate::state::AppConfig;

#[derive(Debug)]
pub struct DbState {
    db: Database,
}

impl DbState {
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// Opens the configured database file and runs migrations.
    pub async fn open(config: &AppConfig) -> Result<Self, ApiError> {
        info!(clinic = %config.clinic_name, "Opening clinic database");
        let db = Database::new(DbConfig::new(&config.database_path)).await?;
        Ok(DbState::new(db))
    }

    /// In-memory database with migrations applied.
    pub async fn in_memory() -> Result<Self, ApiError> {
        Ok(DbState::new(Database::new(DbConfig::in_memory()).await?))
    }

    pub fn inner(&self) -> &Database {
        &self.db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            database_path: dir.path().join("nested").join("clinic.db"),
            ..AppConfig::default()
        };

        let state = DbState::open(&config).await.unwrap();
        assert!(state.inner().health_check().await);
        assert!(config.database_path.exists());
    }
}
