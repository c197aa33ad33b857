use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use log::info;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use thiserror::Error;

use crate::repository::Storage;

mod migrate;
mod progress_repo;

/// How long a write waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Progress store kept in one `progress_entries` table, a row per key.
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

fn connect_options(database_url: &str) -> Result<SqliteConnectOptions, sqlx::Error> {
    Ok(SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT))
}

impl SqliteRepository {
    /// Opens a single-connection pool for `database_url`, creating the file
    /// when it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the URL is malformed or the database
    /// cannot be opened.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteInitError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(BUSY_TIMEOUT)
            .connect_with(connect_options(database_url)?)
            .await?;
        info!("opened progress database {database_url}");
        Ok(Self { pool })
    }

    /// # Errors
    ///
    /// Returns `SqliteInitError` if a schema step fails.
    pub async fn migrate(&self) -> Result<(), SqliteInitError> {
        migrate::run_migrations(&self.pool).await
    }
}

impl Storage {
    /// Opens and migrates a `SQLite` progress database.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if opening or migrating fails.
    pub async fn sqlite(database_url: &str) -> Result<Self, SqliteInitError> {
        let repo = SqliteRepository::connect(database_url).await?;
        repo.migrate().await?;
        Ok(Self {
            progress: Arc::new(repo),
        })
    }
}
