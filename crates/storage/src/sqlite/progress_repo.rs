use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use crate::repository::{ProgressKey, ProgressRepository, StorageError};

use super::SqliteRepository;

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn load(&self, key: ProgressKey) -> Result<Option<String>, StorageError> {
        let row = sqlx::query("SELECT value FROM progress_entries WHERE key = ?1")
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        row.try_get::<String, _>("value")
            .map(Some)
            .map_err(|err| StorageError::Connection(err.to_string()))
    }

    async fn save(&self, key: ProgressKey, value: &str) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO progress_entries (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            ",
        )
        .bind(key.as_str())
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }
}
