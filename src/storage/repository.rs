use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool, sqlite::SqlitePoolOptions};
use tracing::warn;

use super::MIGRATION_001_APP_STATE;

/// One stored blob and when it was last written.
#[derive(Debug, Clone)]
pub struct StoredState {
    pub value: String,
    /// `None` when the stored timestamp is not valid RFC 3339.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Durable key/value storage for the serialized game.
#[derive(Clone)]
pub struct StateStore {
    pool: SqlitePool,
}

impl StateStore {
    /// Create a new store with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database URL.
    /// Keeps exactly one connection open; a `sqlite::memory:` database lives
    /// only as long as its connection.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_APP_STATE)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Connect and migrate in one go.
    pub async fn init(database_url: &str) -> Result<Self> {
        let store = Self::connect(database_url).await?;
        store.migrate().await?;
        Ok(store)
    }

    /// Read the blob stored under `key`, if any.
    ///
    /// Only a failing query is an error. A row whose columns cannot be read
    /// counts as no saved state, and an unreadable timestamp is dropped.
    pub async fn load(&self, key: &str) -> Result<Option<StoredState>> {
        let row = sqlx::query("SELECT value, updated_at FROM app_state WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to read stored state")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let value: String = match row.try_get("value") {
            Ok(value) => value,
            Err(err) => {
                warn!(key, error = %err, "Stored state is not text; ignoring it");
                return Ok(None);
            }
        };

        let updated_at = match row.try_get::<String, _>("updated_at") {
            Ok(raw) => match DateTime::parse_from_rfc3339(&raw) {
                Ok(at) => Some(at.with_timezone(&Utc)),
                Err(err) => {
                    warn!(key, updated_at = %raw, error = %err, "Invalid updated_at timestamp");
                    None
                }
            },
            Err(err) => {
                warn!(key, error = %err, "Unreadable updated_at column");
                None
            }
        };

        Ok(Some(StoredState { value, updated_at }))
    }

    /// Write (or overwrite) the blob under `key`.
    pub async fn save(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO app_state (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save state")?;
        Ok(())
    }

    /// Remove the blob under `key`. Returns true if something was deleted.
    pub async fn clear(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM app_state WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .context("Failed to clear state")?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> StateStore {
        StateStore::init("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_missing_key_loads_none() {
        let store = memory_store().await;
        assert!(store.load("nothing-here").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let store = memory_store().await;
        store.save("game", "{\"a\":1}").await.unwrap();
        store.save("game", "{\"a\":2}").await.unwrap();

        let stored = store.load("game").await.unwrap().unwrap();
        assert_eq!(stored.value, "{\"a\":2}");
        assert!(stored.updated_at.is_some_and(|at| at <= Utc::now()));
    }

    #[tokio::test]
    async fn test_bad_timestamp_still_loads_value() {
        let store = memory_store().await;
        store.save("game", "{\"a\":1}").await.unwrap();
        sqlx::query("UPDATE app_state SET updated_at = 'garbage' WHERE key = 'game'")
            .execute(&store.pool)
            .await
            .unwrap();

        let stored = store.load("game").await.unwrap().unwrap();
        assert_eq!(stored.value, "{\"a\":1}");
        assert!(stored.updated_at.is_none());
    }

    #[tokio::test]
    async fn test_clear() {
        let store = memory_store().await;
        store.save("game", "{}").await.unwrap();

        assert!(store.clear("game").await.unwrap());
        assert!(!store.clear("game").await.unwrap());
        assert!(store.load("game").await.unwrap().is_none());
    }
}
