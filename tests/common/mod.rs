// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::{DateTime, Utc};
use monopoly_banker::application::{BankerConfig, BankerSession};
use monopoly_banker::storage::StateStore;
use tempfile::TempDir;

/// Helper to create a test config pointing at a fresh temporary database
pub fn test_config(temp_dir: &TempDir) -> BankerConfig {
    let db_path = temp_dir.path().join("banker.db");
    BankerConfig::new(db_path.to_str().unwrap())
}

/// Helper to open a persistent session over a temporary database
pub async fn test_session(players: usize) -> Result<(BankerSession, TempDir)> {
    let temp_dir = TempDir::new()?;
    let config = test_config(&temp_dir).with_initial_players(players);
    let session = BankerSession::open(config).await?;
    Ok((session, temp_dir))
}

/// Helper to open the raw store behind a test config
pub async fn raw_store(config: &BankerConfig) -> Result<StateStore> {
    StateStore::init(&config.database_url().unwrap()).await
}

/// Helper to run raw SQL against a test database on its own connection
pub async fn exec_sql(config: &BankerConfig, sql: &str) -> Result<()> {
    let pool = sqlx::SqlitePool::connect(&config.database_url().unwrap()).await?;
    sqlx::query(sql).execute(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Helper to build a fixed instant `ms` milliseconds after the epoch
pub fn at(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap()
}
