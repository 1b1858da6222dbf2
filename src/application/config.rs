use chrono::Duration;

use crate::domain::{MAX_PLAYERS, NAME_RESET_DELAY_MS, clamp_player_count};

use super::AppError;

pub const DEFAULT_DATABASE: &str = "banker.db";
pub const DEFAULT_STORAGE_KEY: &str = "monopoly-banker-state";

/// Settings for one banker session.
#[derive(Debug, Clone)]
pub struct BankerConfig {
    /// SQLite file holding the saved game; `None` keeps everything in memory
    pub database: Option<String>,
    /// Key of the saved-game blob inside the database
    pub storage_key: String,
    /// Seats for a fresh game when nothing is saved
    pub initial_players: usize,
    pub name_reset_delay: Duration,
}

impl BankerConfig {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: Some(database.into()),
            ..Self::in_memory()
        }
    }

    /// A session that never touches the disk.
    pub fn in_memory() -> Self {
        Self {
            database: None,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            initial_players: MAX_PLAYERS,
            name_reset_delay: Duration::milliseconds(NAME_RESET_DELAY_MS),
        }
    }

    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Seats for a fresh game, clamped to 2..=4 like every other seat count.
    pub fn with_initial_players(mut self, count: usize) -> Self {
        self.initial_players = clamp_player_count(count);
        self
    }

    pub fn with_name_reset_delay(mut self, delay: Duration) -> Self {
        self.name_reset_delay = delay;
        self
    }

    /// SQLite URL for the configured file, created on first use.
    pub fn database_url(&self) -> Option<String> {
        self.database
            .as_ref()
            .map(|path| format!("sqlite:{}?mode=rwc", path))
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.storage_key.trim().is_empty() {
            return Err(AppError::InvalidConfig(
                "storage key must not be empty".to_string(),
            ));
        }
        if self.name_reset_delay < Duration::zero() {
            return Err(AppError::InvalidConfig(
                "name reset delay must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for BankerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATABASE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BankerConfig::default();
        assert_eq!(config.database.as_deref(), Some("banker.db"));
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
        assert_eq!(config.initial_players, 4);
        assert_eq!(config.name_reset_delay, Duration::milliseconds(3000));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_database_url() {
        assert_eq!(
            BankerConfig::new("/tmp/game.db").database_url().as_deref(),
            Some("sqlite:/tmp/game.db?mode=rwc")
        );
        assert!(BankerConfig::in_memory().database_url().is_none());
    }

    #[test]
    fn test_initial_players_are_clamped() {
        let config = BankerConfig::in_memory().with_initial_players(5);
        assert_eq!(config.initial_players, 4);
        assert!(config.validate().is_ok());

        assert_eq!(BankerConfig::in_memory().with_initial_players(0).initial_players, 2);
        assert_eq!(BankerConfig::in_memory().with_initial_players(3).initial_players, 3);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(
            BankerConfig::in_memory()
                .with_storage_key(" ")
                .validate()
                .is_err()
        );
        assert!(
            BankerConfig::in_memory()
                .with_name_reset_delay(Duration::milliseconds(-1))
                .validate()
                .is_err()
        );
    }
}
