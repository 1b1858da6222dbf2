use serde::{Deserialize, Serialize};

use super::{Dollars, PlayerId};

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 4;
pub const STARTING_BALANCE: Dollars = 1500;
pub const MAX_NAME_LEN: usize = 24;
pub const PLAYER_COLORS: [&str; 4] = ["#ffb347", "#5dd6c1", "#6ea8ff", "#f970b7"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    /// Display only; may be blank while the player is typing
    pub name: String,
    pub balance: Dollars,
    pub color: String,
}

impl Player {
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            name: default_name(id),
            balance: STARTING_BALANCE,
            color: color_for(id).to_string(),
        }
    }

    pub fn has_blank_name(&self) -> bool {
        self.name.trim().is_empty()
    }
}

pub fn default_name(id: PlayerId) -> String {
    format!("Player {}", id)
}

pub fn color_for(id: PlayerId) -> &'static str {
    let index = (usize::from(id).max(1) - 1) % PLAYER_COLORS.len();
    PLAYER_COLORS[index]
}

/// Clamp a requested player count into the supported table size.
pub fn clamp_player_count(count: usize) -> usize {
    count.clamp(MIN_PLAYERS, MAX_PLAYERS)
}

/// Cut a name down to the input limit, counting characters rather than bytes.
pub fn truncate_name(name: &str) -> String {
    name.chars().take(MAX_NAME_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_player_defaults() {
        let player = Player::new(3);
        assert_eq!(player.name, "Player 3");
        assert_eq!(player.balance, STARTING_BALANCE);
        assert_eq!(player.color, "#6ea8ff");
    }

    #[test]
    fn test_clamp_player_count() {
        assert_eq!(clamp_player_count(0), 2);
        assert_eq!(clamp_player_count(3), 3);
        assert_eq!(clamp_player_count(7), 4);
    }

    #[test]
    fn test_truncate_name_counts_chars() {
        let long = "é".repeat(30);
        assert_eq!(truncate_name(&long).chars().count(), MAX_NAME_LEN);
        assert_eq!(truncate_name("Ann"), "Ann");
    }
}
