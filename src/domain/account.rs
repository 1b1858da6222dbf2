use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub type PlayerId = u8;

pub const BANK_KEY: &str = "bank";
pub const TAX_KEY: &str = "tax";

/// Anything that can be the source or target of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountId {
    Player(PlayerId),
    /// The shared tax pile in the middle of the board
    Tax,
    /// The bank never runs out of money
    Bank,
}

impl AccountId {
    pub fn is_bank(&self) -> bool {
        matches!(self, AccountId::Bank)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountId::Player(id) => write!(f, "player-{}", id),
            AccountId::Tax => write!(f, "{}", TAX_KEY),
            AccountId::Bank => write!(f, "{}", BANK_KEY),
        }
    }
}

impl FromStr for AccountId {
    type Err = ParseAccountError;

    /// Accepts "bank", "tax", "player-2" and a bare player number such as "2".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        match key.as_str() {
            BANK_KEY => Ok(AccountId::Bank),
            TAX_KEY => Ok(AccountId::Tax),
            _ => {
                let number = key.strip_prefix("player-").unwrap_or(key.as_str());
                number
                    .parse::<PlayerId>()
                    .ok()
                    .filter(|id| *id > 0)
                    .map(AccountId::Player)
                    .ok_or_else(|| ParseAccountError(s.to_string()))
            }
        }
    }
}

impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseAccountError(pub String);

impl fmt::Display for ParseAccountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown account '{}' (expected bank, tax or player-N)",
            self.0
        )
    }
}

impl std::error::Error for ParseAccountError {}

/// One entry of an account picker, labelled with its live balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountOption {
    pub id: AccountId,
    pub label: String,
}
