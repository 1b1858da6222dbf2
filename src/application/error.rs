use thiserror::Error;

use crate::domain::{PlayerId, TransferError};

#[derive(Error, Debug)]
pub enum AppError {
    /// A refused transfer; the message is the one shown to the table
    #[error("{0}")]
    Transfer(#[from] TransferError),

    #[error("Enter a positive custom amount.")]
    InvalidCustomAmount(String),

    #[error("Player not found: {0}")]
    PlayerNotFound(PlayerId),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to serialize game state: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}
