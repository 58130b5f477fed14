//! Error type shared by the scheduler, the database layer and the CLI.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SrsError {
    /// Quality rating outside 0-5
    #[error("Invalid quality rating: {0} (expected 0-5)")]
    InvalidQuality(i64),
    /// Quality given as text that is neither a number nor a known label
    #[error("Unknown quality rating '{0}' (expected 0-5 or a label such as 'perfect')")]
    UnknownQualityLabel(String),
    /// Card state that breaks the scheduling invariants
    #[error("Invalid card state: {0}")]
    InvalidCard(String),
    /// No scheduling record for the (user, item) pair
    #[error("No review card for user {user_id}, item {item_id}")]
    CardNotFound { user_id: i64, item_id: i64 },
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Simulated date cannot move past chrono's supported range
    #[error("Simulated date {0} cannot be advanced further")]
    DateOutOfRange(DateTime<Utc>),
    /// A thread panicked while holding the connection
    #[error("Database lock poisoned")]
    LockPoisoned,
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Invalid configuration file
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SrsError>;
