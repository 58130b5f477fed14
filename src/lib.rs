pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod models;

pub use error::{Result, SrsError};
pub use models::{HasDueDate, Quality, ReviewCard, ReviewSession, VocabCard, VocabItem};
