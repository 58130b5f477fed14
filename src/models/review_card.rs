//! Scheduling state of one vocabulary item for one learner.
use super::sm2::{DEFAULT_EASE, MIN_EASE};
use crate::error::{Result, SrsError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCard {
    pub ease_factor: f64,
    /// Days until the next review. 0 only for a card that was never reviewed.
    pub interval: u32,
    /// Consecutive successful reviews since the last lapse
    pub repetitions: u32,
    pub next_review_at: DateTime<Utc>,
}

impl ReviewCard {
    /// Fresh card, due immediately.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            ease_factor: DEFAULT_EASE,
            interval: 0,
            repetitions: 0,
            next_review_at: now,
        }
    }

    /// Rejects states the scheduler can never produce.
    /// Used for cards coming from outside the database (backup files).
    pub fn check_invariants(&self) -> Result<()> {
        if !self.ease_factor.is_finite() || self.ease_factor < MIN_EASE {
            return Err(SrsError::InvalidCard(format!(
                "ease factor {} is below {}",
                self.ease_factor, MIN_EASE
            )));
        }
        if self.repetitions >= 1 && self.interval == 0 {
            return Err(SrsError::InvalidCard(format!(
                "interval is 0 after {} repetitions",
                self.repetitions
            )));
        }
        Ok(())
    }
}

/// Anything that carries a due date and can go through `select_due`.
pub trait HasDueDate {
    fn next_review_at(&self) -> DateTime<Utc>;
}

impl HasDueDate for ReviewCard {
    fn next_review_at(&self) -> DateTime<Utc> {
        self.next_review_at
    }
}

impl<T: HasDueDate + ?Sized> HasDueDate for &T {
    fn next_review_at(&self) -> DateTime<Utc> {
        (**self).next_review_at()
    }
}
