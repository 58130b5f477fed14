//! A learner's vocabulary entry: Dutch word and its translation.
use super::{HasDueDate, ReviewCard};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabItem {
    pub id: i64,
    pub user_id: i64,
    pub word: String,
    pub translation: String,
}

/// Vocabulary item together with its scheduling state
#[derive(Clone, Debug, PartialEq)]
pub struct VocabCard {
    pub item: VocabItem,
    pub card: ReviewCard,
}

impl HasDueDate for VocabCard {
    fn next_review_at(&self) -> DateTime<Utc> {
        self.card.next_review_at
    }
}
