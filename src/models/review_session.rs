//! Review session over a learner's due cards.
//! Runs the due set in rounds; every grade goes through SM-2 and is persisted.

use super::{Quality, ReviewCard, VocabCard};
use crate::database::CardStore;
use crate::error::Result;

struct SessionCard {
    entry: VocabCard,
    passed: bool,
}

/// Cards graded as a lapse (quality < 3) come back in the next round.
/// The session is over once a round ends without lapses.
pub struct ReviewSession<S: CardStore> {
    pub user_id: i64,
    cards: Vec<SessionCard>,
    current_round_cards: Vec<usize>,
    current_index: usize,
    pub round_number: usize,
    store: S,
}

impl<S: CardStore> ReviewSession<S> {
    /// Starts a session. `cards` is expected to be the user's due set,
    /// in the order it should be shown.
    pub fn new_from_due_cards(user_id: i64, cards: Vec<VocabCard>, store: S) -> Self {
        let cards: Vec<_> = cards
            .into_iter()
            .map(|entry| SessionCard {
                entry,
                passed: false,
            })
            .collect();

        let indices: Vec<usize> = (0..cards.len()).collect();

        Self {
            user_id,
            cards,
            current_round_cards: indices,
            current_index: 0,
            round_number: 1,
            store,
        }
    }

    pub fn current_card(&self) -> Option<&VocabCard> {
        self.current_round_cards
            .get(self.current_index)
            .and_then(|&idx| self.cards.get(idx).map(|c| &c.entry))
    }

    pub fn next_card(&mut self) {
        if self.current_index + 1 < self.current_round_cards.len() {
            self.current_index += 1;
        } else {
            self.start_next_round();
        }
    }

    /// Queues this round's lapses as a new round. Does nothing when
    /// every card passed, which completes the session.
    fn start_next_round(&mut self) {
        let failed: Vec<usize> = self
            .current_round_cards
            .iter()
            .copied()
            .filter(|&idx| self.cards.get(idx).is_some_and(|c| !c.passed))
            .collect();

        if !failed.is_empty() {
            self.current_round_cards = failed;
            self.current_index = 0;
            self.round_number += 1;
            tracing::debug!(
                "Round {} with {} cards to retry",
                self.round_number,
                self.current_round_cards.len()
            );
        }
    }

    /// Grades the current card, persists the new schedule and returns it.
    ///
    /// An invalid quality is returned as an error; the card stays current
    /// and nothing is written. `Ok(None)` when there is no current card.
    pub fn grade_current_card(&mut self, quality: i64) -> Result<Option<ReviewCard>> {
        let Some(&idx) = self.current_round_cards.get(self.current_index) else {
            return Ok(None);
        };
        let Some(card) = self.cards.get_mut(idx) else {
            return Ok(None);
        };

        let quality = Quality::try_from(quality)?;
        let now = self.store.current_date()?;
        let next = self.store.submit_review(
            self.user_id,
            card.entry.item.id,
            i64::from(quality.value()),
            now,
        )?;

        card.passed = !quality.is_lapse();
        card.entry.card = next.clone();
        Ok(Some(next))
    }

    pub fn passed_count(&self) -> usize {
        self.current_round_cards
            .iter()
            .filter(|&&idx| self.cards.get(idx).is_some_and(|c| c.passed))
            .count()
    }

    pub fn total_count(&self) -> usize {
        self.current_round_cards.len()
    }

    pub fn remaining_count(&self) -> usize {
        self.total_count() - self.passed_count()
    }

    pub fn is_completed(&self) -> bool {
        self.current_round_cards.is_empty() || self.passed_count() == self.total_count()
    }

    pub fn phase_message(&self) -> String {
        if self.round_number == 1 {
            format!("Round {}: {} cards", self.round_number, self.total_count())
        } else {
            format!("Round {} (retry): {} cards", self.round_number, self.total_count())
        }
    }
}
