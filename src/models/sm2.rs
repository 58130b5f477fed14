//! SM-2 (SuperMemo 2) spaced repetition scheduling.
//!
//! - Every review adjusts the easiness factor (EF); EF never drops below 1.3
//! - Quality 0-2 is a lapse: repetitions reset, the card comes back tomorrow
//! - Quality 3-5 grows the interval: 1 day, 6 days, then previous interval * new EF
//! - The due date is `now` plus the interval in whole days
//!
//! Everything here is pure. The caller passes `now` and persists the result.

use super::{HasDueDate, Quality, ReviewCard};
use crate::error::Result;
use chrono::{DateTime, Days, Utc};

pub const DEFAULT_EASE: f64 = 2.5;
pub const MIN_EASE: f64 = 1.3;
pub const FIRST_INTERVAL_DAYS: u32 = 1;
pub const SECOND_INTERVAL_DAYS: u32 = 6;
/// Interval given after a lapse
pub const LAPSE_INTERVAL_DAYS: u32 = 1;

/// Fresh scheduling state for a newly added item, due right away.
pub fn initialize(now: DateTime<Utc>) -> ReviewCard {
    ReviewCard::new(now)
}

/// Validates the raw rating and computes the next state.
/// Ratings outside 0-5 are rejected, never clamped.
pub fn schedule_next(quality: i64, card: &ReviewCard, now: DateTime<Utc>) -> Result<ReviewCard> {
    let quality = Quality::try_from(quality)?;
    Ok(apply(quality, card, now))
}

/// Computes the next state for an already validated rating.
pub fn apply(quality: Quality, card: &ReviewCard, now: DateTime<Utc>) -> ReviewCard {
    let new_ef = next_ease(card.ease_factor, quality);

    let (new_interval, new_repetitions) = if quality.is_lapse() {
        (LAPSE_INTERVAL_DAYS, 0)
    } else {
        let new_reps = card.repetitions.saturating_add(1);
        let new_int = match new_reps {
            1 => FIRST_INTERVAL_DAYS,
            2 => SECOND_INTERVAL_DAYS,
            // float -> int casts saturate, so a runaway interval caps at u32::MAX
            _ => (f64::from(card.interval) * new_ef).round() as u32,
        };
        (new_int, new_reps)
    };

    ReviewCard {
        ease_factor: new_ef,
        interval: new_interval,
        repetitions: new_repetitions,
        next_review_at: due_after(now, new_interval),
    }
}

/// EF' = EF + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02)), floored at 1.3
pub fn next_ease(ease_factor: f64, quality: Quality) -> f64 {
    let d = f64::from(Quality::MAX - quality.value());
    let ef = ease_factor + (0.1 - d * (0.08 + d * 0.02));
    ef.max(MIN_EASE)
}

/// `now` plus whole calendar days.
pub fn due_after(now: DateTime<Utc>, interval_days: u32) -> DateTime<Utc> {
    now.checked_add_days(Days::new(u64::from(interval_days)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Inclusive: a card is due at exactly `next_review_at`.
pub fn is_due(next_review_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now >= next_review_at
}

/// Keeps the due cards, in input order.
pub fn select_due<I, T>(cards: I, now: DateTime<Utc>) -> Vec<T>
where
    I: IntoIterator<Item = T>,
    T: HasDueDate,
{
    cards
        .into_iter()
        .filter(|c| is_due(c.next_review_at(), now))
        .collect()
}

/// Informational 0-100 score. Not used for scheduling.
pub fn mastery_level(repetitions: u32, ease_factor: f64) -> u8 {
    let repetition_score = f64::from(repetitions.saturating_mul(10).min(60));
    let ease_ratio = (ease_factor - MIN_EASE) / (DEFAULT_EASE - MIN_EASE);
    let ease_score = (ease_ratio * 40.0).clamp(0.0, 40.0);
    (repetition_score + ease_score).min(100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SrsError;
    use chrono::{Duration, TimeZone};

    const EPS: f64 = 1e-9;

    fn day(n: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 8, 30, 0).unwrap() + Duration::days(i64::from(n))
    }

    fn card(ease: f64, interval: u32, repetitions: u32) -> ReviewCard {
        ReviewCard {
            ease_factor: ease,
            interval,
            repetitions,
            next_review_at: day(0),
        }
    }

    #[test]
    fn test_first_review() {
        let next = schedule_next(4, &initialize(day(0)), day(0)).unwrap();
        assert_eq!(next.interval, 1);
        assert_eq!(next.repetitions, 1);
    }

    #[test]
    fn test_second_review() {
        let first = schedule_next(4, &initialize(day(0)), day(0)).unwrap();
        let next = schedule_next(3, &first, day(1)).unwrap();
        assert_eq!(next.interval, 6);
        assert_eq!(next.repetitions, 2);
    }

    #[test]
    fn test_third_review_uses_previous_interval_and_new_ease() {
        let review = card(2.36, 6, 2);
        let expected_ease = next_ease(2.36, Quality::HESITANT);

        let next = schedule_next(4, &review, day(7)).unwrap();
        assert_eq!(next.repetitions, 3);
        assert_eq!(next.interval, (6.0 * expected_ease).round() as u32);
        assert_eq!(next.interval, 14);
    }

    #[test]
    fn test_quality_below_3_resets() {
        for q in 0..3 {
            let next = schedule_next(q, &card(2.5, 10, 5), day(0)).unwrap();
            assert_eq!(next.interval, 1);
            assert_eq!(next.repetitions, 0);
            // EF should still be updated
            assert!(next.ease_factor < 2.5);
        }
    }

    #[test]
    fn test_ease_changes_per_quality() {
        let deltas = [-0.8, -0.54, -0.32, -0.14, 0.0, 0.1];
        for (q, delta) in deltas.iter().enumerate() {
            let q = Quality::new(q as u8).unwrap();
            assert!((next_ease(2.5, q) - (2.5 + delta)).abs() < EPS, "quality {}", q);
        }
    }

    #[test]
    fn test_ef_floor() {
        for q in 0..=5 {
            for ease in [1.3, 1.35, 1.5, 2.5, 3.1] {
                let next = schedule_next(q, &card(ease, 3, 2), day(0)).unwrap();
                assert!(next.ease_factor >= MIN_EASE);
            }
        }
        let next = schedule_next(0, &card(1.3, 1, 1), day(0)).unwrap();
        assert_eq!(next.ease_factor, MIN_EASE);
    }

    #[test]
    fn test_invalid_quality_rejected() {
        assert!(matches!(
            schedule_next(6, &card(2.5, 0, 0), day(0)),
            Err(SrsError::InvalidQuality(6))
        ));
        assert!(schedule_next(-1, &card(2.5, 0, 0), day(0)).is_err());
    }

    #[test]
    fn test_due_date_is_now_plus_interval() {
        let now = day(3);
        let next = schedule_next(5, &card(2.5, 6, 2), now).unwrap();
        assert_eq!(next.interval, 16);
        assert_eq!(next.next_review_at, now + Duration::days(16));

        let fresh = initialize(now);
        assert_eq!(fresh.interval, 0);
        assert_eq!(fresh.next_review_at, now);
    }

    #[test]
    fn test_huge_interval_saturates() {
        let next = schedule_next(5, &card(5.0, u32::MAX, 40), day(0)).unwrap();
        assert_eq!(next.interval, u32::MAX);
        assert_eq!(next.next_review_at, DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn test_is_due_boundary() {
        let at = day(5);
        assert!(is_due(at, at));
        assert!(!is_due(at, at - Duration::seconds(1)));
        assert!(is_due(at, at + Duration::days(1)));
    }

    #[test]
    fn test_select_due_keeps_order() {
        let cards: Vec<ReviewCard> = [4, 1, 9, 2, 5]
            .into_iter()
            .map(|due_day| {
                let mut c = card(2.5, 1, 1);
                c.next_review_at = day(due_day);
                c
            })
            .collect();

        let due = select_due(&cards, day(4));
        let due_days: Vec<DateTime<Utc>> = due.iter().map(|c| c.next_review_at).collect();
        assert_eq!(due_days, vec![day(4), day(1), day(2)]);

        let again = select_due(&cards, day(4));
        assert_eq!(due, again);

        assert!(select_due(&cards, day(0)).is_empty());
        assert_eq!(select_due(cards.clone(), day(30)), cards);
    }

    #[test]
    fn test_mastery_level() {
        assert_eq!(mastery_level(100, 2.5), 100);
        assert_eq!(mastery_level(0, 1.3), 0);
        assert_eq!(mastery_level(3, 1.9), 50);
        assert_eq!(mastery_level(6, 3.0), 100);
        assert_eq!(mastery_level(0, 1.0), 0);
    }

    #[test]
    fn test_mastery_is_monotonic() {
        let mut last = 0;
        for reps in 0..10 {
            let m = mastery_level(reps, 2.0);
            assert!(m >= last);
            last = m;
        }
        let mut last = 0;
        for i in 0..20 {
            let m = mastery_level(2, 1.3 + f64::from(i) * 0.1);
            assert!(m >= last);
            last = m;
        }
    }

    #[test]
    fn test_review_sequence() {
        // 5, 5, 5, lapse, recovery
        let mut review = initialize(day(0));

        review = schedule_next(5, &review, day(0)).unwrap();
        assert_eq!((review.repetitions, review.interval), (1, 1));
        assert!((review.ease_factor - 2.6).abs() < EPS);

        review = schedule_next(5, &review, day(1)).unwrap();
        assert_eq!((review.repetitions, review.interval), (2, 6));
        assert!((review.ease_factor - 2.7).abs() < EPS);

        review = schedule_next(5, &review, day(2)).unwrap();
        assert!((review.ease_factor - 2.8).abs() < EPS);
        assert_eq!(review.repetitions, 3);
        assert_eq!(review.interval, (6.0 * review.ease_factor).round() as u32);
        assert_eq!(review.interval, 17);
        assert_eq!(review.next_review_at, day(19));

        review = schedule_next(2, &review, day(3)).unwrap();
        assert_eq!((review.repetitions, review.interval), (0, 1));
        assert!((review.ease_factor - 2.48).abs() < EPS);

        review = schedule_next(4, &review, day(4)).unwrap();
        assert_eq!((review.repetitions, review.interval), (1, 1));
        assert!((review.ease_factor - 2.48).abs() < EPS);
        assert_eq!(review.next_review_at, day(5));
    }
}
