//! Database operations for vocabulary review cards
//!
//! Handles SQLite initialization, vocabulary CRUD, and persistence of
//! SM-2 scheduling state, one row per (user, vocabulary item).

use crate::error::{Result, SrsError};
use crate::models::{ReviewCard, VocabCard, VocabItem, sm2};
use chrono::{DateTime, Days, Utc};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use serde::Serialize;
use std::path::Path;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS vocabulary (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        word TEXT NOT NULL,
        translation TEXT NOT NULL,
        UNIQUE(user_id, word),
        UNIQUE(id, user_id)
    );

    CREATE TABLE IF NOT EXISTS review_cards (
        user_id INTEGER NOT NULL,
        item_id INTEGER NOT NULL,
        ease_factor REAL NOT NULL DEFAULT 2.5,
        interval_days INTEGER NOT NULL DEFAULT 0,
        repetitions INTEGER NOT NULL DEFAULT 0,
        next_review_at INTEGER NOT NULL,
        PRIMARY KEY (user_id, item_id),
        FOREIGN KEY (item_id, user_id) REFERENCES vocabulary(id, user_id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS review_log (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        item_id INTEGER NOT NULL,
        quality INTEGER NOT NULL,
        interval_days INTEGER NOT NULL,
        reviewed_at INTEGER NOT NULL,
        FOREIGN KEY (item_id, user_id) REFERENCES vocabulary(id, user_id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS app_state (
        key TEXT PRIMARY KEY,
        value INTEGER NOT NULL
    );
";

/// Opens (or creates) the database file and makes sure the schema exists.
///
/// The simulated `current_date` is set to now on first use.
pub fn init_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    prepare(&conn)?;
    tracing::info!("Opened review database at {}", path.display());
    Ok(conn)
}

/// Same as `init_database`, backed by memory. Used by tests and dry runs.
pub fn init_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    prepare(&conn)?;
    Ok(conn)
}

fn prepare(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.execute_batch(SCHEMA)?;
    conn.execute(
        "INSERT OR IGNORE INTO app_state (key, value) VALUES ('current_date', ?1)",
        params![Utc::now().timestamp_micros()],
    )?;
    Ok(())
}

fn from_micros(idx: usize, micros: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, micros))
}

/// Retrieves the simulated date from the database
pub fn get_current_date(conn: &Connection) -> Result<DateTime<Utc>> {
    let micros: i64 = conn.query_row(
        "SELECT value FROM app_state WHERE key = 'current_date'",
        [],
        |row| row.get(0),
    )?;
    Ok(from_micros(0, micros)?)
}

pub fn set_current_date(date: DateTime<Utc>, conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT INTO app_state (key, value) VALUES ('current_date', ?1)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![date.timestamp_micros()],
    )?;
    Ok(())
}

/// Moves the simulated date one calendar day forward and returns it
pub fn advance_day(conn: &Connection) -> Result<DateTime<Utc>> {
    let current = get_current_date(conn)?;
    let next_day = current
        .checked_add_days(Days::new(1))
        .ok_or(SrsError::DateOutOfRange(current))?;
    set_current_date(next_day, conn)?;
    tracing::debug!("Advanced simulated date to {}", next_day);
    Ok(next_day)
}

/// Adds a word to the user's vocabulary and creates its review card,
/// due at the simulated current date.
///
/// Returns the item id. If the user already has the word, the existing
/// item and its card are left untouched.
pub fn add_word(user_id: i64, word: &str, translation: &str, conn: &Connection) -> Result<i64> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO vocabulary (user_id, word, translation) VALUES (?1, ?2, ?3)",
        params![user_id, word, translation],
    )?;

    let item_id: i64 = conn.query_row(
        "SELECT id FROM vocabulary WHERE user_id = ?1 AND word = ?2",
        params![user_id, word],
        |row| row.get(0),
    )?;

    if inserted > 0 {
        let card = sm2::initialize(get_current_date(conn)?);
        save_card(user_id, item_id, &card, conn)?;
        tracing::info!("Added '{}' for user {} (item {})", word, user_id, item_id);
    }

    Ok(item_id)
}

/// Removes a word; its card and review log go with it.
/// Returns false when the user has no such item.
pub fn remove_word(user_id: i64, item_id: i64, conn: &Connection) -> Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM vocabulary WHERE user_id = ?1 AND id = ?2",
        params![user_id, item_id],
    )?;
    Ok(deleted > 0)
}

pub fn load_card(user_id: i64, item_id: i64, conn: &Connection) -> Result<Option<ReviewCard>> {
    let card = conn
        .query_row(
            "SELECT ease_factor, interval_days, repetitions, next_review_at
             FROM review_cards WHERE user_id = ?1 AND item_id = ?2",
            params![user_id, item_id],
            |row| row_to_card(row, 0),
        )
        .optional()?;
    Ok(card)
}

/// Writes the whole card. Inserts when the pair has no row yet.
///
/// The item must belong to `user_id`; otherwise the foreign key rejects the write.
pub fn save_card(user_id: i64, item_id: i64, card: &ReviewCard, conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT INTO review_cards
            (user_id, item_id, ease_factor, interval_days, repetitions, next_review_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(user_id, item_id) DO UPDATE SET
            ease_factor = excluded.ease_factor,
            interval_days = excluded.interval_days,
            repetitions = excluded.repetitions,
            next_review_at = excluded.next_review_at",
        params![
            user_id,
            item_id,
            card.ease_factor,
            card.interval,
            card.repetitions,
            card.next_review_at.timestamp_micros()
        ],
    )?;
    Ok(())
}

/// Records one review: load, schedule, save and log in a single
/// IMMEDIATE transaction, so two submissions for the same card cannot
/// both compute from the same stale state.
///
/// An invalid quality or a missing card rolls back and leaves the
/// stored card unchanged.
pub fn submit_review(
    user_id: i64,
    item_id: i64,
    quality: i64,
    now: DateTime<Utc>,
    conn: &mut Connection,
) -> Result<ReviewCard> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let card = load_card(user_id, item_id, &tx)?
        .ok_or(SrsError::CardNotFound { user_id, item_id })?;

    let next = match sm2::schedule_next(quality, &card, now) {
        Ok(next) => next,
        Err(e) => {
            tracing::warn!("Rejected review of item {} by user {}: {}", item_id, user_id, e);
            return Err(e);
        }
    };

    save_card(user_id, item_id, &next, &tx)?;
    tx.execute(
        "INSERT INTO review_log (user_id, item_id, quality, interval_days, reviewed_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![user_id, item_id, quality, next.interval, now.timestamp_micros()],
    )?;
    tx.commit()?;

    tracing::debug!(
        user_id,
        item_id,
        quality,
        ease_factor = next.ease_factor,
        interval = next.interval,
        repetitions = next.repetitions,
        "Scheduled next review for {}",
        next.next_review_at
    );
    Ok(next)
}

fn row_to_card(row: &Row, offset: usize) -> rusqlite::Result<ReviewCard> {
    let micros: i64 = row.get(offset + 3)?;
    Ok(ReviewCard {
        ease_factor: row.get(offset)?,
        interval: row.get(offset + 1)?,
        repetitions: row.get(offset + 2)?,
        next_review_at: from_micros(offset + 3, micros)?,
    })
}

fn row_to_vocab_card(row: &Row) -> rusqlite::Result<VocabCard> {
    Ok(VocabCard {
        item: VocabItem {
            id: row.get(0)?,
            user_id: row.get(1)?,
            word: row.get(2)?,
            translation: row.get(3)?,
        },
        card: row_to_card(row, 4)?,
    })
}

/// All of a user's words with their cards, ordered by item id
pub fn get_cards_for_user(user_id: i64, conn: &Connection) -> Result<Vec<VocabCard>> {
    let mut stmt = conn.prepare(
        "SELECT v.id, v.user_id, v.word, v.translation,
                c.ease_factor, c.interval_days, c.repetitions, c.next_review_at
         FROM vocabulary v
         JOIN review_cards c ON c.item_id = v.id AND c.user_id = v.user_id
         WHERE v.user_id = ?1
         ORDER BY v.id ASC",
    )?;

    let cards = stmt
        .query_map(params![user_id], row_to_vocab_card)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(cards)
}

/// Cards due at `now`, in item id order. Shuffling is up to the caller.
pub fn get_due_cards(
    user_id: i64,
    now: DateTime<Utc>,
    conn: &Connection,
) -> Result<Vec<VocabCard>> {
    let cards = get_cards_for_user(user_id, conn)?;
    Ok(sm2::select_due(cards, now))
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReviewLogEntry {
    pub item_id: i64,
    pub quality: u8,
    pub interval_days: u32,
    pub reviewed_at: DateTime<Utc>,
}

/// Review history of one item, oldest first
pub fn get_review_history(
    user_id: i64,
    item_id: i64,
    conn: &Connection,
) -> Result<Vec<ReviewLogEntry>> {
    let mut stmt = conn.prepare(
        "SELECT item_id, quality, interval_days, reviewed_at
         FROM review_log WHERE user_id = ?1 AND item_id = ?2
         ORDER BY reviewed_at ASC, id ASC",
    )?;

    let entries = stmt
        .query_map(params![user_id, item_id], |row| {
            let micros: i64 = row.get(3)?;
            Ok(ReviewLogEntry {
                item_id: row.get(0)?,
                quality: row.get(1)?,
                interval_days: row.get(2)?,
                reviewed_at: from_micros(3, micros)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(entries)
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UserStats {
    pub total_items: usize,
    /// Never reviewed
    pub new_items: usize,
    pub due_now: usize,
    pub average_mastery: f64,
}

pub fn user_stats(user_id: i64, now: DateTime<Utc>, conn: &Connection) -> Result<UserStats> {
    let cards = get_cards_for_user(user_id, conn)?;

    let total_items = cards.len();
    let new_items = cards
        .iter()
        .filter(|vc| vc.card.repetitions == 0 && vc.card.interval == 0)
        .count();
    let due_now = sm2::select_due(&cards, now).len();
    let average_mastery = if cards.is_empty() {
        0.0
    } else {
        let sum: u32 = cards
            .iter()
            .map(|vc| u32::from(sm2::mastery_level(vc.card.repetitions, vc.card.ease_factor)))
            .sum();
        f64::from(sum) / total_items as f64
    };

    Ok(UserStats {
        total_items,
        new_items,
        due_now,
        average_mastery,
    })
}
