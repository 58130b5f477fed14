//! Repository seam between review sessions and the database.

use super::db;
use crate::error::{Result, SrsError};
use crate::models::ReviewCard;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard};

/// Load/save contract for scheduling records keyed by (user, item).
///
/// `submit_review` must serialize the read-modify-write per key.
pub trait CardStore {
    fn load_card(&self, user_id: i64, item_id: i64) -> Result<Option<ReviewCard>>;
    fn save_card(&self, user_id: i64, item_id: i64, card: &ReviewCard) -> Result<()>;
    fn submit_review(
        &self,
        user_id: i64,
        item_id: i64,
        quality: i64,
        now: DateTime<Utc>,
    ) -> Result<ReviewCard>;
    /// Clock used to timestamp reviews
    fn current_date(&self) -> Result<DateTime<Utc>>;
}

/// SQLite-backed store shared between threads.
#[derive(Clone)]
pub struct SqliteCardStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCardStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| {
            tracing::error!("Review database lock poisoned");
            SrsError::LockPoisoned
        })
    }
}

impl CardStore for SqliteCardStore {
    fn load_card(&self, user_id: i64, item_id: i64) -> Result<Option<ReviewCard>> {
        let conn = self.lock()?;
        db::load_card(user_id, item_id, &conn)
    }

    fn save_card(&self, user_id: i64, item_id: i64, card: &ReviewCard) -> Result<()> {
        let conn = self.lock()?;
        db::save_card(user_id, item_id, card, &conn)
    }

    fn submit_review(
        &self,
        user_id: i64,
        item_id: i64,
        quality: i64,
        now: DateTime<Utc>,
    ) -> Result<ReviewCard> {
        let mut conn = self.lock()?;
        db::submit_review(user_id, item_id, quality, now, &mut conn)
    }

    fn current_date(&self) -> Result<DateTime<Utc>> {
        let conn = self.lock()?;
        db::get_current_date(&conn)
    }
}
