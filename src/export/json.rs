//! JSON backup of a learner's vocabulary and review cards.
//! Export writes a pretty-printed file; import validates everything before writing.

use crate::database::db;
use crate::error::{Result, SrsError};
use crate::models::ReviewCard;
use rusqlite::{Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupEntry {
    pub word: String,
    pub translation: String,
    pub card: ReviewCard,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub user_id: i64,
    pub entries: Vec<BackupEntry>,
}

pub fn build_backup(user_id: i64, conn: &Connection) -> Result<Backup> {
    let entries = db::get_cards_for_user(user_id, conn)?
        .into_iter()
        .map(|vc| BackupEntry {
            word: vc.item.word,
            translation: vc.item.translation,
            card: vc.card,
        })
        .collect();
    Ok(Backup { user_id, entries })
}

/// Exports a user's cards to a JSON file. Returns the number of entries.
pub fn export_json_to_path(user_id: i64, path: &Path, conn: &Connection) -> Result<usize> {
    let backup = build_backup(user_id, conn)?;
    let json_string = serde_json::to_string_pretty(&backup)?;
    fs::write(path, json_string)?;
    tracing::info!(
        "Exported {} cards of user {} to {}",
        backup.entries.len(),
        user_id,
        path.display()
    );
    Ok(backup.entries.len())
}

pub fn read_backup(path: &Path) -> Result<Backup> {
    let contents = fs::read_to_string(path)?;
    let backup: Backup = serde_json::from_str(&contents)?;
    Ok(backup)
}

/// Imports a backup file for `user_id` (which may differ from the user
/// in the file). Existing words get their card overwritten.
///
/// Every card is checked first; one bad card rejects the whole file.
pub fn import_json(user_id: i64, path: &Path, conn: &mut Connection) -> Result<usize> {
    let backup = read_backup(path)?;

    for entry in &backup.entries {
        entry.card.check_invariants().map_err(|e| match e {
            SrsError::InvalidCard(msg) => {
                SrsError::InvalidCard(format!("'{}': {}", entry.word, msg))
            }
            other => other,
        })?;
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    for entry in &backup.entries {
        let item_id = db::add_word(user_id, &entry.word, &entry.translation, &tx)?;
        db::save_card(user_id, item_id, &entry.card, &tx)?;
    }
    tx.commit()?;

    tracing::info!(
        "Imported {} cards for user {} from {}",
        backup.entries.len(),
        user_id,
        path.display()
    );
    Ok(backup.entries.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 2, 10, 0, 0).unwrap()
    }

    fn create_test_db() -> Connection {
        let mut conn = db::init_in_memory().unwrap();
        db::set_current_date(start(), &conn).unwrap();
        let id = db::add_word(1, "hond", "dog", &conn).unwrap();
        db::add_word(1, "vogel", "bird", &conn).unwrap();
        db::submit_review(1, id, 5, start(), &mut conn).unwrap();
        conn
    }

    #[test]
    fn test_export_json_to_path() {
        let conn = create_test_db();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");

        assert_eq!(export_json_to_path(1, &path, &conn).unwrap(), 2);

        let backup = read_backup(&path).unwrap();
        assert_eq!(backup.user_id, 1);
        assert_eq!(backup.entries[0].word, "hond");
        assert_eq!(backup.entries[0].card.repetitions, 1);
        assert_eq!(backup.entries[1].card.interval, 0);
    }

    #[test]
    fn test_backup_keys_are_camel_case() {
        let conn = create_test_db();
        let json = serde_json::to_value(build_backup(1, &conn).unwrap()).unwrap();

        assert_eq!(json["userId"], 1);
        assert!(json.get("user_id").is_none());
        assert_eq!(json["entries"][0]["word"], "hond");
        let ease = json["entries"][0]["card"]["easeFactor"].as_f64().unwrap();
        assert!((ease - 2.6).abs() < 1e-9);
    }

    #[test]
    fn test_import_json() {
        let json_content = r#"{
  "userId": 5,
  "entries": [
    {
      "word": "kaas",
      "translation": "cheese",
      "card": {
        "easeFactor": 2.36,
        "interval": 6,
        "repetitions": 2,
        "nextReviewAt": "2024-09-08T10:00:00Z"
      }
    }
  ]
}"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("import.json");
        fs::write(&path, json_content).unwrap();

        let mut conn = db::init_in_memory().unwrap();
        assert_eq!(import_json(2, &path, &mut conn).unwrap(), 1);

        let cards = db::get_cards_for_user(2, &conn).unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].item.word, "kaas");
        assert_eq!(cards[0].card.interval, 6);
        assert_eq!(cards[0].card.next_review_at, start() + Duration::days(6));
    }

    #[test]
    fn test_export_and_import_into_another_user() {
        let mut conn = create_test_db();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roundtrip.json");

        export_json_to_path(1, &path, &conn).unwrap();
        import_json(9, &path, &mut conn).unwrap();

        let original = build_backup(1, &conn).unwrap();
        let copied = build_backup(9, &conn).unwrap();
        assert_eq!(original.entries, copied.entries);
    }

    #[test]
    fn test_import_rejects_invalid_card() {
        let mut conn = db::init_in_memory().unwrap();
        let backup = Backup {
            user_id: 1,
            entries: vec![
                BackupEntry {
                    word: "goed".to_string(),
                    translation: "good".to_string(),
                    card: ReviewCard::new(start()),
                },
                BackupEntry {
                    word: "slecht".to_string(),
                    translation: "bad".to_string(),
                    card: ReviewCard {
                        ease_factor: 0.9,
                        ..ReviewCard::new(start())
                    },
                },
            ],
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, serde_json::to_string(&backup).unwrap()).unwrap();

        let result = import_json(1, &path, &mut conn);
        assert!(matches!(result, Err(SrsError::InvalidCard(msg)) if msg.contains("slecht")));
        assert!(db::get_cards_for_user(1, &conn).unwrap().is_empty());
    }

    #[test]
    fn test_import_nonexistent_file() {
        let mut conn = db::init_in_memory().unwrap();
        let result = import_json(1, Path::new("nonexistent_file_xyz123.json"), &mut conn);
        assert!(matches!(result, Err(SrsError::Io(_))));
    }

    #[test]
    fn test_import_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invalid.json");
        fs::write(&path, "{ this is not valid json }").unwrap();

        let mut conn = db::init_in_memory().unwrap();
        assert!(matches!(import_json(1, &path, &mut conn), Err(SrsError::Json(_))));
    }
}
