use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::deck::make_id;
use crate::error::{Result, VocabError};
use crate::models::{format_timestamp, PartialVocabItem, VocabItem};
use crate::srs::init_srs;

pub const USER_NAME_KEY: &str = "vocab_user_name";
pub const STUDY_CURSOR_KEY: &str = "vocab_study_cursor";
/// Contributor recorded when no name has been set.
pub const DEFAULT_USER_NAME: &str = "Owner";

/// String-keyed blob storage. The whole item collection is one JSON blob, so
/// every save rewrites it.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "opened store");
        Ok(Self { conn })
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    pub fn get_blob(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn put_blob(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![key, value, format_timestamp(&Utc::now())],
        )?;
        Ok(())
    }

    pub fn delete_blob(&self, key: &str) -> Result<bool> {
        let rows = self.conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(rows > 0)
    }

    /// Load the collection under `key`, initializing every record. An absent
    /// key is an empty collection; a malformed record is an error. Records
    /// without an id get one, and the collection is written back so the id
    /// survives to the next load.
    pub fn load_items(&self, key: &str) -> Result<Vec<VocabItem>> {
        let Some(raw) = self.get_blob(key)? else {
            debug!(key, "no stored items");
            return Ok(Vec::new());
        };

        let records: Vec<Value> = serde_json::from_str(&raw)?;
        let mut items = records
            .into_iter()
            .enumerate()
            .map(|(index, value)| parse_record(index, value).map(init_srs))
            .collect::<Result<Vec<_>>>()?;

        let mut assigned = 0;
        for item in items.iter_mut().filter(|it| it.id.is_empty()) {
            item.id = make_id();
            assigned += 1;
        }
        if assigned > 0 {
            warn!(key, count = assigned, "assigned ids to stored items without one");
            self.save_items(key, &items)?;
        }

        info!(key, count = items.len(), "loaded items");
        Ok(items)
    }

    pub fn save_items(&self, key: &str, items: &[VocabItem]) -> Result<()> {
        let raw = serde_json::to_string(items)?;
        self.put_blob(key, &raw)?;
        debug!(key, count = items.len(), "saved items");
        Ok(())
    }

    pub fn user_name(&self) -> Result<Option<String>> {
        self.get_blob(USER_NAME_KEY)
    }

    pub fn set_user_name(&self, name: &str) -> Result<()> {
        self.put_blob(USER_NAME_KEY, name)
    }

    pub fn clear_user_name(&self) -> Result<bool> {
        self.delete_blob(USER_NAME_KEY)
    }

    /// The name recorded on new contributions.
    pub fn contributor_name(&self) -> Result<String> {
        Ok(self
            .user_name()?
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_USER_NAME.to_string()))
    }

    /// Position of the sequential study walk. Unreadable values restart at 0.
    pub fn study_cursor(&self) -> Result<usize> {
        Ok(self
            .get_blob(STUDY_CURSOR_KEY)?
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(0))
    }

    pub fn set_study_cursor(&self, cursor: usize) -> Result<()> {
        self.put_blob(STUDY_CURSOR_KEY, &cursor.to_string())
    }
}

/// Decode one raw record, rejecting wrongly typed fields before they reach the
/// scheduler.
pub fn parse_record(index: usize, value: Value) -> Result<PartialVocabItem> {
    let partial: PartialVocabItem =
        serde_json::from_value(value).map_err(|e| VocabError::InvalidRecord {
            index,
            reason: e.to_string(),
        })?;
    partial
        .validate()
        .map_err(|reason| VocabError::InvalidRecord { index, reason })?;
    Ok(partial)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_store() -> Store {
        let store = Store::open(":memory:").expect("Failed to create in-memory store");
        store.init().expect("Failed to initialize store");
        store
    }

    mod init_tests {
        use super::*;

        #[test]
        fn init_creates_table() {
            let store = setup_store();
            let rows: i64 = store
                .conn
                .query_row("SELECT COUNT(*) FROM kv", [], |row| row.get(0))
                .expect("kv table should exist");
            assert_eq!(rows, 0);
        }

        #[test]
        fn init_is_idempotent() {
            let store = setup_store();
            store.put_blob("k", "v").unwrap();

            store.init().expect("Re-init should succeed");

            assert_eq!(store.get_blob("k").unwrap().as_deref(), Some("v"));
        }
    }

    mod blob_tests {
        use super::*;

        #[test]
        fn get_missing_key() {
            let store = setup_store();
            assert!(store.get_blob("missing").unwrap().is_none());
        }

        #[test]
        fn put_overwrites() {
            let store = setup_store();
            store.put_blob("k", "one").unwrap();
            store.put_blob("k", "two").unwrap();
            assert_eq!(store.get_blob("k").unwrap().as_deref(), Some("two"));
        }

        #[test]
        fn delete_blob_reports_presence() {
            let store = setup_store();
            store.put_blob("k", "v").unwrap();
            assert!(store.delete_blob("k").unwrap());
            assert!(!store.delete_blob("k").unwrap());
        }

        #[test]
        fn user_name_round_trip() {
            let store = setup_store();
            assert!(store.user_name().unwrap().is_none());
            store.set_user_name("Ada").unwrap();
            assert_eq!(store.user_name().unwrap().as_deref(), Some("Ada"));
            assert!(store.clear_user_name().unwrap());
            assert!(store.user_name().unwrap().is_none());
        }

        #[test]
        fn contributor_defaults_to_owner() {
            let store = setup_store();
            assert_eq!(store.contributor_name().unwrap(), DEFAULT_USER_NAME);

            store.set_user_name("   ").unwrap();
            assert_eq!(store.contributor_name().unwrap(), "Owner");

            store.set_user_name("Ada").unwrap();
            assert_eq!(store.contributor_name().unwrap(), "Ada");
        }

        #[test]
        fn study_cursor_round_trip() {
            let store = setup_store();
            assert_eq!(store.study_cursor().unwrap(), 0);
            store.set_study_cursor(4).unwrap();
            assert_eq!(store.study_cursor().unwrap(), 4);

            store.put_blob(STUDY_CURSOR_KEY, "garbage").unwrap();
            assert_eq!(store.study_cursor().unwrap(), 0);
        }
    }

    mod item_tests {
        use super::*;
        use crate::srs::DEFAULT_EASE;

        #[test]
        fn load_missing_key_is_empty() {
            let store = setup_store();
            assert!(store.load_items("vocab_items_v1").unwrap().is_empty());
        }

        #[test]
        fn load_initializes_legacy_records() {
            let store = setup_store();
            store
                .put_blob(
                    "items",
                    r#"[{"id": "v_1", "word": "terse", "definition": "brief", "interval": 3}]"#,
                )
                .unwrap();

            let items = store.load_items("items").unwrap();
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].interval, 3);
            assert_eq!(items[0].ease, DEFAULT_EASE);
            assert_eq!(items[0].repetitions, 0);
            assert!(items[0].next_review.is_none());
        }

        #[test]
        fn legacy_ids_are_stable_across_loads() {
            let store = setup_store();
            store
                .put_blob(
                    "items",
                    r#"[{"word": "a", "definition": "b"}, {"id": "", "word": "c", "definition": "d"}]"#,
                )
                .unwrap();

            let first = store.load_items("items").unwrap();
            assert!(first.iter().all(|it| it.id.starts_with("v_")));

            let second = store.load_items("items").unwrap();
            let first_ids: Vec<&str> = first.iter().map(|it| it.id.as_str()).collect();
            let second_ids: Vec<&str> = second.iter().map(|it| it.id.as_str()).collect();
            assert_eq!(first_ids, second_ids);

            let raw = store.get_blob("items").unwrap().unwrap();
            assert!(raw.contains(first_ids[0]));
        }

        #[test]
        fn load_leaves_blob_alone_when_ids_present() {
            let store = setup_store();
            let blob = r#"[{"id":"v_1","word":"a","definition":"b"}]"#;
            store.put_blob("items", blob).unwrap();

            store.load_items("items").unwrap();

            assert_eq!(store.get_blob("items").unwrap().as_deref(), Some(blob));
        }

        #[test]
        fn save_then_load_preserves_items() {
            let store = setup_store();
            let mut item = init_srs(PartialVocabItem::new("sanguine", "optimistic"));
            item.id = "v_9".into();
            item.extra.insert("antonyms".into(), serde_json::json!(["gloomy"]));
            let items = vec![item];

            store.save_items("items", &items).unwrap();
            let loaded = store.load_items("items").unwrap();
            assert_eq!(loaded, items);
        }

        #[test]
        fn saved_json_uses_browser_field_names() {
            let store = setup_store();
            let items = vec![init_srs(PartialVocabItem::new("a", "b"))];
            store.save_items("items", &items).unwrap();

            let raw = store.get_blob("items").unwrap().unwrap();
            assert!(raw.contains("\"nextReview\":null"));
            assert!(raw.contains("\"repetitions\":0"));
        }

        #[test]
        fn load_rejects_mistyped_ease() {
            let store = setup_store();
            store
                .put_blob("items", r#"[{"word": "a"}, {"word": "b", "ease": "2.5"}]"#)
                .unwrap();

            match store.load_items("items") {
                Err(VocabError::InvalidRecord { index, .. }) => assert_eq!(index, 1),
                other => panic!("expected InvalidRecord, got {:?}", other),
            }
        }

        #[test]
        fn load_rejects_non_array_blob() {
            let store = setup_store();
            store.put_blob("items", r#"{"word": "a"}"#).unwrap();
            assert!(matches!(store.load_items("items"), Err(VocabError::Json(_))));
        }

        #[test]
        fn file_backed_store_persists_across_opens() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("nested").join("vocab.db");
            {
                let store = Store::open(&path).unwrap();
                store.init().unwrap();
                store
                    .save_items("items", &[init_srs(PartialVocabItem::new("x", "y"))])
                    .unwrap();
            }

            let store = Store::open(&path).unwrap();
            store.init().unwrap();
            let items = store.load_items("items").unwrap();
            assert_eq!(items[0].word, "x");
        }
    }
}
