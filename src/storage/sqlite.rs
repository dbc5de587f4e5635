//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Store trait.

use crate::models::{CaptionKind, CaptionTrack, ContentItem};
use crate::state::RunStats;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{StorageError, StorageResult, Store};
use crate::storage::{ItemRecord, SessionRecord, SessionStatus};
use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens or creates the database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn count(&self, sql: &str, params: impl rusqlite::Params) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(sql, params, |row| row.get(0))?;
        Ok(count as u64)
    }

    fn finish_session(
        &mut self,
        session_id: i64,
        stats: &RunStats,
        status: SessionStatus,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE sessions
             SET finished_at = ?1, found = ?2, processed = ?3, downloaded = ?4,
                 subtitles_extracted = ?5, errors = ?6, status = ?7
             WHERE id = ?8",
            params![
                now,
                stats.found as i64,
                stats.processed as i64,
                stats.downloaded as i64,
                stats.subtitles_extracted as i64,
                stats.errors as i64,
                status.to_db_string(),
                session_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::SessionNotFound(session_id));
        }
        Ok(())
    }
}

/// Rejects a stored enum value this build does not recognize
fn decode_column<T>(index: usize, value: &str, decoded: Option<T>) -> rusqlite::Result<T> {
    decoded.ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            Type::Text,
            Box::new(StorageError::Database(format!(
                "unrecognized value '{}' in column {}",
                value, index
            ))),
        )
    })
}

fn caption_from_row(row: &Row<'_>) -> rusqlite::Result<CaptionTrack> {
    let kind: String = row.get(2)?;
    Ok(CaptionTrack {
        content_id: row.get(0)?,
        language: row.get(1)?,
        kind: decode_column(2, &kind, CaptionKind::from_db_string(&kind))?,
        text: row.get(3)?,
        source_ref: row.get(4)?,
    })
}

impl Store for SqliteStore {
    // ===== Items =====

    fn exists(&self, id: &str) -> StorageResult<bool> {
        let found = self
            .conn
            .query_row("SELECT 1 FROM items WHERE id = ?1", params![id], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    fn put_item(&mut self, item: &ContentItem) -> StorageResult<bool> {
        let now = Utc::now().to_rfc3339();
        let inserted = self.conn.execute(
            "INSERT INTO items
             (id, url, title, description, channel, duration, is_target_language, language_score, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO NOTHING",
            params![
                item.id(),
                item.url(),
                item.title(),
                item.description(),
                item.channel(),
                item.duration().map(|d| d as i64),
                item.is_target_language(),
                item.language_score(),
                now
            ],
        )?;
        Ok(inserted == 1)
    }

    fn get_item(&self, id: &str) -> StorageResult<Option<ContentItem>> {
        let item = self
            .conn
            .query_row(
                "SELECT id, url, title, description, channel, duration, is_target_language, language_score
                 FROM items WHERE id = ?1",
                params![id],
                |row| {
                    Ok(ContentItem::from_stored(
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get::<_, Option<i64>>(5)?.map(|d| d as u64),
                        row.get(6)?,
                        row.get(7)?,
                    ))
                },
            )
            .optional()?;
        Ok(item)
    }

    fn list_items(&self) -> StorageResult<Vec<ItemRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, url, title, description, channel, duration, is_target_language, language_score, created_at
             FROM items ORDER BY rowid",
        )?;

        let items = stmt
            .query_map([], |row| {
                Ok(ItemRecord {
                    id: row.get(0)?,
                    url: row.get(1)?,
                    title: row.get(2)?,
                    description: row.get(3)?,
                    channel: row.get(4)?,
                    duration: row.get::<_, Option<i64>>(5)?.map(|d| d as u64),
                    is_target_language: row.get(6)?,
                    language_score: row.get(7)?,
                    created_at: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    fn count_items(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM items", [])
    }

    // ===== Captions =====

    fn put_caption(&mut self, track: &CaptionTrack) -> StorageResult<bool> {
        let now = Utc::now().to_rfc3339();
        let word_count = track.text.split_whitespace().count() as i64;
        let char_count = track.text.chars().count() as i64;

        let changed = self.conn.execute(
            "INSERT INTO captions
             (content_id, language, kind, text, source_ref, word_count, char_count, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(content_id, language, kind) DO UPDATE SET
                text = excluded.text,
                source_ref = excluded.source_ref,
                word_count = excluded.word_count,
                char_count = excluded.char_count,
                updated_at = excluded.updated_at",
            params![
                track.content_id,
                track.language,
                track.kind.to_db_string(),
                track.text,
                track.source_ref,
                word_count,
                char_count,
                now
            ],
        )?;
        Ok(changed > 0)
    }

    fn list_captions(&self) -> StorageResult<Vec<CaptionTrack>> {
        let mut stmt = self.conn.prepare(
            "SELECT content_id, language, kind, text, source_ref FROM captions ORDER BY id",
        )?;

        let captions = stmt
            .query_map([], caption_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(captions)
    }

    fn count_captions(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM captions", [])
    }

    fn count_captions_by_language(&self, language: &str) -> StorageResult<u64> {
        self.count(
            "SELECT COUNT(*) FROM captions WHERE language = ?1",
            params![language],
        )
    }

    fn items_missing_caption(&self, language: &str) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT i.id FROM items i
             WHERE NOT EXISTS (
                SELECT 1 FROM captions c WHERE c.content_id = i.id AND c.language = ?1
             )
             ORDER BY i.rowid",
        )?;

        let ids = stmt
            .query_map(params![language], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(ids)
    }

    // ===== Sessions =====

    fn create_session(&mut self, seeds: &[String], config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        let seeds_json =
            serde_json::to_string(seeds).map_err(|e| StorageError::Database(e.to_string()))?;

        self.conn.execute(
            "INSERT INTO sessions (started_at, seeds, config_hash, status) VALUES (?1, ?2, ?3, ?4)",
            params![
                now,
                seeds_json,
                config_hash,
                SessionStatus::Running.to_db_string()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn complete_session(&mut self, session_id: i64, stats: &RunStats) -> StorageResult<()> {
        self.finish_session(session_id, stats, SessionStatus::Completed)
    }

    fn fail_session(&mut self, session_id: i64, stats: &RunStats) -> StorageResult<()> {
        self.finish_session(session_id, stats, SessionStatus::Failed)
    }

    fn get_latest_session(&self) -> StorageResult<Option<SessionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, started_at, finished_at, seeds, config_hash, found, processed,
                    downloaded, subtitles_extracted, errors, status
             FROM sessions ORDER BY id DESC LIMIT 1",
        )?;

        let session = stmt
            .query_row([], |row| {
                let seeds: String = row.get(3)?;
                let status: String = row.get(10)?;
                Ok(SessionRecord {
                    id: row.get(0)?,
                    started_at: row.get(1)?,
                    finished_at: row.get(2)?,
                    seeds: serde_json::from_str(&seeds).unwrap_or_default(),
                    config_hash: row.get(4)?,
                    found: row.get::<_, i64>(5)? as u64,
                    processed: row.get::<_, i64>(6)? as u64,
                    downloaded: row.get::<_, i64>(7)? as u64,
                    subtitles_extracted: row.get::<_, i64>(8)? as u64,
                    errors: row.get::<_, i64>(9)? as u64,
                    status: decode_column(10, &status, SessionStatus::from_db_string(&status))?,
                })
            })
            .optional()?;

        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::LanguageClassifier;
    use crate::models::PageMetadata;

    fn item(id: &str, title: &str) -> ContentItem {
        let page = PageMetadata {
            id: id.to_string(),
            url: format!("https://www.youtube.com/watch?v={}", id),
            title: title.to_string(),
            description: "توضیحات".to_string(),
            channel: "کانال".to_string(),
            duration: Some(300),
            related: Vec::new(),
        };
        ContentItem::classify(page, &LanguageClassifier::default(), 0.1)
    }

    fn track(id: &str, language: &str, kind: CaptionKind, text: &str) -> CaptionTrack {
        CaptionTrack {
            content_id: id.to_string(),
            language: language.to_string(),
            kind,
            text: text.to_string(),
            source_ref: None,
        }
    }

    #[test]
    fn test_create_in_memory() {
        let store = SqliteStore::in_memory();
        assert!(store.is_ok());
    }

    #[test]
    fn test_put_item_then_exists() {
        let mut store = SqliteStore::in_memory().unwrap();
        assert!(!store.exists("abcdefghijk").unwrap());

        assert!(store.put_item(&item("abcdefghijk", "ویدیو")).unwrap());

        assert!(store.exists("abcdefghijk").unwrap());
        assert_eq!(store.count_items().unwrap(), 1);
    }

    #[test]
    fn test_put_item_duplicate_is_noop() {
        let mut store = SqliteStore::in_memory().unwrap();

        assert!(store.put_item(&item("abcdefghijk", "اول")).unwrap());
        assert!(!store.put_item(&item("abcdefghijk", "دوم")).unwrap());

        let stored = store.get_item("abcdefghijk").unwrap().unwrap();
        assert_eq!(stored.title(), "اول");
        assert_eq!(store.count_items().unwrap(), 1);
    }

    #[test]
    fn test_get_item_preserves_classification() {
        let mut store = SqliteStore::in_memory().unwrap();
        let original = item("abcdefghijk", "سلام دنیا");
        store.put_item(&original).unwrap();

        let stored = store.get_item("abcdefghijk").unwrap().unwrap();

        assert!(stored.is_target_language());
        assert_eq!(stored.language_score(), original.language_score());
        assert_eq!(stored.duration(), Some(300));
    }

    #[test]
    fn test_get_missing_item() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.get_item("missing0000").unwrap().is_none());
    }

    #[test]
    fn test_caption_upsert_keeps_single_track() {
        let mut store = SqliteStore::in_memory().unwrap();
        store.put_item(&item("abcdefghijk", "ویدیو")).unwrap();

        store
            .put_caption(&track("abcdefghijk", "fa", CaptionKind::Manual, "قدیمی"))
            .unwrap();
        store
            .put_caption(&track("abcdefghijk", "fa", CaptionKind::Manual, "جدید"))
            .unwrap();

        let captions = store.list_captions().unwrap();
        assert_eq!(captions.len(), 1);
        assert_eq!(captions[0].text, "جدید");
    }

    #[test]
    fn test_caption_kinds_are_distinct_tracks() {
        let mut store = SqliteStore::in_memory().unwrap();
        store.put_item(&item("abcdefghijk", "ویدیو")).unwrap();

        store
            .put_caption(&track("abcdefghijk", "fa", CaptionKind::Manual, "یک"))
            .unwrap();
        store
            .put_caption(&track("abcdefghijk", "fa", CaptionKind::Automatic, "دو"))
            .unwrap();
        store
            .put_caption(&track("abcdefghijk", "en", CaptionKind::Automatic, "two"))
            .unwrap();

        assert_eq!(store.count_captions().unwrap(), 3);
        assert_eq!(store.count_captions_by_language("fa").unwrap(), 2);
        assert_eq!(store.count_captions_by_language("en").unwrap(), 1);
    }

    #[test]
    fn test_caption_for_unknown_item_fails() {
        let mut store = SqliteStore::in_memory().unwrap();
        let result = store.put_caption(&track("missing0000", "fa", CaptionKind::Manual, "متن"));
        assert!(result.is_err());
    }

    #[test]
    fn test_unrecognized_caption_kind_is_an_error() {
        let mut store = SqliteStore::in_memory().unwrap();
        store.put_item(&item("abcdefghijk", "ویدیو")).unwrap();
        store
            .conn
            .execute(
                "INSERT INTO captions (content_id, language, kind, text, updated_at)
                 VALUES ('abcdefghijk', 'fa', 'bogus', 'متن', '2024-01-01T00:00:00Z')",
                [],
            )
            .unwrap();

        let result = store.list_captions();

        assert!(matches!(
            result,
            Err(StorageError::Sqlite(rusqlite::Error::FromSqlConversionFailure(2, _, _)))
        ));
    }

    #[test]
    fn test_items_missing_caption() {
        let mut store = SqliteStore::in_memory().unwrap();
        store.put_item(&item("aaaaaaaaaaa", "یک")).unwrap();
        store.put_item(&item("bbbbbbbbbbb", "دو")).unwrap();
        store
            .put_caption(&track("aaaaaaaaaaa", "fa", CaptionKind::Manual, "متن"))
            .unwrap();

        assert_eq!(
            store.items_missing_caption("fa").unwrap(),
            vec!["bbbbbbbbbbb".to_string()]
        );
        assert_eq!(store.items_missing_caption("en").unwrap().len(), 2);
    }

    #[test]
    fn test_session_lifecycle() {
        let mut store = SqliteStore::in_memory().unwrap();
        let seeds = vec!["https://www.youtube.com/watch?v=abcdefghijk".to_string()];

        let session_id = store.create_session(&seeds, "test_hash").unwrap();
        assert!(session_id > 0);

        let running = store.get_latest_session().unwrap().unwrap();
        assert_eq!(running.status, SessionStatus::Running);
        assert_eq!(running.seeds, seeds);

        let stats = RunStats {
            found: 4,
            processed: 4,
            subtitles_extracted: 3,
            ..Default::default()
        };
        store.complete_session(session_id, &stats).unwrap();

        let done = store.get_latest_session().unwrap().unwrap();
        assert_eq!(done.status, SessionStatus::Completed);
        assert_eq!(done.found, 4);
        assert_eq!(done.subtitles_extracted, 3);
        assert!(done.finished_at.is_some());
    }

    #[test]
    fn test_fail_unknown_session() {
        let mut store = SqliteStore::in_memory().unwrap();
        let result = store.fail_session(42, &RunStats::default());
        assert!(matches!(result, Err(StorageError::SessionNotFound(42))));
    }

    #[test]
    fn test_store_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collector.db");

        {
            let mut store = SqliteStore::new(&path).unwrap();
            store.put_item(&item("abcdefghijk", "ویدیو")).unwrap();
        }

        let store = SqliteStore::new(&path).unwrap();
        assert!(store.exists("abcdefghijk").unwrap());
    }
}
