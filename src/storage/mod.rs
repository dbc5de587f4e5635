//! Storage module for persisting collected content
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Item persistence with existence checks
//! - Caption persistence with one track per (item, language, kind)
//! - Session tracking

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{Store, StorageError, StorageResult};

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

/// A store shared between crawlers and retrieval tasks
pub type SharedStore = Arc<Mutex<dyn Store>>;

/// Wraps a store for shared use
pub fn share<S: Store + 'static>(store: S) -> SharedStore {
    Arc::new(Mutex::new(store))
}

/// Locks a shared store, mapping poisoning to a storage error
pub fn lock_store(store: &SharedStore) -> StorageResult<MutexGuard<'_, dyn Store + 'static>> {
    store.lock().map_err(|_| StorageError::LockPoisoned)
}

/// An item row as stored, used by exports
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemRecord {
    pub id: String,
    pub url: String,
    pub title: String,
    pub description: String,
    pub channel: String,
    pub duration: Option<u64>,
    pub is_target_language: bool,
    pub language_score: f64,
    pub created_at: String,
}

/// Represents a crawl session
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub seeds: Vec<String>,
    pub config_hash: String,
    pub found: u64,
    pub processed: u64,
    pub downloaded: u64,
    pub subtitles_extracted: u64,
    pub errors: u64,
    pub status: SessionStatus,
}

/// Status of a crawl session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    Completed,
    Failed,
}

impl SessionStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_status_roundtrip() {
        for status in &[
            SessionStatus::Running,
            SessionStatus::Completed,
            SessionStatus::Failed,
        ] {
            let db_str = status.to_db_string();
            let parsed = SessionStatus::from_db_string(db_str);
            assert_eq!(Some(*status), parsed);
        }
    }

    #[test]
    fn test_session_status_invalid() {
        assert_eq!(SessionStatus::from_db_string("interrupted"), None);
    }

    #[test]
    fn test_shared_store_lock() {
        let store = share(SqliteStore::in_memory().unwrap());
        let guard = lock_store(&store).unwrap();
        assert_eq!(guard.count_items().unwrap(), 0);
    }
}
