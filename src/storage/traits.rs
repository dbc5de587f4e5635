//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::models::{CaptionTrack, ContentItem};
use crate::state::RunStats;
use crate::storage::{ItemRecord, SessionRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
///
/// A storage error while writing one item or caption is recoverable: it is
/// counted and the item is picked up again by the next run.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Session not found: {0}")]
    SessionNotFound(i64),

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Writers take `&mut self`; shared use goes through `Arc<Mutex<dyn Store>>`
/// so an existence check and the following insert happen under one lock.
pub trait Store: Send {
    // ===== Items =====

    /// Returns true if an item with this id is stored
    fn exists(&self, id: &str) -> StorageResult<bool>;

    /// Inserts an item
    ///
    /// Returns false, leaving the stored row untouched, if the id exists.
    fn put_item(&mut self, item: &ContentItem) -> StorageResult<bool>;

    /// Loads an item by id
    fn get_item(&self, id: &str) -> StorageResult<Option<ContentItem>>;

    /// Lists all items in insertion order
    fn list_items(&self) -> StorageResult<Vec<ItemRecord>>;

    /// Counts stored items
    fn count_items(&self) -> StorageResult<u64>;

    // ===== Captions =====

    /// Inserts or replaces the track for (content id, language, kind)
    fn put_caption(&mut self, track: &CaptionTrack) -> StorageResult<bool>;

    /// Lists all caption tracks
    fn list_captions(&self) -> StorageResult<Vec<CaptionTrack>>;

    /// Counts stored caption tracks
    fn count_captions(&self) -> StorageResult<u64>;

    /// Counts stored caption tracks in one language
    fn count_captions_by_language(&self, language: &str) -> StorageResult<u64>;

    /// Ids of items that have no caption track in `language`
    fn items_missing_caption(&self, language: &str) -> StorageResult<Vec<String>>;

    // ===== Sessions =====

    /// Starts a new session and returns its id
    fn create_session(&mut self, seeds: &[String], config_hash: &str) -> StorageResult<i64>;

    /// Records final counters and marks the session completed
    fn complete_session(&mut self, session_id: i64, stats: &RunStats) -> StorageResult<()>;

    /// Records partial counters and marks the session failed
    fn fail_session(&mut self, session_id: i64, stats: &RunStats) -> StorageResult<()>;

    /// Gets the most recent session
    fn get_latest_session(&self) -> StorageResult<Option<SessionRecord>>;
}
