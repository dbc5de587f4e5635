//! VidCollector: a Farsi video discovery and caption collector
//!
//! This crate implements a bounded frontier crawler that walks related-content
//! links on a video platform, keeps the pages whose text is Farsi, and feeds
//! them into an ingestion pipeline that persists metadata and retrieves
//! caption tracks with bounded parallelism.

pub mod config;
pub mod crawler;
pub mod ingest;
pub mod language;
pub mod models;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for VidCollector operations
#[derive(Debug, Error)]
pub enum VidError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
///
/// These are the only errors that abort a run, and they are raised before any
/// crawl work begins.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Missing required setting: {0}")]
    Missing(String),
}

/// Errors raised while fetching a page or a caption track
///
/// A fetch error is always local to one locator: it is counted and logged,
/// and the surrounding loop moves on.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Unexpected status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Parse error for {url}: {message}")]
    Parse { url: String, message: String },

    #[error("No content id in locator: {0}")]
    InvalidLocator(String),
}

impl FetchError {
    /// Classifies a reqwest error for the given URL
    pub fn from_reqwest(url: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Http {
                url: url.to_string(),
                source,
            }
        }
    }
}

/// Result type alias for VidCollector operations
pub type Result<T> = std::result::Result<T, VidError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for fetch operations
pub type FetchResult<T> = std::result::Result<T, FetchError>;

// Re-export commonly used types
pub use config::Config;
pub use language::LanguageClassifier;
pub use models::{CaptionKind, CaptionTrack, ContentItem, RelatedCandidate};
pub use state::{FrontierState, RunStats};
pub use crate::url::{canonical_watch_url, extract_video_id};
