//! Output module for statistics and exports
//!
//! This module handles:
//! - Displaying collection statistics and run counters
//! - Exporting stored items and captions as JSON or CSV

mod export;
pub mod stats;

pub use export::{export, write_csv, write_json, ExportFormat, ExportSummary, ExportTable};
pub use stats::{load_statistics, print_run_stats, print_statistics, CollectionStatistics};

use crate::storage::StorageError;
use thiserror::Error;

/// Errors that can occur while producing output
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
