//! Ingestion module for persisting accepted items
//!
//! This module contains:
//! - The ingestion pipeline (dedup, persistence, bounded caption retrieval)
//! - Caption fetching and WebVTT cleaning
//! - The append-only mapping log

mod captions;
mod mapping;
mod pipeline;

pub use captions::{
    clean_caption_line, infer_target_track, parse_vtt, HttpSubtitleFetcher, SubtitleFetcher,
};
pub use mapping::{read_mapping, MappingLog, MappingRecord};
pub use pipeline::{IngestionPipeline, PipelineSettings};
