//! Statistics from the collection database
//!
//! This module provides functionality for extracting and displaying
//! collection statistics from the store and the mapping log, and for
//! printing the counters of a finished run.

use crate::ingest::read_mapping;
use crate::output::OutputError;
use crate::state::RunStats;
use crate::storage::{SessionRecord, Store};
use std::path::Path;

/// Collection statistics summary
#[derive(Debug, Clone)]
pub struct CollectionStatistics {
    /// Total number of stored items
    pub total_items: u64,

    /// Stored items classified as target language
    pub target_items: u64,

    /// Total number of stored caption tracks
    pub total_captions: u64,

    /// Caption tracks per configured language, in configuration order
    pub captions_by_language: Vec<(String, u64)>,

    /// Items without a track in each configured language
    pub missing_by_language: Vec<(String, u64)>,

    /// Lines in the mapping log
    pub mapping_lines: usize,

    /// Mapping lines with at least one caption reference
    pub mapping_with_captions: usize,

    /// Most recent session, if any
    pub latest_session: Option<SessionRecord>,
}

/// Loads statistics from the store and the mapping log
///
/// # Arguments
///
/// * `store` - The store to query
/// * `languages` - Configured caption languages
/// * `mapping_path` - Path of the mapping log (a missing file counts as empty)
///
/// # Returns
///
/// * `Ok(CollectionStatistics)` - Successfully loaded statistics
/// * `Err(OutputError)` - Failed to query the store or read the log
pub fn load_statistics(
    store: &dyn Store,
    languages: &[String],
    mapping_path: &Path,
) -> Result<CollectionStatistics, OutputError> {
    let total_items = store.count_items()?;
    let target_items = store
        .list_items()?
        .iter()
        .filter(|item| item.is_target_language)
        .count() as u64;
    let total_captions = store.count_captions()?;

    let mut captions_by_language = Vec::new();
    let mut missing_by_language = Vec::new();
    for language in languages {
        captions_by_language.push((language.clone(), store.count_captions_by_language(language)?));
        missing_by_language.push((
            language.clone(),
            store.items_missing_caption(language)?.len() as u64,
        ));
    }

    let records = read_mapping(mapping_path)?;
    let mapping_with_captions = records.iter().filter(|r| r.has_captions()).count();

    Ok(CollectionStatistics {
        total_items,
        target_items,
        total_captions,
        captions_by_language,
        missing_by_language,
        mapping_lines: records.len(),
        mapping_with_captions,
        latest_session: store.get_latest_session()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CollectionStatistics) {
    println!("=== Collection Statistics ===\n");

    println!("Overview:");
    println!("  Items stored: {}", stats.total_items);
    println!("  Target-language items: {}", stats.target_items);
    println!("  Caption tracks: {}", stats.total_captions);
    println!();

    if !stats.captions_by_language.is_empty() {
        println!("Captions by Language:");
        for ((language, count), (_, missing)) in stats
            .captions_by_language
            .iter()
            .zip(&stats.missing_by_language)
        {
            println!("  {}: {} tracks, {} items without", language, count, missing);
        }
        println!();
    }

    let coverage = if stats.mapping_lines > 0 {
        (stats.mapping_with_captions as f64 / stats.mapping_lines as f64) * 100.0
    } else {
        0.0
    };
    println!("Mapping Log:");
    println!(
        "  {} entries, {} with captions ({:.1}%)",
        stats.mapping_lines, stats.mapping_with_captions, coverage
    );
    println!();

    match &stats.latest_session {
        Some(session) => {
            println!("Latest Session (#{}):", session.id);
            println!("  Started: {}", session.started_at);
            if let Some(finished) = &session.finished_at {
                println!("  Finished: {}", finished);
            }
            println!("  Status: {}", session.status.to_db_string());
            println!("  Seeds: {}", session.seeds.len());
            println!(
                "  Found {}, processed {}, downloaded {}, captions {}, errors {}",
                session.found,
                session.processed,
                session.downloaded,
                session.subtitles_extracted,
                session.errors
            );
        }
        None => println!("No sessions recorded yet."),
    }
}

/// Prints the counters of a finished run
pub fn print_run_stats(stats: &RunStats) {
    println!("=== Run Summary ===\n");
    println!("  Found: {}", stats.found);
    println!("  Processed: {}", stats.processed);
    println!("  Skipped (already stored): {}", stats.skipped_existing);
    println!("  Downloaded: {}", stats.downloaded);
    println!("  Subtitles extracted: {}", stats.subtitles_extracted);
    println!("  Pages fetched: {}", stats.steps);
    println!("  Errors: {}", stats.errors);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{MappingLog, MappingRecord};
    use crate::language::LanguageClassifier;
    use crate::models::{CaptionKind, CaptionTrack, ContentItem, PageMetadata};
    use crate::storage::SqliteStore;

    fn item(id: &str, title: &str) -> ContentItem {
        ContentItem::classify(
            PageMetadata {
                id: id.to_string(),
                url: format!("https://www.youtube.com/watch?v={}", id),
                title: title.to_string(),
                ..Default::default()
            },
            &LanguageClassifier::default(),
            0.1,
        )
    }

    #[test]
    fn test_load_statistics() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SqliteStore::in_memory().unwrap();
        store.put_item(&item("aaaaaaaaaaa", "ویدیو فارسی")).unwrap();
        store.put_item(&item("bbbbbbbbbbb", "English video")).unwrap();
        store
            .put_caption(&CaptionTrack {
                content_id: "aaaaaaaaaaa".to_string(),
                language: "fa".to_string(),
                kind: CaptionKind::Manual,
                text: "زیرنویس".to_string(),
                source_ref: None,
            })
            .unwrap();

        let mapping = MappingLog::new(dir.path().join("mapping.txt"));
        mapping
            .append(&MappingRecord {
                locator: "https://www.youtube.com/watch?v=aaaaaaaaaaa".to_string(),
                primary_caption: Some("a.fa.manual.txt".to_string()),
                ..Default::default()
            })
            .unwrap();
        mapping
            .append(&MappingRecord::bare("https://www.youtube.com/watch?v=bbbbbbbbbbb"))
            .unwrap();

        let languages = vec!["fa".to_string(), "en".to_string()];
        let stats = load_statistics(&store, &languages, mapping.path()).unwrap();

        assert_eq!(stats.total_items, 2);
        assert_eq!(stats.target_items, 1);
        assert_eq!(stats.total_captions, 1);
        assert_eq!(stats.captions_by_language[0], ("fa".to_string(), 1));
        assert_eq!(stats.missing_by_language[0], ("fa".to_string(), 1));
        assert_eq!(stats.missing_by_language[1], ("en".to_string(), 2));
        assert_eq!(stats.mapping_lines, 2);
        assert_eq!(stats.mapping_with_captions, 1);
        assert!(stats.latest_session.is_none());
    }

    #[test]
    fn test_load_statistics_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::in_memory().unwrap();

        let stats = load_statistics(&store, &[], &dir.path().join("missing.txt")).unwrap();

        assert_eq!(stats.total_items, 0);
        assert_eq!(stats.mapping_lines, 0);
        assert!(stats.captions_by_language.is_empty());
    }
}
