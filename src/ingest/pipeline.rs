//! Ingestion pipeline
//!
//! The pipeline consumes accepted items, skips the ones the store already
//! has, persists the rest and retrieves their captions with bounded
//! parallelism. A single consumer loop owns the run counters and the mapping
//! log; retrieval tasks only report outcomes back to it.

use crate::config::Config;
use crate::crawler::SharedThrottle;
use crate::ingest::captions::{infer_target_track, SubtitleFetcher};
use crate::ingest::mapping::{MappingLog, MappingRecord};
use crate::language::LanguageClassifier;
use crate::models::{CaptionTrack, ContentItem};
use crate::state::RunStats;
use crate::storage::{lock_store, SharedStore, StorageResult};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinError, JoinSet};

/// Pipeline options
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    /// Retrieve captions and write artifacts for new items
    pub download_content: bool,
    /// Maximum number of concurrent retrieval tasks
    pub concurrency: usize,
    /// Caption languages to request, in priority order
    pub caption_languages: Vec<String>,
    /// Language of inferred tracks
    pub target_language: String,
    /// Directory for caption files and metadata sidecars
    pub download_dir: PathBuf,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            download_content: config.ingest.download_content,
            concurrency: config.ingest.concurrency,
            caption_languages: config.ingest.caption_languages.clone(),
            target_language: config.classifier.target_language.clone(),
            download_dir: PathBuf::from(&config.output.download_dir),
        }
    }
}

/// Everything a retrieval task needs, shared read-only between tasks
struct RetrievalContext {
    store: SharedStore,
    subtitles: Arc<dyn SubtitleFetcher>,
    classifier: LanguageClassifier,
    throttle: SharedThrottle,
    caption_languages: Vec<String>,
    target_language: String,
    download_dir: PathBuf,
}

/// What a retrieval task reports back to the consumer loop
#[derive(Debug, Default)]
struct RetrievalOutcome {
    content_id: String,
    locator: String,
    artifact: Option<String>,
    caption_refs: HashMap<String, String>,
    persisted: u64,
    failed: u64,
    error: Option<String>,
    /// Whether the item was new in this run and gets a mapping line once
    /// retrieval succeeds
    log_mapping: bool,
}

/// Consumes accepted items and persists them
pub struct IngestionPipeline {
    context: Arc<RetrievalContext>,
    download_content: bool,
    semaphore: Arc<Semaphore>,
    mapping: Option<MappingLog>,
}

impl IngestionPipeline {
    pub fn new(
        store: SharedStore,
        subtitles: Arc<dyn SubtitleFetcher>,
        classifier: LanguageClassifier,
        throttle: SharedThrottle,
        settings: PipelineSettings,
    ) -> Self {
        let context = RetrievalContext {
            store,
            subtitles,
            classifier,
            throttle,
            caption_languages: settings.caption_languages,
            target_language: settings.target_language,
            download_dir: settings.download_dir,
        };

        Self {
            context: Arc::new(context),
            download_content: settings.download_content,
            semaphore: Arc::new(Semaphore::new(settings.concurrency.max(1))),
            mapping: None,
        }
    }

    /// Appends one line per new item to `mapping`
    ///
    /// Items whose caption retrieval fails get no line.
    pub fn with_mapping(mut self, mapping: MappingLog) -> Self {
        self.mapping = Some(mapping);
        self
    }

    /// Consumes items until the sender side is dropped and every retrieval
    /// task has finished
    pub async fn run(&self, mut rx: mpsc::Receiver<ContentItem>) -> RunStats {
        let mut stats = RunStats::new();
        let mut tasks: JoinSet<RetrievalOutcome> = JoinSet::new();
        let mut receiving = true;

        loop {
            tokio::select! {
                received = rx.recv(), if receiving => match received {
                    Some(item) => self.ingest_item(item, &mut tasks, &mut stats),
                    None => {
                        tracing::debug!("Item stream closed, draining {} retrieval tasks", tasks.len());
                        receiving = false;
                    }
                },
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    self.record_outcome(joined, &mut stats);
                }
                else => break,
            }
        }

        tracing::info!(
            "Ingestion finished: {} processed, {} skipped, {} downloaded, {} captions, {} errors",
            stats.processed,
            stats.skipped_existing,
            stats.downloaded,
            stats.subtitles_extracted,
            stats.errors
        );
        stats
    }

    /// Runs the pipeline over an already collected batch
    pub async fn process_items(&self, items: Vec<ContentItem>) -> RunStats {
        let (tx, rx) = mpsc::channel(items.len().max(1));
        for item in items {
            if tx.send(item).await.is_err() {
                break;
            }
        }
        drop(tx);
        self.run(rx).await
    }

    /// Re-runs caption retrieval for stored items lacking a configured
    /// caption language
    ///
    /// At most `limit` items are retried. No mapping lines are written.
    pub async fn resume_captions(&self, limit: usize) -> RunStats {
        let mut stats = RunStats::new();

        let items = match self.items_needing_captions(limit) {
            Ok(items) => items,
            Err(e) => {
                tracing::error!("Failed to list items missing captions: {}", e);
                stats.errors += 1;
                return stats;
            }
        };

        tracing::info!("Retrying caption retrieval for {} items", items.len());

        let mut tasks: JoinSet<RetrievalOutcome> = JoinSet::new();
        for item in items {
            stats.processed += 1;
            self.spawn_retrieval(item, false, &mut tasks);
        }

        while let Some(joined) = tasks.join_next().await {
            self.record_outcome(joined, &mut stats);
        }

        stats
    }

    fn items_needing_captions(&self, limit: usize) -> StorageResult<Vec<ContentItem>> {
        let store = lock_store(&self.context.store)?;

        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        for language in &self.context.caption_languages {
            for id in store.items_missing_caption(language)? {
                if seen.insert(id.clone()) {
                    ids.push(id);
                }
            }
        }

        let mut items = Vec::new();
        for id in ids.into_iter().take(limit) {
            if let Some(item) = store.get_item(&id)? {
                items.push(item);
            }
        }
        Ok(items)
    }

    fn ingest_item(
        &self,
        item: ContentItem,
        tasks: &mut JoinSet<RetrievalOutcome>,
        stats: &mut RunStats,
    ) {
        let inserted = lock_store(&self.context.store).and_then(|mut store| {
            if store.exists(item.id())? {
                Ok(false)
            } else {
                store.put_item(&item)
            }
        });

        match inserted {
            Err(e) => {
                tracing::error!("Failed to persist {}: {}", item.id(), e);
                stats.errors += 1;
            }
            Ok(false) => {
                tracing::debug!("Skipping {}, already stored", item.id());
                stats.processed += 1;
                stats.skipped_existing += 1;
            }
            Ok(true) => {
                stats.processed += 1;
                if self.download_content {
                    self.spawn_retrieval(item, true, tasks);
                } else {
                    self.append_mapping(&MappingRecord::bare(item.url()), stats);
                }
            }
        }
    }

    fn spawn_retrieval(
        &self,
        item: ContentItem,
        log_mapping: bool,
        tasks: &mut JoinSet<RetrievalOutcome>,
    ) {
        let context = Arc::clone(&self.context);
        let semaphore = Arc::clone(&self.semaphore);

        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            let mut outcome = retrieve(&context, &item).await;
            outcome.log_mapping = log_mapping;
            outcome
        });
    }

    fn record_outcome(&self, joined: Result<RetrievalOutcome, JoinError>, stats: &mut RunStats) {
        let outcome = match joined {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Retrieval task failed: {}", e);
                stats.errors += 1;
                return;
            }
        };

        stats.subtitles_extracted += outcome.persisted;
        stats.errors += outcome.failed;

        match &outcome.error {
            Some(error) => {
                tracing::warn!("Retrieval failed for {}: {}", outcome.content_id, error);
                stats.errors += 1;
            }
            None => {
                tracing::debug!(
                    "Retrieved {} caption tracks for {}",
                    outcome.persisted,
                    outcome.content_id
                );
                stats.downloaded += 1;
            }
        }

        // Failed retrievals get no mapping line so a later run can retry them
        if outcome.log_mapping && outcome.error.is_none() {
            let caption_ref = |index: usize| {
                self.context
                    .caption_languages
                    .get(index)
                    .and_then(|language| outcome.caption_refs.get(language))
                    .cloned()
            };
            let record = MappingRecord {
                locator: outcome.locator.clone(),
                artifact: outcome.artifact.clone(),
                primary_caption: caption_ref(0),
                secondary_caption: caption_ref(1),
            };
            self.append_mapping(&record, stats);
        }
    }

    fn append_mapping(&self, record: &MappingRecord, stats: &mut RunStats) {
        if let Some(mapping) = &self.mapping {
            if let Err(e) = mapping.append(record) {
                tracing::error!("Failed to append to {}: {}", mapping.path().display(), e);
                stats.errors += 1;
            }
        }
    }
}

/// Fetches, writes and persists the captions of one item
async fn retrieve(context: &RetrievalContext, item: &ContentItem) -> RetrievalOutcome {
    let mut outcome = RetrievalOutcome {
        content_id: item.id().to_string(),
        locator: item.url().to_string(),
        ..Default::default()
    };

    context.throttle.lock().await.acquire().await;

    let mut captions = match context
        .subtitles
        .fetch_captions(item.id(), &context.caption_languages)
        .await
    {
        Ok(captions) => captions,
        Err(e) => {
            outcome.error = Some(e.to_string());
            return outcome;
        }
    };

    if let Some(inferred) =
        infer_target_track(&captions, &context.target_language, &context.classifier)
    {
        tracing::debug!("Inferred {} captions for {}", inferred.language, item.id());
        captions.push(inferred);
    }

    if let Err(e) = tokio::fs::create_dir_all(&context.download_dir).await {
        outcome.error = Some(format!(
            "cannot create {}: {}",
            context.download_dir.display(),
            e
        ));
        return outcome;
    }

    for fetched in captions {
        let file_name = format!("{}.{}.{}.txt", item.id(), fetched.language, fetched.kind);
        let path = context.download_dir.join(file_name);

        let source_ref = match tokio::fs::write(&path, &fetched.text).await {
            Ok(()) => Some(path.display().to_string()),
            Err(e) => {
                tracing::warn!("Failed to write {}: {}", path.display(), e);
                None
            }
        };

        let mut track = CaptionTrack::from_fetched(item.id(), fetched);
        track.source_ref = source_ref.clone();

        let persisted = lock_store(&context.store).and_then(|mut store| store.put_caption(&track));
        match persisted {
            Ok(_) => {
                outcome.persisted += 1;
                if let Some(source_ref) = source_ref {
                    outcome
                        .caption_refs
                        .entry(track.language.clone())
                        .or_insert(source_ref);
                }
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to persist {} {} captions for {}: {}",
                    track.kind,
                    track.language,
                    item.id(),
                    e
                );
                outcome.failed += 1;
            }
        }
    }

    let info_path = context.download_dir.join(format!("{}.info.json", item.id()));
    match serde_json::to_vec_pretty(item) {
        Ok(json) => match tokio::fs::write(&info_path, json).await {
            Ok(()) => outcome.artifact = Some(info_path.display().to_string()),
            Err(e) => tracing::warn!("Failed to write {}: {}", info_path.display(), e),
        },
        Err(e) => tracing::warn!("Failed to serialize {}: {}", item.id(), e),
    }

    outcome
}
