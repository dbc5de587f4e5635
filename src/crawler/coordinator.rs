//! Crawler coordinator - session orchestration
//!
//! This module wires one collection session together:
//! - Opening the store and building the HTTP fetchers
//! - Recording the session row
//! - Running one combined crawler, or one crawler per seed in parallel
//! - Feeding accepted items to the ingestion pipeline
//! - Merging counters and closing the session

use crate::config::{ClassifierConfig, Config};
use crate::crawler::fetcher::{build_http_client, ContentFetcher, HttpContentFetcher};
use crate::crawler::frontier::{CrawlSettings, FrontierCrawler, ItemFilter};
use crate::crawler::throttle::Throttle;
use crate::ingest::{HttpSubtitleFetcher, IngestionPipeline, MappingLog, PipelineSettings, SubtitleFetcher};
use crate::language::{LanguageClassifier, WhatlangDetector, PERSIAN_RANGES};
use crate::state::RunStats;
use crate::storage::{lock_store, share, SharedStore, SqliteStore};
use crate::{ConfigError, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use url::Url;

/// Result of one collection session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSummary {
    pub session_id: i64,
    pub stats: RunStats,
    /// The run timeout stopped the crawl before it finished
    pub timed_out: bool,
}

/// Builds the classifier described by the configuration
///
/// The statistical detector is attached only when enabled and the target
/// language is known to it.
pub fn build_classifier(config: &ClassifierConfig) -> LanguageClassifier {
    let classifier = LanguageClassifier::new(PERSIAN_RANGES.to_vec(), config.min_length);

    if !config.use_detector {
        return classifier;
    }

    match WhatlangDetector::for_code(&config.target_language) {
        Some(detector) => classifier.with_detector(Arc::new(detector)),
        None => {
            tracing::warn!(
                "No statistical model for '{}', using script ratio only",
                config.target_language
            );
            classifier
        }
    }
}

/// Main coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    config_hash: String,
    store: SharedStore,
    fetcher: Arc<dyn ContentFetcher>,
    subtitles: Arc<dyn SubtitleFetcher>,
    classifier: LanguageClassifier,
}

impl Coordinator {
    /// Creates a coordinator backed by SQLite and the HTTP fetchers
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    /// * `config_hash` - Hash of the configuration, recorded with the session
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(VidError)` - Failed to open the store or build the client
    pub fn new(config: Config, config_hash: String) -> Result<Self> {
        let database_path = Path::new(&config.output.database_path);
        if let Some(parent) = database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let store = share(SqliteStore::new(database_path)?);

        let base_url = Url::parse(&config.source.base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", config.source.base_url, e)))?;
        let client = build_http_client(&config.user_agent, config.source.request_timeout)?;

        let fetcher = Arc::new(HttpContentFetcher::new(client.clone()));
        let subtitles = Arc::new(HttpSubtitleFetcher::new(client, base_url));

        Ok(Self::with_components(config, config_hash, store, fetcher, subtitles))
    }

    /// Creates a coordinator from already built collaborators
    pub fn with_components(
        config: Config,
        config_hash: String,
        store: SharedStore,
        fetcher: Arc<dyn ContentFetcher>,
        subtitles: Arc<dyn SubtitleFetcher>,
    ) -> Self {
        let classifier = build_classifier(&config.classifier);

        Self {
            config: Arc::new(config),
            config_hash,
            store,
            fetcher,
            subtitles,
            classifier,
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    fn pipeline(&self) -> IngestionPipeline {
        IngestionPipeline::new(
            Arc::clone(&self.store),
            Arc::clone(&self.subtitles),
            self.classifier.clone(),
            Throttle::from_millis(self.config.crawler.rate_limit_delay).shared(),
            PipelineSettings::from_config(&self.config),
        )
        .with_mapping(MappingLog::new(&self.config.output.mapping_path))
    }

    fn crawler(&self, settings: CrawlSettings) -> FrontierCrawler {
        FrontierCrawler::new(
            Arc::clone(&self.fetcher),
            self.classifier.clone(),
            settings,
            ItemFilter::from_config(&self.config.filters),
            Throttle::from_millis(self.config.crawler.rate_limit_delay),
        )
    }

    /// Runs one collection session over `seeds`
    ///
    /// This method:
    /// 1. Records a new session
    /// 2. Starts the crawler(s), all feeding one item channel
    /// 3. Runs the ingestion pipeline until every crawler has finished
    /// 4. Merges counters and completes (or, on timeout, fails) the session
    pub async fn run(&self, seeds: &[String]) -> Result<SessionSummary> {
        if seeds.is_empty() {
            return Err(ConfigError::Missing("seeds".to_string()).into());
        }

        let session_id = lock_store(&self.store)?.create_session(seeds, &self.config_hash)?;
        tracing::info!("Starting session {} with {} seeds", session_id, seeds.len());
        let start_time = Instant::now();

        let mut settings = CrawlSettings::from_config(&self.config);
        settings.deadline = self
            .config
            .crawler
            .run_timeout
            .map(|secs| start_time + Duration::from_secs(secs));

        let seed_groups: Vec<Vec<String>> = if self.config.crawler.per_seed {
            seeds.iter().map(|seed| vec![seed.clone()]).collect()
        } else {
            vec![seeds.to_vec()]
        };

        let (tx, rx) = mpsc::channel(self.config.ingest.concurrency.max(1) * 2);
        let mut crawlers = JoinSet::new();

        for group in seed_groups {
            let mut crawler = self.crawler(settings.clone());
            crawler.seed(&group);
            let tx = tx.clone();
            crawlers.spawn(async move {
                let stats = crawler.run(tx).await;
                (stats, crawler.timed_out())
            });
        }
        drop(tx);

        let ingest_stats = self.pipeline().run(rx).await;

        let mut stats = RunStats::new();
        let mut timed_out = false;
        while let Some(joined) = crawlers.join_next().await {
            match joined {
                Ok((crawler_stats, crawler_timed_out)) => {
                    stats.merge(&crawler_stats);
                    timed_out |= crawler_timed_out;
                }
                Err(e) => {
                    tracing::error!("Crawler task failed: {}", e);
                    stats.errors += 1;
                }
            }
        }
        stats.merge(&ingest_stats);

        {
            let mut store = lock_store(&self.store)?;
            if timed_out {
                store.fail_session(session_id, &stats)?;
            } else {
                store.complete_session(session_id, &stats)?;
            }
        }

        if timed_out {
            tracing::warn!(
                "Session {} hit the run timeout after {:?}; partial results kept",
                session_id,
                start_time.elapsed()
            );
        } else {
            tracing::info!(
                "Session {} completed in {:?}: {} found, {} processed, {} errors",
                session_id,
                start_time.elapsed(),
                stats.found,
                stats.processed,
                stats.errors
            );
        }

        Ok(SessionSummary {
            session_id,
            stats,
            timed_out,
        })
    }

    /// Retries caption retrieval for up to `limit` stored items
    pub async fn resume_captions(&self, limit: usize) -> RunStats {
        self.pipeline().resume_captions(limit).await
    }
}
