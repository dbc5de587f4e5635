//! Breadth-first frontier crawler
//!
//! The crawler pops locators from its frontier, fetches them, classifies the
//! result and expands the frontier with related candidates that pass the
//! pre-filter. Accepted items are sent to the ingestion pipeline in
//! discovery order.

use crate::config::{Config, FilterConfig};
use crate::crawler::fetcher::ContentFetcher;
use crate::crawler::throttle::Throttle;
use crate::language::LanguageClassifier;
use crate::models::{ContentItem, RelatedCandidate};
use crate::state::{FrontierState, QueuedCandidate, RunStats};
use crate::url::canonicalize_locator;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

/// Limits and thresholds for one crawler
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlSettings {
    /// Stop after this many accepted items
    pub max_items: usize,
    /// Queue length after each expansion
    pub max_queue_size: usize,
    /// Stop after this many fetches
    pub max_steps: Option<usize>,
    /// Post-fetch classification threshold
    pub min_ratio: f64,
    /// Threshold applied to candidate title and channel before enqueueing
    pub prefilter_ratio: f64,
    /// Stop fetching once this instant has passed
    pub deadline: Option<Instant>,
}

impl CrawlSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_items: config.crawler.max_items,
            max_queue_size: config.crawler.max_queue_size,
            max_steps: config.crawler.max_steps,
            min_ratio: config.classifier.min_ratio,
            prefilter_ratio: config.classifier.prefilter_ratio,
            deadline: None,
        }
    }
}

/// Post-classification filter on item attributes
///
/// Items with unknown duration pass the duration bounds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemFilter {
    pub min_duration: Option<u64>,
    pub max_duration: Option<u64>,
    pub channel_whitelist: Vec<String>,
}

impl ItemFilter {
    pub fn from_config(config: &FilterConfig) -> Self {
        Self {
            min_duration: config.min_duration,
            max_duration: config.max_duration,
            channel_whitelist: config.channel_whitelist.clone(),
        }
    }

    pub fn accepts(&self, item: &ContentItem) -> bool {
        if let Some(duration) = item.duration() {
            if self.min_duration.is_some_and(|min| duration < min) {
                return false;
            }
            if self.max_duration.is_some_and(|max| duration > max) {
                return false;
            }
        }

        self.channel_whitelist.is_empty()
            || self
                .channel_whitelist
                .iter()
                .any(|channel| channel.as_str() == item.channel())
    }
}

/// A sequential breadth-first crawler over related-content links
pub struct FrontierCrawler {
    fetcher: Arc<dyn ContentFetcher>,
    classifier: LanguageClassifier,
    settings: CrawlSettings,
    filter: ItemFilter,
    throttle: Throttle,
    state: FrontierState,
    stats: RunStats,
    accepted: usize,
    timed_out: bool,
}

impl FrontierCrawler {
    pub fn new(
        fetcher: Arc<dyn ContentFetcher>,
        classifier: LanguageClassifier,
        settings: CrawlSettings,
        filter: ItemFilter,
        throttle: Throttle,
    ) -> Self {
        Self {
            fetcher,
            classifier,
            settings,
            filter,
            throttle,
            state: FrontierState::new(),
            stats: RunStats::new(),
            accepted: 0,
            timed_out: false,
        }
    }

    /// Queues seed locators
    ///
    /// Seeds without a recognizable content id are counted as errors.
    pub fn seed<S: AsRef<str>>(&mut self, seeds: &[S]) {
        for seed in seeds {
            let seed = seed.as_ref();
            match canonicalize_locator(seed) {
                Some((id, locator)) => {
                    self.state.enqueue(QueuedCandidate::new(id, locator));
                }
                None => {
                    tracing::warn!("Seed {} has no content id, skipping", seed);
                    self.stats.errors += 1;
                }
            }
        }
    }

    /// Runs the crawl, sending accepted items to `tx`
    ///
    /// Stops when the queue is empty, `max_items` items were accepted,
    /// `max_steps` fetches were made, the deadline passed or the receiver was
    /// dropped. Returns the crawler's counters (`found`, `errors`, `steps`).
    pub async fn run(&mut self, tx: mpsc::Sender<ContentItem>) -> RunStats {
        loop {
            if self.accepted >= self.settings.max_items {
                tracing::info!(
                    "Reached {} accepted items, discarding {} queued candidates",
                    self.accepted,
                    self.state.queue_len()
                );
                break;
            }

            if let Some(max_steps) = self.settings.max_steps {
                if self.stats.steps >= max_steps as u64 {
                    tracing::info!("Reached step limit of {}", max_steps);
                    break;
                }
            }

            if self.settings.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                tracing::warn!("Run deadline reached, stopping crawl");
                self.timed_out = true;
                break;
            }

            let Some(candidate) = self.state.pop_unvisited() else {
                tracing::info!("Frontier is empty, crawl complete");
                break;
            };

            self.state.mark_visited(&candidate.id);
            self.throttle.acquire().await;
            self.stats.steps += 1;

            let page = match self.fetcher.fetch(&candidate.locator).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!("Failed to fetch {}: {}", candidate.locator, e);
                    self.stats.errors += 1;
                    continue;
                }
            };

            if page.id != candidate.id && !self.state.mark_visited(&page.id) {
                tracing::debug!(
                    "{} resolved to already visited {}, skipping",
                    candidate.id,
                    page.id
                );
                continue;
            }

            let item = ContentItem::classify(page, &self.classifier, self.settings.min_ratio);
            self.expand(item.related());

            if !item.is_target_language() {
                tracing::debug!("Rejected {} (score {:.2})", item.id(), item.language_score());
                continue;
            }
            if !self.filter.accepts(&item) {
                tracing::debug!("Filtered out {}", item.id());
                continue;
            }

            tracing::debug!("Accepted {}: {}", item.id(), item.title());
            self.accepted += 1;
            self.stats.found += 1;

            if tx.send(item).await.is_err() {
                tracing::warn!("Item receiver closed, stopping crawl");
                break;
            }
        }

        self.stats
    }

    /// Runs the crawl and collects the accepted items
    pub async fn collect(&mut self) -> (Vec<ContentItem>, RunStats) {
        let (tx, mut rx) = mpsc::channel(16);

        let drain = async move {
            let mut items = Vec::new();
            while let Some(item) = rx.recv().await {
                items.push(item);
            }
            items
        };

        let (stats, items) = tokio::join!(self.run(tx), drain);
        (items, stats)
    }

    fn expand(&mut self, related: &[RelatedCandidate]) {
        for candidate in related {
            if self.state.is_visited(&candidate.id) || self.state.is_queued(&candidate.id) {
                continue;
            }
            if !self
                .classifier
                .is_target_language(&candidate.prefilter_text(), self.settings.prefilter_ratio)
            {
                tracing::trace!("Pre-filter rejected {}", candidate.id);
                continue;
            }
            self.state.enqueue(QueuedCandidate::new(
                candidate.id.clone(),
                candidate.locator.clone(),
            ));
        }

        let dropped = self.state.truncate(self.settings.max_queue_size);
        if dropped > 0 {
            tracing::debug!("Dropped {} candidates over the queue limit", dropped);
        }
    }

    pub fn state(&self) -> &FrontierState {
        &self.state
    }

    /// Whether the last run stopped because of the deadline
    pub fn timed_out(&self) -> bool {
        self.timed_out
    }
}
