use serde::Deserialize;

/// Main configuration structure for VidCollector
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub filters: FilterConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub source: SourceConfig,
    pub output: OutputConfig,
    /// Seed locators used when none are given on the command line
    #[serde(default)]
    pub seeds: Vec<String>,
}

/// Frontier crawler limits
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Hard cap on accepted items per crawler
    #[serde(rename = "max-items")]
    pub max_items: usize,

    /// Frontier cap; the queue is truncated from the back beyond this
    #[serde(rename = "max-queue-size", default = "default_max_queue_size")]
    pub max_queue_size: usize,

    /// Maximum fetch steps per crawler, if bounded
    #[serde(rename = "max-steps", default)]
    pub max_steps: Option<usize>,

    /// Minimum delay between consecutive external fetches (milliseconds)
    #[serde(rename = "rate-limit-delay", default = "default_rate_limit_delay")]
    pub rate_limit_delay: u64,

    /// Run one crawler per seed in parallel instead of one shared frontier
    #[serde(rename = "per-seed", default)]
    pub per_seed: bool,

    /// Abort the whole run after this many seconds
    #[serde(rename = "run-timeout", default)]
    pub run_timeout: Option<u64>,
}

/// Language classification thresholds
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    /// ISO-639 code of the target language
    #[serde(rename = "target-language", default = "default_target_language")]
    pub target_language: String,

    /// Minimum target-script letter ratio for a fetched page
    #[serde(rename = "min-ratio", default = "default_ratio")]
    pub min_ratio: f64,

    /// Minimum ratio for related candidates (title and channel only)
    #[serde(rename = "prefilter-ratio", default = "default_ratio")]
    pub prefilter_ratio: f64,

    /// Texts shorter than this are never target-language
    #[serde(rename = "min-length", default = "default_min_length")]
    pub min_length: usize,

    /// Consult the statistical detector as a secondary signal
    #[serde(rename = "use-detector", default = "default_true")]
    pub use_detector: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            target_language: default_target_language(),
            min_ratio: default_ratio(),
            prefilter_ratio: default_ratio(),
            min_length: default_min_length(),
            use_detector: true,
        }
    }
}

/// Ingestion pipeline settings
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    /// Retrieve captions and write artifacts for new items
    #[serde(rename = "download-content", default = "default_true")]
    pub download_content: bool,

    /// Maximum concurrent retrieval tasks
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Caption languages to request, in mapping-file column order
    #[serde(rename = "caption-languages", default = "default_caption_languages")]
    pub caption_languages: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            download_content: true,
            concurrency: default_concurrency(),
            caption_languages: default_caption_languages(),
        }
    }
}

/// Acceptance filters applied to target-language items
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterConfig {
    /// Minimum duration in seconds (items with unknown duration pass)
    #[serde(rename = "min-duration", default)]
    pub min_duration: Option<u64>,

    /// Maximum duration in seconds (items with unknown duration pass)
    #[serde(rename = "max-duration", default)]
    pub max_duration: Option<u64>,

    /// Only accept items from these channels, when non-empty
    #[serde(rename = "channel-whitelist", default)]
    pub channel_whitelist: Vec<String>,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

/// Upstream platform settings
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Base URL for caption requests
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the append-only mapping file
    #[serde(rename = "mapping-path")]
    pub mapping_path: String,

    /// Directory for caption files and item sidecars
    #[serde(rename = "download-dir")]
    pub download_dir: String,
}

fn default_max_queue_size() -> usize {
    100
}

fn default_rate_limit_delay() -> u64 {
    1000
}

fn default_target_language() -> String {
    "fa".to_string()
}

fn default_ratio() -> f64 {
    0.1
}

fn default_min_length() -> usize {
    3
}

fn default_true() -> bool {
    true
}

fn default_concurrency() -> usize {
    3
}

fn default_caption_languages() -> Vec<String> {
    vec!["fa".to_string(), "en".to_string()]
}

fn default_base_url() -> String {
    "https://www.youtube.com".to_string()
}

fn default_request_timeout() -> u64 {
    30
}
