//! Crawler module for content discovery
//!
//! This module contains the discovery side of a session, including:
//! - HTTP fetching of watch pages
//! - HTML parsing of metadata and related links
//! - Rate limiting between requests
//! - The breadth-first frontier crawler
//! - Overall session coordination

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod throttle;

pub use coordinator::{build_classifier, Coordinator, SessionSummary};
pub use fetcher::{build_http_client, ContentFetcher, HttpContentFetcher};
pub use frontier::{CrawlSettings, FrontierCrawler, ItemFilter};
pub use parser::{parse_iso8601_duration, parse_watch_page};
pub use throttle::{SharedThrottle, Throttle};
