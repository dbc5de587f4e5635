//! Configuration module for VidCollector
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! A configuration error is fatal and is reported before any crawl work starts.
//!
//! # Example
//!
//! ```no_run
//! use vidcollector::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("vidcollector.toml")).unwrap();
//! println!("Crawler will accept at most {} items", config.crawler.max_items);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ClassifierConfig, Config, CrawlerConfig, FilterConfig, IngestConfig, OutputConfig,
    SourceConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate_seeds;
