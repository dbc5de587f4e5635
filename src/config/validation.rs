use crate::config::types::{
    ClassifierConfig, Config, CrawlerConfig, FilterConfig, IngestConfig, OutputConfig,
    SourceConfig, UserAgentConfig,
};
use crate::url::extract_video_id;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_classifier_config(&config.classifier)?;
    validate_ingest_config(&config.ingest)?;
    validate_filter_config(&config.filters)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_source_config(&config.source)?;
    validate_output_config(&config.output)?;
    validate_seeds(&config.seeds)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_items < 1 {
        return Err(ConfigError::Validation(
            "max_items must be >= 1".to_string(),
        ));
    }

    if config.max_queue_size < 1 {
        return Err(ConfigError::Validation(format!(
            "max_queue_size must be >= 1, got {}",
            config.max_queue_size
        )));
    }

    if config.max_steps == Some(0) {
        return Err(ConfigError::Validation(
            "max_steps must be >= 1 when set".to_string(),
        ));
    }

    if config.run_timeout == Some(0) {
        return Err(ConfigError::Validation(
            "run_timeout must be >= 1 second when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates classifier thresholds
fn validate_classifier_config(config: &ClassifierConfig) -> Result<(), ConfigError> {
    for (name, ratio) in [
        ("min_ratio", config.min_ratio),
        ("prefilter_ratio", config.prefilter_ratio),
    ] {
        if !(0.0..=1.0).contains(&ratio) {
            return Err(ConfigError::Validation(format!(
                "{} must be between 0.0 and 1.0, got {}",
                name, ratio
            )));
        }
    }

    if config.target_language.is_empty() {
        return Err(ConfigError::Missing("target_language".to_string()));
    }

    Ok(())
}

/// Validates ingestion settings
fn validate_ingest_config(config: &IngestConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 64 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 64, got {}",
            config.concurrency
        )));
    }

    if config.caption_languages.is_empty() {
        return Err(ConfigError::Missing("caption_languages".to_string()));
    }

    if let Some(code) = config.caption_languages.iter().find(|code| !is_language_code(code)) {
        return Err(ConfigError::Validation(format!(
            "Invalid caption language code '{}'",
            code
        )));
    }

    Ok(())
}

/// Validates acceptance filters
fn validate_filter_config(config: &FilterConfig) -> Result<(), ConfigError> {
    if let (Some(min), Some(max)) = (config.min_duration, config.max_duration) {
        if min > max {
            return Err(ConfigError::Validation(format!(
                "min_duration ({}) must not exceed max_duration ({})",
                min, max
            )));
        }
    }
    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Missing("crawler_name".to_string()));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    Ok(())
}

/// Validates the upstream source
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url must use HTTP or HTTPS, got '{}'",
            config.base_url
        )));
    }

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(
            "request_timeout must be >= 1 second".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("database_path", &config.database_path),
        ("mapping_path", &config.mapping_path),
        ("download_dir", &config.download_dir),
    ] {
        if value.is_empty() {
            return Err(ConfigError::Missing(name.to_string()));
        }
    }
    Ok(())
}

/// Validates configured seed locators
pub fn validate_seeds(seeds: &[String]) -> Result<(), ConfigError> {
    for seed in seeds {
        Url::parse(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

        if extract_video_id(seed).is_none() {
            return Err(ConfigError::InvalidUrl(format!(
                "Seed URL '{}' does not identify a video",
                seed
            )));
        }
    }
    Ok(())
}

/// ISO-639 style code: 2-3 lowercase letters, optionally with a region suffix
fn is_language_code(code: &str) -> bool {
    let mut parts = code.splitn(2, '-');
    let primary = parts.next().unwrap_or("");
    let primary_ok =
        (2..=3).contains(&primary.len()) && primary.chars().all(|c| c.is_ascii_lowercase());
    let region_ok = parts
        .next()
        .map(|region| !region.is_empty() && region.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or(true);
    primary_ok && region_ok
}
