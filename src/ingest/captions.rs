//! Caption retrieval
//!
//! This module defines the `SubtitleFetcher` seam, its HTTP implementation
//! against the timed-text endpoint, WebVTT parsing, and the derivation of an
//! inferred target-language track from automatic tracks in other languages.

use crate::language::LanguageClassifier;
use crate::models::{CaptionKind, FetchedCaption};
use crate::{FetchError, FetchResult};
use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, StatusCode};
use std::sync::LazyLock;
use url::Url;

static MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("markup pattern is valid"));

static BRACKETED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[[^\]]*\]|\([^)]*\)").expect("annotation pattern is valid")
});

/// Retrieves caption tracks for a content id
///
/// Returns an empty vector when the content has no captions in any of the
/// requested languages.
#[async_trait]
pub trait SubtitleFetcher: Send + Sync {
    async fn fetch_captions(
        &self,
        content_id: &str,
        languages: &[String],
    ) -> FetchResult<Vec<FetchedCaption>>;
}

/// Fetches WebVTT tracks from `<base>/api/timedtext`
///
/// For each language the manual track is requested first, then the automatic
/// one (`kind=asr`).
///
/// A failed track request is logged and its siblings are still returned; the
/// call fails only when every request failed.
#[derive(Debug, Clone)]
pub struct HttpSubtitleFetcher {
    client: Client,
    base_url: Url,
}

impl HttpSubtitleFetcher {
    pub fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    fn track_url(&self, content_id: &str, language: &str, kind: CaptionKind) -> FetchResult<Url> {
        let mut url = self
            .base_url
            .join("/api/timedtext")
            .map_err(|e| FetchError::InvalidLocator(e.to_string()))?;

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("v", content_id)
                .append_pair("lang", language)
                .append_pair("fmt", "vtt");
            if kind == CaptionKind::Automatic {
                query.append_pair("kind", "asr");
            }
        }

        Ok(url)
    }

    async fn fetch_track(
        &self,
        content_id: &str,
        language: &str,
        kind: CaptionKind,
    ) -> FetchResult<Option<FetchedCaption>> {
        let url = self.track_url(content_id, language, kind)?;
        let url_str = url.to_string();

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(&url_str, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url_str,
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(&url_str, e))?;

        let text = parse_vtt(&body);
        if text.is_empty() {
            return Ok(None);
        }

        Ok(Some(FetchedCaption {
            language: language.to_string(),
            kind,
            text,
        }))
    }
}

#[async_trait]
impl SubtitleFetcher for HttpSubtitleFetcher {
    async fn fetch_captions(
        &self,
        content_id: &str,
        languages: &[String],
    ) -> FetchResult<Vec<FetchedCaption>> {
        let mut captions = Vec::new();
        let mut requests = 0usize;
        let mut failures = 0usize;
        let mut last_error = None;

        for language in languages {
            for kind in [CaptionKind::Manual, CaptionKind::Automatic] {
                requests += 1;
                match self.fetch_track(content_id, language, kind).await {
                    Ok(Some(caption)) => {
                        tracing::debug!("Found {} {} captions for {}", kind, language, content_id);
                        captions.push(caption);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(
                            "Failed to fetch {} {} captions for {}: {}",
                            kind,
                            language,
                            content_id,
                            e
                        );
                        failures += 1;
                        last_error = Some(e);
                    }
                }
            }
        }

        match last_error {
            Some(e) if failures == requests => Err(e),
            _ => Ok(captions),
        }
    }
}

/// Extracts the cue text of a WebVTT document
///
/// Header, `NOTE` and `STYLE` blocks are skipped. Cue text is cleaned with
/// [`clean_caption_line`]; empty lines and immediate repeats (common in
/// automatic tracks) are dropped.
pub fn parse_vtt(body: &str) -> String {
    let normalized = body.replace("\r\n", "\n");
    let mut lines: Vec<String> = Vec::new();

    for block in normalized.split("\n\n") {
        let mut block_lines = block.lines();
        if !block_lines.any(|line| line.contains("-->")) {
            continue;
        }

        for line in block_lines {
            let cleaned = clean_caption_line(line);
            if cleaned.is_empty() || lines.last() == Some(&cleaned) {
                continue;
            }
            lines.push(cleaned);
        }
    }

    lines.join("\n")
}

/// Removes markup tags and `[..]`/`(..)` annotations and collapses whitespace
pub fn clean_caption_line(line: &str) -> String {
    let without_tags = MARKUP.replace_all(line, "");
    let without_annotations = BRACKETED.replace_all(&without_tags, "");
    without_annotations
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Derives a target-language track from automatic tracks in other languages
///
/// Returns `None` if a target-language track is already present or no
/// automatic track has lines containing target-script characters.
pub fn infer_target_track(
    captions: &[FetchedCaption],
    target_language: &str,
    classifier: &LanguageClassifier,
) -> Option<FetchedCaption> {
    if captions.iter().any(|c| c.language == target_language) {
        return None;
    }

    captions
        .iter()
        .filter(|c| c.kind == CaptionKind::Automatic)
        .find_map(|caption| {
            let lines: Vec<&str> = caption
                .text
                .lines()
                .filter(|line| classifier.has_target_chars(line))
                .collect();

            if lines.is_empty() {
                None
            } else {
                Some(FetchedCaption {
                    language: target_language.to_string(),
                    kind: CaptionKind::Inferred,
                    text: lines.join("\n"),
                })
            }
        })
}
