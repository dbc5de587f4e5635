use crate::language::LanguageClassifier;
use serde::Serialize;

/// A related-content link found on a page
///
/// Candidates are plain identifiers; they never point at other items, so the
/// discovered graph has no reference cycles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelatedCandidate {
    /// Content id of the candidate
    pub id: String,

    /// Locator to fetch the candidate from
    pub locator: String,

    /// Title shown next to the link
    pub title: String,

    /// Channel shown next to the link
    pub channel: String,
}

impl RelatedCandidate {
    /// Text used by the frontier pre-filter
    pub fn prefilter_text(&self) -> String {
        format!("{} {}", self.title, self.channel)
    }
}

/// Raw page metadata as returned by a content fetcher
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageMetadata {
    pub id: String,
    pub url: String,
    pub title: String,
    pub description: String,
    pub channel: String,
    /// Duration in seconds, when the page exposes it
    pub duration: Option<u64>,
    pub related: Vec<RelatedCandidate>,
}

/// A fetched and classified unit of content
///
/// An item is immutable once built: the source fields are fixed by the fetch
/// and the language fields are computed once in [`ContentItem::classify`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentItem {
    id: String,
    url: String,
    title: String,
    description: String,
    channel: String,
    duration: Option<u64>,
    related: Vec<RelatedCandidate>,
    is_target_language: bool,
    language_score: f64,
}

impl ContentItem {
    /// Builds a content item from fetched metadata and classifies it
    ///
    /// Title and description are classified together.
    pub fn classify(page: PageMetadata, classifier: &LanguageClassifier, min_ratio: f64) -> Self {
        let text = format!("{} {}", page.title, page.description);
        let language_score = classifier.score(&text);
        let is_target_language = classifier.is_target_language(&text, min_ratio);

        Self {
            id: page.id,
            url: page.url,
            title: page.title,
            description: page.description,
            channel: page.channel,
            duration: page.duration,
            related: page.related,
            is_target_language,
            language_score,
        }
    }

    /// Rebuilds an item from stored fields without re-running classification
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_stored(
        id: String,
        url: String,
        title: String,
        description: String,
        channel: String,
        duration: Option<u64>,
        is_target_language: bool,
        language_score: f64,
    ) -> Self {
        Self {
            id,
            url,
            title,
            description,
            channel,
            duration,
            related: Vec::new(),
            is_target_language,
            language_score,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Canonical locator
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Length in seconds, if the page declared one
    pub fn duration(&self) -> Option<u64> {
        self.duration
    }

    /// Related candidates in page order
    pub fn related(&self) -> &[RelatedCandidate] {
        &self.related
    }

    pub fn is_target_language(&self) -> bool {
        self.is_target_language
    }

    pub fn language_score(&self) -> f64 {
        self.language_score
    }
}
