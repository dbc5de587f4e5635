use serde::Serialize;
use std::fmt;

/// Provenance of a caption track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionKind {
    /// Authored by a person
    Manual,
    /// Generated by the platform's speech recognition
    Automatic,
    /// Derived locally from another track's lines
    Inferred,
}

impl CaptionKind {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Automatic => "automatic",
            Self::Inferred => "inferred",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "manual" => Some(Self::Manual),
            "automatic" => Some(Self::Automatic),
            "inferred" => Some(Self::Inferred),
            _ => None,
        }
    }
}

impl fmt::Display for CaptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// A caption as returned by a subtitle fetcher, before it is tied to storage
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedCaption {
    pub language: String,
    pub kind: CaptionKind,
    pub text: String,
}

/// One stored caption track
///
/// At most one track exists per (`content_id`, `language`, `kind`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptionTrack {
    pub content_id: String,
    pub language: String,
    pub kind: CaptionKind,
    pub text: String,
    /// File the track was written to, if any
    pub source_ref: Option<String>,
}

impl CaptionTrack {
    pub fn from_fetched(content_id: &str, fetched: FetchedCaption) -> Self {
        Self {
            content_id: content_id.to_string(),
            language: fetched.language,
            kind: fetched.kind,
            text: fetched.text,
            source_ref: None,
        }
    }
}
