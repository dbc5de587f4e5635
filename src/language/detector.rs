//! Auxiliary statistical language detection
//!
//! The detector is a best-effort signal. It never fails: when it cannot make
//! a call it reports [`Detection::NoOpinion`], which callers treat exactly
//! like [`Detection::Other`].

use whatlang::Lang;

/// Outcome of an auxiliary detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    /// Detected the target language
    Target,
    /// Detected some other language
    Other,
    /// Could not classify the text
    NoOpinion,
}

impl Detection {
    /// Returns true only for a positive target-language detection
    pub fn is_target(&self) -> bool {
        matches!(self, Self::Target)
    }
}

/// Capability for statistical language detection
pub trait LanguageDetector: Send + Sync {
    fn detect(&self, text: &str) -> Detection;
}

/// Detector backed by the `whatlang` trigram models
#[derive(Debug, Clone)]
pub struct WhatlangDetector {
    target: Lang,
}

impl WhatlangDetector {
    /// Creates a detector for an ISO-639 language code
    ///
    /// Returns `None` when the code is not known to the detector.
    pub fn for_code(code: &str) -> Option<Self> {
        let target = match code {
            "fa" | "fas" | "per" | "pes" => Lang::Pes,
            other => Lang::from_code(other)?,
        };

        Some(Self { target })
    }
}

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Detection {
        match whatlang::detect(text) {
            Some(info) if info.lang() == self.target && info.is_reliable() => Detection::Target,
            Some(info) if info.lang() == self.target => Detection::NoOpinion,
            Some(_) => Detection::Other,
            None => Detection::NoOpinion,
        }
    }
}
