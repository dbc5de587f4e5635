//! Character-range and ratio based language classifier

use crate::language::detector::LanguageDetector;
use std::sync::Arc;

/// An inclusive range of Unicode code points belonging to the target script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptRange {
    pub start: u32,
    pub end: u32,
}

impl ScriptRange {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, c: char) -> bool {
        let cp = c as u32;
        cp >= self.start && cp <= self.end
    }
}

/// Arabic, Arabic Supplement, Arabic Extended-A and the presentation forms
pub const PERSIAN_RANGES: &[ScriptRange] = &[
    ScriptRange::new(0x0600, 0x06FF),
    ScriptRange::new(0x0750, 0x077F),
    ScriptRange::new(0x08A0, 0x08FF),
    ScriptRange::new(0xFB50, 0xFDFF),
    ScriptRange::new(0xFE70, 0xFEFF),
];

/// Default minimum number of characters before text is considered at all
pub const DEFAULT_MIN_LENGTH: usize = 3;

/// Decides whether text samples are target-language content
#[derive(Clone)]
pub struct LanguageClassifier {
    ranges: Vec<ScriptRange>,
    min_length: usize,
    detector: Option<Arc<dyn LanguageDetector>>,
}

impl Default for LanguageClassifier {
    fn default() -> Self {
        Self::new(PERSIAN_RANGES.to_vec(), DEFAULT_MIN_LENGTH)
    }
}

impl LanguageClassifier {
    /// Creates a classifier with no auxiliary detector
    pub fn new(ranges: Vec<ScriptRange>, min_length: usize) -> Self {
        Self {
            ranges,
            min_length,
            detector: None,
        }
    }

    /// Attaches an auxiliary statistical detector
    pub fn with_detector(mut self, detector: Arc<dyn LanguageDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    fn in_target_script(&self, c: char) -> bool {
        self.ranges.iter().any(|range| range.contains(c))
    }

    /// Returns true if any code point of `text` is in the target script
    pub fn has_target_chars(&self, text: &str) -> bool {
        text.chars().any(|c| self.in_target_script(c))
    }

    /// Ratio of target-script letters among all letters, in `[0, 1]`
    ///
    /// Text without any alphabetic code point scores 0.0.
    pub fn score(&self, text: &str) -> f64 {
        let (target, alphabetic) = self.letter_counts(text);
        if alphabetic == 0 {
            return 0.0;
        }
        target as f64 / alphabetic as f64
    }

    fn letter_counts(&self, text: &str) -> (usize, usize) {
        text.chars()
            .filter(|c| c.is_alphabetic())
            .fold((0, 0), |(target, total), c| {
                let hit = usize::from(self.in_target_script(c));
                (target + hit, total + 1)
            })
    }

    /// Decides whether `text` is target-language content
    ///
    /// Text shorter than the minimum length, or without letters, is never
    /// target-language. Otherwise the text must contain target-script
    /// characters and either reach `min_ratio` or be positively identified by
    /// the auxiliary detector.
    pub fn is_target_language(&self, text: &str, min_ratio: f64) -> bool {
        let trimmed = text.trim();
        if trimmed.chars().count() < self.min_length {
            return false;
        }

        let (target, alphabetic) = self.letter_counts(trimmed);
        if alphabetic == 0 || !self.has_target_chars(trimmed) {
            return false;
        }

        let ratio = target as f64 / alphabetic as f64;
        if ratio >= min_ratio {
            return true;
        }

        self.detector
            .as_ref()
            .map(|detector| detector.detect(trimmed).is_target())
            .unwrap_or(false)
    }
}
