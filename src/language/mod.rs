//! Language classification for fetched content
//!
//! This module decides whether a text sample is target-language content:
//! - A character-range test over the target script
//! - A ratio of target-script letters among all letters
//! - An optional statistical detector used as a secondary positive signal

mod classifier;
mod detector;

pub use classifier::{LanguageClassifier, ScriptRange, PERSIAN_RANGES};
pub use detector::{Detection, LanguageDetector, WhatlangDetector};
