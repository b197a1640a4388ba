//! Keyword-based intent classification.
//!
//! Rules are checked in a fixed order: weather, then translation, then the
//! `general` fallback. A message matching both specific rules is weather.

use regex::Regex;
use std::sync::LazyLock;

use crate::types::Intent;

struct IntentPatterns {
    weather: Vec<Regex>,
    translation: Vec<Regex>,
}

static INTENT_PATTERNS: LazyLock<IntentPatterns> = LazyLock::new(|| {
    let mk = |pats: &[&str]| -> Vec<Regex> {
        pats.iter()
            .map(|p| Regex::new(p).expect("Invalid intent regex"))
            .collect()
    };

    IntentPatterns {
        weather: mk(&[
            r"(?i)\bweather\b",
            r"(?i)\bforecasts?\b",
            r"(?i)\b(?:rain|raining|rainy)\b",
            r"(?i)\b(?:snow|snowing|snowy)\b",
            r"(?i)\b(?:sunny|humid|humidity)\b",
            r"天氣|天气|氣溫|气温|下雨",
        ]),
        translation: mk(&[
            r"(?i)\btranslat(?:e|es|ed|ing|ion)\b",
            r"(?i)\bhow\s+do\s+(?:you|i)\s+say\b",
            r"翻譯|翻译",
        ]),
    }
});

/// Maps a raw message to exactly one [`Intent`].
///
/// Total and deterministic: history never influences the result.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntentClassifier;

impl IntentClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, message: &str) -> Intent {
        if is_weather(message) {
            Intent::Weather
        } else if is_translation(message) {
            Intent::Translation
        } else {
            Intent::General
        }
    }
}

/// Whether the message contains a weather keyword.
pub fn is_weather(message: &str) -> bool {
    INTENT_PATTERNS.weather.iter().any(|re| re.is_match(message))
}

/// Whether the message contains a translation keyword.
pub fn is_translation(message: &str) -> bool {
    INTENT_PATTERNS
        .translation
        .iter()
        .any(|re| re.is_match(message))
}
