//! Weather responder.
//!
//! Extracts a location from the message and answers with a static forecast.
//! Asks for a city instead of failing when no location can be found.

use regex::Regex;
use serde_json::{json, Map, Value};
use std::sync::LazyLock;

use super::ResponderOutput;

const CONDITION: &str = "sunny";
const TEMPERATURE_C: i64 = 25;

/// Han text directly before 天氣/天气. Greedy, so the last keyword wins.
static CJK_PLACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\p{Han}+)(?:天氣|天气)").unwrap());

/// Words that introduce a place.
static PREPOSITIONS: &[&str] = &["in", "for", "at"];

/// Words that end a place name. Prepositions are included so that
/// "paris for tomorrow" stops after "paris".
static STOP_WORDS: &[&str] = &[
    "today", "tomorrow", "tonight", "now", "this", "next", "the", "a", "an", "my", "your",
    "weekend", "morning", "afternoon", "evening", "please", "general", "week", "in", "for",
    "at", "on", "to", "of", "around", "near", "during", "by", "and", "or", "is", "will", "be",
    "like", "going", "weather", "forecast", "monday", "tuesday", "wednesday", "thursday",
    "friday", "saturday", "sunday",
];

/// Latin place names are at most this many words unless capitalized.
const MAX_LOWERCASE_WORDS: usize = 3;

static CJK_TIME_WORDS: &[&str] = &[
    "今天", "明天", "後天", "后天", "現在", "现在", "今日", "明日", "這週", "这周",
];

/// Request phrasing that can precede a Han place name.
static CJK_LEAD_WORDS: &[&str] = &[
    "我想知道", "想知道", "告訴我", "告诉我", "幫我查", "帮我查", "請問", "请问", "查詢",
    "查询", "一下", "我想", "請", "请", "問", "问",
];

/// Where the location came from; decides the answer language.
#[derive(Debug, Clone, PartialEq)]
enum Location {
    Latin(String),
    Han(String),
}

impl Location {
    fn name(&self) -> &str {
        match self {
            Self::Latin(s) | Self::Han(s) => s,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WeatherResponder;

impl WeatherResponder {
    pub fn new() -> Self {
        Self
    }

    pub fn respond(&self, message: &str) -> ResponderOutput {
        let mut metadata = Map::new();

        let Some(location) = extract_location(message) else {
            tracing::debug!("No location found in weather query; asking for clarification");
            metadata.insert("clarification".to_string(), Value::Bool(true));
            let answer = if contains_han(message) {
                "請問您想查詢哪個城市的天氣？"
            } else {
                "Which city would you like the weather for?"
            };
            return ResponderOutput {
                answer: answer.to_string(),
                model_used: None,
                metadata,
            };
        };

        let answer = match &location {
            Location::Latin(place) => format!(
                "The weather in {} today is {} with a high of {}°C.",
                place, CONDITION, TEMPERATURE_C
            ),
            Location::Han(place) => format!("{}今天晴天，氣溫{}度。", place, TEMPERATURE_C),
        };

        tracing::debug!(location = %location.name(), "Weather answer generated");

        metadata.insert("clarification".to_string(), Value::Bool(false));
        metadata.insert("location".to_string(), json!(location.name()));
        metadata.insert(
            "forecast".to_string(),
            json!({ "condition": CONDITION, "temperature_c": TEMPERATURE_C }),
        );

        ResponderOutput {
            answer,
            model_used: None,
            metadata,
        }
    }
}

/// Best-effort location extraction. Returns `None` when nothing plausible is found.
fn extract_location(message: &str) -> Option<Location> {
    if let Some(place) = latin_location(message) {
        return Some(Location::Latin(place));
    }
    han_location(message).map(Location::Han)
}

/// First preposition followed by a plausible place name.
///
/// A capitalized first word starts a run of capitalized words ("New York").
/// Otherwise up to three words are taken and title-cased ("new york").
fn latin_location(message: &str) -> Option<String> {
    let words: Vec<(&str, bool)> = message.split_whitespace().map(clean_word).collect();

    for (i, (word, clause_end)) in words.iter().enumerate() {
        if *clause_end || !PREPOSITIONS.contains(&word.to_lowercase().as_str()) {
            continue;
        }
        let capitalized = words.get(i + 1).is_some_and(|(w, _)| starts_uppercase(w));

        let mut place = Vec::new();
        for (word, clause_end) in &words[i + 1..] {
            if !is_place_word(word) || (capitalized && !starts_uppercase(word)) {
                break;
            }
            if !capitalized && place.len() == MAX_LOWERCASE_WORDS {
                break;
            }
            place.push(*word);
            if *clause_end {
                break;
            }
        }

        if !place.is_empty() {
            let place = place.join(" ");
            return Some(if capitalized { place } else { title_case(&place) });
        }
    }

    None
}

/// Strip surrounding punctuation. The flag is set when the word ends a clause.
fn clean_word(raw: &str) -> (&str, bool) {
    let trimmed = raw.trim_end_matches(['?', '!', ',', ';', ':', '.', '"', '\'']);
    let clause_end = trimmed.len() < raw.len();
    (trimmed.trim_start_matches(['"', '\'', '(']), clause_end)
}

fn is_place_word(word: &str) -> bool {
    !word.is_empty()
        && !STOP_WORDS.contains(&word.to_lowercase().as_str())
        && word
            .chars()
            .all(|c| c.is_alphabetic() || matches!(c, '\'' | '-' | '.'))
}

fn starts_uppercase(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_uppercase)
}

/// Han characters right before 天氣, minus request phrasing and time words.
fn han_location(message: &str) -> Option<String> {
    let caps = CJK_PLACE_RE.captures(message)?;
    let mut place = caps[1].trim_end_matches('的');

    loop {
        let before = place;
        for word in CJK_LEAD_WORDS.iter().chain(CJK_TIME_WORDS) {
            if let Some(rest) = place.strip_prefix(word) {
                place = rest;
            }
        }
        for word in CJK_TIME_WORDS {
            if let Some(rest) = place.strip_suffix(word) {
                place = rest;
            }
        }
        place = place.trim_end_matches('的');
        if place == before {
            break;
        }
    }

    (place.chars().count() >= 2).then(|| place.to_string())
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn contains_han(s: &str) -> bool {
    s.chars().any(|c| ('\u{4e00}'..='\u{9fff}').contains(&c))
}
