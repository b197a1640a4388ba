//! Translation responder.
//!
//! Parses the text to translate and the target-language cue out of the
//! message, then translates with the built-in phrase table. Words without a
//! table entry pass through unchanged and are counted in the metadata.

use regex::Regex;
use serde_json::{json, Map, Value};
use std::sync::LazyLock;

use super::lexicon::{self, MAX_PHRASE_CHARS, MAX_PHRASE_WORDS};
use super::ResponderOutput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    English,
    Chinese,
    Japanese,
    French,
    Spanish,
    German,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::English,
        Language::Chinese,
        Language::Japanese,
        Language::French,
        Language::Spanish,
        Language::German,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::English => "english",
            Self::Chinese => "chinese",
            Self::Japanese => "japanese",
            Self::French => "french",
            Self::Spanish => "spanish",
            Self::German => "german",
        }
    }

    /// Resolve an English or CJK language name, e.g. "French" or "日文".
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        let lang = match name.as_str() {
            "english" | "英文" | "英語" | "英语" => Self::English,
            "chinese" | "mandarin" | "中文" | "華語" | "华语" | "國語" | "国语" | "漢語"
            | "汉语" => Self::Chinese,
            "japanese" | "日文" | "日語" | "日语" => Self::Japanese,
            "french" | "法文" | "法語" | "法语" => Self::French,
            "spanish" | "西班牙文" | "西班牙語" | "西班牙语" => Self::Spanish,
            "german" | "德文" | "德語" | "德语" => Self::German,
            _ => return None,
        };
        Some(lang)
    }

    pub fn is_cjk(&self) -> bool {
        matches!(self, Self::Chinese | Self::Japanese)
    }

    pub(crate) fn column(&self) -> usize {
        match self {
            Self::English => 0,
            Self::Chinese => 1,
            Self::Japanese => 2,
            Self::French => 3,
            Self::Spanish => 4,
            Self::German => 5,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Request parsing
// =============================================================================

/// "to French", "into Spanish", "in Japanese".
static LATIN_TARGET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:to|into|in)\s+(\p{L}+)").unwrap());

/// "翻譯成英文", "译成日语".
static CJK_TARGET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"成\s*(\p{Han}{1,3}?[文語语])").unwrap());

static QUOTED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""([^"]+)"|“([^”]+)”|「([^」]+)」|(?:^|\s)'([^']+)'"#).unwrap()
});

static COMMAND_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^\s*(?:(?:can|could|would)\s+you\s+)?(?:please\s+)?",
        r"(?:translate|translation(?:\s+of)?|how\s+do\s+(?:you|i)\s+say)\b",
        r"\s*(?:(?:this|the\s+following)\b)?\s*(?:please\b)?",
    ))
    .unwrap()
});

static CJK_COMMAND_WORDS: &[&str] = &["請", "请", "幫我", "帮我", "把", "翻譯", "翻译", "一下"];

/// Target language and text extracted from a translation request.
#[derive(Debug, Clone, PartialEq)]
struct ParsedRequest {
    text: String,
    target: Option<Language>,
}

fn parse_request(message: &str) -> ParsedRequest {
    let mut remainder = message.to_string();
    let mut target = None;

    if let Some(m) = LATIN_TARGET_RE
        .captures_iter(message)
        .filter(|c| Language::from_name(&c[1]).is_some())
        .last()
    {
        target = Language::from_name(&m[1]);
        if let Some(whole) = m.get(0) {
            remainder.replace_range(whole.range(), " ");
        }
    } else if let Some(m) = CJK_TARGET_RE
        .captures_iter(message)
        .find(|c| Language::from_name(&c[1]).is_some())
    {
        target = Language::from_name(&m[1]);
        if let Some(whole) = m.get(0) {
            remainder.replace_range(whole.range(), "");
        }
    }

    ParsedRequest {
        text: extract_text(message, &remainder),
        target,
    }
}

fn extract_text(message: &str, remainder: &str) -> String {
    let quoted = QUOTED_RE
        .captures_iter(message)
        .filter_map(|caps| (1..=4).find_map(|i| caps.get(i)))
        .map(|m| m.as_str().trim())
        .find(|text| !text.is_empty());
    if let Some(quoted) = quoted {
        return quoted.to_string();
    }

    if let Some(idx) = remainder.find([':', '：']) {
        let sep_len = remainder[idx..].chars().next().map_or(1, char::len_utf8);
        let after = clean_leftover(&remainder[idx + sep_len..]);
        if !after.is_empty() {
            return after;
        }
    }

    let mut text = COMMAND_PREFIX_RE.replace(remainder, "").to_string();
    for word in CJK_COMMAND_WORDS {
        text = text.replace(word, "");
    }
    clean_leftover(&text)
}

/// Separators and quote marks that can be left over once the command is gone.
static LEFTOVER_MARKS: &[char] = &[':', '：', '"', '\'', '“', '”', '「', '」', ',', '，'];

/// Target cues with no language after them: "translate to", "翻譯成".
static DANGLING_CUES: &[&str] = &["to", "into", "in", "成"];

/// Empty when only separators or dangling cues remain.
fn clean_leftover(text: &str) -> String {
    let text = clean_trailing(text);
    let text = text.trim_matches(|c: char| c.is_whitespace() || LEFTOVER_MARKS.contains(&c));
    let only_cues = text
        .split_whitespace()
        .all(|w| DANGLING_CUES.contains(&w.to_lowercase().as_str()));
    if only_cues {
        String::new()
    } else {
        text.to_string()
    }
}

fn clean_trailing(text: &str) -> String {
    let text =
        text.trim_end_matches(|c: char| matches!(c, '?' | '!' | '.' | '？' | '！' | '。'));
    let text = text.trim();
    text.strip_suffix(" please")
        .or_else(|| text.strip_suffix(" Please"))
        .unwrap_or(text)
        .trim()
        .to_string()
}

// =============================================================================
// Translation
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
struct Translation {
    text: String,
    source: Language,
    untranslated: usize,
}

/// A run of source text and its lexicon row, if any.
enum Token<'a> {
    Known(usize),
    Unknown(&'a str),
}

fn detect_source(text: &str) -> Language {
    if text.chars().any(|c| ('\u{3040}'..='\u{30ff}').contains(&c)) {
        return Language::Japanese;
    }
    if text.chars().any(|c| ('\u{4e00}'..='\u{9fff}').contains(&c)) {
        return Language::Chinese;
    }

    // Pick the Latin language whose column explains the most words.
    let mut best = (Language::English, 0usize);
    for lang in [
        Language::English,
        Language::French,
        Language::Spanish,
        Language::German,
    ] {
        let known = tokenize_words(text, lang)
            .iter()
            .filter(|t| matches!(t, Token::Known(_)))
            .count();
        if known > best.1 {
            best = (lang, known);
        }
    }
    best.0
}

/// Greedy longest-phrase tokenization of whitespace-separated text.
fn tokenize_words(text: &str, lang: Language) -> Vec<Token<'_>> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let normalized: Vec<String> = words
        .iter()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'' && c != '-')
                .to_lowercase()
        })
        .collect();

    let mut tokens = Vec::new();
    let mut i = 0;
    while i < words.len() {
        let longest = (1..=MAX_PHRASE_WORDS.min(words.len() - i))
            .rev()
            .find_map(|n| {
                lexicon::lookup(lang, &normalized[i..i + n].join(" ")).map(|row| (n, row))
            });
        match longest {
            Some((n, row)) => {
                tokens.push(Token::Known(row));
                i += n;
            }
            None => {
                tokens.push(Token::Unknown(words[i]));
                i += 1;
            }
        }
    }
    tokens
}

/// Greedy longest-phrase tokenization of unsegmented CJK text.
fn tokenize_chars(text: &str, lang: Language) -> Vec<Token<'_>> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let byte_at = |i: usize| chars.get(i).map_or(text.len(), |(b, _)| *b);

    let mut tokens = Vec::new();
    let mut unknown_start: Option<usize> = None;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i].1;
        if c.is_whitespace() || is_punctuation(c) {
            if let Some(start) = unknown_start.take() {
                tokens.push(Token::Unknown(&text[byte_at(start)..byte_at(i)]));
            }
            i += 1;
            continue;
        }

        let longest = (1..=MAX_PHRASE_CHARS.min(chars.len() - i))
            .rev()
            .find_map(|n| {
                lexicon::lookup(lang, &text[byte_at(i)..byte_at(i + n)]).map(|row| (n, row))
            });
        match longest {
            Some((n, row)) => {
                if let Some(start) = unknown_start.take() {
                    tokens.push(Token::Unknown(&text[byte_at(start)..byte_at(i)]));
                }
                tokens.push(Token::Known(row));
                i += n;
            }
            None => {
                unknown_start.get_or_insert(i);
                i += 1;
            }
        }
    }
    if let Some(start) = unknown_start {
        tokens.push(Token::Unknown(&text[byte_at(start)..]));
    }
    tokens
}

fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation() || "，。！？、：；「」『』（）".contains(c)
}

fn translate(text: &str, target: Language) -> Translation {
    let source = detect_source(text);
    if source == target {
        return Translation {
            text: text.to_string(),
            source,
            untranslated: 0,
        };
    }

    let tokens = if source.is_cjk() {
        tokenize_chars(text, source)
    } else {
        tokenize_words(text, source)
    };

    let untranslated = tokens
        .iter()
        .filter(|t| matches!(t, Token::Unknown(_)))
        .count();
    let parts: Vec<&str> = tokens
        .iter()
        .map(|t| match t {
            Token::Known(row) => lexicon::render(*row, target),
            Token::Unknown(s) => *s,
        })
        .collect();
    let separator = if target.is_cjk() { "" } else { " " };

    Translation {
        text: parts.join(separator),
        source,
        untranslated,
    }
}

// =============================================================================
// TranslationResponder
// =============================================================================

#[derive(Debug, Clone)]
pub struct TranslationResponder {
    fallback: Language,
}

impl TranslationResponder {
    /// `fallback` is used when the message names no target language.
    pub fn new(fallback: Language) -> Self {
        Self { fallback }
    }

    pub fn fallback(&self) -> Language {
        self.fallback
    }

    pub fn respond(&self, message: &str) -> ResponderOutput {
        let parsed = parse_request(message);
        let assumed = parsed.target.is_none();
        let target = parsed.target.unwrap_or(self.fallback);

        let mut metadata = Map::new();
        metadata.insert("target_language".to_string(), json!(target.as_str()));
        metadata.insert("assumed_target_language".to_string(), Value::Bool(assumed));

        if parsed.text.is_empty() {
            metadata.insert("clarification".to_string(), Value::Bool(true));
            return ResponderOutput {
                answer: "What would you like me to translate?".to_string(),
                model_used: None,
                metadata,
            };
        }

        let translation = translate(&parsed.text, target);

        tracing::debug!(
            source = %translation.source,
            target = %target,
            assumed,
            untranslated = translation.untranslated,
            "Translation generated"
        );

        metadata.insert("clarification".to_string(), Value::Bool(false));
        metadata.insert("source_text".to_string(), json!(parsed.text));
        metadata.insert(
            "source_language".to_string(),
            json!(translation.source.as_str()),
        );
        metadata.insert(
            "untranslated_words".to_string(),
            json!(translation.untranslated),
        );

        ResponderOutput {
            answer: translation.text,
            model_used: None,
            metadata,
        }
    }
}
