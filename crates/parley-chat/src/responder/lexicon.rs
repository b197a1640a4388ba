//! Phrase table backing the translation responder.
//!
//! Columns follow [`Language`] order: english, chinese, japanese, french,
//! spanish, german. Earlier rows win when a phrase appears twice in a column.

use std::collections::HashMap;
use std::sync::LazyLock;

use super::translation::Language;

pub(crate) const PHRASES: &[[&str; 6]] = &[
    ["hello", "你好", "こんにちは", "bonjour", "hola", "hallo"],
    ["good morning", "早安", "おはようございます", "bonjour", "buenos días", "guten Morgen"],
    ["good night", "晚安", "おやすみなさい", "bonne nuit", "buenas noches", "gute Nacht"],
    ["goodbye", "再見", "さようなら", "au revoir", "adiós", "auf Wiedersehen"],
    ["thank you", "謝謝", "ありがとう", "merci", "gracias", "danke"],
    ["thanks", "謝謝", "ありがとう", "merci", "gracias", "danke"],
    ["please", "請", "お願いします", "s'il vous plaît", "por favor", "bitte"],
    ["sorry", "對不起", "ごめんなさい", "désolé", "lo siento", "Entschuldigung"],
    ["yes", "是", "はい", "oui", "sí", "ja"],
    ["no", "不", "いいえ", "non", "no", "nein"],
    [
        "how are you",
        "你好嗎",
        "お元気ですか",
        "comment allez-vous",
        "cómo estás",
        "wie geht es dir",
    ],
    ["i love you", "我愛你", "愛してる", "je t'aime", "te quiero", "ich liebe dich"],
    ["my name is", "我的名字是", "私の名前は", "je m'appelle", "me llamo", "ich heiße"],
    ["welcome", "歡迎", "ようこそ", "bienvenue", "bienvenido", "willkommen"],
    ["i", "我", "私", "je", "yo", "ich"],
    ["you", "你", "あなた", "vous", "tú", "du"],
    ["love", "愛", "愛", "amour", "amor", "Liebe"],
    ["friend", "朋友", "友達", "ami", "amigo", "Freund"],
    ["water", "水", "水", "eau", "agua", "Wasser"],
    ["food", "食物", "食べ物", "nourriture", "comida", "Essen"],
    ["cat", "貓", "猫", "chat", "gato", "Katze"],
    ["dog", "狗", "犬", "chien", "perro", "Hund"],
    ["book", "書", "本", "livre", "libro", "Buch"],
    ["world", "世界", "世界", "monde", "mundo", "Welt"],
    ["today", "今天", "今日", "aujourd'hui", "hoy", "heute"],
    ["tomorrow", "明天", "明日", "demain", "mañana", "morgen"],
    ["good", "好", "良い", "bon", "bueno", "gut"],
    ["beautiful", "美麗", "美しい", "beau", "hermoso", "schön"],
    ["morning", "早上", "朝", "matin", "mañana", "Morgen"],
    ["night", "晚上", "夜", "nuit", "noche", "Nacht"],
];

/// Longest phrase, in words (Latin) or characters (CJK), across all columns.
pub(crate) const MAX_PHRASE_WORDS: usize = 4;
pub(crate) const MAX_PHRASE_CHARS: usize = 9;

/// Per-language lookup from lowercased phrase to row index.
static INDEX: LazyLock<Vec<HashMap<String, usize>>> = LazyLock::new(|| {
    (0..Language::ALL.len())
        .map(|col| {
            let mut map = HashMap::new();
            for (row, phrase) in PHRASES.iter().enumerate() {
                map.entry(phrase[col].to_lowercase()).or_insert(row);
            }
            map
        })
        .collect()
});

/// Find the row whose `language` column equals `phrase` (case-insensitive).
pub(crate) fn lookup(language: Language, phrase: &str) -> Option<usize> {
    INDEX[language.column()].get(&phrase.to_lowercase()).copied()
}

/// The `language` rendering of row `row`.
pub(crate) fn render(row: usize, language: Language) -> &'static str {
    PHRASES[row][language.column()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(lookup(Language::English, "Hello"), Some(0));
        assert_eq!(lookup(Language::German, "guten morgen"), Some(1));
        assert_eq!(lookup(Language::English, "spaceship"), None);
    }

    #[test]
    fn test_duplicate_phrases_prefer_first_row() {
        // "謝謝" appears for both "thank you" and "thanks".
        let row = lookup(Language::Chinese, "謝謝").unwrap();
        assert_eq!(render(row, Language::English), "thank you");
    }

    #[test]
    fn test_max_phrase_lengths_cover_table() {
        for row in PHRASES {
            for (col, phrase) in row.iter().enumerate() {
                if Language::ALL[col].is_cjk() {
                    assert!(phrase.chars().count() <= MAX_PHRASE_CHARS, "{}", phrase);
                } else {
                    assert!(phrase.split_whitespace().count() <= MAX_PHRASE_WORDS, "{}", phrase);
                }
            }
        }
    }
}
