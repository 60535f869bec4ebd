//! Data models for Mushaf
//!
//! Defines the content hierarchy (surah → ayah → word) and the per-word
//! grammar analysis record that editors revise. Serialized field names use
//! camelCase to stay compatible with the persisted application state and
//! the remote backend payloads.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-word linguistic analysis: category, root, and grammar notes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WordAnalysis {
    /// Category label, e.g. "Noun", "Verb", "Proper Name"
    #[serde(rename = "type")]
    pub word_type: String,
    /// Short root/etymology string, e.g. "س م و"
    pub root: String,
    /// Free-text explanation of the root's meaning
    pub root_explanation: String,
    /// Free-text grammatical notes
    pub grammar: String,
}

impl WordAnalysis {
    /// True if every field is empty (no analysis authored yet)
    pub fn is_empty(&self) -> bool {
        self.word_type.is_empty()
            && self.root.is_empty()
            && self.root_explanation.is_empty()
            && self.grammar.is_empty()
    }
}

/// A single word within an ayah
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Word {
    /// Source text
    pub arabic: String,
    /// Romanized rendering
    pub transliteration: String,
    /// Target-language rendering
    pub translation: String,
    /// Grammar analysis
    pub analysis: WordAnalysis,
}

/// A verse with its ordered words
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Ayah {
    /// Verse number within the surah (1-based, stable)
    pub ayah_number: u32,
    pub arabic: String,
    pub transliteration: String,
    pub translation: String,
    /// Default audio resource for this ayah
    pub recitation_url: String,
    /// Ordered words; position in this list is the word index
    pub words: Vec<Word>,
}

/// A chapter with its ordered ayat
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Surah {
    /// Chapter number (1-114, stable)
    pub surah_number: u32,
    pub surah_name: String,
    /// Ordered verses
    pub ayat: Vec<Ayah>,
}

impl Surah {
    /// Look up an ayah by its verse number (not its index)
    pub fn ayah(&self, number: u32) -> Option<&Ayah> {
        self.ayat.iter().find(|a| a.ayah_number == number)
    }

    /// Mutable ayah lookup by verse number
    pub fn ayah_mut(&mut self, number: u32) -> Option<&mut Ayah> {
        self.ayat.iter_mut().find(|a| a.ayah_number == number)
    }

    /// Look up a word by its full key
    ///
    /// Returns `None` if the key's surah number doesn't match, or the
    /// ayah/word doesn't exist.
    pub fn word(&self, key: &WordKey) -> Option<&Word> {
        if key.surah != self.surah_number {
            return None;
        }
        self.ayah(key.ayah)?.words.get(key.word as usize)
    }

    /// Mutable word lookup by full key
    pub fn word_mut(&mut self, key: &WordKey) -> Option<&mut Word> {
        if key.surah != self.surah_number {
            return None;
        }
        self.ayah_mut(key.ayah)?.words.get_mut(key.word as usize)
    }
}

/// Identity of a single word: (surah number, ayah number, word position)
///
/// Assigned at authoring time and never renumbered. Displays as
/// `"surah:ayah:word"`, which is also the storage key for edit overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WordKey {
    pub surah: u32,
    pub ayah: u32,
    /// Zero-based position within the ayah's word list
    pub word: u32,
}

impl WordKey {
    pub fn new(surah: u32, ayah: u32, word: u32) -> Self {
        Self { surah, ayah, word }
    }
}

impl fmt::Display for WordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.surah, self.ayah, self.word)
    }
}

/// Error parsing a `WordKey` from its string form
#[derive(Debug, Error)]
#[error("Invalid word key '{0}': expected 'surah:ayah:word'")]
pub struct WordKeyParseError(String);

impl FromStr for WordKey {
    type Err = WordKeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let parse = |part: Option<&str>| -> Option<u32> { part?.trim().parse().ok() };
        let surah = parse(parts.next());
        let ayah = parse(parts.next());
        let word = parse(parts.next());
        match (surah, ayah, word, parts.next()) {
            (Some(surah), Some(ayah), Some(word), None) => Ok(Self { surah, ayah, word }),
            _ => Err(WordKeyParseError(s.to_string())),
        }
    }
}

/// Storage key for a per-ayah media override: `"surah-ayah"`
pub fn media_key(surah: u32, ayah: u32) -> String {
    format!("{}-{}", surah, ayah)
}

/// Current reading position
///
/// `verse_index` is the index into the surah's `ayat` list, not the ayah
/// number - matching what the original reader persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Position {
    pub surah: u32,
    pub verse_index: usize,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            surah: 1,
            verse_index: 0,
        }
    }
}

/// Read-only snapshot of the authenticated user
///
/// Refreshed from the auth provider's change events; the application never
/// mutates it directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_surah() -> Surah {
        Surah {
            surah_number: 1,
            surah_name: "Al-Fatihah".to_string(),
            ayat: vec![
                Ayah {
                    ayah_number: 1,
                    arabic: "بِسْمِ اللَّهِ".to_string(),
                    transliteration: "Bismi Allāhi".to_string(),
                    translation: "In the name of Allah".to_string(),
                    recitation_url: String::new(),
                    words: vec![
                        Word {
                            arabic: "بِسْمِ".to_string(),
                            transliteration: "Bismi".to_string(),
                            translation: "In the name".to_string(),
                            analysis: WordAnalysis {
                                word_type: "Phrase".to_string(),
                                root: "س م و".to_string(),
                                ..Default::default()
                            },
                        },
                        Word {
                            arabic: "اللَّهِ".to_string(),
                            ..Default::default()
                        },
                    ],
                },
                Ayah {
                    ayah_number: 2,
                    words: vec![Word::default()],
                    ..Default::default()
                },
            ],
        }
    }

    #[test]
    fn test_word_key_display_and_parse() {
        let key = WordKey::new(1, 1, 2);
        assert_eq!(key.to_string(), "1:1:2");

        let parsed: WordKey = "1:1:2".parse().unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn test_word_key_parse_rejects_malformed() {
        assert!("1-1-2".parse::<WordKey>().is_err());
        assert!("1:1".parse::<WordKey>().is_err());
        assert!("1:1:2:3".parse::<WordKey>().is_err());
        assert!("a:b:c".parse::<WordKey>().is_err());
    }

    #[test]
    fn test_word_key_ordering() {
        let mut keys = vec![
            WordKey::new(2, 1, 0),
            WordKey::new(1, 2, 0),
            WordKey::new(1, 1, 1),
            WordKey::new(1, 1, 0),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                WordKey::new(1, 1, 0),
                WordKey::new(1, 1, 1),
                WordKey::new(1, 2, 0),
                WordKey::new(2, 1, 0),
            ]
        );
    }

    #[test]
    fn test_surah_word_lookup() {
        let surah = sample_surah();

        let word = surah.word(&WordKey::new(1, 1, 0)).unwrap();
        assert_eq!(word.transliteration, "Bismi");

        // Word index out of range
        assert!(surah.word(&WordKey::new(1, 1, 5)).is_none());
        // Unknown ayah number
        assert!(surah.word(&WordKey::new(1, 9, 0)).is_none());
        // Wrong surah number
        assert!(surah.word(&WordKey::new(2, 1, 0)).is_none());
    }

    #[test]
    fn test_surah_word_mut_updates_analysis() {
        let mut surah = sample_surah();
        let key = WordKey::new(1, 1, 1);

        let word = surah.word_mut(&key).unwrap();
        word.analysis.word_type = "Proper Name".to_string();

        assert_eq!(surah.word(&key).unwrap().analysis.word_type, "Proper Name");
    }

    #[test]
    fn test_analysis_serde_field_names() {
        let analysis = WordAnalysis {
            word_type: "Noun".to_string(),
            root: "م ل ك".to_string(),
            root_explanation: "To own, to rule".to_string(),
            grammar: "Genitive case".to_string(),
        };

        let value = serde_json::to_value(&analysis).unwrap();
        assert_eq!(value["type"], "Noun");
        assert_eq!(value["rootExplanation"], "To own, to rule");
        assert!(value.get("word_type").is_none());
    }

    #[test]
    fn test_ayah_serde_field_names() {
        let json = r#"{
            "ayahNumber": 3,
            "arabic": "text",
            "recitationUrl": "https://example.com/a.mp3"
        }"#;

        let ayah: Ayah = serde_json::from_str(json).unwrap();
        assert_eq!(ayah.ayah_number, 3);
        assert_eq!(ayah.recitation_url, "https://example.com/a.mp3");
        assert!(ayah.words.is_empty());
    }

    #[test]
    fn test_media_key_format() {
        assert_eq!(media_key(73, 12), "73-12");
    }

    #[test]
    fn test_default_position() {
        let pos = Position::default();
        assert_eq!(pos.surah, 1);
        assert_eq!(pos.verse_index, 0);
    }
}
