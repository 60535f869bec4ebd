//! Bundled seed content
//!
//! Surah Al-Fatihah ships with the binary so a fresh install can read
//! something before any backend is configured. Seed surahs are merged
//! into local state on first open; locally persisted content always wins.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use tracing::warn;

use crate::models::Surah;

const AL_FATIHAH: &str = include_str!("../assets/al-fatihah.json");

/// Canonical surah names, indexed by surah number
const SURAH_NAMES: [&str; 114] = [
    "Al-Fatihah",
    "Al-Baqarah",
    "Ali 'Imran",
    "An-Nisa",
    "Al-Ma'idah",
    "Al-An'am",
    "Al-A'raf",
    "Al-Anfal",
    "At-Tawbah",
    "Yunus",
    "Hud",
    "Yusuf",
    "Ar-Ra'd",
    "Ibrahim",
    "Al-Hijr",
    "An-Nahl",
    "Al-Isra",
    "Al-Kahf",
    "Maryam",
    "Taha",
    "Al-Anbya",
    "Al-Hajj",
    "Al-Mu'minun",
    "An-Nur",
    "Al-Furqan",
    "Ash-Shu'ara",
    "An-Naml",
    "Al-Qasas",
    "Al-'Ankabut",
    "Ar-Rum",
    "Luqman",
    "As-Sajdah",
    "Al-Ahzab",
    "Saba",
    "Fatir",
    "Ya-Sin",
    "As-Saffat",
    "Sad",
    "Az-Zumar",
    "Ghafir",
    "Fussilat",
    "Ash-Shuraa",
    "Az-Zukhruf",
    "Ad-Dukhan",
    "Al-Jathiyah",
    "Al-Ahqaf",
    "Muhammad",
    "Al-Fath",
    "Al-Hujurat",
    "Qaf",
    "Adh-Dhariyat",
    "At-Tur",
    "An-Najm",
    "Al-Qamar",
    "Ar-Rahman",
    "Al-Waqi'ah",
    "Al-Hadid",
    "Al-Mujadila",
    "Al-Hashr",
    "Al-Mumtahanah",
    "As-Saf",
    "Al-Jumu'ah",
    "Al-Munafiqun",
    "At-Taghabun",
    "At-Talaq",
    "At-Tahrim",
    "Al-Mulk",
    "Al-Qalam",
    "Al-Haqqah",
    "Al-Ma'arij",
    "Nuh",
    "Al-Jinn",
    "Al-Muzzammil",
    "Al-Muddaththir",
    "Al-Qiyamah",
    "Al-Insan",
    "Al-Mursalat",
    "An-Naba",
    "An-Nazi'at",
    "'Abasa",
    "At-Takwir",
    "Al-Infitar",
    "Al-Mutaffifin",
    "Al-Inshiqaq",
    "Al-Buruj",
    "At-Tariq",
    "Al-A'la",
    "Al-Ghashiyah",
    "Al-Fajr",
    "Al-Balad",
    "Ash-Shams",
    "Al-Layl",
    "Ad-Duhaa",
    "Ash-Sharh",
    "At-Tin",
    "Al-'Alaq",
    "Al-Qadr",
    "Al-Bayyinah",
    "Az-Zalzalah",
    "Al-'Adiyat",
    "Al-Qari'ah",
    "At-Takathur",
    "Al-'Asr",
    "Al-Humazah",
    "Al-Fil",
    "Quraysh",
    "Al-Ma'un",
    "Al-Kawthar",
    "Al-Kafirun",
    "An-Nasr",
    "Al-Masad",
    "Al-Ikhlas",
    "Al-Falaq",
    "An-Nas",
];

/// All bundled surahs, keyed by surah number
///
/// A parse failure logs and yields an empty map rather than panicking;
/// the application still works, it just starts with no offline content.
pub fn seed_content() -> &'static BTreeMap<u32, Surah> {
    static CONTENT: OnceLock<BTreeMap<u32, Surah>> = OnceLock::new();
    CONTENT.get_or_init(|| {
        let mut map = BTreeMap::new();
        match serde_json::from_str::<Surah>(AL_FATIHAH) {
            Ok(surah) => {
                map.insert(surah.surah_number, surah);
            }
            Err(e) => warn!("Bundled content is unreadable: {}", e),
        }
        map
    })
}

/// Look up a bundled surah
pub fn seed_surah(surah_number: u32) -> Option<&'static Surah> {
    seed_content().get(&surah_number)
}

/// The canonical name of a surah, if the number is valid (1-114)
pub fn surah_name(surah_number: u32) -> Option<&'static str> {
    if (1..=114).contains(&surah_number) {
        Some(SURAH_NAMES[(surah_number - 1) as usize])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_contains_al_fatihah() {
        let surah = seed_surah(1).expect("bundled surah should parse");
        assert_eq!(surah.surah_number, 1);
        assert_eq!(surah.ayat.len(), 7);

        // All ayat carry word-level analysis
        for ayah in &surah.ayat {
            assert!(!ayah.words.is_empty(), "ayah {} has no words", ayah.ayah_number);
            assert!(!ayah.arabic.is_empty());
        }
        let bismillah = &surah.ayat[0].words[0];
        assert!(!bismillah.analysis.root.is_empty());
    }

    #[test]
    fn test_seed_only_has_bundled_surahs() {
        assert!(seed_surah(2).is_none());
        assert!(seed_surah(114).is_none());
    }

    #[test]
    fn test_surah_names() {
        assert_eq!(surah_name(1), Some("Al-Fatihah"));
        assert_eq!(surah_name(36), Some("Ya-Sin"));
        assert_eq!(surah_name(114), Some("An-Nas"));
        assert_eq!(surah_name(0), None);
        assert_eq!(surah_name(115), None);
    }
}
