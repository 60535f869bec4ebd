//! Remote backend adapters
//!
//! One uniform fetch/upsert/auth surface over the interchangeable backends:
//!
//! - **Airtable**: table-based REST API keyed by `filterByFormula`
//! - **Supabase**: relational backend (PostgREST + stored procedures, GoTrue auth)
//! - **Memory**: in-process backend for offline use and tests
//!
//! The backend is selected once at startup from configuration
//! (`Backend::from_config`) and never re-chosen per call. Upserts are atomic
//! at the service level for both remote backends, so two concurrent upserts
//! for the same word key cannot produce a duplicate record.

pub mod airtable;
pub mod error;
pub mod memory;
pub mod supabase;

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::Config;
use crate::models::{Surah, User, Word, WordAnalysis, WordKey};

pub use airtable::AirtableBackend;
pub use error::{BackendError, BackendResult};
pub use memory::MemoryBackend;
pub use supabase::SupabaseBackend;

/// Timeout applied to every remote request
///
/// Converts a hung connection into an explicit `BackendError::Http` instead
/// of a never-resolving call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Which concrete backend is in use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Airtable,
    Supabase,
    Memory,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Airtable => write!(f, "airtable"),
            BackendKind::Supabase => write!(f, "supabase"),
            BackendKind::Memory => write!(f, "memory"),
        }
    }
}

/// Wire representation of a single word, as stored remotely
///
/// Field names match the remote column set (Airtable columns / the
/// flattened `word_records` view on Supabase).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordRecord {
    pub surah_number: u32,
    pub ayah_number: u32,
    pub word_index: u32,
    #[serde(default)]
    pub arabic: String,
    #[serde(default)]
    pub transliteration: String,
    #[serde(default)]
    pub translation: String,
    #[serde(default)]
    pub root: String,
    #[serde(default)]
    pub root_explanation: String,
    #[serde(default)]
    pub grammar_type: String,
    #[serde(default)]
    pub grammar_details: String,
    #[serde(default)]
    pub recitation_url: String,
    #[serde(default = "Utc::now")]
    pub last_modified: DateTime<Utc>,
}

impl WordRecord {
    /// Build a record from a word plus a (possibly revised) analysis
    pub fn from_word(key: WordKey, word: &Word, analysis: &WordAnalysis) -> Self {
        Self {
            surah_number: key.surah,
            ayah_number: key.ayah,
            word_index: key.word,
            arabic: word.arabic.clone(),
            transliteration: word.transliteration.clone(),
            translation: word.translation.clone(),
            root: analysis.root.clone(),
            root_explanation: analysis.root_explanation.clone(),
            grammar_type: analysis.word_type.clone(),
            grammar_details: analysis.grammar.clone(),
            recitation_url: String::new(),
            last_modified: Utc::now(),
        }
    }

    /// The word's identity triple
    pub fn key(&self) -> WordKey {
        WordKey::new(self.surah_number, self.ayah_number, self.word_index)
    }

    /// The analysis portion of this record
    pub fn analysis(&self) -> WordAnalysis {
        WordAnalysis {
            word_type: self.grammar_type.clone(),
            root: self.root.clone(),
            root_explanation: self.root_explanation.clone(),
            grammar: self.grammar_details.clone(),
        }
    }
}

/// Result of a successful upsert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// Backend-assigned record identifier
    pub record_id: String,
}

/// The configured remote backend
///
/// A tagged variant rather than a trait object: the method set is small,
/// every call site matches once, and async methods stay plain.
pub enum Backend {
    Airtable(AirtableBackend),
    Supabase(SupabaseBackend),
    Memory(MemoryBackend),
}

impl Backend {
    /// Select a backend from configuration, once, at startup
    ///
    /// An explicit `backend = "..."` choice wins; otherwise the first
    /// backend with complete credentials is used (Supabase, then Airtable).
    /// Returns `None` when nothing is configured - callers then operate
    /// local-only.
    pub fn from_config(config: &Config) -> Option<Backend> {
        match config.backend.as_deref() {
            Some("airtable") => {
                AirtableBackend::from_config(config).map(Backend::Airtable)
            }
            Some("supabase") => {
                SupabaseBackend::from_config(config).map(Backend::Supabase)
            }
            Some("memory") => Some(Backend::Memory(MemoryBackend::new())),
            Some(other) => {
                warn!("Unknown backend '{}' in config; running local-only", other);
                None
            }
            None => SupabaseBackend::from_config(config)
                .map(Backend::Supabase)
                .or_else(|| AirtableBackend::from_config(config).map(Backend::Airtable)),
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            Backend::Airtable(_) => BackendKind::Airtable,
            Backend::Supabase(_) => BackendKind::Supabase,
            Backend::Memory(_) => BackendKind::Memory,
        }
    }

    /// Fetch a whole surah, words ordered by ayah number then word position
    pub async fn fetch_surah(&self, surah_number: u32) -> BackendResult<Option<Surah>> {
        match self {
            Backend::Airtable(b) => b.fetch_surah(surah_number).await,
            Backend::Supabase(b) => b.fetch_surah(surah_number).await,
            Backend::Memory(b) => b.fetch_surah(surah_number).await,
        }
    }

    /// Fetch one word record by its key
    pub async fn fetch_word(&self, key: WordKey) -> BackendResult<Option<WordRecord>> {
        match self {
            Backend::Airtable(b) => b.fetch_word(key).await,
            Backend::Supabase(b) => b.fetch_word(key).await,
            Backend::Memory(b) => b.fetch_word(key).await,
        }
    }

    /// Insert-or-update a word record, atomically keyed on the identity triple
    pub async fn upsert_word(&self, record: &WordRecord) -> BackendResult<UpsertOutcome> {
        match self {
            Backend::Airtable(b) => b.upsert_word(record).await,
            Backend::Supabase(b) => b.upsert_word(record).await,
            Backend::Memory(b) => b.upsert_word(record).await,
        }
    }

    /// Register a new user with the auth provider
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> BackendResult<User> {
        match self {
            Backend::Airtable(_) => Err(BackendError::Unsupported("airtable")),
            Backend::Supabase(b) => b.sign_up(email, password, display_name).await,
            Backend::Memory(b) => b.sign_up(email, password, display_name).await,
        }
    }

    /// Sign in and return the user snapshot
    pub async fn sign_in(&self, email: &str, password: &str) -> BackendResult<User> {
        match self {
            Backend::Airtable(_) => Err(BackendError::Unsupported("airtable")),
            Backend::Supabase(b) => b.sign_in(email, password).await,
            Backend::Memory(b) => b.sign_in(email, password).await,
        }
    }

    /// End the current session
    pub async fn sign_out(&self) -> BackendResult<()> {
        match self {
            Backend::Airtable(_) => Err(BackendError::Unsupported("airtable")),
            Backend::Supabase(b) => b.sign_out().await,
            Backend::Memory(b) => b.sign_out().await,
        }
    }
}
