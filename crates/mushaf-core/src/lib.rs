//! Core library for Mushaf
//!
//! Mushaf is a Quran reader with word-level grammar annotations. This
//! crate provides everything except the user interface:
//!
//! - [`models`]: surahs, ayat, words, and their analysis
//! - [`store`]: atomic JSON persistence of the full application state
//! - [`cache`]: a TTL-bounded in-memory cache of remotely fetched surahs
//! - [`backend`]: interchangeable remote adapters (Airtable, Supabase)
//! - [`sync`]: the coordinator joining local state, cache, and backend
//! - [`auth`]: observable sign-in state
//! - [`seed`]: content bundled into the binary for first run
//! - [`config`]: TOML configuration with environment overrides

pub mod auth;
pub mod backend;
pub mod cache;
pub mod config;
pub mod models;
pub mod seed;
pub mod store;
pub mod sync;

pub use auth::AuthSession;
pub use backend::{
    Backend, BackendError, BackendKind, BackendResult, MemoryBackend, UpsertOutcome, WordRecord,
};
pub use cache::SurahCache;
pub use config::Config;
pub use models::{media_key, Ayah, Position, Surah, User, Word, WordAnalysis, WordKey};
pub use seed::{seed_surah, surah_name};
pub use store::{AppState, LocalStore, PendingWrite, StoreError};
pub use sync::{FlushReport, SaveOutcome, SyncCoordinator, SyncStatus};
