//! Local persistent store
//!
//! Persists the whole application state (reading position, edit and media
//! overrides, content snapshot, pending writes) as one JSON document at
//! `<data_dir>/state.json`. Writes are atomic (temp file + fsync + rename).
//!
//! Loading fails open: a missing or corrupt file yields the default empty
//! state so the application always starts. A corrupt file is moved aside to
//! `state.json.corrupt.backup` before being replaced.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::backend::WordRecord;
use crate::config::Config;
use crate::models::{Position, Surah, WordAnalysis};

/// Errors that can occur saving state
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to serialize application state
    #[error("Failed to serialize application state: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Failed to write the state file
    #[error("Failed to write state to '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A word edit that reached local state but not yet the remote backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingWrite {
    /// The record to upsert remotely
    pub record: WordRecord,
    /// Failed sync attempts so far
    #[serde(default)]
    pub attempts: u32,
    pub queued_at: DateTime<Utc>,
    /// Earliest time the next attempt is due (exponential backoff)
    pub next_attempt_at: DateTime<Utc>,
}

impl PendingWrite {
    pub fn new(record: WordRecord) -> Self {
        let now = Utc::now();
        Self {
            record,
            attempts: 0,
            queued_at: now,
            next_attempt_at: now,
        }
    }
}

/// The full persisted application state
///
/// Field names mirror the original reader's localStorage layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppState {
    /// Current reading position
    pub position: Position,
    /// Analysis corrections keyed by `"surah:ayah:word"`.
    /// Always take precedence over the content snapshot's analysis.
    pub edit_overrides: BTreeMap<String, WordAnalysis>,
    /// Alternate audio URLs keyed by `"surah-ayah"`
    pub media_overrides: BTreeMap<String, String>,
    /// Content snapshot: seeded and remotely fetched surahs
    pub all_content: BTreeMap<u32, Surah>,
    /// Edits awaiting remote sync
    pub pending_writes: Vec<PendingWrite>,
}

/// Persistence handler for `AppState`
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.state_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load state from disk
    ///
    /// Never errors: absence yields the default state, and a file that
    /// isn't valid JSON is backed up and treated as empty.
    pub fn load(&self) -> AppState {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No state file at {:?}, starting empty", self.path);
                return AppState::default();
            }
            Err(e) => {
                warn!("Failed to read state file {:?}: {}", self.path, e);
                return AppState::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(state) => state,
            Err(e) => {
                warn!(
                    "State file {:?} is corrupt ({}); backing it up and starting empty",
                    self.path, e
                );
                self.backup_corrupt_file();
                AppState::default()
            }
        }
    }

    /// Save state to disk using an atomic write
    pub fn save(&self, state: &AppState) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(state)?;
        atomic_write(&self.path, &json)
    }

    /// Move a corrupt state file aside so its contents aren't lost
    fn backup_corrupt_file(&self) {
        let backup = self.path.with_extension("json.corrupt.backup");
        if let Err(e) = fs::rename(&self.path, &backup) {
            warn!("Could not back up corrupt state file: {}", e);
        }
    }
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
///
/// This ensures the target file is never left in a partially-written state.
fn atomic_write(path: &Path, data: &[u8]) -> Result<(), StoreError> {
    let write_err = |source: io::Error| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    let temp_path = path.with_extension("tmp");

    let mut file = File::create(&temp_path).map_err(write_err)?;
    file.write_all(data).map_err(write_err)?;
    file.sync_all().map_err(write_err)?;

    fs::rename(&temp_path, path).map_err(write_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{media_key, WordKey};
    use tempfile::TempDir;

    fn store_in(temp_dir: &TempDir) -> LocalStore {
        LocalStore::new(temp_dir.path().join("state.json"))
    }

    fn sample_state() -> AppState {
        let mut state = AppState {
            position: Position {
                surah: 73,
                verse_index: 4,
            },
            ..Default::default()
        };
        state.edit_overrides.insert(
            WordKey::new(1, 1, 0).to_string(),
            WordAnalysis {
                word_type: "Phrase".to_string(),
                root: "س م و".to_string(),
                root_explanation: "Name, mark, to be high".to_string(),
                grammar: "Takes kasra after bi-".to_string(),
            },
        );
        state
            .media_overrides
            .insert(media_key(1, 1), "https://example.com/alt.mp3".to_string());
        state.all_content.insert(
            1,
            Surah {
                surah_number: 1,
                surah_name: "Al-Fatihah".to_string(),
                ayat: Vec::new(),
            },
        );
        state
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        assert!(!store.exists());
        let state = store.load();
        assert_eq!(state, AppState::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        let state = sample_state();
        store.save(&state).unwrap();
        assert!(store.exists());

        let loaded = store.load();
        assert_eq!(loaded.position, state.position);
        assert_eq!(loaded.edit_overrides, state.edit_overrides);
        assert_eq!(loaded.media_overrides, state.media_overrides);
        assert_eq!(loaded.all_content, state.all_content);
    }

    #[test]
    fn test_corrupt_file_fails_open_with_backup() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        fs::write(store.path(), "{ not valid json").unwrap();

        let state = store.load();
        assert_eq!(state, AppState::default());

        // The broken content was moved aside, not destroyed
        let backup = temp_dir.path().join("state.json.corrupt.backup");
        assert!(backup.exists());
        assert!(!store.exists());
    }

    #[test]
    fn test_save_overwrites_previous_state() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        store.save(&sample_state()).unwrap();

        let mut updated = sample_state();
        updated.position.verse_index = 9;
        store.save(&updated).unwrap();

        assert_eq!(store.load().position.verse_index, 9);
    }

    #[test]
    fn test_persisted_layout_field_names() {
        let state = sample_state();
        let value = serde_json::to_value(&state).unwrap();

        assert!(value.get("position").is_some());
        assert_eq!(value["position"]["verseIndex"], 4);
        assert!(value["editOverrides"].get("1:1:0").is_some());
        assert_eq!(value["mediaOverrides"]["1-1"], "https://example.com/alt.mp3");
        assert!(value["allContent"].get("1").is_some());
        assert!(value.get("pendingWrites").is_some());
    }

    #[test]
    fn test_loads_state_without_pending_writes_field() {
        // Older state files predate the pending queue
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        fs::write(
            store.path(),
            r#"{"position": {"surah": 2, "verseIndex": 1}}"#,
        )
        .unwrap();

        let state = store.load();
        assert_eq!(state.position.surah, 2);
        assert!(state.pending_writes.is_empty());
    }

    #[test]
    fn test_pending_write_starts_due() {
        let record = WordRecord::from_word(
            WordKey::new(1, 1, 0),
            &Default::default(),
            &Default::default(),
        );
        let write = PendingWrite::new(record);
        assert_eq!(write.attempts, 0);
        assert!(write.next_attempt_at <= Utc::now());
    }
}
