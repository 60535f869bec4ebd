//! Sync coordinator
//!
//! Single entry point tying the local store, the surah cache, and the
//! remote backend together. Reads prefer local data and fall back to the
//! network; writes land locally first and sync optimistically, queueing
//! for retry when the backend is unreachable. Local edit overrides are
//! applied on every read path, so a queued edit is visible immediately.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tracing::{debug, info, warn};

use crate::backend::{Backend, WordRecord};
use crate::cache::SurahCache;
use crate::config::Config;
use crate::models::{media_key, Position, Surah, WordAnalysis, WordKey};
use crate::seed;
use crate::store::{AppState, LocalStore, PendingWrite};

/// Most pending writes kept on disk; older entries are dropped first
pub const MAX_PENDING_WRITES: usize = 100;

/// A pending write is abandoned after this many failed sync attempts
pub const MAX_SYNC_ATTEMPTS: u32 = 5;

/// Base delay for retry backoff, doubled per failed attempt
const RETRY_BASE_MS: i64 = 500;

/// Coarse sync health, for status displays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// No backend configured; everything stays local
    Offline,
    /// Backend configured, nothing waiting to sync
    Idle,
    /// Some writes are queued for retry
    Pending(usize),
}

/// What happened to a single saved edit
#[derive(Debug, Clone)]
pub struct SaveOutcome {
    /// Whether the edit reached the remote backend
    pub synced: bool,
    /// Remote record id, when the upsert succeeded
    pub record_id: Option<String>,
    /// Why the sync part failed, when it did
    pub error: Option<String>,
}

impl SaveOutcome {
    fn local_only() -> Self {
        Self {
            synced: false,
            record_id: None,
            error: None,
        }
    }

    fn synced(record_id: String) -> Self {
        Self {
            synced: true,
            record_id: Some(record_id),
            error: None,
        }
    }

    fn failed(message: String) -> Self {
        Self {
            synced: false,
            record_id: None,
            error: Some(message),
        }
    }

    /// True unless the sync attempt failed outright
    ///
    /// A local-only save (no backend configured) counts as ok.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Summary of one pass over the pending-write queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Writes that reached the backend
    pub flushed: usize,
    /// Writes that failed and stay queued
    pub failed: usize,
    /// Writes not yet due for retry
    pub deferred: usize,
    /// Writes abandoned after too many attempts
    pub dropped: usize,
}

/// Coordinates the local store, cache, and remote backend
pub struct SyncCoordinator {
    config: Config,
    state: AppState,
    store: LocalStore,
    cache: SurahCache,
    backend: Option<Backend>,
}

impl SyncCoordinator {
    /// Open using the default config location
    pub fn open() -> Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        Self::open_with_config(config)
    }

    /// Open with an explicit config
    ///
    /// Loads persisted state (or starts empty), merges bundled seed content
    /// under it, and selects the backend once. Missing backend credentials
    /// are not an error; the coordinator then runs local-only.
    pub fn open_with_config(config: Config) -> Result<Self> {
        let store = LocalStore::from_config(&config);
        let mut state = store.load();

        // Seed surahs fill gaps only; persisted content wins
        for (number, surah) in seed::seed_content() {
            state.all_content.entry(*number).or_insert_with(|| surah.clone());
        }

        let backend = Backend::from_config(&config);
        match &backend {
            Some(b) => debug!("Using {} backend", b.kind()),
            None => debug!("No backend configured, running local-only"),
        }

        Ok(Self {
            config,
            state,
            store,
            cache: SurahCache::new(),
            backend,
        })
    }

    /// Replace the backend, keeping everything else
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backend(&self) -> Option<&Backend> {
        self.backend.as_ref()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Fetch a surah from cache or the backend
    ///
    /// Returns `Ok(None)` when the surah isn't available remotely or the
    /// backend is unreachable; callers fall back to local content via
    /// [`surah`](Self::surah). Fetched content is snapshotted into local
    /// state so it survives restarts.
    pub async fn fetch_surah(&mut self, surah_number: u32) -> Result<Option<Surah>> {
        if let Some(mut cached) = self.cache.get(surah_number) {
            debug!("Cache hit for surah {}", surah_number);
            self.apply_overrides(&mut cached);
            return Ok(Some(cached));
        }

        let backend = match &self.backend {
            Some(backend) => backend,
            None => return Ok(None),
        };

        let mut surah = match backend.fetch_surah(surah_number).await {
            Ok(Some(surah)) => surah,
            Ok(None) => return Ok(None),
            Err(e) => {
                warn!("Failed to fetch surah {}: {}", surah_number, e);
                return Ok(None);
            }
        };

        // Word tables don't carry chapter names
        if surah.surah_name.is_empty() || surah.surah_name == format!("Surah {}", surah_number) {
            if let Some(name) = seed::surah_name(surah_number) {
                surah.surah_name = name.to_string();
            }
        }

        self.cache.put(surah.clone());
        self.state.all_content.insert(surah_number, surah.clone());
        if let Err(e) = self.store.save(&self.state) {
            warn!("Failed to persist fetched surah {}: {}", surah_number, e);
        }

        self.apply_overrides(&mut surah);
        Ok(Some(surah))
    }

    /// Get a surah from anywhere: cache, backend, local snapshot, or seed
    pub async fn surah(&mut self, surah_number: u32) -> Result<Option<Surah>> {
        if let Some(surah) = self.fetch_surah(surah_number).await? {
            return Ok(Some(surah));
        }
        let local = self
            .state
            .all_content
            .get(&surah_number)
            .cloned()
            .or_else(|| seed::seed_surah(surah_number).cloned());
        Ok(local.map(|mut surah| {
            self.apply_overrides(&mut surah);
            surah
        }))
    }

    /// Overlay local edits and media overrides onto a surah
    ///
    /// Edit overrides always beat whatever the surah carried, local or
    /// remote.
    fn apply_overrides(&self, surah: &mut Surah) {
        for (key, analysis) in &self.state.edit_overrides {
            let key: WordKey = match key.parse() {
                Ok(key) => key,
                Err(e) => {
                    warn!("Skipping malformed override key: {}", e);
                    continue;
                }
            };
            if key.surah != surah.surah_number {
                continue;
            }
            if let Some(word) = surah.word_mut(&key) {
                word.analysis = analysis.clone();
            }
        }

        let surah_number = surah.surah_number;
        for ayah in &mut surah.ayat {
            if let Some(url) = self
                .state
                .media_overrides
                .get(&media_key(surah_number, ayah.ayah_number))
            {
                ayah.recitation_url = url.clone();
            }
        }
    }

    /// Save a word analysis edit: local first, then sync optimistically
    ///
    /// The edit is persisted before any network traffic, so it can never
    /// be lost to a sync failure. A failed sync queues the write for
    /// [`flush_pending`](Self::flush_pending); the error is reported in
    /// the outcome rather than returned, since the save itself succeeded.
    pub async fn save_word_analysis(
        &mut self,
        key: WordKey,
        analysis: WordAnalysis,
    ) -> Result<SaveOutcome> {
        self.state
            .edit_overrides
            .insert(key.to_string(), analysis.clone());
        if let Some(surah) = self.state.all_content.get_mut(&key.surah) {
            if let Some(word) = surah.word_mut(&key) {
                word.analysis = analysis.clone();
            }
        }
        self.store
            .save(&self.state)
            .context("Failed to persist edit locally")?;
        debug!("Saved edit for word {}", key);

        let backend = match &self.backend {
            Some(backend) => backend,
            None => return Ok(SaveOutcome::local_only()),
        };

        let word = self
            .state
            .all_content
            .get(&key.surah)
            .and_then(|s| s.word(&key))
            .cloned()
            .unwrap_or_default();
        let record = WordRecord::from_word(key, &word, &analysis);

        match backend.upsert_word(&record).await {
            Ok(outcome) => {
                // Cached copy predates the edit
                self.cache.invalidate(key.surah);
                info!("Synced edit for word {}", key);
                Ok(SaveOutcome::synced(outcome.record_id))
            }
            Err(e) => {
                warn!("Sync failed for word {}, queueing: {}", key, e);
                self.queue_pending(record);
                self.store
                    .save(&self.state)
                    .context("Failed to persist pending write")?;
                Ok(SaveOutcome::failed(e.to_string()))
            }
        }
    }

    /// Record an alternate recitation URL for an ayah
    ///
    /// Media overrides are a local preference and never sync.
    pub fn save_media_override(&mut self, surah: u32, ayah: u32, url: String) -> Result<()> {
        self.state.media_overrides.insert(media_key(surah, ayah), url);
        self.cache.invalidate(surah);
        self.store
            .save(&self.state)
            .context("Failed to persist media override")
    }

    /// Remove a media override, restoring the ayah's default audio
    pub fn clear_media_override(&mut self, surah: u32, ayah: u32) -> Result<()> {
        self.state.media_overrides.remove(&media_key(surah, ayah));
        self.cache.invalidate(surah);
        self.store
            .save(&self.state)
            .context("Failed to persist media override")
    }

    fn queue_pending(&mut self, record: WordRecord) {
        // One queue slot per word; a newer edit replaces the old payload
        self.state
            .pending_writes
            .retain(|w| w.record.key() != record.key());
        self.state.pending_writes.push(PendingWrite::new(record));
        while self.state.pending_writes.len() > MAX_PENDING_WRITES {
            let dropped = self.state.pending_writes.remove(0);
            warn!(
                "Pending queue full, dropping oldest write for word {}",
                dropped.record.key()
            );
        }
    }

    /// Retry queued writes that are due
    ///
    /// Each failure doubles the write's backoff delay; a write that fails
    /// [`MAX_SYNC_ATTEMPTS`] times is dropped with a warning.
    pub async fn flush_pending(&mut self) -> Result<FlushReport> {
        let backend = match &self.backend {
            Some(backend) => backend,
            None => return Ok(FlushReport::default()),
        };
        if self.state.pending_writes.is_empty() {
            return Ok(FlushReport::default());
        }

        let now = Utc::now();
        let mut report = FlushReport::default();
        let mut kept = Vec::new();

        for mut write in std::mem::take(&mut self.state.pending_writes) {
            if now < write.next_attempt_at {
                report.deferred += 1;
                kept.push(write);
                continue;
            }
            match backend.upsert_word(&write.record).await {
                Ok(_) => {
                    debug!("Flushed pending write for word {}", write.record.key());
                    self.cache.invalidate(write.record.surah_number);
                    report.flushed += 1;
                }
                Err(e) => {
                    write.attempts += 1;
                    if write.attempts >= MAX_SYNC_ATTEMPTS {
                        warn!(
                            "Dropping write for word {} after {} attempts: {}",
                            write.record.key(),
                            write.attempts,
                            e
                        );
                        report.dropped += 1;
                    } else {
                        write.next_attempt_at = next_attempt(now, write.attempts);
                        warn!(
                            "Retry {} failed for word {}: {}",
                            write.attempts,
                            write.record.key(),
                            e
                        );
                        report.failed += 1;
                        kept.push(write);
                    }
                }
            }
        }

        self.state.pending_writes = kept;
        self.store
            .save(&self.state)
            .context("Failed to persist pending queue")?;

        if report.flushed > 0 {
            info!("Flushed {} pending write(s)", report.flushed);
        }
        Ok(report)
    }

    pub fn position(&self) -> Position {
        self.state.position
    }

    /// Persist the reading position
    pub fn set_position(&mut self, position: Position) -> Result<()> {
        self.state.position = position;
        self.store
            .save(&self.state)
            .context("Failed to persist reading position")
    }

    pub fn media_override(&self, surah: u32, ayah: u32) -> Option<&str> {
        self.state
            .media_overrides
            .get(&media_key(surah, ayah))
            .map(String::as_str)
    }

    pub fn pending_count(&self) -> usize {
        self.state.pending_writes.len()
    }

    pub fn sync_status(&self) -> SyncStatus {
        match (&self.backend, self.state.pending_writes.len()) {
            (None, _) => SyncStatus::Offline,
            (Some(_), 0) => SyncStatus::Idle,
            (Some(_), n) => SyncStatus::Pending(n),
        }
    }
}

/// When a write that has failed `attempts` times should next be tried
fn next_attempt(now: DateTime<Utc>, attempts: u32) -> DateTime<Utc> {
    let delay_ms = RETRY_BASE_MS << attempts.min(6);
    now + ChronoDuration::milliseconds(delay_ms)
}
