//! In-memory cache for remotely fetched surahs
//!
//! Entries expire after a TTL (30 minutes by default) and the cache holds
//! at most 114 surahs, evicting the oldest entry when full. Expiry is
//! checked lazily on lookup.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::models::Surah;

/// How long a cached surah stays fresh
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

/// One entry per surah in the Quran
pub const DEFAULT_CAPACITY: usize = 114;

struct CacheEntry {
    surah: Surah,
    cached_at: Instant,
}

/// TTL-bounded surah cache
pub struct SurahCache {
    entries: HashMap<u32, CacheEntry>,
    ttl: Duration,
    capacity: usize,
}

impl SurahCache {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            ttl: DEFAULT_TTL,
            capacity: DEFAULT_CAPACITY,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Get a fresh copy of a cached surah, if present and unexpired
    pub fn get(&mut self, surah_number: u32) -> Option<Surah> {
        self.get_at(surah_number, Instant::now())
    }

    fn get_at(&mut self, surah_number: u32, now: Instant) -> Option<Surah> {
        let expired = match self.entries.get(&surah_number) {
            Some(entry) => now.saturating_duration_since(entry.cached_at) >= self.ttl,
            None => return None,
        };
        if expired {
            debug!("Cache entry for surah {} expired", surah_number);
            self.entries.remove(&surah_number);
            return None;
        }
        self.entries.get(&surah_number).map(|e| e.surah.clone())
    }

    /// Cache a surah, evicting the oldest entry if at capacity
    pub fn put(&mut self, surah: Surah) {
        self.put_at(surah, Instant::now());
    }

    fn put_at(&mut self, surah: Surah, now: Instant) {
        let key = surah.surah_number;
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            if let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, e)| e.cached_at)
                .map(|(k, _)| *k)
            {
                debug!("Cache full, evicting surah {}", oldest);
                self.entries.remove(&oldest);
            }
        }
        self.entries.insert(
            key,
            CacheEntry {
                surah,
                cached_at: now,
            },
        );
    }

    /// Drop a single surah so the next read refetches it
    pub fn invalidate(&mut self, surah_number: u32) {
        self.entries.remove(&surah_number);
    }

    pub fn invalidate_all(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SurahCache {
    fn default() -> Self {
        Self::new()
    }
}
