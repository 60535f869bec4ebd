//! In-process backend
//!
//! Selected with `backend = "memory"` in config. Holds everything in maps,
//! counts fetches, and can be flipped into a failing mode - which is what
//! the coordinator tests lean on to verify cache hits and the
//! optimistic-write error paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::error::{BackendError, BackendResult};
use super::{UpsertOutcome, WordRecord};
use crate::models::{Surah, User, WordKey};

#[derive(Default)]
struct Inner {
    surahs: HashMap<u32, Surah>,
    records: HashMap<(u32, u32, u32), WordRecord>,
    /// email -> (password, user)
    users: HashMap<String, (String, User)>,
    signed_in: Option<User>,
    failing: bool,
}

/// Backend that never leaves the process
#[derive(Default)]
pub struct MemoryBackend {
    inner: Mutex<Inner>,
    fetches: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a surah (builder style)
    pub fn with_surah(self, surah: Surah) -> Self {
        self.insert_surah(surah);
        self
    }

    pub fn insert_surah(&self, surah: Surah) {
        self.lock().surahs.insert(surah.surah_number, surah);
    }

    /// How many fetch calls have reached this backend
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of stored word records
    pub fn record_count(&self) -> usize {
        self.lock().records.len()
    }

    /// When set, every data operation fails with a simulated 500
    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    /// Register a user that can later sign in
    pub fn add_user(&self, email: &str, password: &str, user: User) {
        self.lock()
            .users
            .insert(email.to_string(), (password.to_string(), user));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_failing(&self) -> BackendResult<()> {
        if self.lock().failing {
            Err(BackendError::Api {
                status: 500,
                message: "simulated server error".to_string(),
            })
        } else {
            Ok(())
        }
    }

    pub async fn fetch_surah(&self, surah_number: u32) -> BackendResult<Option<Surah>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.check_failing()?;
        Ok(self.lock().surahs.get(&surah_number).cloned())
    }

    pub async fn fetch_word(&self, key: WordKey) -> BackendResult<Option<WordRecord>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.check_failing()?;
        Ok(self
            .lock()
            .records
            .get(&(key.surah, key.ayah, key.word))
            .cloned())
    }

    pub async fn upsert_word(&self, record: &WordRecord) -> BackendResult<UpsertOutcome> {
        self.check_failing()?;
        let key = record.key();
        self.lock()
            .records
            .insert((key.surah, key.ayah, key.word), record.clone());
        Ok(UpsertOutcome {
            record_id: format!("mem-{}", key),
        })
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> BackendResult<User> {
        self.check_failing()?;
        let user = User {
            email: email.to_string(),
            display_name: display_name.map(|s| s.to_string()),
            is_admin: false,
        };
        let mut inner = self.lock();
        inner
            .users
            .insert(email.to_string(), (password.to_string(), user.clone()));
        inner.signed_in = Some(user.clone());
        Ok(user)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> BackendResult<User> {
        self.check_failing()?;
        let mut inner = self.lock();
        match inner.users.get(email) {
            Some((stored, user)) if stored == password => {
                let user = user.clone();
                inner.signed_in = Some(user.clone());
                Ok(user)
            }
            _ => Err(BackendError::Api {
                status: 400,
                message: "Invalid login credentials".to_string(),
            }),
        }
    }

    pub async fn sign_out(&self) -> BackendResult<()> {
        let mut inner = self.lock();
        if inner.signed_in.take().is_none() {
            return Err(BackendError::AuthRequired);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Word, WordAnalysis};

    fn sample_record(word: u32) -> WordRecord {
        WordRecord::from_word(
            WordKey::new(1, 1, word),
            &Word::default(),
            &WordAnalysis::default(),
        )
    }

    #[tokio::test]
    async fn test_fetch_counts_calls() {
        let backend = MemoryBackend::new().with_surah(Surah {
            surah_number: 1,
            ..Default::default()
        });

        assert_eq!(backend.fetch_count(), 0);
        assert!(backend.fetch_surah(1).await.unwrap().is_some());
        assert!(backend.fetch_surah(2).await.unwrap().is_none());
        assert_eq!(backend.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_per_key() {
        let backend = MemoryBackend::new();

        backend.upsert_word(&sample_record(0)).await.unwrap();
        backend.upsert_word(&sample_record(0)).await.unwrap();
        backend.upsert_word(&sample_record(1)).await.unwrap();

        assert_eq!(backend.record_count(), 2);
    }

    #[tokio::test]
    async fn test_failing_mode() {
        let backend = MemoryBackend::new();
        backend.set_failing(true);

        let err = backend.fetch_surah(1).await.unwrap_err();
        assert!(matches!(err, BackendError::Api { status: 500, .. }));

        backend.set_failing(false);
        assert!(backend.fetch_surah(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_auth_round_trip() {
        let backend = MemoryBackend::new();

        let user = backend
            .sign_up("editor@example.com", "secret", Some("Editor"))
            .await
            .unwrap();
        assert_eq!(user.email, "editor@example.com");
        assert!(!user.is_admin);

        backend.sign_out().await.unwrap();
        assert!(matches!(
            backend.sign_out().await.unwrap_err(),
            BackendError::AuthRequired
        ));

        let user = backend.sign_in("editor@example.com", "secret").await.unwrap();
        assert_eq!(user.display_name.as_deref(), Some("Editor"));

        let err = backend.sign_in("editor@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, BackendError::Api { status: 400, .. }));
    }
}
