//! Supabase backend adapter
//!
//! Talks to the relational backend over its REST surfaces: PostgREST for
//! data (including the `get_surah_complete` stored procedure), GoTrue for
//! authentication. Upserts POST against the flattened `word_records` view
//! with `on_conflict` on the identity columns, so the conflict resolution
//! is a single atomic statement in the database.

use std::sync::Mutex;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::error::{BackendError, BackendResult};
use super::{UpsertOutcome, WordRecord, REQUEST_TIMEOUT};
use crate::config::Config;
use crate::models::{Surah, User, WordKey};

/// Table (view) holding the flattened per-word rows
const WORD_TABLE: &str = "word_records";

/// Stored procedure returning a surah in the app's nested shape
const SURAH_RPC: &str = "get_surah_complete";

/// Adapter for a Supabase project (PostgREST + GoTrue)
pub struct SupabaseBackend {
    client: reqwest::Client,
    url: String,
    anon_key: String,
    /// Access token of the signed-in user, if any
    access_token: Mutex<Option<String>>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: GoTrueUser,
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
    email: String,
    #[serde(default)]
    user_metadata: Value,
}

#[derive(Debug, Deserialize)]
struct AdminRow {
    is_admin: bool,
}

#[derive(Debug, Deserialize)]
struct UpsertedRow {
    #[serde(default)]
    id: Option<i64>,
}

impl SupabaseBackend {
    /// Build an adapter if the minimum credentials (project URL + anon key)
    /// are present
    pub fn from_config(config: &Config) -> Option<Self> {
        let url = config.supabase_url.clone()?;
        let anon_key = config.supabase_anon_key.clone()?;
        Some(Self::new(&url, anon_key))
    }

    pub fn new(url: &str, anon_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.trim_end_matches('/').to_string(),
            anon_key,
            access_token: Mutex::new(None),
        }
    }

    fn rest_url(&self, path: &str) -> String {
        format!("{}/rest/v1/{}", self.url, path)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.url, path)
    }

    /// Bearer token to use: the signed-in user's, falling back to anon
    fn bearer(&self) -> String {
        self.token_snapshot().unwrap_or_else(|| self.anon_key.clone())
    }

    fn token_snapshot(&self) -> Option<String> {
        self.access_token
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn set_token(&self, token: Option<String>) {
        *self
            .access_token
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = token;
    }

    /// Fetch a surah through the stored procedure
    pub async fn fetch_surah(&self, surah_number: u32) -> BackendResult<Option<Surah>> {
        let response = self
            .client
            .post(self.rest_url(&format!("rpc/{}", SURAH_RPC)))
            .timeout(REQUEST_TIMEOUT)
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer())
            .json(&json!({ "p_surah_number": surah_number }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let body: Value = response.json().await?;
        if body.is_null() {
            return Ok(None);
        }

        let surah: Surah = serde_json::from_value(body)
            .map_err(|e| BackendError::Unexpected(format!("malformed surah payload: {}", e)))?;
        debug!("Fetched surah {} from Supabase", surah_number);
        Ok(Some(surah))
    }

    /// Fetch one word row by its identity triple
    pub async fn fetch_word(&self, key: WordKey) -> BackendResult<Option<WordRecord>> {
        let url = format!(
            "{}?select=*&surah_number=eq.{}&ayah_number=eq.{}&word_index=eq.{}&limit=1",
            self.rest_url(WORD_TABLE),
            key.surah,
            key.ayah,
            key.word
        );

        let response = self
            .client
            .get(url)
            .timeout(REQUEST_TIMEOUT)
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let mut rows: Vec<WordRecord> = response.json().await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }

    /// Atomic upsert on the identity columns
    pub async fn upsert_word(&self, record: &WordRecord) -> BackendResult<UpsertOutcome> {
        let url = format!(
            "{}?on_conflict=surah_number,ayah_number,word_index",
            self.rest_url(WORD_TABLE)
        );

        let response = self
            .client
            .post(url)
            .timeout(REQUEST_TIMEOUT)
            .header("apikey", &self.anon_key)
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .bearer_auth(self.bearer())
            .json(&[record])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let rows: Vec<UpsertedRow> = response.json().await?;
        let record_id = rows
            .first()
            .and_then(|r| r.id)
            .map(|id| id.to_string())
            .unwrap_or_else(|| record.key().to_string());

        Ok(UpsertOutcome { record_id })
    }

    /// Register a new user and create their profile row
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> BackendResult<User> {
        let body = json!({
            "email": email,
            "password": password,
            "data": { "display_name": display_name },
        });

        let response = self
            .client
            .post(self.auth_url("signup"))
            .timeout(REQUEST_TIMEOUT)
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        // GoTrue returns a session directly when email confirmation is off,
        // otherwise just the user object.
        let body: Value = response.json().await?;
        let (token, gotrue_user) = if body.get("access_token").is_some() {
            let session: TokenResponse = serde_json::from_value(body)
                .map_err(|e| BackendError::Unexpected(format!("malformed session: {}", e)))?;
            (Some(session.access_token), session.user)
        } else {
            let user: GoTrueUser = serde_json::from_value(body)
                .map_err(|e| BackendError::Unexpected(format!("malformed user: {}", e)))?;
            (None, user)
        };
        self.set_token(token);

        // New accounts start without editor rights
        let profile = json!({
            "id": gotrue_user.id,
            "display_name": display_name,
            "is_admin": false,
        });
        let response = self
            .client
            .post(self.rest_url("user_profiles"))
            .timeout(REQUEST_TIMEOUT)
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer())
            .json(&profile)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        Ok(User {
            email: gotrue_user.email,
            display_name: display_name.map(|s| s.to_string()),
            is_admin: false,
        })
    }

    /// Sign in with the password grant and fetch the admin flag
    pub async fn sign_in(&self, email: &str, password: &str) -> BackendResult<User> {
        let response = self
            .client
            .post(self.auth_url("token?grant_type=password"))
            .timeout(REQUEST_TIMEOUT)
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let session: TokenResponse = response.json().await?;
        self.set_token(Some(session.access_token));

        let is_admin = self.fetch_admin_flag(&session.user.id).await?;
        let display_name = session
            .user
            .user_metadata
            .get("display_name")
            .and_then(Value::as_str)
            .map(|s| s.to_string());

        Ok(User {
            email: session.user.email,
            display_name,
            is_admin,
        })
    }

    /// End the current session
    pub async fn sign_out(&self) -> BackendResult<()> {
        let Some(token) = self.token_snapshot() else {
            return Err(BackendError::AuthRequired);
        };

        let response = self
            .client
            .post(self.auth_url("logout"))
            .timeout(REQUEST_TIMEOUT)
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await?;

        self.set_token(None);

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(())
    }

    async fn fetch_admin_flag(&self, user_id: &str) -> BackendResult<bool> {
        let url = format!(
            "{}?select=is_admin&id=eq.{}",
            self.rest_url("user_profiles"),
            user_id
        );

        let response = self
            .client
            .get(url)
            .timeout(REQUEST_TIMEOUT)
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let rows: Vec<AdminRow> = response.json().await?;
        Ok(rows.first().map(|r| r.is_admin).unwrap_or(false))
    }
}

/// Convert a non-2xx response into an `Api` error, consuming the body
async fn api_error(response: reqwest::Response) -> BackendError {
    let status = response.status().as_u16();
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());
    BackendError::Api { status, message }
}
