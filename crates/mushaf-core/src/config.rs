//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/mushaf/config.toml)
//! 3. Environment variables (MUSHAF_* prefix)
//!
//! Environment variables take precedence over config file values.
//!
//! Which remote backend is used is decided once at startup from these
//! values (see `Backend::from_config`) - never re-checked per call.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable prefix
const ENV_PREFIX: &str = "MUSHAF";

/// Default Airtable table holding the per-word records
pub const DEFAULT_AIRTABLE_TABLE: &str = "Quran_Words";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for local state storage
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Explicit backend choice: "airtable", "supabase" or "memory".
    /// When unset, the first backend with complete credentials is used.
    #[serde(default)]
    pub backend: Option<String>,

    /// Airtable API key
    #[serde(default)]
    pub airtable_api_key: Option<String>,

    /// Airtable base identifier
    #[serde(default)]
    pub airtable_base_id: Option<String>,

    /// Airtable table name
    #[serde(default = "default_airtable_table")]
    pub airtable_table: String,

    /// Supabase project URL
    #[serde(default)]
    pub supabase_url: Option<String>,

    /// Supabase anon key
    #[serde(default)]
    pub supabase_anon_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            backend: None,
            airtable_api_key: None,
            airtable_base_id: None,
            airtable_table: default_airtable_table(),
            supabase_url: None,
            supabase_anon_key: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (MUSHAF_DATA_DIR, MUSHAF_BACKEND, ...)
    /// 2. Config file (~/.config/mushaf/config.toml or MUSHAF_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var(format!("{}_BACKEND", ENV_PREFIX)) {
            self.backend = if val.is_empty() { None } else { Some(val) };
        }

        if let Ok(val) = std::env::var(format!("{}_AIRTABLE_API_KEY", ENV_PREFIX)) {
            self.airtable_api_key = if val.is_empty() { None } else { Some(val) };
        }

        if let Ok(val) = std::env::var(format!("{}_AIRTABLE_BASE_ID", ENV_PREFIX)) {
            self.airtable_base_id = if val.is_empty() { None } else { Some(val) };
        }

        if let Ok(val) = std::env::var(format!("{}_AIRTABLE_TABLE", ENV_PREFIX)) {
            if !val.is_empty() {
                self.airtable_table = val;
            }
        }

        if let Ok(val) = std::env::var(format!("{}_SUPABASE_URL", ENV_PREFIX)) {
            self.supabase_url = if val.is_empty() { None } else { Some(val) };
        }

        if let Ok(val) = std::env::var(format!("{}_SUPABASE_ANON_KEY", ENV_PREFIX)) {
            self.supabase_anon_key = if val.is_empty() { None } else { Some(val) };
        }
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_file_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with MUSHAF_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mushaf")
            .join("config.toml")
    }

    /// Get the path to the persisted application state
    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join("state.json")
    }

    /// True iff the minimum Airtable credentials are present
    pub fn airtable_configured(&self) -> bool {
        self.airtable_api_key.is_some() && self.airtable_base_id.is_some()
    }

    /// True iff the minimum Supabase credentials are present
    pub fn supabase_configured(&self) -> bool {
        self.supabase_url.is_some() && self.supabase_anon_key.is_some()
    }
}

fn default_airtable_table() -> String {
    DEFAULT_AIRTABLE_TABLE.to_string()
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mushaf")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap();
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            // Clear all the vars
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "MUSHAF_DATA_DIR",
        "MUSHAF_BACKEND",
        "MUSHAF_AIRTABLE_API_KEY",
        "MUSHAF_AIRTABLE_BASE_ID",
        "MUSHAF_AIRTABLE_TABLE",
        "MUSHAF_SUPABASE_URL",
        "MUSHAF_SUPABASE_ANON_KEY",
    ];

    #[test]
    fn test_default_config() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config::default();
        assert!(config.backend.is_none());
        assert!(!config.airtable_configured());
        assert!(!config.supabase_configured());
        assert_eq!(config.airtable_table, "Quran_Words");
        assert!(config.data_dir.ends_with("mushaf"));
    }

    #[test]
    fn test_state_path() {
        let config = Config {
            data_dir: PathBuf::from("/data/mushaf"),
            ..Default::default()
        };
        assert_eq!(config.state_path(), PathBuf::from("/data/mushaf/state.json"));
    }

    #[test]
    fn test_env_override_data_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("MUSHAF_DATA_DIR", "/tmp/mushaf-test");
        config.apply_env_overrides();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/mushaf-test"));
    }

    #[test]
    fn test_env_override_airtable_credentials() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        assert!(!config.airtable_configured());

        env::set_var("MUSHAF_AIRTABLE_API_KEY", "pat-test");
        env::set_var("MUSHAF_AIRTABLE_BASE_ID", "appTestBase");
        config.apply_env_overrides();

        assert!(config.airtable_configured());
        assert_eq!(config.airtable_api_key.as_deref(), Some("pat-test"));

        // Empty string clears a credential
        env::set_var("MUSHAF_AIRTABLE_API_KEY", "");
        config.apply_env_overrides();
        assert!(!config.airtable_configured());
    }

    #[test]
    fn test_env_override_backend_choice() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("MUSHAF_BACKEND", "supabase");
        config.apply_env_overrides();
        assert_eq!(config.backend.as_deref(), Some("supabase"));

        env::set_var("MUSHAF_BACKEND", "");
        config.apply_env_overrides();
        assert!(config.backend.is_none());
    }

    #[test]
    fn test_serialization() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config {
            data_dir: PathBuf::from("/data/mushaf"),
            backend: Some("airtable".to_string()),
            airtable_api_key: Some("key".to_string()),
            airtable_base_id: Some("base".to_string()),
            ..Default::default()
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("data_dir"));
        assert!(toml_str.contains("airtable_api_key"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.data_dir, config.data_dir);
        assert_eq!(parsed.backend, config.backend);
        assert_eq!(parsed.airtable_api_key, config.airtable_api_key);
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            data_dir = "/custom/data"
            supabase_url = "https://project.supabase.co"
            supabase_anon_key = "anon-key"
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
        assert!(config.supabase_configured());
        assert!(!config.airtable_configured());
    }

    #[test]
    fn test_env_overrides_file_value() {
        let _guard = EnvGuard::new(ENV_VARS);

        env::set_var("MUSHAF_SUPABASE_URL", "https://env.supabase.co");
        let config = Config::load_from_str(r#"supabase_url = "https://file.supabase.co""#).unwrap();
        assert_eq!(
            config.supabase_url.as_deref(),
            Some("https://env.supabase.co")
        );
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = tempfile::TempDir::new().unwrap();
        env::set_var("MUSHAF_DATA_DIR", temp_dir.path().join("data"));

        let path = PathBuf::from("/nonexistent/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        // Should return defaults when file doesn't exist
        assert!(config.backend.is_none());
        assert!(!config.airtable_configured());
    }
}
