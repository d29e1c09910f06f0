//! Stored settings for rulegate consumers.
//!
//! Connection settings (base URL + API token) live in a secure key-value
//! store behind the [`SettingsStore`] trait -- keyring-backed in
//! production, in-memory for tests. Transport tuning lives in a TOML app
//! config under the platform config directory. Both resolve into a fresh
//! `rulegate_core::ConnectionConfig` snapshot; a settings change should
//! build a new snapshot (and with it a new session) rather than mutate
//! the old one.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use rulegate_core::ConnectionConfig;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("secure storage error: {0}")]
    Storage(#[from] keyring::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Secure settings store ───────────────────────────────────────────

/// Storage key for the remote base URL.
pub const BASE_URL_KEY: &str = "base_url";
/// Storage key for the bearer token.
pub const API_TOKEN_KEY: &str = "api_token";

const KEYRING_SERVICE: &str = "rulegate";

/// Scoped key-value storage for connection settings.
///
/// Implementations persist values encrypted at rest; callers rely only
/// on get/set semantics. An absent key is a valid state meaning "not
/// configured".
pub trait SettingsStore {
    fn get(&self, key: &str) -> Result<Option<String>, ConfigError>;
    fn set(&self, key: &str, value: &str) -> Result<(), ConfigError>;
}

/// OS keyring-backed store (macOS Keychain, Windows Credential Manager,
/// Secret Service on Linux).
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new() -> Self {
        Self {
            service: KEYRING_SERVICE.into(),
        }
    }

    /// Use a non-default keyring service name (e.g. for side-by-side
    /// installs).
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStore for KeyringStore {
    fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let entry = keyring::Entry::new(&self.service, key)?;
        match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        let entry = keyring::Entry::new(&self.service, key)?;
        entry.set_password(value)?;
        Ok(())
    }
}

/// In-memory store for tests and ephemeral sessions. Not encrypted.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let values = self
            .values
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut values = self
            .values
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

// ── Connection settings ─────────────────────────────────────────────

/// Normalize a base URL so it always carries a trailing slash.
fn ensure_trailing_slash(raw: &str) -> String {
    if raw.ends_with('/') {
        raw.to_owned()
    } else {
        format!("{raw}/")
    }
}

/// Resolve the base URL: env var `RULEGATE_BASE_URL` first, then the
/// secure store. Empty values count as absent.
pub fn load_base_url(store: &dyn SettingsStore) -> Result<Option<String>, ConfigError> {
    if let Ok(value) = std::env::var("RULEGATE_BASE_URL") {
        if !value.trim().is_empty() {
            return Ok(Some(ensure_trailing_slash(&value)));
        }
    }

    Ok(store
        .get(BASE_URL_KEY)?
        .filter(|value| !value.trim().is_empty())
        .map(|value| ensure_trailing_slash(&value)))
}

/// Resolve the API token: env var `RULEGATE_API_TOKEN` first, then the
/// secure store. Empty values count as absent.
pub fn load_api_token(store: &dyn SettingsStore) -> Result<Option<SecretString>, ConfigError> {
    if let Ok(value) = std::env::var("RULEGATE_API_TOKEN") {
        if !value.is_empty() {
            return Ok(Some(SecretString::from(value)));
        }
    }

    Ok(store
        .get(API_TOKEN_KEY)?
        .filter(|value| !value.is_empty())
        .map(SecretString::from))
}

/// Persist connection settings, normalizing the base URL on the way in.
pub fn save_connection(
    store: &dyn SettingsStore,
    base_url: &str,
    api_token: &str,
) -> Result<(), ConfigError> {
    store.set(BASE_URL_KEY, &ensure_trailing_slash(base_url))?;
    store.set(API_TOKEN_KEY, api_token)?;
    Ok(())
}

// ── App config (TOML) ───────────────────────────────────────────────

/// Transport tuning, kept outside the secure store since nothing here
/// is a secret.
#[derive(Debug, Deserialize, Serialize)]
pub struct AppConfig {
    /// TCP connect timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Total request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
        }
    }
}

fn default_connect_timeout() -> u64 {
    5
}
fn default_request_timeout() -> u64 {
    10
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "rulegate", "rulegate").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("rulegate");
    p
}

/// Load the app config from the canonical path + environment.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    load_app_config_from(&config_path())
}

/// Load the app config from an explicit file path + environment.
pub fn load_app_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(AppConfig::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("RULEGATE_"));

    let config: AppConfig = figment.extract()?;
    Ok(config)
}

/// Serialize the app config to TOML and write it to the canonical path.
pub fn save_app_config(cfg: &AppConfig) -> Result<(), ConfigError> {
    save_app_config_to(cfg, &config_path())
}

/// Serialize the app config to TOML at an explicit path.
pub fn save_app_config_to(cfg: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation to core config ──────────────────────────────────────

/// Build a fresh [`ConnectionConfig`] snapshot from stored settings and
/// the canonical app config.
pub fn stored_connection_config(store: &dyn SettingsStore) -> Result<ConnectionConfig, ConfigError> {
    let app = load_app_config()?;
    connection_config_with(store, &app)
}

/// Build a [`ConnectionConfig`] snapshot from stored settings and an
/// explicit app config.
pub fn connection_config_with(
    store: &dyn SettingsStore,
    app: &AppConfig,
) -> Result<ConnectionConfig, ConfigError> {
    Ok(ConnectionConfig {
        base_url: load_base_url(store)?,
        api_token: load_api_token(store)?,
        connect_timeout: Duration::from_secs(app.connect_timeout),
        request_timeout: Duration::from_secs(app.request_timeout),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::default();
        assert_eq!(store.get(BASE_URL_KEY).unwrap(), None);

        store.set(BASE_URL_KEY, "https://example.com/").unwrap();
        assert_eq!(
            store.get(BASE_URL_KEY).unwrap().as_deref(),
            Some("https://example.com/")
        );
    }

    #[test]
    fn save_connection_normalizes_trailing_slash() {
        let store = MemoryStore::default();
        save_connection(&store, "https://example.com/shim", "tok").unwrap();

        assert_eq!(
            store.get(BASE_URL_KEY).unwrap().as_deref(),
            Some("https://example.com/shim/")
        );
        assert_eq!(store.get(API_TOKEN_KEY).unwrap().as_deref(), Some("tok"));
    }

    #[test]
    fn load_normalizes_urls_stored_without_slash() {
        let store = MemoryStore::default();
        store.set(BASE_URL_KEY, "https://example.com").unwrap();

        assert_eq!(
            load_base_url(&store).unwrap().as_deref(),
            Some("https://example.com/")
        );
    }

    #[test]
    fn empty_stored_values_count_as_absent() {
        let store = MemoryStore::default();
        store.set(BASE_URL_KEY, "  ").unwrap();
        store.set(API_TOKEN_KEY, "").unwrap();

        assert_eq!(load_base_url(&store).unwrap(), None);
        assert!(load_api_token(&store).unwrap().is_none());
    }

    #[test]
    fn stored_settings_resolve_to_a_complete_snapshot() {
        let store = MemoryStore::default();
        save_connection(&store, "https://example.com", "tok").unwrap();

        let config = connection_config_with(&store, &AppConfig::default()).unwrap();
        assert!(config.is_complete());
        assert_eq!(config.base_url.as_deref(), Some("https://example.com/"));
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn absent_settings_resolve_to_an_incomplete_snapshot() {
        let store = MemoryStore::default();
        let config = connection_config_with(&store, &AppConfig::default()).unwrap();
        assert!(!config.is_complete());
    }

    #[test]
    fn app_config_defaults_when_file_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_app_config_from(&dir.path().join("missing.toml")).unwrap();

        assert_eq!(config.connect_timeout, 5);
        assert_eq!(config.request_timeout, 10);
    }

    #[test]
    fn app_config_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "request_timeout = 30\n").unwrap();

        let config = load_app_config_from(&path).unwrap();
        assert_eq!(config.connect_timeout, 5);
        assert_eq!(config.request_timeout, 30);
    }

    #[test]
    fn app_config_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let cfg = AppConfig {
            connect_timeout: 2,
            request_timeout: 7,
        };
        save_app_config_to(&cfg, &path).unwrap();

        let reloaded = load_app_config_from(&path).unwrap();
        assert_eq!(reloaded.connect_timeout, 2);
        assert_eq!(reloaded.request_timeout, 7);
    }
}
