//! Profile store configuration.
//!
//! Defaults match the long-standing keychain item so an existing profile stays
//! readable. A JSON file and environment variables can override them.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::profile::PROFILE_KEY;
use crate::storage::{EncryptedFileStore, KeyringStore, MemoryStore, SecureStore, encrypted};

const ENV_BACKEND: &str = "PROFILE_KEYCHAIN_BACKEND";
const ENV_KEY: &str = "PROFILE_KEYCHAIN_KEY";
const ENV_STORE_PATH: &str = "PROFILE_KEYCHAIN_STORE_PATH";

/// Which secure store holds the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    #[default]
    Keyring,
    EncryptedFile,
    Memory,
}

impl std::str::FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keyring" | "keychain" => Ok(Backend::Keyring),
            "encrypted-file" | "file" => Ok(Backend::EncryptedFile),
            "memory" => Ok(Backend::Memory),
            other => anyhow::bail!("unknown profile store backend: {other}"),
        }
    }
}

/// Unknown fields are rejected. Item attributes such as accessibility are
/// fixed and cannot be configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    /// Service and account name of the stored item.
    #[serde(default = "default_key")]
    pub key: String,
    #[serde(default)]
    pub backend: Backend,
    /// Location of the encrypted file; only used by [`Backend::EncryptedFile`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,
}

fn default_key() -> String {
    PROFILE_KEY.to_string()
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            key: default_key(),
            backend: Backend::default(),
            store_path: None,
        }
    }
}

impl ProfileConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read profile config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("invalid profile config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    /// Apply `PROFILE_KEYCHAIN_*` environment overrides on top of `self`.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(backend) = var(ENV_BACKEND) {
            self.backend = backend.parse()?;
        }
        if let Some(key) = var(ENV_KEY) {
            self.key = key;
        }
        if let Some(path) = var(ENV_STORE_PATH) {
            self.store_path = Some(PathBuf::from(path));
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        if self.key.trim().is_empty() {
            anyhow::bail!("profile key must not be empty");
        }
        Ok(())
    }

    /// Path of the encrypted file store.
    pub fn resolved_store_path(&self) -> PathBuf {
        self.store_path
            .clone()
            .unwrap_or_else(encrypted::default_store_path)
    }
}

/// Build the backend selected by `config`.
pub fn open_store(config: &ProfileConfig) -> Result<Box<dyn SecureStore>> {
    let store: Box<dyn SecureStore> = match config.backend {
        Backend::Keyring => Box::new(KeyringStore::new()),
        Backend::EncryptedFile => {
            let path = config.resolved_store_path();
            let store = EncryptedFileStore::open(&path)
                .with_context(|| format!("failed to open profile store {}", path.display()))?;
            Box::new(store)
        }
        Backend::Memory => Box::new(MemoryStore::new()),
    };
    tracing::debug!(backend = ?config.backend, key = %config.key, "Opened profile store");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_address_existing_profile_item() {
        let config = ProfileConfig::default();
        assert_eq!(config.key, "curentProfile");
        assert_eq!(config.backend, Backend::Keyring);
        assert!(config.store_path.is_none());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: ProfileConfig =
            serde_json::from_str(r#"{"backend":"encrypted-file"}"#).unwrap();
        assert_eq!(config.backend, Backend::EncryptedFile);
        assert_eq!(config.key, PROFILE_KEY);
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        std::fs::write(
            &path,
            r#"{"key":"other","backend":"memory","store_path":"/tmp/p.enc"}"#,
        )
        .unwrap();

        let config = ProfileConfig::load(&path).unwrap();
        assert_eq!(config.key, "other");
        assert_eq!(config.backend, Backend::Memory);
        assert_eq!(config.store_path, Some(PathBuf::from("/tmp/p.enc")));
    }

    #[test]
    fn load_rejects_accessibility_setting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        std::fs::write(
            &path,
            r#"{"accessibility":"when-passcode-set-this-device-only"}"#,
        )
        .unwrap();

        let err = ProfileConfig::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("accessibility"));
    }

    #[test]
    fn load_rejects_empty_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        std::fs::write(&path, r#"{"key":"  "}"#).unwrap();
        assert!(ProfileConfig::load(&path).is_err());
    }

    #[test]
    fn load_missing_file_names_path() {
        let err = ProfileConfig::load(Path::new("/nonexistent/profile.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/profile.json"));
    }

    #[test]
    fn env_overrides_apply() {
        let config = ProfileConfig::default()
            .with_overrides(env(&[
                (ENV_BACKEND, "file"),
                (ENV_KEY, "alt"),
                (ENV_STORE_PATH, "/tmp/x.enc"),
            ]))
            .unwrap();
        assert_eq!(config.backend, Backend::EncryptedFile);
        assert_eq!(config.key, "alt");
        assert_eq!(config.resolved_store_path(), PathBuf::from("/tmp/x.enc"));
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let result = ProfileConfig::default().with_overrides(env(&[(ENV_BACKEND, "cloud")]));
        assert!(result.is_err());
    }

    #[test]
    fn default_store_path_ends_with_store_file() {
        let path = ProfileConfig::default().resolved_store_path();
        assert!(path.ends_with(Path::new("profile-keychain").join(encrypted::STORE_FILE)));
    }

    #[test]
    fn open_memory_store() {
        let config = ProfileConfig {
            backend: Backend::Memory,
            ..Default::default()
        };
        let store = open_store(&config).unwrap();
        let query = crate::storage::Query::for_key(&config.key);
        assert!(store.lookup(&query).unwrap_err().is_not_found());
    }
}
