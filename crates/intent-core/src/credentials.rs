//! Credential storage for the model API key.

use std::env;
use std::fs;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::errors::IntentError;

/// Environment override consulted before any stored credential.
pub const API_KEY_ENV: &str = "VOICEPILOT_API_KEY";

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// The stored key, or `None`. Absence is a typed condition for the
    /// caller ([`IntentError::MissingCredential`]), not a failure here.
    async fn get(&self) -> Option<String>;

    async fn set(&self, key: &str) -> Result<(), IntentError>;
}

/// File-backed store under the platform config directory, with the
/// environment variable taking precedence.
pub struct FileCredentialStore {
    path: PathBuf,
    env_key: String,
}

impl FileCredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            env_key: API_KEY_ENV.to_string(),
        }
    }

    /// Override the environment variable consulted before the file.
    pub fn with_env_key(mut self, env_key: impl Into<String>) -> Self {
        self.env_key = env_key.into();
        self
    }

    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("voicepilot")
            .join("api-key")
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl Default for FileCredentialStore {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn get(&self) -> Option<String> {
        if let Ok(key) = env::var(&self.env_key) {
            let trimmed = key.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }

        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let trimmed = contents.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Err(_) => {
                debug!(target: "intent-core", path = %self.path.display(), "no stored credential");
                None
            }
        }
    }

    async fn set(&self, key: &str) -> Result<(), IntentError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| IntentError::Store(err.to_string()))?;
        }
        fs::write(&self.path, key.trim()).map_err(|err| IntentError::Store(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn isolated(path: PathBuf, env_key: &str) -> FileCredentialStore {
        FileCredentialStore::new(path).with_env_key(env_key)
    }

    #[tokio::test]
    async fn round_trips_through_file() {
        let dir = tempdir().unwrap();
        let store = isolated(
            dir.path().join("nested").join("api-key"),
            "VOICEPILOT_TEST_KEY_UNSET_A",
        );
        assert!(store.get().await.is_none());
        store.set("  secret-key \n").await.unwrap();
        assert_eq!(store.get().await.as_deref(), Some("secret-key"));
    }

    #[tokio::test]
    async fn env_override_wins() {
        let dir = tempdir().unwrap();
        let store = isolated(dir.path().join("api-key"), "VOICEPILOT_TEST_KEY_SET");
        store.set("file-key").await.unwrap();

        env::set_var("VOICEPILOT_TEST_KEY_SET", "env-key");
        let got = store.get().await;
        env::remove_var("VOICEPILOT_TEST_KEY_SET");
        assert_eq!(got.as_deref(), Some("env-key"));
    }

    #[tokio::test]
    async fn blank_file_counts_as_absent() {
        let dir = tempdir().unwrap();
        let store = isolated(dir.path().join("api-key"), "VOICEPILOT_TEST_KEY_UNSET_B");
        store.set("   ").await.unwrap();
        assert!(store.get().await.is_none());
    }
}
