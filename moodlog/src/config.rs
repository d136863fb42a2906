//! Application configuration
//!
//! Central location for storage keys, file naming, validation boundaries
//! and the runtime `AppConfig` loaded from `config.json`.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ===== Persisted Keys =====

/// Key holding the JSON array of survey records
pub const SURVEY_DATA_KEY: &str = "survey_data";

/// Key holding the format version of `survey_data`
pub const SURVEY_DATA_VERSION_KEY: &str = "survey_data_version";

/// Key holding the notification schedule JSON object
pub const NOTIFICATION_SETTINGS_KEY: &str = "notification_settings";

// ===== File Layout =====

/// Application directory name under the platform data/cache dirs
pub const APP_DIR_NAME: &str = "moodlog";

/// Config file name inside the data directory
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Database file name inside the data directory
pub const DATABASE_FILE_NAME: &str = "moodlog.db";

/// Durable media directory name inside the data directory
pub const VIDEO_DIR_NAME: &str = "videos";

/// Manifest file name inside an export bundle
pub const EXPORT_MANIFEST_NAME: &str = "survey_data.json";

// ===== Validation Boundaries =====

/// Lowest mood rating
pub const MIN_MOOD: u8 = 1;

/// Highest mood rating
pub const MAX_MOOD: u8 = 5;

// ===== Reminder Content =====

pub const REMINDER_TITLE: &str = "Time to log your mood!";
pub const REMINDER_BODY: &str = "Take a moment to record how you are feeling right now.";

/// Remote mirror settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_remote_base_url")]
    pub base_url: String,
    /// Per-request timeout. `None` leaves requests unbounded.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_remote_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_remote_base_url(),
            timeout_secs: None,
        }
    }
}

/// Runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Durable app storage (database, videos)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Reclaimable storage (export bundles)
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    /// Destination for JSON-only exports
    #[serde(default = "default_documents_dir")]
    pub documents_dir: PathBuf,
    #[serde(default)]
    pub remote: RemoteConfig,
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
}

fn default_documents_dir() -> PathBuf {
    dirs::document_dir().unwrap_or_else(default_data_dir)
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            cache_dir: default_cache_dir(),
            documents_dir: default_documents_dir(),
            remote: RemoteConfig::default(),
        }
    }
}

impl AppConfig {
    /// Config rooted at explicit directories, remote mirror disabled.
    pub fn with_dirs(data_dir: PathBuf, cache_dir: PathBuf) -> Self {
        Self {
            documents_dir: data_dir.clone(),
            data_dir,
            cache_dir,
            remote: RemoteConfig::default(),
        }
    }

    /// Load config from `<data_dir>/config.json`, falling back to defaults
    /// when the file does not exist.
    pub fn load_or_default(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self {
                data_dir: data_dir.to_path_buf(),
                ..Self::default()
            });
        }

        let content = std::fs::read_to_string(&path)?;
        let mut config: Self = serde_json::from_str(&content)
            .map_err(|e| AppError::Generic(format!("Failed to parse config {:?}: {}", path, e)))?;
        config.data_dir = data_dir.to_path_buf();

        Ok(config)
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE_NAME)
    }

    pub fn video_dir(&self) -> PathBuf {
        self.data_dir.join(VIDEO_DIR_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let config = AppConfig::load_or_default(temp.path()).unwrap();

        assert_eq!(config.data_dir, temp.path());
        assert!(!config.remote.enabled);
        assert_eq!(config.remote.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.video_dir(), temp.path().join("videos"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            r#"{"remote": {"enabled": true, "base_url": "https://mood.example.com"}}"#,
        )
        .unwrap();

        let config = AppConfig::load_or_default(temp.path()).unwrap();

        assert!(config.remote.enabled);
        assert_eq!(config.remote.base_url, "https://mood.example.com");
        assert_eq!(config.remote.timeout_secs, None);
        assert_eq!(config.data_dir, temp.path());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE_NAME), "not json").unwrap();

        assert!(AppConfig::load_or_default(temp.path()).is_err());
    }
}
