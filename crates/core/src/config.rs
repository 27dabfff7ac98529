//! Application Configuration
//!
//! Manages the settings AVD Pilot needs at startup:
//! - Android SDK, AVD home, and JDK locations
//! - Model-serving API endpoint and default model
//! - Log level

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{PilotError, Result};

/// Default endpoint of the local model-serving API
pub const DEFAULT_MODEL_URL: &str = "http://localhost:11434";

/// Android SDK configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AndroidConfig {
    /// Path to Android SDK
    pub sdk_path: Option<PathBuf>,
    /// Directory holding AVD definitions (ANDROID_AVD_HOME)
    pub avd_home: Option<PathBuf>,
    /// Path to JDK, needed by avdmanager and sdkmanager
    pub java_home: Option<PathBuf>,
}

/// Model-serving API configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ModelConfig {
    /// Base URL of the API
    pub base_url: String,
    /// Model used when a request does not name one
    pub default_model: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_MODEL_URL.to_string(),
            default_model: "llama3".to_string(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Android SDK settings
    pub android: AndroidConfig,
    /// Model-serving API settings
    pub model: ModelConfig,
    /// Log filter used when RUST_LOG is unset
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            android: AndroidConfig::default(),
            model: ModelConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Get the configuration directory path
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "avdpilot", "AVD-Pilot")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the configuration file path
    pub fn config_file() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the platform config file is
    /// used when present and defaults otherwise. Environment overrides are
    /// applied last in both cases.
    pub async fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(PilotError::ConfigNotFound(path.to_path_buf()));
                }
                Self::load_from(path).await?
            }
            None => match Self::config_file() {
                Some(path) if path.exists() => Self::load_from(&path).await?,
                _ => {
                    info!("Config file not found, using defaults");
                    AppConfig::default()
                }
            },
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a specific file
    pub async fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", path);
        let contents = tokio::fs::read_to_string(path).await?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Fill unset values from the environment.
    ///
    /// `ANDROID_HOME` wins over `ANDROID_SDK_ROOT`; both only apply when the
    /// file did not name an SDK. `OLLAMA_HOST` replaces the model URL.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if self.android.sdk_path.is_none() {
            self.android.sdk_path = non_empty("ANDROID_HOME")
                .or_else(|| non_empty("ANDROID_SDK_ROOT"))
                .map(PathBuf::from);
        }

        if self.android.avd_home.is_none() {
            self.android.avd_home = non_empty("ANDROID_AVD_HOME").map(PathBuf::from);
        }

        if self.android.java_home.is_none() {
            self.android.java_home = non_empty("JAVA_HOME").map(PathBuf::from);
        }

        if let Some(host) = non_empty("OLLAMA_HOST") {
            self.model.base_url = if host.starts_with("http://") || host.starts_with("https://") {
                host
            } else {
                format!("http://{}", host)
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.model.base_url, DEFAULT_MODEL_URL);
        assert_eq!(config.log_level, "info");
        assert!(config.android.sdk_path.is_none());
    }

    #[test]
    fn test_env_overrides_fill_missing_values() {
        let env: HashMap<&str, &str> = [
            ("ANDROID_SDK_ROOT", "/opt/sdk-root"),
            ("ANDROID_HOME", "/opt/android"),
            ("OLLAMA_HOST", "10.0.0.2:11434"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.android.sdk_path, Some(PathBuf::from("/opt/android")));
        assert_eq!(config.model.base_url, "http://10.0.0.2:11434");
    }

    #[test]
    fn test_env_does_not_replace_file_sdk_path() {
        let mut config = AppConfig::default();
        config.android.sdk_path = Some(PathBuf::from("/from/file"));
        config.apply_env_overrides(|key| (key == "ANDROID_HOME").then(|| "/from/env".to_string()));

        assert_eq!(config.android.sdk_path, Some(PathBuf::from("/from/file")));
    }

    #[tokio::test]
    async fn test_explicit_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        tokio::fs::write(&path, "log_level = \"debug\"\n\n[android]\nsdk_path = \"/sdk\"\n")
            .await
            .unwrap();

        let loaded = AppConfig::load(Some(&path)).await.unwrap();
        assert_eq!(loaded.log_level, "debug");
        assert_eq!(loaded.android.sdk_path, Some(PathBuf::from("/sdk")));
    }

    #[tokio::test]
    async fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        tokio::fs::write(&path, "[model]\ndefault_model = \"phi3\"\n").await.unwrap();

        let loaded = AppConfig::load_from(&path).await.unwrap();
        assert_eq!(loaded.model.default_model, "phi3");
        assert_eq!(loaded.model.base_url, DEFAULT_MODEL_URL);
        assert_eq!(loaded.log_level, "info");
    }

    #[tokio::test]
    async fn test_explicit_missing_path_is_an_error() {
        let err = AppConfig::load(Some(Path::new("/definitely/not/here.toml")))
            .await
            .unwrap_err();
        assert!(matches!(err, PilotError::ConfigNotFound(_)));
    }
}
