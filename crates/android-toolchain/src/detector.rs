//! Toolchain Detection
//!
//! Finds an Android SDK root from configuration, the environment, or the
//! usual install locations.

use std::env;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

/// Toolchain detection errors
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("SDK not found")]
    SdkNotFound,
    #[error("Invalid installation: {0}")]
    InvalidInstallation(String),
}

/// Toolchain detector
pub struct ToolchainDetector;

impl ToolchainDetector {
    /// Detect the Android SDK root.
    ///
    /// A configured path is authoritative: it is returned if it looks like an
    /// SDK and rejected otherwise, without falling back to other candidates.
    pub fn detect_sdk(configured: Option<PathBuf>) -> Result<PathBuf, DetectionError> {
        if let Some(path) = configured {
            return if Self::is_valid_sdk(&path) {
                debug!("Using configured Android SDK at {:?}", path);
                Ok(path)
            } else {
                Err(DetectionError::InvalidInstallation(format!(
                    "{} does not contain emulator, platform-tools or cmdline-tools",
                    path.display()
                )))
            };
        }

        for path in Self::sdk_candidates() {
            if Self::is_valid_sdk(&path) {
                info!("Found Android SDK at {:?}", path);
                return Ok(path);
            }
        }

        Err(DetectionError::SdkNotFound)
    }

    /// Get SDK path candidates
    fn sdk_candidates() -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        if let Ok(android_home) = env::var("ANDROID_HOME") {
            candidates.push(PathBuf::from(android_home));
        }
        if let Ok(sdk_root) = env::var("ANDROID_SDK_ROOT") {
            candidates.push(PathBuf::from(sdk_root));
        }

        if cfg!(windows) {
            if let Some(local) = dirs::data_local_dir() {
                candidates.push(local.join("Android").join("Sdk"));
            }
            candidates.push(PathBuf::from(r"C:\Android\sdk"));
        }

        if cfg!(target_os = "macos") {
            if let Some(home) = dirs::home_dir() {
                candidates.push(home.join("Library").join("Android").join("sdk"));
            }
        }

        if cfg!(unix) {
            if let Some(home) = dirs::home_dir() {
                candidates.push(home.join("Android").join("Sdk"));
                candidates.push(home.join("android-sdk"));
            }
            candidates.push(PathBuf::from("/opt/android-sdk"));
            candidates.push(PathBuf::from("/usr/local/android-sdk"));
        }

        candidates
    }

    /// Check if a path contains an SDK with at least one tool directory
    pub fn is_valid_sdk(path: &Path) -> bool {
        if !path.is_dir() {
            return false;
        }

        ["emulator", "platform-tools", "cmdline-tools"]
            .iter()
            .any(|dir| path.join(dir).is_dir())
    }
}
