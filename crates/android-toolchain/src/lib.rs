//! Android Toolchain Resolution
//!
//! Works out where the Android command-line tools live and what environment
//! they need:
//! - Android SDK root detection
//! - Paths to emulator, adb, avdmanager and sdkmanager
//! - PATH and home-directory variables for child processes

pub mod detector;
pub mod env;
pub mod paths;

use tracing::warn;

pub use detector::{DetectionError, ToolchainDetector};
pub use env::{EnvManager, EnvironmentConfig, EnvironmentValidation};
pub use paths::{AndroidTool, ToolPaths};

/// Everything a command runner needs to invoke an Android tool
#[derive(Debug, Clone)]
pub struct Toolchain {
    pub paths: ToolPaths,
    pub env: EnvManager,
}

impl Toolchain {
    /// Resolve tool paths and environment from the configured locations.
    ///
    /// A missing SDK is not an error here: tools then resolve through PATH and
    /// any failure surfaces when a command is actually run.
    pub fn resolve(config: EnvironmentConfig) -> Self {
        let sdk = match ToolchainDetector::detect_sdk(config.android_home.clone()) {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Android SDK unavailable ({}), resolving tools from PATH", e);
                None
            }
        };
        let config = EnvironmentConfig {
            android_home: sdk.clone(),
            ..config
        };
        let paths = ToolPaths::resolve(sdk.as_deref());
        let env = EnvManager::new(config.with_sdk_tool_dirs());
        let toolchain = Self { paths, env };

        let validation = toolchain.validate();
        if !validation.is_ready() {
            warn!(
                missing = ?validation.missing_components(),
                "Android toolchain incomplete; commands using missing tools will fail"
            );
        }

        toolchain
    }

    /// Check which tools exist on disk
    pub fn validate(&self) -> EnvironmentValidation {
        self.env.validate(&self.paths)
    }
}
