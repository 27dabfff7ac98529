//! Environment Manager
//!
//! Builds the environment handed to every Android tool invocation.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::debug;

use crate::paths::ToolPaths;

/// Environment configuration
#[derive(Debug, Clone, Default)]
pub struct EnvironmentConfig {
    /// ANDROID_HOME / ANDROID_SDK_ROOT
    pub android_home: Option<PathBuf>,
    /// ANDROID_AVD_HOME
    pub avd_home: Option<PathBuf>,
    /// JAVA_HOME
    pub java_home: Option<PathBuf>,
    /// Additional PATH entries
    pub path_additions: Vec<PathBuf>,
}

impl EnvironmentConfig {
    /// Create from configured locations
    pub fn new(
        android_home: Option<PathBuf>,
        avd_home: Option<PathBuf>,
        java_home: Option<PathBuf>,
    ) -> Self {
        Self {
            android_home,
            avd_home,
            java_home,
            ..Default::default()
        }
    }

    /// Prepend the SDK tool directories and the JDK bin directory to PATH
    pub fn with_sdk_tool_dirs(mut self) -> Self {
        let mut additions = Vec::new();

        if let Some(ref sdk) = self.android_home {
            additions.extend(ToolPaths::in_sdk(sdk).tool_dirs());
        }

        if let Some(ref jdk) = self.java_home {
            additions.push(jdk.join("bin"));
        }

        for path in std::mem::take(&mut self.path_additions) {
            if !additions.contains(&path) {
                additions.push(path);
            }
        }

        self.path_additions = additions;
        self
    }
}

/// Environment Manager
#[derive(Debug, Clone)]
pub struct EnvManager {
    config: EnvironmentConfig,
    original_path: String,
}

impl EnvManager {
    /// Create a new environment manager over the current process PATH
    pub fn new(config: EnvironmentConfig) -> Self {
        let original_path = std::env::var("PATH")
            .or_else(|_| std::env::var("Path"))
            .unwrap_or_default();

        Self::with_base_path(config, original_path)
    }

    /// Create with an explicit base PATH
    pub fn with_base_path(config: EnvironmentConfig, original_path: impl Into<String>) -> Self {
        Self {
            config,
            original_path: original_path.into(),
        }
    }

    /// Get environment variables to set
    pub fn get_env_vars(&self) -> HashMap<String, String> {
        let mut vars = HashMap::new();

        if let Some(ref path) = self.config.android_home {
            let path_str = path.to_string_lossy().to_string();
            vars.insert("ANDROID_HOME".to_string(), path_str.clone());
            vars.insert("ANDROID_SDK_ROOT".to_string(), path_str);
        }

        if let Some(ref path) = self.config.avd_home {
            vars.insert("ANDROID_AVD_HOME".to_string(), path.to_string_lossy().to_string());
        }

        if let Some(ref path) = self.config.java_home {
            vars.insert("JAVA_HOME".to_string(), path.to_string_lossy().to_string());
        }

        vars
    }

    /// Get PATH value including additions
    pub fn get_path(&self) -> String {
        let path_sep = if cfg!(windows) { ";" } else { ":" };

        if self.config.path_additions.is_empty() {
            return self.original_path.clone();
        }

        let additions: Vec<String> = self
            .config
            .path_additions
            .iter()
            .map(|p| p.to_string_lossy().to_string())
            .collect();

        if self.original_path.is_empty() {
            additions.join(path_sep)
        } else {
            format!("{}{}{}", additions.join(path_sep), path_sep, self.original_path)
        }
    }

    /// Full environment for a child process
    pub fn command_env(&self) -> HashMap<String, String> {
        let mut env = self.get_env_vars();
        let path_key = if cfg!(windows) { "Path" } else { "PATH" };
        env.insert(path_key.to_string(), self.get_path());
        debug!("Tool environment has {} variables", env.len());
        env
    }

    /// Check which parts of the environment exist on disk
    pub fn validate(&self, paths: &ToolPaths) -> EnvironmentValidation {
        EnvironmentValidation {
            sdk_valid: self.config.android_home.as_ref().map(|p| p.exists()).unwrap_or(false),
            emulator_available: paths.emulator.exists(),
            adb_available: paths.adb.exists(),
            avdmanager_available: paths.avdmanager.exists(),
            sdkmanager_available: paths.sdkmanager.exists(),
        }
    }
}

/// Environment validation result
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EnvironmentValidation {
    pub sdk_valid: bool,
    pub emulator_available: bool,
    pub adb_available: bool,
    pub avdmanager_available: bool,
    pub sdkmanager_available: bool,
}

impl EnvironmentValidation {
    /// Check if every tool is reachable
    pub fn is_ready(&self) -> bool {
        self.emulator_available
            && self.adb_available
            && self.avdmanager_available
            && self.sdkmanager_available
    }

    /// Get list of missing components
    pub fn missing_components(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();

        if !self.sdk_valid {
            missing.push("Android SDK");
        }
        if !self.emulator_available {
            missing.push("emulator");
        }
        if !self.adb_available {
            missing.push("ADB (platform-tools)");
        }
        if !self.avdmanager_available {
            missing.push("avdmanager (cmdline-tools)");
        }
        if !self.sdkmanager_available {
            missing.push("sdkmanager (cmdline-tools)");
        }

        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_config() {
        let config = EnvironmentConfig {
            android_home: Some(PathBuf::from("/android/sdk")),
            avd_home: Some(PathBuf::from("/avd")),
            java_home: Some(PathBuf::from("/java/jdk")),
            ..Default::default()
        };

        let env = EnvManager::with_base_path(config, "/usr/bin");
        let vars = env.get_env_vars();

        assert_eq!(vars.get("ANDROID_HOME").map(String::as_str), Some("/android/sdk"));
        assert_eq!(vars.get("ANDROID_SDK_ROOT").map(String::as_str), Some("/android/sdk"));
        assert_eq!(vars.get("ANDROID_AVD_HOME").map(String::as_str), Some("/avd"));
        assert!(vars.contains_key("JAVA_HOME"));
    }

    #[cfg(unix)]
    #[test]
    fn test_path_is_prefixed_with_tool_dirs() {
        let config = EnvironmentConfig::new(Some(PathBuf::from("/sdk")), None, None)
            .with_sdk_tool_dirs();
        let env = EnvManager::with_base_path(config, "/usr/bin");

        let path = env.get_path();
        assert!(path.starts_with("/sdk/emulator:/sdk/platform-tools:"));
        assert!(path.ends_with(":/usr/bin"));
        assert_eq!(env.command_env().get("PATH"), Some(&path));
    }

    #[test]
    fn test_no_additions_keeps_original_path() {
        let env = EnvManager::with_base_path(EnvironmentConfig::default(), "/bin");
        assert_eq!(env.get_path(), "/bin");
        assert!(env.get_env_vars().is_empty());
    }

    #[test]
    fn test_validation() {
        let validation = EnvironmentValidation {
            sdk_valid: true,
            emulator_available: true,
            adb_available: true,
            avdmanager_available: false,
            sdkmanager_available: true,
        };

        assert!(!validation.is_ready());
        assert_eq!(validation.missing_components(), vec!["avdmanager (cmdline-tools)"]);
    }
}
