//! AVD (Android Virtual Device) Manager
//!
//! Lists, creates and deletes virtual devices through `avdmanager`.

use std::sync::Arc;

use avd_pilot_android_toolchain::AndroidTool;
use tracing::{info, warn};

use crate::device::EmulatorDescriptor;
use crate::parsers;
use crate::runner::{Invocation, ToolError, ToolRunner};

/// Answer to "Do you wish to create a custom hardware profile?"
const DECLINE_CUSTOM_PROFILE: &str = "no\n";

/// AVD Manager errors
#[derive(Debug, thiserror::Error)]
pub enum AvdError {
    #[error("Failed to create AVD {name}: {source}")]
    CreateFailed {
        name: String,
        #[source]
        source: ToolError,
    },
    #[error("Failed to delete AVD {name}: {source}")]
    DeleteFailed {
        name: String,
        #[source]
        source: ToolError,
    },
}

/// AVD configuration for creation
#[derive(Debug, Clone)]
pub struct AvdConfig {
    pub name: String,
    /// System image package, e.g. `system-images;android-34;google_apis;x86_64`
    pub package: String,
    /// Hardware profile id, e.g. `pixel_6`
    pub device: Option<String>,
}

impl AvdConfig {
    pub fn new(name: &str, package: &str) -> Self {
        Self {
            name: name.to_string(),
            package: package.to_string(),
            device: None,
        }
    }

    pub fn with_device(mut self, device: &str) -> Self {
        self.device = Some(device.to_string());
        self
    }

    fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "create".to_string(),
            "avd".to_string(),
            "-n".to_string(),
            self.name.clone(),
            "-k".to_string(),
            self.package.clone(),
        ];

        if let Some(ref device) = self.device {
            args.push("-d".to_string());
            args.push(device.clone());
        }

        args
    }
}

/// AVD Manager
#[derive(Clone)]
pub struct AvdManager {
    runner: Arc<dyn ToolRunner>,
}

impl AvdManager {
    pub fn new(runner: Arc<dyn ToolRunner>) -> Self {
        Self { runner }
    }

    /// Configured AVDs.
    ///
    /// A failing `avdmanager` is reported as nothing configured.
    pub async fn list_configured(&self) -> Vec<EmulatorDescriptor> {
        let invocation = Invocation::new(AndroidTool::AvdManager, ["list", "avd"]);

        match self.runner.run(&invocation).await {
            Ok(output) => parsers::parse_avd_list(&output),
            Err(e) => {
                warn!("Listing AVDs failed, reporting none: {}", e);
                Vec::new()
            }
        }
    }

    /// Create a new AVD.
    ///
    /// The package is not checked beforehand; avdmanager reports a missing
    /// image itself and that message is passed through.
    pub async fn create_avd(&self, config: &AvdConfig) -> Result<String, AvdError> {
        info!("Creating AVD {} from {}", config.name, config.package);

        let invocation =
            Invocation::new(AndroidTool::AvdManager, config.to_args()).with_stdin(DECLINE_CUSTOM_PROFILE);

        let output = self
            .runner
            .run(&invocation)
            .await
            .map_err(|source| AvdError::CreateFailed {
                name: config.name.clone(),
                source,
            })?;

        info!("AVD created: {}", config.name);
        Ok(format!("{}\nAVD '{}' created successfully", output.trim_end(), config.name))
    }

    /// Delete an AVD and its data
    pub async fn delete_avd(&self, name: &str) -> Result<String, AvdError> {
        info!("Deleting AVD: {}", name);

        let invocation = Invocation::new(AndroidTool::AvdManager, ["delete", "avd", "-n", name]);
        self.runner
            .run(&invocation)
            .await
            .map_err(|source| AvdError::DeleteFailed {
                name: name.to_string(),
                source,
            })?;

        Ok(format!("AVD '{}' deleted", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::UNKNOWN;
    use crate::testing::ScriptedRunner;

    #[test]
    fn test_create_args_without_device() {
        let config = AvdConfig::new("Test", "system-images;android-34;google_apis;x86_64");
        assert_eq!(
            config.to_args(),
            vec!["create", "avd", "-n", "Test", "-k", "system-images;android-34;google_apis;x86_64"]
        );
    }

    #[test]
    fn test_create_args_with_device() {
        let config = AvdConfig::new("Test", "system-images;android-34;google_apis;x86_64").with_device("pixel_6");
        let args = config.to_args();
        assert_eq!(&args[args.len() - 2..], ["-d", "pixel_6"]);
    }

    #[tokio::test]
    async fn test_create_returns_tool_output_and_answers_prompt() {
        let runner = Arc::new(ScriptedRunner::new().on(
            AndroidTool::AvdManager,
            "create avd",
            "[=======================================] 100% Fetch remote repository...\n",
        ));
        let manager = AvdManager::new(runner.clone());

        let message = manager
            .create_avd(&AvdConfig::new("Pixel_Test", "system-images;android-34;google_apis;x86_64"))
            .await
            .unwrap();

        assert!(message.starts_with("[="));
        assert!(message.ends_with("AVD 'Pixel_Test' created successfully"));
        assert_eq!(runner.calls()[0].stdin.as_deref(), Some("no\n"));
    }

    #[tokio::test]
    async fn test_create_forwards_tool_error() {
        let runner = Arc::new(ScriptedRunner::new().on_fail(
            AndroidTool::AvdManager,
            "create avd",
            "Error: Package path is not valid. Valid system image paths are:",
        ));
        let manager = AvdManager::new(runner);

        let err = manager
            .create_avd(&AvdConfig::new("Broken", "system-images;android-99;none;x86_64"))
            .await
            .unwrap_err();

        assert!(matches!(err, AvdError::CreateFailed { ref name, .. } if name == "Broken"));
        assert!(err.to_string().contains("Package path is not valid"));
    }

    #[tokio::test]
    async fn test_list_configured_parses_blocks() {
        let output = "Available Android Virtual Devices:\n    Name: Pixel_6\n  Device: pixel_6 (Google)\n    Path: /home/u/.android/avd/Pixel_6.avd\n  Target: Google APIs (Google Inc.)\n          Based on: Android 14.0 (UpsideDownCake) Tag/ABI: google_apis/x86_64\n---------\n    Name: Bare\n";
        let runner = Arc::new(ScriptedRunner::new().on(AndroidTool::AvdManager, "list avd", output));
        let manager = AvdManager::new(runner);

        let avds = manager.list_configured().await;
        assert_eq!(avds.len(), 2);
        assert_eq!(avds[0].name, "Pixel_6");
        assert_eq!(avds[0].target, "Google APIs (Google Inc.)");
        assert_eq!(avds[1].target, UNKNOWN);
        assert_eq!(avds[1].abi, UNKNOWN);
    }

    #[tokio::test]
    async fn test_list_configured_swallows_failure() {
        let runner = Arc::new(ScriptedRunner::new().on_fail(
            AndroidTool::AvdManager,
            "list avd",
            "JAVA_HOME is not set",
        ));
        let manager = AvdManager::new(runner);

        assert!(manager.list_configured().await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_failure_names_avd() {
        let runner = Arc::new(ScriptedRunner::new().on_fail(
            AndroidTool::AvdManager,
            "delete avd",
            "Error: There is no Android Virtual Device named 'Ghost'.",
        ));
        let manager = AvdManager::new(runner);

        let err = manager.delete_avd("Ghost").await.unwrap_err();
        assert!(err.to_string().contains("Ghost"));
    }
}
