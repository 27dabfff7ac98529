//! System image reporting via `sdkmanager --list`

use std::sync::Arc;

use avd_pilot_android_toolchain::AndroidTool;
use tracing::warn;

use crate::device::{SdkPackageListing, SystemImagePackage};
use crate::parsers;
use crate::runner::{Invocation, ToolRunner};

/// Read-only view of the SDK package manager
#[derive(Clone)]
pub struct SdkManager {
    runner: Arc<dyn ToolRunner>,
}

impl SdkManager {
    pub fn new(runner: Arc<dyn ToolRunner>) -> Self {
        Self { runner }
    }

    /// All installed and available SDK packages.
    ///
    /// A failing `sdkmanager` is reported as an empty listing.
    pub async fn list_packages(&self) -> SdkPackageListing {
        let invocation = Invocation::new(AndroidTool::SdkManager, ["--list"]);

        match self.runner.run(&invocation).await {
            Ok(output) => parsers::parse_sdk_list(&output),
            Err(e) => {
                warn!("Listing SDK packages failed, reporting none: {}", e);
                SdkPackageListing::default()
            }
        }
    }

    /// Installed and available system images only
    pub async fn list_system_images(&self) -> SdkPackageListing {
        self.list_packages()
            .await
            .retain(SystemImagePackage::is_system_image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedRunner;

    const SDK_LIST: &str = "\
[=======================================] 100% Computing updates...
Installed packages:
  Path                                        | Version | Description                                | Location
  -------                                     | ------- | -------                                    | -------
  emulator                                    | 34.1.19 | Android Emulator                           | emulator
  system-images;android-34;google_apis;x86_64 | 12      | Google APIs Intel x86_64 Atom System Image | system-images/android-34/google_apis/x86_64

Available Packages:
  Path                                                  | Version | Description
  -------                                               | ------- | -------
  platform-tools                                        | 35.0.1  | Android SDK Platform-Tools
  system-images;android-35;google_apis_playstore;x86_64 | 9       | Google Play Intel x86_64 Atom System Image

Available Updates:
  ID                                          | Installed | Available
  -------                                     | -------   | -------
  system-images;android-34;google_apis;x86_64 | 12        | 13
";

    #[tokio::test]
    async fn test_system_images_are_classified_by_section() {
        let runner = Arc::new(ScriptedRunner::new().on(AndroidTool::SdkManager, "--list", SDK_LIST));
        let sdk = SdkManager::new(runner);

        let images = sdk.list_system_images().await;

        assert_eq!(images.installed.len(), 1);
        assert!(images.installed[0].installed);
        assert_eq!(images.installed[0].version, "12");

        assert_eq!(images.available.len(), 1);
        assert_eq!(
            images.available[0].path,
            "system-images;android-35;google_apis_playstore;x86_64"
        );
        assert!(!images.available[0].installed);
    }

    #[tokio::test]
    async fn test_full_listing_keeps_other_packages() {
        let runner = Arc::new(ScriptedRunner::new().on(AndroidTool::SdkManager, "--list", SDK_LIST));
        let sdk = SdkManager::new(runner);

        let listing = sdk.list_packages().await;
        assert_eq!(listing.installed.len(), 2);
        assert_eq!(listing.available.len(), 2);
    }

    #[tokio::test]
    async fn test_failure_yields_empty_listing() {
        let runner = Arc::new(ScriptedRunner::new().on_fail(
            AndroidTool::SdkManager,
            "--list",
            "Error: Could not find or load main class",
        ));
        let sdk = SdkManager::new(runner);

        assert!(sdk.list_system_images().await.is_empty());
    }
}
