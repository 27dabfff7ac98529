//! Android Emulator Bridge
//!
//! Device orchestration over the Android command-line tools: emulator
//! lifecycle, AVD management, device queries, the app launch workflow and
//! gesture injection. State is never cached; every call asks the tools.

pub mod adb;
pub mod avd;
pub mod device;
pub mod emulator;
pub mod gesture;
pub mod parsers;
pub mod runner;
pub mod system_images;
pub mod workflow;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

use std::sync::Arc;

use avd_pilot_android_toolchain::Toolchain;

pub use adb::{AdbClient, AdbError};
pub use avd::{AvdConfig, AvdError, AvdManager};
pub use device::{
    emulator_serial, DeviceInfo, EmulatorDescriptor, RunningInstance, ScreenGeometry,
    SdkPackageListing, StartOptions, SystemImagePackage, UNKNOWN,
};
pub use emulator::{ConsoleAction, EmulatorController, EmulatorError};
pub use gesture::{swipe_path, Direction, GestureError, GestureSynthesizer, SwipePath, SWIPE_DURATION_MS};
pub use runner::{Invocation, SystemRunner, ToolError, ToolOutput, ToolRunner};
pub use system_images::SdkManager;
pub use workflow::{AppLauncher, LaunchError, LaunchStep};

/// Every device operation behind one handle, sharing a single runner
#[derive(Clone)]
pub struct DeviceBridge {
    emulators: EmulatorController,
    avds: AvdManager,
    adb: AdbClient,
    sdk: SdkManager,
    launcher: AppLauncher,
    gestures: GestureSynthesizer,
}

impl DeviceBridge {
    pub fn new(runner: Arc<dyn ToolRunner>) -> Self {
        let emulators = EmulatorController::new(Arc::clone(&runner));
        let adb = AdbClient::new(Arc::clone(&runner));

        Self {
            launcher: AppLauncher::new(emulators.clone(), adb.clone()),
            gestures: GestureSynthesizer::new(adb.clone()),
            avds: AvdManager::new(Arc::clone(&runner)),
            sdk: SdkManager::new(runner),
            emulators,
            adb,
        }
    }

    /// Bridge that runs the real tools from `toolchain`
    pub fn system(toolchain: Toolchain) -> Self {
        Self::new(Arc::new(SystemRunner::new(toolchain)))
    }

    pub async fn list_configured(&self) -> Vec<EmulatorDescriptor> {
        self.avds.list_configured().await
    }

    pub async fn list_running(&self) -> Vec<RunningInstance> {
        self.emulators.list_running().await
    }

    pub async fn start_instance(&self, name: &str, options: &StartOptions) -> Result<String, EmulatorError> {
        self.emulators.start_instance(name, options).await
    }

    pub async fn stop_instance(&self, port: u16) -> Result<String, EmulatorError> {
        self.emulators.stop_instance(port).await
    }

    pub async fn fold_instance(&self, port: u16) -> Result<String, EmulatorError> {
        self.emulators.fold_instance(port).await
    }

    pub async fn unfold_instance(&self, port: u16) -> Result<String, EmulatorError> {
        self.emulators.unfold_instance(port).await
    }

    pub async fn create_avd(&self, config: &AvdConfig) -> Result<String, AvdError> {
        self.avds.create_avd(config).await
    }

    pub async fn delete_avd(&self, name: &str) -> Result<String, AvdError> {
        self.avds.delete_avd(name).await
    }

    pub async fn device_info(&self, port: u16) -> Result<DeviceInfo, AdbError> {
        self.adb.device_info(port).await
    }

    pub async fn list_system_images(&self) -> SdkPackageListing {
        self.sdk.list_system_images().await
    }

    pub async fn launch_application(&self, port: u16, package: &str) -> Result<String, LaunchError> {
        self.launcher.launch_application(port, package).await
    }

    pub async fn swipe(&self, port: u16, direction: &str) -> Result<SwipePath, GestureError> {
        self.gestures.swipe(port, direction).await
    }
}
