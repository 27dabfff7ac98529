//! ADB (Android Debug Bridge) Client
//!
//! Device-scoped commands against emulators, addressed by console port.

use std::sync::Arc;

use avd_pilot_android_toolchain::AndroidTool;
use tracing::debug;

use crate::device::{emulator_serial, DeviceInfo, ScreenGeometry};
use crate::parsers::{self, EmulatorEntry};
use crate::runner::{Invocation, ToolError, ToolRunner};

/// Density Android treats as one device pixel per logical pixel
const BASELINE_DENSITY: f64 = 160.0;

/// ADB errors
#[derive(Debug, thiserror::Error)]
pub enum AdbError {
    #[error("Failed to query device on port {port}: {source}")]
    Query {
        port: u16,
        #[source]
        source: ToolError,
    },
}

/// ADB Client
#[derive(Clone)]
pub struct AdbClient {
    runner: Arc<dyn ToolRunner>,
}

impl AdbClient {
    /// Create a new ADB client
    pub fn new(runner: Arc<dyn ToolRunner>) -> Self {
        Self { runner }
    }

    /// Run an ADB command
    async fn run(&self, args: Vec<String>) -> Result<String, ToolError> {
        self.runner.run(&Invocation::new(AndroidTool::Adb, args)).await
    }

    /// Run an ADB command for the emulator on `port`
    async fn run_for_device(&self, port: u16, args: &[&str]) -> Result<String, ToolError> {
        let mut full_args = vec!["-s".to_string(), emulator_serial(port)];
        full_args.extend(args.iter().map(|a| a.to_string()));
        self.run(full_args).await
    }

    /// Emulator lines from `adb devices`
    pub async fn list_emulators(&self) -> Result<Vec<EmulatorEntry>, ToolError> {
        let output = self.run(vec!["devices".to_string()]).await?;
        Ok(parsers::parse_adb_devices(&output))
    }

    /// Send an emulator console command (`adb emu ...`).
    ///
    /// The console answers `KO: ...` with a zero exit status when it rejects
    /// a command; that is reported as a failure too.
    pub async fn emu(&self, port: u16, command: &[&str]) -> Result<String, ToolError> {
        let mut args = vec!["emu"];
        args.extend_from_slice(command);

        let output = self.run_for_device(port, &args).await?;
        match parsers::console_rejection(&output) {
            Some(rejection) => {
                let serial = emulator_serial(port);
                let mut full = vec!["-s", serial.as_str()];
                full.extend_from_slice(&args);
                Err(Invocation::new(AndroidTool::Adb, full).failure(rejection))
            }
            None => Ok(output),
        }
    }

    /// AVD name reported by the emulator console
    pub async fn avd_name(&self, port: u16) -> Option<String> {
        match self.emu(port, &["avd", "name"]).await {
            Ok(output) => parsers::parse_avd_name(&output),
            Err(e) => {
                debug!("Could not read AVD name on port {}: {}", port, e);
                None
            }
        }
    }

    /// Run a shell command on the emulator
    pub async fn shell(&self, port: u16, args: &[&str]) -> Result<String, ToolError> {
        let mut full_args = vec!["shell"];
        full_args.extend_from_slice(args);
        self.run_for_device(port, &full_args).await
    }

    /// Read build and product properties
    pub async fn device_info(&self, port: u16) -> Result<DeviceInfo, AdbError> {
        let output = self
            .shell(port, &["getprop"])
            .await
            .map_err(|source| AdbError::Query { port, source })?;

        Ok(parsers::parse_device_info(port, &output))
    }

    /// Current screen size and density.
    ///
    /// `Ok(None)` means `wm size` ran but printed nothing recognizable. An
    /// unreadable density falls back to a scale of 1.0.
    pub async fn screen_geometry(&self, port: u16) -> Result<Option<ScreenGeometry>, ToolError> {
        let size = self.shell(port, &["wm", "size"]).await?;
        let Some((width, height)) = parsers::parse_wm_size(&size) else {
            return Ok(None);
        };

        let scale = match self.shell(port, &["wm", "density"]).await {
            Ok(output) => parsers::parse_wm_density(&output)
                .map(|dpi| f64::from(dpi) / BASELINE_DENSITY)
                .unwrap_or(1.0),
            Err(e) => {
                debug!("Density unavailable on port {}: {}", port, e);
                1.0
            }
        };

        Ok(Some(ScreenGeometry { width, height, scale }))
    }

    /// Inject a swipe between two points
    pub async fn input_swipe(
        &self,
        port: u16,
        from: (u32, u32),
        to: (u32, u32),
        duration_ms: u32,
    ) -> Result<(), ToolError> {
        let coords = [from.0, from.1, to.0, to.1, duration_ms].map(|n| n.to_string());
        let mut args = vec!["input", "swipe"];
        args.extend(coords.iter().map(String::as_str));

        self.shell(port, &args).await?;
        Ok(())
    }

    /// Installed packages whose name contains `filter`
    pub async fn installed_packages(&self, port: u16, filter: &str) -> Result<Vec<String>, ToolError> {
        let output = self.shell(port, &["pm", "list", "packages", filter]).await?;
        Ok(parsers::parse_package_list(&output))
    }

    /// Launcher component of `package`, if it has one
    pub async fn resolve_activity(&self, port: u16, package: &str) -> Result<Option<String>, ToolError> {
        let output = self
            .shell(port, &["cmd", "package", "resolve-activity", "--brief", package])
            .await?;
        Ok(parsers::parse_resolved_activity(&output))
    }

    /// Launch an activity
    pub async fn start_activity(&self, port: u16, component: &str) -> Result<String, ToolError> {
        let args = ["am", "start", "-n", component];
        let output = self.shell(port, &args).await?;

        match parsers::activity_start_error(&output) {
            Some(error) => {
                let serial = emulator_serial(port);
                let mut full = vec!["-s", serial.as_str(), "shell"];
                full.extend_from_slice(&args);
                Err(Invocation::new(AndroidTool::Adb, full).failure(error))
            }
            None => Ok(output),
        }
    }
}
