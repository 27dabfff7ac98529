//! Device Types
//!
//! Typed records produced from tool output. None of these are cached; each
//! is a snapshot of what the tools reported at query time.

use serde::{Deserialize, Serialize};

/// Placeholder for a field the tool output did not contain
pub const UNKNOWN: &str = "Unknown";

/// ADB serial of the emulator listening on a console port
pub fn emulator_serial(port: u16) -> String {
    format!("emulator-{}", port)
}

/// A configured virtual device, running or not
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmulatorDescriptor {
    pub name: String,
    pub target: String,
    /// Mirrors `target`; kept as its own field for callers that ask for it
    pub sdk: String,
    pub abi: String,
}

/// A live emulator, identified by its console port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningInstance {
    /// AVD name reported by the emulator console
    pub name: String,
    pub port: u16,
    pub serial: String,
    /// ADB state, e.g. `device` or `offline` while booting
    pub state: String,
}

/// Point-in-time properties of a running emulator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub port: u16,
    pub android_version: String,
    pub api_level: String,
    pub model: String,
    pub manufacturer: String,
    pub abi: String,
}

/// Emulator start options. Flags are only passed when set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartOptions {
    /// Skip the quick-boot snapshot
    pub cold_boot: bool,
    /// Reset user data
    pub wipe_data: bool,
    /// GPU mode (auto, host, swiftshader_indirect, ...)
    pub gpu_mode: Option<String>,
    /// Console port
    pub port: Option<u16>,
}

impl StartOptions {
    /// Convert to command line arguments
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.cold_boot {
            args.push("-no-snapshot-load".to_string());
        }

        if self.wipe_data {
            args.push("-wipe-data".to_string());
        }

        if let Some(ref gpu) = self.gpu_mode {
            args.push("-gpu".to_string());
            args.push(gpu.clone());
        }

        if let Some(port) = self.port {
            args.push("-port".to_string());
            args.push(port.to_string());
        }

        args
    }
}

/// An SDK package row from sdkmanager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemImagePackage {
    /// Package path, e.g. `system-images;android-34;google_apis;x86_64`
    pub path: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Set from the section the row appeared in
    pub installed: bool,
}

impl SystemImagePackage {
    pub fn is_system_image(&self) -> bool {
        self.path.starts_with("system-images;")
    }
}

/// Installed and available packages from one sdkmanager listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkPackageListing {
    pub installed: Vec<SystemImagePackage>,
    pub available: Vec<SystemImagePackage>,
}

impl SdkPackageListing {
    /// Keep only packages matching `keep` in both sections
    pub fn retain<F>(mut self, keep: F) -> Self
    where
        F: Fn(&SystemImagePackage) -> bool,
    {
        self.installed.retain(&keep);
        self.available.retain(&keep);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.installed.is_empty() && self.available.is_empty()
    }
}

/// Screen size in device pixels plus the density scale factor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenGeometry {
    pub width: u32,
    pub height: u32,
    /// Device pixels per logical pixel (density / 160)
    pub scale: f64,
}

impl ScreenGeometry {
    pub fn center(&self) -> (u32, u32) {
        (self.width / 2, self.height / 2)
    }
}
