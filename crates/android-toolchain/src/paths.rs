//! Tool Paths
//!
//! Locates the four command-line entry points inside an SDK root.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

/// Android command-line tools driven by AVD Pilot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AndroidTool {
    Emulator,
    Adb,
    AvdManager,
    SdkManager,
}

impl AndroidTool {
    /// Executable name without platform extension
    pub fn name(&self) -> &'static str {
        match self {
            AndroidTool::Emulator => "emulator",
            AndroidTool::Adb => "adb",
            AndroidTool::AvdManager => "avdmanager",
            AndroidTool::SdkManager => "sdkmanager",
        }
    }

    fn file_name(&self) -> String {
        if !cfg!(windows) {
            return self.name().to_string();
        }
        match self {
            AndroidTool::AvdManager | AndroidTool::SdkManager => format!("{}.bat", self.name()),
            _ => format!("{}.exe", self.name()),
        }
    }
}

impl std::fmt::Display for AndroidTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolved executable paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub emulator: PathBuf,
    pub adb: PathBuf,
    pub avdmanager: PathBuf,
    pub sdkmanager: PathBuf,
}

impl ToolPaths {
    /// Resolve paths under `sdk_root`, or from PATH when no SDK is known.
    pub fn resolve(sdk_root: Option<&Path>) -> Self {
        match sdk_root {
            Some(root) => Self::in_sdk(root),
            None => Self::from_search_path(),
        }
    }

    /// Paths inside an SDK root
    pub fn in_sdk(root: &Path) -> Self {
        Self {
            emulator: root.join("emulator").join(AndroidTool::Emulator.file_name()),
            adb: root.join("platform-tools").join(AndroidTool::Adb.file_name()),
            avdmanager: cmdline_tool(root, AndroidTool::AvdManager),
            sdkmanager: cmdline_tool(root, AndroidTool::SdkManager),
        }
    }

    /// Paths found on PATH, falling back to bare names
    pub fn from_search_path() -> Self {
        let find = |tool: AndroidTool| {
            which::which(tool.name()).unwrap_or_else(|_| PathBuf::from(tool.name()))
        };

        Self {
            emulator: find(AndroidTool::Emulator),
            adb: find(AndroidTool::Adb),
            avdmanager: find(AndroidTool::AvdManager),
            sdkmanager: find(AndroidTool::SdkManager),
        }
    }

    /// Path of a single tool
    pub fn path(&self, tool: AndroidTool) -> &Path {
        match tool {
            AndroidTool::Emulator => &self.emulator,
            AndroidTool::Adb => &self.adb,
            AndroidTool::AvdManager => &self.avdmanager,
            AndroidTool::SdkManager => &self.sdkmanager,
        }
    }

    /// Directories holding the tools, in lookup order
    pub fn tool_dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = Vec::new();
        for path in [&self.emulator, &self.adb, &self.avdmanager] {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                if !dirs.iter().any(|d| d == parent) {
                    dirs.push(parent.to_path_buf());
                }
            }
        }
        dirs
    }
}

/// Find a cmdline-tools executable.
///
/// Looks in `cmdline-tools/latest`, then any versioned `cmdline-tools/<v>`,
/// then the legacy `tools/bin`. Falls back to the `latest` path so the error
/// names a sensible location.
fn cmdline_tool(root: &Path, tool: AndroidTool) -> PathBuf {
    let exe = tool.file_name();
    let latest = root.join("cmdline-tools").join("latest").join("bin").join(&exe);
    if latest.exists() {
        return latest;
    }

    if let Ok(entries) = std::fs::read_dir(root.join("cmdline-tools")) {
        let mut versioned: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path().join("bin").join(&exe))
            .filter(|path| path.exists())
            .collect();
        versioned.sort();
        if let Some(path) = versioned.pop() {
            debug!("Using versioned {} at {:?}", tool, path);
            return path;
        }
    }

    let legacy = root.join("tools").join("bin").join(&exe);
    if legacy.exists() {
        return legacy;
    }

    latest
}
