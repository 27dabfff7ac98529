//! Application launch workflow
//!
//! Four dependent steps, each a precondition for the next:
//!
//! 1. the emulator on the port is running
//! 2. the package is installed on it
//! 3. the package has a launchable entry point
//! 4. `am start` on that entry point succeeds
//!
//! The first failing step ends the workflow. Nothing is retried and nothing
//! is rolled back; steps 1 to 3 only read.

use std::fmt;

use tracing::{debug, info};

use crate::adb::AdbClient;
use crate::emulator::EmulatorController;
use crate::runner::ToolError;

/// Read-only steps that can fail on the tool itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchStep {
    PackageLookup,
    EntryPointLookup,
}

impl fmt::Display for LaunchStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchStep::PackageLookup => f.write_str("look up installed packages"),
            LaunchStep::EntryPointLookup => f.write_str("resolve entry point"),
        }
    }
}

/// Launch errors, one per step
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("No emulator is running on port {port}")]
    NotRunning { port: u16 },
    #[error("Package {package} is not installed on the emulator on port {port}")]
    PackageNotInstalled { package: String, port: u16 },
    #[error("Could not resolve a launchable activity for {package}")]
    EntryPointUnresolved { package: String },
    #[error("Failed to start {component}: {message}")]
    StartFailed { component: String, message: String },
    #[error("Failed to {step} on port {port}: {source}")]
    Query {
        port: u16,
        step: LaunchStep,
        #[source]
        source: ToolError,
    },
}

/// Runs the launch workflow against one emulator at a time
#[derive(Clone)]
pub struct AppLauncher {
    emulators: EmulatorController,
    adb: AdbClient,
}

impl AppLauncher {
    pub fn new(emulators: EmulatorController, adb: AdbClient) -> Self {
        Self { emulators, adb }
    }

    /// Launch `package` on the emulator listening on `port`
    pub async fn launch_application(&self, port: u16, package: &str) -> Result<String, LaunchError> {
        if !self.emulators.is_running(port).await {
            return Err(LaunchError::NotRunning { port });
        }

        let installed = self
            .adb
            .installed_packages(port, package)
            .await
            .map_err(|source| LaunchError::Query {
                port,
                step: LaunchStep::PackageLookup,
                source,
            })?;

        // `pm list packages` filters by substring; only an exact name counts.
        if !installed.iter().any(|p| p == package) {
            return Err(LaunchError::PackageNotInstalled {
                package: package.to_string(),
                port,
            });
        }

        let component = self
            .adb
            .resolve_activity(port, package)
            .await
            .map_err(|source| LaunchError::Query {
                port,
                step: LaunchStep::EntryPointLookup,
                source,
            })?
            .ok_or_else(|| LaunchError::EntryPointUnresolved {
                package: package.to_string(),
            })?;

        debug!("Resolved {} to {}", package, component);

        let output = self
            .adb
            .start_activity(port, &component)
            .await
            .map_err(|e| LaunchError::StartFailed {
                component: component.clone(),
                message: e.message(),
            })?;

        info!("Launched {} on port {}", component, port);
        Ok(format!("Launched {} on port {}\n{}", component, port, output.trim()))
    }
}
