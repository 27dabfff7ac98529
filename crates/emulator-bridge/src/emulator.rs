//! Emulator Controller
//!
//! Starts emulators as detached processes and drives running ones through
//! their console.

use std::fmt;
use std::sync::Arc;

use avd_pilot_android_toolchain::AndroidTool;
use tracing::{info, warn};

use crate::adb::AdbClient;
use crate::device::{emulator_serial, RunningInstance, StartOptions, UNKNOWN};
use crate::runner::{Invocation, ToolError, ToolRunner};

/// Console commands that change a running emulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleAction {
    Stop,
    Fold,
    Unfold,
}

impl ConsoleAction {
    fn command(&self) -> &'static str {
        match self {
            ConsoleAction::Stop => "kill",
            ConsoleAction::Fold => "fold",
            ConsoleAction::Unfold => "unfold",
        }
    }
}

impl fmt::Display for ConsoleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            ConsoleAction::Stop => "stop",
            ConsoleAction::Fold => "fold",
            ConsoleAction::Unfold => "unfold",
        };
        f.write_str(verb)
    }
}

/// Emulator errors
#[derive(Debug, thiserror::Error)]
pub enum EmulatorError {
    #[error("Failed to start emulator {name}: {source}")]
    StartFailed {
        name: String,
        #[source]
        source: ToolError,
    },
    #[error("Failed to {action} emulator on port {port}: {source}")]
    Console {
        port: u16,
        action: ConsoleAction,
        #[source]
        source: ToolError,
    },
}

/// Emulator process and console controller
#[derive(Clone)]
pub struct EmulatorController {
    runner: Arc<dyn ToolRunner>,
    adb: AdbClient,
}

impl EmulatorController {
    pub fn new(runner: Arc<dyn ToolRunner>) -> Self {
        let adb = AdbClient::new(Arc::clone(&runner));
        Self { runner, adb }
    }

    /// Launch an emulator and return without waiting for it to boot.
    ///
    /// The process is detached from ours and keeps running after we exit.
    /// Success only means the process was spawned.
    pub async fn start_instance(&self, name: &str, options: &StartOptions) -> Result<String, EmulatorError> {
        let mut args = vec!["-avd".to_string(), name.to_string()];
        args.extend(options.to_args());

        info!("Launching emulator {} with {:?}", name, options);

        let invocation = Invocation::new(AndroidTool::Emulator, args);
        let pid = self
            .runner
            .spawn_detached(&invocation)
            .await
            .map_err(|source| EmulatorError::StartFailed {
                name: name.to_string(),
                source,
            })?;

        let port_note = options
            .port
            .map(|port| format!(" on port {}", port))
            .unwrap_or_default();

        Ok(format!(
            "Emulator {} starting{} (pid {}). Boot continues in the background; check the running list before using it.",
            name, port_note, pid
        ))
    }

    /// Kill the emulator on `port`
    pub async fn stop_instance(&self, port: u16) -> Result<String, EmulatorError> {
        self.console(port, ConsoleAction::Stop).await
    }

    /// Put a foldable emulator into the folded posture
    pub async fn fold_instance(&self, port: u16) -> Result<String, EmulatorError> {
        self.console(port, ConsoleAction::Fold).await
    }

    /// Put a foldable emulator into the unfolded posture
    pub async fn unfold_instance(&self, port: u16) -> Result<String, EmulatorError> {
        self.console(port, ConsoleAction::Unfold).await
    }

    async fn console(&self, port: u16, action: ConsoleAction) -> Result<String, EmulatorError> {
        self.adb
            .emu(port, &[action.command()])
            .await
            .map_err(|source| EmulatorError::Console { port, action, source })?;

        info!("Sent {} to {}", action.command(), emulator_serial(port));
        Ok(format!("Emulator on port {}: {} requested", port, action))
    }

    /// Emulators currently known to adb.
    ///
    /// A failing `adb devices` is reported as no emulators running.
    pub async fn list_running(&self) -> Vec<RunningInstance> {
        let entries = match self.adb.list_emulators().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Listing running emulators failed, reporting none: {}", e);
                return Vec::new();
            }
        };

        let mut instances = Vec::with_capacity(entries.len());
        for entry in entries {
            let name = self
                .adb
                .avd_name(entry.port)
                .await
                .unwrap_or_else(|| UNKNOWN.to_string());

            instances.push(RunningInstance {
                name,
                port: entry.port,
                serial: entry.serial,
                state: entry.state,
            });
        }

        instances
    }

    /// Whether an emulator is listening on `port`
    pub async fn is_running(&self, port: u16) -> bool {
        self.list_running().await.iter().any(|i| i.port == port)
    }
}
