//! Tool Runner
//!
//! The single seam through which the bridge talks to the Android tools.
//! Every operation builds an [`Invocation`] and hands it to a [`ToolRunner`];
//! the runner returns captured text and never interprets it.

use std::process::Stdio;

use async_trait::async_trait;
use avd_pilot_android_toolchain::{AndroidTool, Toolchain};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

/// Invocation failure: the tool could not run or exited abnormally
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Failed to launch {tool}: {source}")]
    Spawn {
        tool: AndroidTool,
        #[source]
        source: std::io::Error,
    },
    #[error("{tool} {command} failed: {message}")]
    Failed {
        tool: AndroidTool,
        command: String,
        message: String,
    },
}

impl ToolError {
    /// The tool's own message, without the command prefix
    pub fn message(&self) -> String {
        match self {
            ToolError::Spawn { source, .. } => source.to_string(),
            ToolError::Failed { message, .. } => message.clone(),
        }
    }
}

/// A single command to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub tool: AndroidTool,
    pub args: Vec<String>,
    /// Text written to stdin before it is closed
    pub stdin: Option<String>,
}

impl Invocation {
    pub fn new<I, S>(tool: AndroidTool, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tool,
            args: args.into_iter().map(Into::into).collect(),
            stdin: None,
        }
    }

    pub fn with_stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Arguments joined for logs and error messages
    pub fn command_line(&self) -> String {
        self.args.join(" ")
    }

    /// Build a failure for this invocation
    pub fn failure(&self, message: impl Into<String>) -> ToolError {
        ToolError::Failed {
            tool: self.tool,
            command: self.command_line(),
            message: message.into(),
        }
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Stdout on success; otherwise a failure carrying the best message the
    /// tool printed.
    pub fn into_result(self, invocation: &Invocation) -> Result<String, ToolError> {
        if self.success {
            return Ok(self.stdout);
        }

        let message = if !self.stderr.trim().is_empty() {
            self.stderr.trim().to_string()
        } else if !self.stdout.trim().is_empty() {
            self.stdout.trim().to_string()
        } else {
            "exited with a non-zero status".to_string()
        };

        Err(invocation.failure(message))
    }
}

/// Executes Android tool invocations
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Run to completion and capture output
    async fn output(&self, invocation: &Invocation) -> Result<ToolOutput, ToolError>;

    /// Start a process that outlives the caller. Returns its pid; no handle
    /// is kept.
    async fn spawn_detached(&self, invocation: &Invocation) -> Result<u32, ToolError>;

    /// Run and return stdout, failing on a non-zero exit
    async fn run(&self, invocation: &Invocation) -> Result<String, ToolError> {
        self.output(invocation).await?.into_result(invocation)
    }
}

/// Runs tools as real child processes
#[derive(Debug, Clone)]
pub struct SystemRunner {
    toolchain: Toolchain,
}

impl SystemRunner {
    pub fn new(toolchain: Toolchain) -> Self {
        Self { toolchain }
    }

    fn command(&self, invocation: &Invocation) -> Command {
        let program = self.toolchain.paths.path(invocation.tool);
        let mut cmd = Command::new(program);
        cmd.args(&invocation.args)
            .envs(self.toolchain.env.command_env());
        cmd
    }
}

#[async_trait]
impl ToolRunner for SystemRunner {
    async fn output(&self, invocation: &Invocation) -> Result<ToolOutput, ToolError> {
        debug!("{} {:?}", invocation.tool, invocation.args);

        let spawn_error = |source: std::io::Error| ToolError::Spawn {
            tool: invocation.tool,
            source,
        };

        let mut cmd = self.command(invocation);
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        cmd.stdin(if invocation.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });

        let mut child = cmd.spawn().map_err(spawn_error)?;

        if let (Some(input), Some(mut stdin)) = (&invocation.stdin, child.stdin.take()) {
            stdin.write_all(input.as_bytes()).await.map_err(spawn_error)?;
            // Dropping stdin closes the pipe so prompts see EOF after the answer.
        }

        let output = child.wait_with_output().await.map_err(spawn_error)?;

        Ok(ToolOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    async fn spawn_detached(&self, invocation: &Invocation) -> Result<u32, ToolError> {
        debug!("{} {:?} (detached)", invocation.tool, invocation.args);

        let program = self.toolchain.paths.path(invocation.tool);
        let mut std_cmd = std::process::Command::new(program);
        std_cmd
            .args(&invocation.args)
            .envs(self.toolchain.env.command_env())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            std_cmd.process_group(0);
        }

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const DETACHED_PROCESS: u32 = 0x0000_0008;
            const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
            std_cmd.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
        }

        let mut cmd = Command::from(std_cmd);
        cmd.kill_on_drop(false);

        let child = cmd.spawn().map_err(|source| ToolError::Spawn {
            tool: invocation.tool,
            source,
        })?;

        let pid = child.id().unwrap_or_default();
        // The handle is dropped here; tokio reaps the process if it exits
        // while we are still alive, and it keeps running after we exit.
        drop(child);

        info!("Spawned detached {} (pid {})", invocation.tool, pid);
        Ok(pid)
    }
}
