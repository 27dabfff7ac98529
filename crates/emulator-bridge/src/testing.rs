//! Scripted runner for tests
//!
//! Answers invocations from a list of canned responses and records every
//! call, so tests can assert both results and which commands were issued.

use std::sync::Mutex;

use async_trait::async_trait;
use avd_pilot_android_toolchain::AndroidTool;

use crate::runner::{Invocation, ToolError, ToolOutput, ToolRunner};

struct Rule {
    tool: AndroidTool,
    pattern: String,
    output: ToolOutput,
}

/// A [`ToolRunner`] that never starts a process.
///
/// Rules match when the tool is equal and the joined argument list contains
/// the pattern; the first matching rule wins. Unmatched invocations fail.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<Invocation>>,
    spawn_error: Mutex<Option<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer matching invocations with a successful exit and `stdout`
    pub fn on(self, tool: AndroidTool, pattern: &str, stdout: &str) -> Self {
        self.respond(tool, pattern, ToolOutput::ok(stdout))
    }

    /// Answer matching invocations with a non-zero exit and `stderr`
    pub fn on_fail(self, tool: AndroidTool, pattern: &str, stderr: &str) -> Self {
        self.respond(tool, pattern, ToolOutput::failed(stderr))
    }

    pub fn respond(self, tool: AndroidTool, pattern: &str, output: ToolOutput) -> Self {
        self.rules.lock().unwrap().push(Rule {
            tool,
            pattern: pattern.to_string(),
            output,
        });
        self
    }

    /// Make detached spawns fail with `message`
    pub fn fail_spawn(self, message: &str) -> Self {
        *self.spawn_error.lock().unwrap() = Some(message.to_string());
        self
    }

    /// Every invocation seen so far, in order
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded invocations of `tool` whose arguments contain `pattern`
    pub fn count(&self, tool: AndroidTool, pattern: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.tool == tool && call.command_line().contains(pattern))
            .count()
    }

    fn record(&self, invocation: &Invocation) {
        self.calls.lock().unwrap().push(invocation.clone());
    }
}

#[async_trait]
impl ToolRunner for ScriptedRunner {
    async fn output(&self, invocation: &Invocation) -> Result<ToolOutput, ToolError> {
        self.record(invocation);

        let line = invocation.command_line();
        let rules = self.rules.lock().unwrap();
        let output = rules
            .iter()
            .find(|rule| rule.tool == invocation.tool && line.contains(&rule.pattern))
            .map(|rule| rule.output.clone())
            .unwrap_or_else(|| ToolOutput::failed(format!("no scripted response for {}", line)));

        Ok(output)
    }

    async fn spawn_detached(&self, invocation: &Invocation) -> Result<u32, ToolError> {
        self.record(invocation);

        match self.spawn_error.lock().unwrap().clone() {
            Some(message) => Err(ToolError::Spawn {
                tool: invocation.tool,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, message),
            }),
            None => Ok(4242),
        }
    }
}
