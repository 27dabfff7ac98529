//! Tool catalogue
//!
//! Maps named tool calls onto device and model operations. Arguments are
//! checked here, before anything runs: a missing or mistyped argument is a
//! JSON-RPC `-32602` error and no command is issued. Failures of the
//! operations themselves come back as results with `isError: true`.

use std::fmt;

use avd_pilot_emulator_bridge::{AvdConfig, Direction, StartOptions};
use avd_pilot_model_proxy::ChatMessage;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::protocol::JsonRpcError;
use crate::PilotContext;

/// Every tool the server exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    ListAvds,
    ListRunningEmulators,
    StartEmulator,
    StopEmulator,
    FoldEmulator,
    UnfoldEmulator,
    CreateAvd,
    DeleteAvd,
    GetDeviceInfo,
    ListSystemImages,
    LaunchApp,
    Swipe,
    GenerateText,
    Chat,
    ListModels,
}

impl Tool {
    pub const ALL: [Tool; 15] = [
        Tool::ListAvds,
        Tool::ListRunningEmulators,
        Tool::StartEmulator,
        Tool::StopEmulator,
        Tool::FoldEmulator,
        Tool::UnfoldEmulator,
        Tool::CreateAvd,
        Tool::DeleteAvd,
        Tool::GetDeviceInfo,
        Tool::ListSystemImages,
        Tool::LaunchApp,
        Tool::Swipe,
        Tool::GenerateText,
        Tool::Chat,
        Tool::ListModels,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Tool::ListAvds => "list_avds",
            Tool::ListRunningEmulators => "list_running_emulators",
            Tool::StartEmulator => "start_emulator",
            Tool::StopEmulator => "stop_emulator",
            Tool::FoldEmulator => "fold_emulator",
            Tool::UnfoldEmulator => "unfold_emulator",
            Tool::CreateAvd => "create_avd",
            Tool::DeleteAvd => "delete_avd",
            Tool::GetDeviceInfo => "get_device_info",
            Tool::ListSystemImages => "list_system_images",
            Tool::LaunchApp => "launch_app",
            Tool::Swipe => "swipe",
            Tool::GenerateText => "generate_text",
            Tool::Chat => "chat",
            Tool::ListModels => "list_models",
        }
    }

    pub fn from_name(name: &str) -> Option<Tool> {
        Tool::ALL.into_iter().find(|tool| tool.name() == name)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Tool::ListAvds => "List configured Android Virtual Devices",
            Tool::ListRunningEmulators => "List running emulators with their console ports",
            Tool::StartEmulator => {
                "Start an emulator in the background. Returns once the process is spawned; booting continues afterwards."
            }
            Tool::StopEmulator => "Stop the emulator on a console port",
            Tool::FoldEmulator => "Fold a foldable emulator",
            Tool::UnfoldEmulator => "Unfold a foldable emulator",
            Tool::CreateAvd => "Create an AVD from an installed system image package",
            Tool::DeleteAvd => "Delete an AVD and its data",
            Tool::GetDeviceInfo => "Android version, API level, model, manufacturer and ABI of a running emulator",
            Tool::ListSystemImages => "Installed and available system images",
            Tool::LaunchApp => "Launch an installed app by package name on a running emulator",
            Tool::Swipe => "Swipe across the screen of a running emulator",
            Tool::GenerateText => "Generate text with a local model",
            Tool::Chat => "Chat with a local model",
            Tool::ListModels => "List models available on the local model server",
        }
    }

    pub fn input_schema(&self) -> Value {
        let port = json!({
            "type": "integer",
            "description": "Emulator console port, e.g. 5554",
            "minimum": 1,
            "maximum": 65535
        });
        let model = json!({
            "type": "string",
            "description": "Model name; the configured default when omitted"
        });

        match self {
            Tool::ListAvds
            | Tool::ListRunningEmulators
            | Tool::ListSystemImages
            | Tool::ListModels => json!({ "type": "object", "properties": {} }),
            Tool::StartEmulator => json!({
                "type": "object",
                "properties": {
                    "avd_name": { "type": "string", "description": "Name of the AVD to start" },
                    "cold_boot": { "type": "boolean", "description": "Skip the quick-boot snapshot" },
                    "wipe_data": { "type": "boolean", "description": "Reset user data" },
                    "gpu_mode": { "type": "string", "description": "GPU mode, e.g. host or swiftshader_indirect" },
                    "port": port
                },
                "required": ["avd_name"]
            }),
            Tool::StopEmulator | Tool::FoldEmulator | Tool::UnfoldEmulator | Tool::GetDeviceInfo => json!({
                "type": "object",
                "properties": { "port": port },
                "required": ["port"]
            }),
            Tool::CreateAvd => json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Name of the new AVD" },
                    "package": {
                        "type": "string",
                        "description": "System image package, e.g. system-images;android-34;google_apis;x86_64"
                    },
                    "device": { "type": "string", "description": "Hardware profile, e.g. pixel_6" }
                },
                "required": ["name", "package"]
            }),
            Tool::DeleteAvd => json!({
                "type": "object",
                "properties": { "name": { "type": "string", "description": "Name of the AVD" } },
                "required": ["name"]
            }),
            Tool::LaunchApp => json!({
                "type": "object",
                "properties": {
                    "port": port,
                    "package": { "type": "string", "description": "Package name, e.g. com.android.settings" }
                },
                "required": ["port", "package"]
            }),
            Tool::Swipe => json!({
                "type": "object",
                "properties": {
                    "port": port,
                    "direction": {
                        "type": "string",
                        "enum": Direction::ALL.iter().map(Direction::as_str).collect::<Vec<_>>()
                    }
                },
                "required": ["port", "direction"]
            }),
            Tool::GenerateText => json!({
                "type": "object",
                "properties": {
                    "prompt": { "type": "string" },
                    "model": model
                },
                "required": ["prompt"]
            }),
            Tool::Chat => json!({
                "type": "object",
                "properties": {
                    "messages": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "role": { "type": "string" },
                                "content": { "type": "string" }
                            },
                            "required": ["role", "content"]
                        }
                    },
                    "model": model
                },
                "required": ["messages"]
            }),
        }
    }

    /// Entry for `tools/list`
    pub fn descriptor(&self) -> Value {
        json!({
            "name": self.name(),
            "description": self.description(),
            "inputSchema": self.input_schema(),
        })
    }

    async fn execute(&self, ctx: &PilotContext, args: &Value) -> Result<ToolResult, JsonRpcError> {
        let bridge = &ctx.bridge;

        let result = match self {
            Tool::ListAvds => ToolResult::json(&bridge.list_configured().await)?,
            Tool::ListRunningEmulators => ToolResult::json(&bridge.list_running().await)?,
            Tool::StartEmulator => {
                let name = extract_string(args, "avd_name")?;
                let options = StartOptions {
                    cold_boot: extract_bool(args, "cold_boot")?,
                    wipe_data: extract_bool(args, "wipe_data")?,
                    gpu_mode: extract_optional_string(args, "gpu_mode")?,
                    port: extract_optional_port(args, "port")?,
                };
                ToolResult::from_text(bridge.start_instance(&name, &options).await)
            }
            Tool::StopEmulator => {
                let port = extract_port(args, "port")?;
                ToolResult::from_text(bridge.stop_instance(port).await)
            }
            Tool::FoldEmulator => {
                let port = extract_port(args, "port")?;
                ToolResult::from_text(bridge.fold_instance(port).await)
            }
            Tool::UnfoldEmulator => {
                let port = extract_port(args, "port")?;
                ToolResult::from_text(bridge.unfold_instance(port).await)
            }
            Tool::CreateAvd => {
                let mut config = AvdConfig::new(&extract_string(args, "name")?, &extract_string(args, "package")?);
                if let Some(device) = extract_optional_string(args, "device")? {
                    config = config.with_device(&device);
                }
                ToolResult::from_text(bridge.create_avd(&config).await)
            }
            Tool::DeleteAvd => {
                let name = extract_string(args, "name")?;
                ToolResult::from_text(bridge.delete_avd(&name).await)
            }
            Tool::GetDeviceInfo => {
                let port = extract_port(args, "port")?;
                match bridge.device_info(port).await {
                    Ok(info) => ToolResult::json(&info)?,
                    Err(e) => ToolResult::failure(e),
                }
            }
            Tool::ListSystemImages => ToolResult::json(&bridge.list_system_images().await)?,
            Tool::LaunchApp => {
                let port = extract_port(args, "port")?;
                let package = extract_string(args, "package")?;
                ToolResult::from_text(bridge.launch_application(port, &package).await)
            }
            Tool::Swipe => {
                let port = extract_port(args, "port")?;
                // Matched as sent: no trimming or case folding.
                let direction = extract_optional_string(args, "direction")?
                    .ok_or_else(|| JsonRpcError::invalid_params("Missing required argument: direction"))?
                    .parse::<Direction>()
                    .map_err(|e| JsonRpcError::invalid_params(e.to_string()))?;

                match bridge.swipe(port, direction.as_str()).await {
                    Ok(path) => ToolResult::text(format!(
                        "Swiped {} on port {} from {:?} to {:?} over {} ms",
                        direction, port, path.from, path.to, path.duration_ms
                    )),
                    Err(e) => ToolResult::failure(e),
                }
            }
            Tool::GenerateText => {
                let prompt = extract_string(args, "prompt")?;
                let model = extract_optional_string(args, "model")?.unwrap_or_else(|| ctx.default_model.clone());
                ToolResult::from_text(ctx.models.generate(&model, &prompt).await)
            }
            Tool::Chat => {
                let messages = extract_messages(args)?;
                let model = extract_optional_string(args, "model")?.unwrap_or_else(|| ctx.default_model.clone());
                match ctx.models.chat(&model, &messages).await {
                    Ok(reply) => ToolResult::text(reply.content),
                    Err(e) => ToolResult::failure(e),
                }
            }
            Tool::ListModels => match ctx.models.list_models().await {
                Ok(models) => ToolResult::json(&models)?,
                Err(e) => ToolResult::failure(e),
            },
        };

        Ok(result)
    }
}

/// Text content returned from a tool call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub text: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn failure(error: impl fmt::Display) -> Self {
        warn!("Tool execution failed: {}", error);
        Self {
            text: error.to_string(),
            is_error: true,
        }
    }

    fn from_text<E: fmt::Display>(result: Result<String, E>) -> Self {
        match result {
            Ok(text) => Self::text(text),
            Err(e) => Self::failure(e),
        }
    }

    fn json<T: Serialize>(value: &T) -> Result<Self, JsonRpcError> {
        serde_json::to_string_pretty(value)
            .map(Self::text)
            .map_err(|e| JsonRpcError::internal_error(format!("Serialization error: {}", e)))
    }

    pub fn into_value(self) -> Value {
        json!({
            "content": [{ "type": "text", "text": self.text }],
            "isError": self.is_error,
        })
    }
}

/// `tools/list` result
pub fn list_tools() -> Value {
    json!({ "tools": Tool::ALL.iter().map(Tool::descriptor).collect::<Vec<_>>() })
}

/// Run the named tool with `args`
pub async fn call_tool(ctx: &PilotContext, name: &str, args: &Value) -> Result<Value, JsonRpcError> {
    let tool = Tool::from_name(name)
        .ok_or_else(|| JsonRpcError::invalid_params(format!("Unknown tool: {}", name)))?;

    debug!("Tool call: name={}", name);
    Ok(tool.execute(ctx, args).await?.into_value())
}

fn type_error(key: &str, expected: &str) -> JsonRpcError {
    JsonRpcError::invalid_params(format!("Argument '{}' must be {}", key, expected))
}

/// Present and not null
fn present<'a>(args: &'a Value, key: &str) -> Option<&'a Value> {
    args.get(key).filter(|v| !v.is_null())
}

fn extract_string(args: &Value, key: &str) -> Result<String, JsonRpcError> {
    let value = present(args, key)
        .ok_or_else(|| JsonRpcError::invalid_params(format!("Missing required argument: {}", key)))?;

    match value.as_str().map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        Some(_) => Err(type_error(key, "a non-empty string")),
        None => Err(type_error(key, "a string")),
    }
}

fn extract_optional_string(args: &Value, key: &str) -> Result<Option<String>, JsonRpcError> {
    match present(args, key) {
        None => Ok(None),
        Some(value) => value
            .as_str()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| type_error(key, "a string")),
    }
}

fn extract_bool(args: &Value, key: &str) -> Result<bool, JsonRpcError> {
    match present(args, key) {
        None => Ok(false),
        Some(value) => value.as_bool().ok_or_else(|| type_error(key, "a boolean")),
    }
}

fn port_value(value: &Value, key: &str) -> Result<u16, JsonRpcError> {
    value
        .as_u64()
        .and_then(|n| u16::try_from(n).ok())
        .filter(|&port| port != 0)
        .ok_or_else(|| type_error(key, "an integer between 1 and 65535"))
}

fn extract_port(args: &Value, key: &str) -> Result<u16, JsonRpcError> {
    let value = present(args, key)
        .ok_or_else(|| JsonRpcError::invalid_params(format!("Missing required argument: {}", key)))?;
    port_value(value, key)
}

fn extract_optional_port(args: &Value, key: &str) -> Result<Option<u16>, JsonRpcError> {
    present(args, key).map(|value| port_value(value, key)).transpose()
}

fn extract_messages(args: &Value) -> Result<Vec<ChatMessage>, JsonRpcError> {
    let messages = present(args, "messages")
        .ok_or_else(|| JsonRpcError::invalid_params("Missing required argument: messages"))?
        .as_array()
        .ok_or_else(|| type_error("messages", "an array"))?;

    messages
        .iter()
        .map(|message| {
            let role = message.get("role").and_then(Value::as_str);
            let content = message.get("content").and_then(Value::as_str);
            match (role, content) {
                (Some(role), Some(content)) => Ok(ChatMessage::new(role, content)),
                _ => Err(type_error("messages", "an array of {role, content} string objects")),
            }
        })
        .collect()
}
