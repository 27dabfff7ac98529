//! Read-only resources
//!
//! Snapshots of the configured and running device lists, queried fresh on
//! every read.

use serde_json::{json, Value};

use crate::protocol::JsonRpcError;
use crate::PilotContext;

const JSON_MIME: &str = "application/json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    ConfiguredAvds,
    RunningEmulators,
}

impl Resource {
    pub const ALL: [Resource; 2] = [Resource::ConfiguredAvds, Resource::RunningEmulators];

    pub fn uri(&self) -> &'static str {
        match self {
            Resource::ConfiguredAvds => "emulator://avds",
            Resource::RunningEmulators => "emulator://running",
        }
    }

    pub fn from_uri(uri: &str) -> Option<Resource> {
        Resource::ALL.into_iter().find(|r| r.uri() == uri)
    }

    fn name(&self) -> &'static str {
        match self {
            Resource::ConfiguredAvds => "Configured AVDs",
            Resource::RunningEmulators => "Running emulators",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Resource::ConfiguredAvds => "Android Virtual Devices known to avdmanager",
            Resource::RunningEmulators => "Emulators currently attached to adb",
        }
    }

    fn descriptor(&self) -> Value {
        json!({
            "uri": self.uri(),
            "name": self.name(),
            "description": self.description(),
            "mimeType": JSON_MIME,
        })
    }
}

/// `resources/list` result
pub fn list_resources() -> Value {
    json!({ "resources": Resource::ALL.iter().map(Resource::descriptor).collect::<Vec<_>>() })
}

/// `resources/read` result for `uri`
pub async fn read_resource(ctx: &PilotContext, uri: &str) -> Result<Value, JsonRpcError> {
    let resource = Resource::from_uri(uri)
        .ok_or_else(|| JsonRpcError::invalid_params(format!("Unknown resource: {}", uri)))?;

    let text = match resource {
        Resource::ConfiguredAvds => serde_json::to_string_pretty(&ctx.bridge.list_configured().await),
        Resource::RunningEmulators => serde_json::to_string_pretty(&ctx.bridge.list_running().await),
    }
    .map_err(|e| JsonRpcError::internal_error(format!("Serialization error: {}", e)))?;

    Ok(json!({
        "contents": [{
            "uri": uri,
            "mimeType": JSON_MIME,
            "text": text,
        }]
    }))
}
