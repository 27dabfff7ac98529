//! Line-delimited JSON-RPC server
//!
//! Reads one request per line and writes one response per line. Requests
//! are handled in arrival order.

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use crate::{resources, tools, PilotContext};

/// Protocol revision reported from `initialize`
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Server name reported from `initialize`
pub const SERVER_NAME: &str = "avd-pilot";

pub struct Server {
    ctx: PilotContext,
}

impl Server {
    pub fn new(ctx: PilotContext) -> Self {
        Self { ctx }
    }

    /// Handle one raw line. Returns `None` for notifications.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                warn!("Failed to parse JSON-RPC request: {}", e);
                return Some(JsonRpcResponse::error(Value::Null, JsonRpcError::parse_error(e.to_string())));
            }
        };

        debug!("Received JSON-RPC request: method={}", request.method);

        if request.is_notification() {
            debug!("Notification {} acknowledged", request.method);
            return None;
        }

        let id = request.id.clone().unwrap_or(Value::Null);
        let result = match request.validate() {
            Ok(()) => self.dispatch(&request).await,
            Err(e) => Err(e),
        };

        if let Err(ref e) = result {
            warn!("Request {} failed: {}", request.method, e);
        }

        Some(JsonRpcResponse::from_result(id, result))
    }

    async fn dispatch(&self, request: &JsonRpcRequest) -> Result<Value, JsonRpcError> {
        match request.method.as_str() {
            "initialize" => Ok(initialize_result()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(tools::list_tools()),
            "tools/call" => {
                let call = request.extract_tool_call()?;
                tools::call_tool(&self.ctx, &call.name, &call.arguments).await
            }
            "resources/list" => Ok(resources::list_resources()),
            "resources/read" => {
                let uri = request.extract_resource_uri()?;
                resources::read_resource(&self.ctx, &uri).await
            }
            other => Err(JsonRpcError::method_not_found(other)),
        }
    }

    /// Serve until `reader` reaches end of input
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(response) = self.handle_line(line).await {
                let mut text = serde_json::to_string(&response)?;
                text.push('\n');
                writer.write_all(text.as_bytes()).await?;
                writer.flush().await?;
            }
        }

        info!("Input closed, shutting down");
        Ok(())
    }

    /// Serve on stdin/stdout
    pub async fn run_stdio(&self) -> std::io::Result<()> {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        self.serve(stdin, tokio::io::stdout()).await
    }
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": {},
            "resources": {}
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": crate::VERSION
        }
    })
}
