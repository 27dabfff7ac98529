//! JSON-RPC 2.0 message types
//!
//! Requests arrive one per line on stdin; a request without an `id` is a
//! notification and gets no response.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

/// JSON-RPC version string
pub const JSONRPC_VERSION: &str = "2.0";

/// Incoming request or notification
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    /// `None` only when the member is absent; `"id": null` is `Some(Null)`
    #[serde(default, deserialize_with = "present_id")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

fn present_id<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl JsonRpcRequest {
    pub fn validate(&self) -> Result<(), JsonRpcError> {
        if self.jsonrpc != JSONRPC_VERSION {
            return Err(JsonRpcError::invalid_request(format!(
                "Unsupported JSON-RPC version: {}",
                self.jsonrpc
            )));
        }
        Ok(())
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// `{name, arguments}` of a `tools/call` request
    pub fn extract_tool_call(&self) -> Result<ToolCallParams, JsonRpcError> {
        let params = self
            .params
            .as_ref()
            .ok_or_else(|| JsonRpcError::invalid_params("Missing params"))?;

        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| JsonRpcError::invalid_params("Missing or invalid 'name' field"))?;

        let arguments = match params.get("arguments") {
            None | Some(Value::Null) => json!({}),
            Some(args @ Value::Object(_)) => args.clone(),
            Some(_) => return Err(JsonRpcError::invalid_params("'arguments' must be an object")),
        };

        Ok(ToolCallParams {
            name: name.to_string(),
            arguments,
        })
    }

    /// `uri` of a `resources/read` request
    pub fn extract_resource_uri(&self) -> Result<String, JsonRpcError> {
        self.params
            .as_ref()
            .and_then(|p| p.get("uri"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| JsonRpcError::invalid_params("Missing or invalid 'uri' field"))
    }
}

/// Parameters of a `tools/call` request
#[derive(Debug, Clone)]
pub struct ToolCallParams {
    pub name: String,
    pub arguments: Value,
}

/// Outgoing response. Holds either a result or an error.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }

    pub fn from_result(id: Value, result: Result<Value, JsonRpcError>) -> Self {
        match result {
            Ok(value) => Self::success(id, value),
            Err(err) => Self::error(id, err),
        }
    }
}

/// JSON-RPC error object
#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[error("[{code}] {message}")]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(code: i32, message: impl Into<String>, data: Value) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::new(error_codes::PARSE_ERROR, msg)
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::new(error_codes::INVALID_REQUEST, msg)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::with_data(
            error_codes::METHOD_NOT_FOUND,
            "Method not found",
            json!({ "method": method }),
        )
    }

    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::new(error_codes::INVALID_PARAMS, msg)
    }

    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self::new(error_codes::INTERNAL_ERROR, msg)
    }
}

/// Standard JSON-RPC 2.0 error codes
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_without_id_is_notification() {
        let req: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).unwrap();
        assert!(req.is_notification());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_null_id_is_a_request() {
        let req: JsonRpcRequest = serde_json::from_str(r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#).unwrap();
        assert!(!req.is_notification());
        assert_eq!(req.id, Some(Value::Null));
    }

    #[test]
    fn test_invalid_version() {
        let req: JsonRpcRequest = serde_json::from_str(r#"{"jsonrpc":"1.0","id":1,"method":"ping"}"#).unwrap();
        assert_eq!(req.validate().unwrap_err().code, error_codes::INVALID_REQUEST);
    }

    #[test]
    fn test_extract_tool_call_defaults_arguments() {
        let req: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"list_avds"}}"#)
                .unwrap();

        let call = req.extract_tool_call().unwrap();
        assert_eq!(call.name, "list_avds");
        assert!(call.arguments.as_object().unwrap().is_empty());
    }

    #[test]
    fn test_extract_tool_call_rejects_non_object_arguments() {
        let req: JsonRpcRequest = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"swipe","arguments":[5554]}}"#,
        )
        .unwrap();

        assert_eq!(req.extract_tool_call().unwrap_err().code, error_codes::INVALID_PARAMS);
    }

    #[test]
    fn test_error_response_has_no_result() {
        let response = JsonRpcResponse::error(json!(7), JsonRpcError::method_not_found("nope"));
        let text = serde_json::to_string(&response).unwrap();

        assert!(text.contains("\"error\""));
        assert!(!text.contains("\"result\""));
        assert!(text.contains("-32601"));
    }
}
