//! Model Proxy
//!
//! Forwards text generation and chat requests to a local Ollama-compatible
//! server. Requests are non-streaming and never retried.

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Model proxy errors
#[derive(Debug, thiserror::Error)]
pub enum ModelProxyError {
    #[error("Model server request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Model server returned {code}: {body}")]
    Status { code: u16, body: String },
    #[error("Unexpected model server response: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ModelProxyError>;

/// One turn of a chat conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `system`, `user` or `assistant`
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }
}

/// A model the server has pulled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelSummary>,
}

/// Client for the model server's HTTP API
#[derive(Debug, Clone)]
pub struct ModelClient {
    http: reqwest::Client,
    base_url: String,
}

impl ModelClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Reuse an existing connection pool
    pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Complete `prompt` with `model`
    pub async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        debug!(model = %model, prompt_len = prompt.len(), "Forwarding generate request");

        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
        };
        let response = self.http.post(self.url("/api/generate")).json(&request).send().await?;
        let body: GenerateResponse = decode(response).await?;

        Ok(body.response)
    }

    /// Continue a conversation; returns the assistant's reply
    pub async fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<ChatMessage> {
        debug!(model = %model, turns = messages.len(), "Forwarding chat request");

        let request = ChatRequest {
            model,
            messages,
            stream: false,
        };
        let response = self.http.post(self.url("/api/chat")).json(&request).send().await?;
        let body: ChatResponse = decode(response).await?;

        Ok(body.message)
    }

    /// Models available on the server
    pub async fn list_models(&self) -> Result<Vec<ModelSummary>> {
        let response = self.http.get(self.url("/api/tags")).send().await?;
        let body: TagsResponse = decode(response).await?;

        Ok(body.models)
    }
}

async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        error!(status_code = status.as_u16(), "Model server returned error status");
        return Err(ModelProxyError::Status {
            code: status.as_u16(),
            body: text,
        });
    }

    Ok(serde_json::from_str(&text)?)
}
