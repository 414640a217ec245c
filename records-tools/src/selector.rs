//! Language-model tool selection (OpenAI chat completions)
//!
//! The selector sends the transcript together with the registry's tool
//! definitions and returns the tool calls the model chose, in order. A model
//! that answers in prose instead yields an empty call list and a reply.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{ToolError, ToolResult};
use crate::protocol::RawToolCall;
use crate::tools::ToolsRegistry;

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

const SYSTEM_PROMPT: &str = "You are a medical records assistant. Use the provided functions to help users query patient records, scans, and annotations.";

/// What the model decided to do with a transcript
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// Tool calls in the order the model listed them
    pub calls: Vec<RawToolCall>,
    /// Plain-text reply, if any
    pub reply: Option<String>,
}

/// Chooses tool calls for a transcript
#[async_trait]
pub trait ToolSelector: Send + Sync {
    /// Provider name, for logs and health output
    fn name(&self) -> &'static str;

    async fn select(&self, text: &str) -> ToolResult<Selection>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
}

impl SelectorConfig {
    pub fn from_env() -> ToolResult<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// `OPENAI_API_KEY` is preferred; `OPENAI_KEY` is accepted as an alias
    pub fn from_vars<F>(lookup: F) -> ToolResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = var("OPENAI_API_KEY")
            .or_else(|| var("OPENAI_KEY"))
            .ok_or_else(|| ToolError::Config("Missing required environment variables: OPENAI_API_KEY".to_string()))?;

        Ok(Self {
            api_url: var("OPENAI_API_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key,
            model: var("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ChatToolCall>,
}

#[derive(Debug, Deserialize)]
struct ChatToolCall {
    function: ChatFunction,
}

#[derive(Debug, Deserialize)]
struct ChatFunction {
    name: String,
    /// JSON-encoded argument object
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

pub struct OpenAiToolSelector {
    client: reqwest::Client,
    config: SelectorConfig,
    tools: Vec<Value>,
}

impl OpenAiToolSelector {
    pub fn new(config: SelectorConfig, registry: &ToolsRegistry) -> ToolResult<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ToolError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            config,
            tools: registry.function_tools(),
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn request_body(&self, text: &str) -> Value {
        json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": text },
            ],
            "tools": self.tools,
            "tool_choice": "auto",
        })
    }
}

/// Decode the model's argument string. Undecodable text is kept as a JSON
/// string so that validation reports it as invalid arguments.
fn decode_arguments(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Object(serde_json::Map::new());
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[async_trait]
impl ToolSelector for OpenAiToolSelector {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn select(&self, text: &str) -> ToolResult<Selection> {
        let url = format!("{}/v1/chat/completions", self.config.api_url);
        debug!(model = %self.config.model, "Requesting tool selection");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&self.request_body(text))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            return Err(ToolError::Upstream(format!("{}: {}", status, message)));
        }

        let parsed: ChatResponse = serde_json::from_str(&body)?;
        let message = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| ToolError::Upstream("response contained no choices".to_string()))?;

        let calls: Vec<RawToolCall> = message
            .tool_calls
            .into_iter()
            .map(|call| RawToolCall::new(call.function.name, decode_arguments(&call.function.arguments)))
            .collect();

        debug!(tool_calls = calls.len(), "Tool selection received");

        Ok(Selection {
            calls,
            reply: message.content.filter(|c| !c.trim().is_empty()),
        })
    }
}
