//! Chat model seam and the OpenAI chat-completions implementation.

use anyhow::Context;
use async_trait::async_trait;
use medrag_config::OpenAiConfig;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, instrument};

const OPENAI_BASE: &str = "https://api.openai.com/v1";

/// One tool call requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub name: String,
    pub arguments: Value,
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Offer the model a tool menu and return the calls it requests
    /// (possibly none).
    async fn request_tool_calls(
        &self,
        prompt: &str,
        tools: &[Value],
    ) -> anyhow::Result<Vec<ToolInvocation>>;

    /// Plain completion, no tools.
    async fn complete(&self, prompt: &str) -> anyhow::Result<String>;
}

pub struct OpenAiChat {
    client: Client,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    base_url: String,
}

impl OpenAiChat {
    pub fn new(cfg: &OpenAiConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
            base_url: OPENAI_BASE.to_string(),
        }
    }

    async fn chat(&self, body: Value) -> anyhow::Result<Value> {
        let resp: Value = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("chat completions response was not JSON")?;
        Ok(resp)
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    #[instrument(skip_all, fields(tools = tools.len()))]
    async fn request_tool_calls(
        &self,
        prompt: &str,
        tools: &[Value],
    ) -> anyhow::Result<Vec<ToolInvocation>> {
        let resp = self
            .chat(json!({
                "model": self.model,
                "temperature": self.temperature,
                "max_tokens": self.max_tokens,
                "messages": [{ "role": "user", "content": prompt }],
                "tools": tools,
            }))
            .await?;
        let calls = parse_tool_calls(&resp);
        debug!(n = calls.len(), "model requested tool calls");
        Ok(calls)
    }

    #[instrument(skip_all)]
    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        let resp = self
            .chat(json!({
                "model": self.model,
                "temperature": self.temperature,
                "max_tokens": self.max_tokens,
                "messages": [{ "role": "user", "content": prompt }],
            }))
            .await?;
        let content = resp["choices"][0]["message"]["content"]
            .as_str()
            .context("chat completion had no content")?;
        Ok(content.to_string())
    }
}

/// Extract tool calls from a chat-completions response. Arguments
/// arrive as a JSON string; unparseable arguments become an empty
/// object rather than sinking the whole enrichment phase.
pub(crate) fn parse_tool_calls(resp: &Value) -> Vec<ToolInvocation> {
    resp["choices"][0]["message"]["tool_calls"]
        .as_array()
        .map(|calls| {
            calls
                .iter()
                .filter_map(|call| {
                    let name = call["function"]["name"].as_str()?;
                    let raw = call["function"]["arguments"].as_str().unwrap_or("{}");
                    let arguments = serde_json::from_str(raw).unwrap_or_else(|_| json!({}));
                    Some(ToolInvocation {
                        name: name.to_string(),
                        arguments,
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}
