//! OpenAI-compatible chat completions backend.
//!
//! The model is forced to call an `insert_row` tool whose single `query`
//! argument carries the INSERT statement.

use super::{render_user_prompt, GenerationRequest, RowOracle, SYSTEM_PROMPT};
use crate::error::Error;
use anyhow::{anyhow, Context};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

const TOOL_NAME: &str = "insert_row";

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    /// JSON-encoded arguments object
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct InsertRowArguments {
    query: String,
}

/// Oracle backed by an OpenAI-compatible `/chat/completions` endpoint
pub struct OpenAiOracle {
    agent: ureq::Agent,
    endpoint: String,
    model: String,
    api_key: String,
}

impl OpenAiOracle {
    pub fn new(base_url: &str, model: &str, api_key: String, timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: model.to_string(),
            api_key,
        }
    }

    /// Build the backend with the API key from `OPENAI_API_KEY`
    pub fn from_env(base_url: &str, model: &str, timeout: Duration) -> crate::error::Result<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::Oracle(format!("{} is not set", API_KEY_ENV)))?;
        Ok(Self::new(base_url, model, api_key, timeout))
    }

    fn complete(&self, request: &GenerationRequest<'_>) -> anyhow::Result<String> {
        let system = format!(
            "{}\nReturn the INSERT inside the `query` field only.",
            SYSTEM_PROMPT
        );
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": render_user_prompt(request) },
            ],
            "tools": [{
                "type": "function",
                "function": {
                    "name": TOOL_NAME,
                    "description": "Insert a single generated row into the table",
                    "parameters": {
                        "type": "object",
                        "properties": {
                            "query": {
                                "type": "string",
                                "description": "A single SQL INSERT statement with one row",
                            },
                        },
                        "required": ["query"],
                    },
                },
            }],
            "tool_choice": "required",
        });

        let response: CompletionResponse = self
            .agent
            .post(&self.endpoint)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .send_json(body)
            .with_context(|| format!("request to {} failed", self.endpoint))?
            .into_json()
            .context("malformed completion response")?;

        let message = response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| anyhow!("completion has no choices"))?;

        if let Some(call) = message
            .tool_calls
            .iter()
            .find(|call| call.function.name == TOOL_NAME)
        {
            let args: InsertRowArguments = serde_json::from_str(&call.function.arguments)
                .with_context(|| format!("bad tool arguments: {}", call.function.arguments))?;
            return Ok(args.query);
        }

        message
            .content
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| anyhow!("completion has neither a tool call nor content"))
    }
}

impl RowOracle for OpenAiOracle {
    fn generate(&mut self, request: &GenerationRequest<'_>) -> String {
        match self.complete(request) {
            Ok(query) => {
                debug!(table = %request.table.name, query = %query, "OpenAI proposed statement");
                query
            }
            Err(e) => {
                warn!(table = %request.table.name, error = %format!("{:#}", e), "OpenAI generation failed");
                String::new()
            }
        }
    }
}
