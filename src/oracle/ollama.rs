//! Ollama chat backend.
//!
//! Uses structured outputs: the request carries a JSON schema for
//! `{"query": string}` and the reply's message content is parsed against it.

use super::{render_user_prompt, GenerationRequest, RowOracle, SYSTEM_PROMPT};
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3.1";

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct QueryAnswer {
    query: String,
}

/// Oracle backed by an Ollama server's `/api/chat` endpoint
pub struct OllamaOracle {
    agent: ureq::Agent,
    endpoint: String,
    model: String,
}

impl OllamaOracle {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            endpoint: format!("{}/api/chat", base_url.trim_end_matches('/')),
            model: model.to_string(),
        }
    }

    fn chat(&self, request: &GenerationRequest<'_>) -> Result<String> {
        let body = json!({
            "model": self.model,
            "stream": false,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": render_user_prompt(request) },
            ],
            "format": {
                "type": "object",
                "properties": { "query": { "type": "string" } },
                "required": ["query"],
            },
            "options": {
                "temperature": 1.2,
                "top_p": 0.9,
                "repeat_penalty": 1.2,
            },
        });

        let response: ChatResponse = self
            .agent
            .post(&self.endpoint)
            .send_json(body)
            .with_context(|| format!("request to {} failed", self.endpoint))?
            .into_json()
            .context("malformed chat response")?;

        let answer: QueryAnswer = serde_json::from_str(&response.message.content)
            .with_context(|| format!("answer is not a query object: {}", response.message.content))?;

        Ok(answer.query)
    }
}

impl RowOracle for OllamaOracle {
    fn generate(&mut self, request: &GenerationRequest<'_>) -> String {
        match self.chat(request) {
            Ok(query) => {
                debug!(table = %request.table.name, query = %query, "Ollama proposed statement");
                query
            }
            Err(e) => {
                warn!(table = %request.table.name, error = %format!("{:#}", e), "Ollama generation failed");
                String::new()
            }
        }
    }
}
