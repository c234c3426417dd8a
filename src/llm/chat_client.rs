//! Chat Client - OpenAI-compatible chat-completions transport
//!
//! Thin reqwest client against a `/chat/completions` endpoint (DeepSeek by
//! default). Also owns the defensive JSON extraction used on model output:
//! responses arrive wrapped in markdown fences, prefixed with prose, or
//! truncated, and the callers only ever see a best-effort JSON string.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";
pub const DEFAULT_MODEL: &str = "deepseek-chat";

pub struct ChatClient {
    base_url: String,
    model: String,
    api_key: String,
    client: Client,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl ChatClient {
    pub fn new(base_url: Option<String>, model: Option<String>, api_key: String) -> Self {
        Self {
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key,
            client: Client::new(),
        }
    }

    /// One system+user exchange, returning the raw assistant text.
    pub async fn chat(&self, system: &str, user: &str, temperature: f32) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user.to_string(),
                },
            ],
            temperature,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send chat request")?
            .error_for_status()
            .context("Chat endpoint returned an error status")?;

        let parsed: ChatResponse = response
            .json()
            .await
            .context("Failed to parse chat response")?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .context("Chat response carried no content")
    }
}

/// Extract a JSON object from model output: markdown fences first, then the
/// outermost brace span, then the text as-is. Never fails — a clearly
/// non-JSON result simply won't parse downstream, which callers treat as
/// "no structured intent".
pub fn extract_json(response: &str) -> String {
    let trimmed = response.trim();

    if let Some(rest) = trimmed.strip_prefix("```json") {
        if let Some(end) = rest.find("```") {
            return rest[..end].trim().to_string();
        }
    }
    if let Some(rest) = trimmed.strip_prefix("```") {
        if let Some(start) = rest.find('\n') {
            if let Some(end) = rest[start + 1..].find("```") {
                return rest[start + 1..start + 1 + end].trim().to_string();
            }
        }
    }

    // Prose around a JSON object: take the outermost brace span.
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            return trimmed[start..=end].to_string();
        }
    }

    trimmed.to_string()
}
