//! External LLM provider implementations.
//!
//! OpenAI and Groq share the chat-completions format. Anthropic uses the
//! Messages API, which takes the system prompt as a separate field.

use async_trait::async_trait;
use kgwizard_core::{Error, Result};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::{LLMConfig, ResolvedProvider};
use crate::types::{ChatMessage, LLMProvider};

const OPENAI_URL: &str = "https://api.openai.com/v1";
const GROQ_URL: &str = "https://api.groq.com/openai/v1";
const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";

/// Produces the next assistant turn for a conversation.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<ChatMessage>;
}

/// Non-streaming chat client for one provider and model.
pub struct ChatGenerator {
    client: Client,
    provider: LLMProvider,
    model: String,
    api_key: String,
    base_url: String,
    temperature: Option<f64>,
    max_tokens: usize,
}

impl ChatGenerator {
    pub fn from_config(config: &LLMConfig, model_override: Option<&str>) -> Result<Self> {
        let ResolvedProvider {
            provider,
            model,
            api_key,
        } = config.resolve_provider(model_override).ok_or_else(|| {
            Error::Config(format!(
                "no API key for provider '{}' (set it in {} or the environment)",
                config.preferred_provider,
                config.config_path.display()
            ))
        })?;

        let base_url = match provider {
            LLMProvider::OpenAI => config
                .openai_base_url
                .clone()
                .unwrap_or_else(|| OPENAI_URL.to_string()),
            LLMProvider::Groq => GROQ_URL.to_string(),
            LLMProvider::Anthropic => ANTHROPIC_URL.to_string(),
        };

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            client,
            provider,
            model,
            api_key,
            base_url,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    pub fn provider(&self) -> LLMProvider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn post(&self, request: reqwest::RequestBuilder, body: &Value) -> Result<Value> {
        let response = request
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Generation(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Generation(format!("API error {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Generation(format!("Unreadable response: {}", e)))
    }
}

#[async_trait]
impl Generator for ChatGenerator {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<ChatMessage> {
        debug!(
            "Requesting completion from {} ({}), {} messages",
            self.provider,
            self.model,
            messages.len()
        );
        let content = match self.provider {
            LLMProvider::OpenAI | LLMProvider::Groq => {
                let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
                let body = openai_body(&self.model, messages, self.temperature);
                let request = self
                    .client
                    .post(url)
                    .header("Authorization", format!("Bearer {}", self.api_key));
                openai_content(&self.post(request, &body).await?)?
            }
            LLMProvider::Anthropic => {
                let body = anthropic_body(&self.model, messages, self.temperature, self.max_tokens);
                let request = self
                    .client
                    .post(&self.base_url)
                    .header("x-api-key", &self.api_key)
                    .header("anthropic-version", "2023-06-01");
                anthropic_content(&self.post(request, &body).await?)?
            }
        };
        Ok(ChatMessage::assistant(content.trim()))
    }
}

fn openai_body(model: &str, messages: &[ChatMessage], temperature: Option<f64>) -> Value {
    let mut body = json!({
        "model": model,
        "messages": messages,
    });
    if let Some(t) = temperature {
        body["temperature"] = json!(t);
    }
    body
}

fn anthropic_body(
    model: &str,
    messages: &[ChatMessage],
    temperature: Option<f64>,
    max_tokens: usize,
) -> Value {
    // Separate system message from conversation
    let system: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == "system")
        .map(|m| m.content.as_str())
        .collect();
    let conversation: Vec<&ChatMessage> = messages.iter().filter(|m| m.role != "system").collect();

    let mut body = json!({
        "model": model,
        "messages": conversation,
        "max_tokens": max_tokens,
    });
    if !system.is_empty() {
        body["system"] = json!(system.join("\n\n"));
    }
    if let Some(t) = temperature {
        body["temperature"] = json!(t);
    }
    body
}

fn openai_content(response: &Value) -> Result<String> {
    response["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::Generation("response has no message content".into()))
}

fn anthropic_content(response: &Value) -> Result<String> {
    let blocks = response["content"]
        .as_array()
        .ok_or_else(|| Error::Generation("response has no content blocks".into()))?;
    Ok(blocks
        .iter()
        .filter(|b| b["type"] == "text")
        .filter_map(|b| b["text"].as_str())
        .collect())
}
