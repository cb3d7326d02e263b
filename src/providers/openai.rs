//! OpenAI-compatible chat completions provider.
//!
//! Works against any `/chat/completions` endpoint; the Abacus RouteLLM agent
//! is configured through this adapter.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::provider::{chat_messages, ChatRole, ProviderError, Reply, Responder, Result};
use crate::protocol::Turn;

pub const DEFAULT_BASE_URL: &str = "https://routellm.abacus.ai/v1";
pub const DEFAULT_MODEL: &str = "route-llm";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn build_request(&self, turns: &[Turn], persona: &str) -> ChatRequest {
        let mut messages = vec![Message {
            role: "system",
            content: persona.to_string(),
        }];
        messages.extend(chat_messages(turns).into_iter().map(|(role, content)| Message {
            role: match role {
                ChatRole::User => "user",
                ChatRole::Assistant => "assistant",
            },
            content,
        }));

        ChatRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
        }
    }
}

#[async_trait]
impl Responder for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn respond(&self, turns: &[Turn], persona: &str) -> Result<Reply> {
        let request = self.build_request(turns, persona);
        tracing::info!(
            "Sending {} messages to {} ({})",
            request.messages.len(),
            self.base_url,
            self.model
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError(format!("HTTP {}: {}", status, text)));
        }

        let chat_response: ChatResponse = response.json().await?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| Reply::from_text(&c.message.content.unwrap_or_default()))
            .ok_or_else(|| ProviderError::ParseError("No response choices".to_string()))
    }
}
