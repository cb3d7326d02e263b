//! Ollama HTTP provider.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::provider::{chat_messages, ChatRole, ProviderError, Reply, Responder, Result};
use crate::protocol::Turn;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3.2";

pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<Options>,
}

#[derive(Serialize)]
struct Options {
    temperature: f32,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

impl OllamaProvider {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: None,
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
        self.temperature = Some(temperature);
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
            stream: false,
            options: self.temperature.map(|temperature| Options { temperature }),
        }
    }
}

#[async_trait]
impl Responder for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn respond(&self, turns: &[Turn], persona: &str) -> Result<Reply> {
        let request = self.build_request(turns, persona);

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError(format!("HTTP {}: {}", status, text)));
        }

        let chat_response: ChatResponse = response.json().await?;

        Ok(Reply::from_text(&chat_response.message.content))
    }
}
