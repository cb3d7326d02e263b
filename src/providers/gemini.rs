//! Google Gemini `generateContent` provider.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::provider::{chat_messages, ChatRole, ProviderError, Reply, Responder, Result};
use crate::protocol::Turn;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_TEMPERATURE: f32 = 0.8;

/// Keeps the key out of request URLs and therefore out of error text.
const API_KEY_HEADER: &str = "x-goog-api-key";

pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}

impl GeminiProvider {
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

    fn build_request(&self, turns: &[Turn], persona: &str) -> GenerateRequest {
        let contents = chat_messages(turns)
            .into_iter()
            .map(|(role, text)| Content {
                role: Some(
                    match role {
                        ChatRole::User => "user",
                        ChatRole::Assistant => "model",
                    }
                    .to_string(),
                ),
                parts: vec![Part { text }],
            })
            .collect();

        GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: persona.to_string(),
                }],
            },
            contents,
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        }
    }
}

/// Text of the first part of the first candidate.
fn first_text(response: GenerateResponse) -> Option<String> {
    response
        .candidates
        .into_iter()
        .next()?
        .content
        .parts
        .into_iter()
        .next()
        .map(|p| p.text)
}

#[async_trait]
impl Responder for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn respond(&self, turns: &[Turn], persona: &str) -> Result<Reply> {
        let request = self.build_request(turns, persona);
        tracing::info!("Sending {} contents to Gemini ({})", request.contents.len(), self.model);

        let response = self
            .client
            .post(format!("{}/models/{}:generateContent", self.base_url, self.model))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::HttpError(e.without_url()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError(format!("HTTP {}: {}", status, text)));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::HttpError(e.without_url()))?;
        let parsed: GenerateResponse = serde_json::from_value(body.clone())
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        match first_text(parsed) {
            Some(text) => Ok(Reply::from_text(&text)),
            None => {
                tracing::error!("Unexpected response format: {}", body);
                Err(ProviderError::ParseError("Unexpected response format".to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Role;

    #[tokio::test]
    async fn test_transport_error_hides_api_key() {
        let provider = GeminiProvider::new("SECRET-KEY-123", Duration::from_secs(2))
            .unwrap()
            .with_base_url("http://127.0.0.1:1");
        let turns = vec![Turn::new("Alice", "Hi", Role::Other)];

        let err = provider.respond(&turns, "You are Gemini.").await.unwrap_err();

        assert!(matches!(err, ProviderError::HttpError(_)));
        assert!(!err.to_string().contains("SECRET-KEY-123"));
        assert!(!format!("{:?}", err).contains("SECRET-KEY-123"));
    }

    #[test]
    fn test_request_shape() {
        let provider = GeminiProvider::new("key", Duration::from_secs(30)).unwrap();
        let turns = vec![
            Turn::new("Alice", "Hi", Role::Other),
            Turn::new("Gemini", "Hey Alice", Role::Own),
        ];

        let json = serde_json::to_value(provider.build_request(&turns, "You are Gemini.")).unwrap();

        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "You are Gemini.");
        assert!(json["systemInstruction"].get("role").is_none());
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Alice: Hi");
        assert_eq!(json["contents"][1]["role"], "model");
        assert!(json["generationConfig"]["temperature"].is_number());
    }

    #[test]
    fn test_first_text() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Noted."}]}}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(body).unwrap();
        assert_eq!(first_text(parsed), Some("Noted.".to_string()));

        let empty: GenerateResponse = serde_json::from_str(r#"{"promptFeedback":{}}"#).unwrap();
        assert_eq!(first_text(empty), None);
    }
}
