//! Responder adapters, one per model provider.

use std::sync::Arc;

pub mod gemini;
pub mod ollama;
pub mod openai;
pub mod provider;

pub use provider::{ProviderError, Reply, Responder, Result, NO_REPLY_SENTINEL};

use crate::config::{AgentConfig, ProviderKind};

/// Build the responder configured for an agent.
pub fn create_responder(agent: &AgentConfig) -> Result<Arc<dyn Responder>> {
    let timeout = agent.timeout();
    let api_key = || {
        agent
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ProviderError::NotAvailable(format!("{} api_key not set", agent.provider)))
    };

    let responder: Arc<dyn Responder> = match agent.provider {
        ProviderKind::OpenAi => {
            let mut p = openai::OpenAiProvider::new(api_key()?, timeout)?;
            if let Some(url) = &agent.base_url {
                p = p.with_base_url(url.clone());
            }
            if let Some(model) = &agent.model {
                p = p.with_model(model.clone());
            }
            if let Some(t) = agent.temperature {
                p = p.with_temperature(t);
            }
            Arc::new(p)
        }
        ProviderKind::Gemini => {
            let mut p = gemini::GeminiProvider::new(api_key()?, timeout)?;
            if let Some(url) = &agent.base_url {
                p = p.with_base_url(url.clone());
            }
            if let Some(model) = &agent.model {
                p = p.with_model(model.clone());
            }
            if let Some(t) = agent.temperature {
                p = p.with_temperature(t);
            }
            Arc::new(p)
        }
        ProviderKind::Ollama => {
            let mut p = ollama::OllamaProvider::new(timeout)?;
            if let Some(url) = &agent.base_url {
                p = p.with_base_url(url.clone());
            }
            if let Some(model) = &agent.model {
                p = p.with_model(model.clone());
            }
            if let Some(t) = agent.temperature {
                p = p.with_temperature(t);
            }
            Arc::new(p)
        }
    };

    Ok(responder)
}
