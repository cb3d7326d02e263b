//! Responder trait for HiveMind.

use async_trait::async_trait;
use thiserror::Error;

use crate::protocol::{Role, Turn};

/// Literal reply meaning "nothing to add this round".
pub const NO_REPLY_SENTINEL: &str = "[NO REPLY]";

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not available: {0}")]
    NotAvailable(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    ParseError(String),
}

pub type Result<T> = std::result::Result<T, ProviderError>;

/// What a responder produced for one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    NoReply,
}

impl Reply {
    /// Interpret raw model output: empty text and the sentinel mean no reply.
    pub fn from_text(raw: &str) -> Self {
        let text = raw.trim();
        if text.is_empty() || text == NO_REPLY_SENTINEL {
            Reply::NoReply
        } else {
            Reply::Text(text.to_string())
        }
    }
}

/// A model backend able to continue the meeting.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Provider name.
    fn name(&self) -> &str;

    /// Produce the next reply given the turns so far and a persona instruction.
    async fn respond(&self, turns: &[Turn], persona: &str) -> Result<Reply>;
}

/// Chat role as most completion APIs name it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

/// Collapse turns into alternating chat messages.
///
/// Own turns become assistant messages with plain content; everyone else is
/// the user side, attributed by name so the model can tell speakers apart.
/// Consecutive turns on the same side are merged.
pub fn chat_messages(turns: &[Turn]) -> Vec<(ChatRole, String)> {
    let mut messages: Vec<(ChatRole, String)> = Vec::new();

    for turn in turns {
        let (role, text) = match turn.role {
            Role::Own => (ChatRole::Assistant, turn.content.clone()),
            Role::Other => (ChatRole::User, turn.attributed()),
        };

        match messages.last_mut() {
            Some((last_role, last_text)) if *last_role == role => {
                last_text.push_str("\n\n");
                last_text.push_str(&text);
            }
            _ => messages.push((role, text)),
        }
    }

    messages
}
