//! Types for the file mailbox.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::str::FromStr;

/// Returned by `read_response` while an agent has not answered yet.
pub const PENDING_SENTINEL: &str = "PENDING: No response found yet.";

/// Sender recorded in task headers.
pub const TASK_SENDER: &str = "orchestrator";

/// Task priority levels.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low = 0,
    #[default]
    Normal = 1,
    High = 2,
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "normal" => Ok(Priority::Normal),
            "high" => Ok(Priority::High),
            _ => Err(format!("Unknown priority: {} (use high, normal or low)", s)),
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Normal => write!(f, "normal"),
            Priority::High => write!(f, "high"),
        }
    }
}

/// Front matter written at the top of every task file.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskHeader {
    pub job_id: String,
    pub from: String,
    pub priority: Priority,
    /// Unix seconds with sub-second precision.
    pub created_at: f64,
}

impl TaskHeader {
    pub fn new(job_id: impl Into<String>, priority: Priority) -> Self {
        let now = chrono::Utc::now();
        Self {
            job_id: job_id.into(),
            from: TASK_SENDER.to_string(),
            priority,
            created_at: now.timestamp_micros() as f64 / 1_000_000.0,
        }
    }

    /// Render the `---` delimited header, followed by one blank line.
    pub fn render(&self) -> String {
        format!(
            "---\njob_id: {}\nfrom: {}\npriority: {}\ncreated_at: {}\n---\n\n",
            self.job_id, self.from, self.priority, self.created_at
        )
    }
}

/// State of a job's response file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseState {
    Ready(String),
    Pending,
}

impl ResponseState {
    pub fn status(&self) -> &'static str {
        match self {
            ResponseState::Ready(_) => "ready",
            ResponseState::Pending => "pending",
        }
    }

    pub fn content(&self) -> &str {
        match self {
            ResponseState::Ready(text) => text,
            ResponseState::Pending => PENDING_SENTINEL,
        }
    }

    /// Text form used by the tool surface: the response, or the pending sentinel.
    pub fn into_text(self) -> String {
        match self {
            ResponseState::Ready(text) => text,
            ResponseState::Pending => PENDING_SENTINEL.to_string(),
        }
    }
}

/// Serialized as `{"status", "content"}`; pending responses carry the sentinel.
impl Serialize for ResponseState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ResponseState", 2)?;
        state.serialize_field("status", self.status())?;
        state.serialize_field("content", self.content())?;
        state.end()
    }
}

/// Mailbox statistics for one agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MailboxStatus {
    pub name: String,
    pub inbox_count: usize,
    pub outbox_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_parsing() {
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!(" low ".parse::<Priority>().unwrap(), Priority::Low);
        assert!("urgent".parse::<Priority>().is_err());
        assert!(Priority::High > Priority::Normal);
    }

    #[test]
    fn test_header_render() {
        let header = TaskHeader {
            job_id: "job-7".to_string(),
            from: TASK_SENDER.to_string(),
            priority: Priority::High,
            created_at: 1700000000.25,
        };

        assert_eq!(
            header.render(),
            "---\njob_id: job-7\nfrom: orchestrator\npriority: high\ncreated_at: 1700000000.25\n---\n\n"
        );
    }

    #[test]
    fn test_response_text() {
        assert_eq!(ResponseState::Pending.into_text(), PENDING_SENTINEL);
        assert_eq!(ResponseState::Ready("done".into()).into_text(), "done");
    }

    #[test]
    fn test_pending_json_carries_sentinel() {
        let json = serde_json::to_value(ResponseState::Pending).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["content"], PENDING_SENTINEL);
    }
}
