//! Meeting log entries and their text form.
//!
//! Every entry is written as a blank-line separated block headed by a bold
//! speaker marker:
//!
//! ```text
//!
//!
//! **Alice**: first line
//! more lines
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Opening and closing delimiter of a speaker marker.
pub const MARKER_DELIMITER: &str = "**";

/// Text between the closing delimiter and the content.
pub const MARKER_SEPARATOR: &str = ": ";

/// Stable identity of an agent.
///
/// `id` keys the configuration, `display_name` is what appears in the log and
/// is what the parser and the self-reply guard compare against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentIdentity {
    pub id: String,
    pub display_name: String,
}

impl AgentIdentity {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }

    /// The bold marker this agent's entries start with, e.g. `**Jules**`.
    pub fn marker(&self) -> String {
        speaker_marker(&self.display_name)
    }
}

/// One persisted message of the meeting log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub speaker: String,
    pub content: String,
}

impl LogEntry {
    /// Build an entry ready to be appended.
    ///
    /// Content is trimmed; an empty speaker or empty content is rejected since
    /// neither can be read back from the log.
    pub fn new(speaker: impl Into<String>, content: impl AsRef<str>) -> Result<Self> {
        let speaker = speaker.into();
        let content = content.as_ref().trim().to_string();

        if speaker.trim().is_empty() {
            return Err(Error::Log("speaker must not be empty".to_string()));
        }
        if speaker.contains('\n') {
            return Err(Error::Log(format!("speaker '{}' spans lines", speaker.escape_debug())));
        }
        if content.is_empty() {
            return Err(Error::Log(format!("refusing to append empty entry for {}", speaker)));
        }

        Ok(Self { speaker, content })
    }

    /// Render the entry exactly as it is appended to the log file.
    pub fn render(&self) -> String {
        format!(
            "\n\n{}{}{}\n",
            speaker_marker(&self.speaker),
            MARKER_SEPARATOR,
            self.content
        )
    }
}

/// Bold speaker marker for a display name.
pub fn speaker_marker(name: &str) -> String {
    format!("{}{}{}", MARKER_DELIMITER, name, MARKER_DELIMITER)
}

/// Render a whole log from entries, in order.
pub fn render_log(entries: &[LogEntry]) -> String {
    entries.iter().map(LogEntry::render).collect()
}

/// Split a marker line into `(speaker, rest)`.
///
/// The speaker is the shortest non-empty text after the opening `**` that is
/// followed by `**: `. Lines that do not start with a marker yield `None`.
pub fn split_marker_line(line: &str) -> Option<(&str, &str)> {
    let after_open = line.strip_prefix(MARKER_DELIMITER)?;
    let first_len = after_open.chars().next()?.len_utf8();

    let closing = format!("{}{}", MARKER_DELIMITER, MARKER_SEPARATOR);
    let end = after_open[first_len..].find(&closing)? + first_len;

    let speaker = &after_open[..end];
    let rest = &after_open[end + closing.len()..];
    Some((speaker, rest))
}
