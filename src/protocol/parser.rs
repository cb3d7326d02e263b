//! Turn parser: raw meeting log text to ordered, role-tagged turns.

use serde::{Deserialize, Serialize};

use super::log::{split_marker_line, LogEntry};

/// Content of the turn handed to a responder when the log is still empty.
pub const DEFAULT_GREETING: &str = "Hello.";

/// Role of a turn relative to the agent reading the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Written by the reading agent.
    #[serde(rename = "self")]
    Own,
    /// Written by anyone else.
    Other,
}

/// One attributed message as seen by a particular agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Speaker display name. Empty for text preceding the first marker.
    pub speaker: String,
    pub content: String,
    pub role: Role,
}

impl Turn {
    pub fn new(speaker: impl Into<String>, content: impl Into<String>, role: Role) -> Self {
        Self {
            speaker: speaker.into(),
            content: content.into(),
            role,
        }
    }

    /// Seed turn used when nobody has spoken yet.
    pub fn greeting() -> Self {
        Self::new("", DEFAULT_GREETING, Role::Other)
    }

    pub fn is_own(&self) -> bool {
        self.role == Role::Own
    }

    /// Content prefixed with the speaker name, for transcripts sent to a model.
    pub fn attributed(&self) -> String {
        if self.speaker.is_empty() {
            self.content.clone()
        } else {
            format!("{}: {}", self.speaker, self.content)
        }
    }
}

impl From<Turn> for LogEntry {
    fn from(turn: Turn) -> Self {
        LogEntry {
            speaker: turn.speaker,
            content: turn.content,
        }
    }
}

/// Turn being accumulated by the scanner.
struct PendingTurn {
    speaker: String,
    lines: Vec<String>,
}

impl PendingTurn {
    fn new(speaker: &str, first_line: &str) -> Self {
        Self {
            speaker: speaker.to_string(),
            lines: vec![first_line.to_string()],
        }
    }

    fn finish(self, reader: &str) -> Option<Turn> {
        let content = self.lines.join("\n").trim().to_string();
        if content.is_empty() {
            return None;
        }
        let role = if self.speaker == reader {
            Role::Own
        } else {
            Role::Other
        };
        Some(Turn {
            speaker: self.speaker,
            content,
            role,
        })
    }
}

enum ScanState {
    Outside,
    Inside(PendingTurn),
}

/// Parse the raw log into turns, tagging each with its role for `reader`.
///
/// A marker line (`**Name**: text`) opens a new turn and any other line
/// continues the current one. Each turn's content is trimmed, so blank lines
/// only survive between two content lines. Text before the first marker
/// becomes a turn with an empty speaker.
pub fn parse_turns(raw: &str, reader: &str) -> Vec<Turn> {
    let mut turns = Vec::new();
    let mut state = ScanState::Outside;

    for line in raw.lines() {
        if line.trim().is_empty() {
            // kept inside a turn; the final trim drops the entry separators
            if let ScanState::Inside(pending) = &mut state {
                pending.lines.push(line.to_string());
            }
            continue;
        }

        state = match (state, split_marker_line(line)) {
            (ScanState::Outside, Some((speaker, rest))) => {
                ScanState::Inside(PendingTurn::new(speaker, rest))
            }
            (ScanState::Outside, None) => ScanState::Inside(PendingTurn::new("", line)),
            (ScanState::Inside(pending), Some((speaker, rest))) => {
                turns.extend(pending.finish(reader));
                ScanState::Inside(PendingTurn::new(speaker, rest))
            }
            (ScanState::Inside(mut pending), None) => {
                pending.lines.push(line.to_string());
                ScanState::Inside(pending)
            }
        };
    }

    if let ScanState::Inside(pending) = state {
        turns.extend(pending.finish(reader));
    }

    turns
}

/// Parse the raw log into plain entries, without roles.
pub fn parse_entries(raw: &str) -> Vec<LogEntry> {
    parse_turns(raw, "")
        .into_iter()
        .filter(|turn| !turn.speaker.is_empty())
        .map(LogEntry::from)
        .collect()
}

/// Turns to hand to a responder: the parsed turns, or the greeting seed when
/// the log holds nothing yet.
pub fn turns_or_greeting(turns: Vec<Turn>) -> Vec<Turn> {
    if turns.is_empty() {
        vec![Turn::greeting()]
    } else {
        turns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::log::render_log;

    #[test]
    fn test_two_turn_scenario() {
        let raw = "\n\n**Alice**: Hi\n\n\n**Bob**: Hello back\n";
        let turns = parse_turns(raw, "Bob");

        assert_eq!(
            turns,
            vec![
                Turn::new("Alice", "Hi", Role::Other),
                Turn::new("Bob", "Hello back", Role::Own),
            ]
        );
    }

    #[test]
    fn test_empty_log() {
        assert!(parse_turns("", "Bob").is_empty());
        assert!(parse_turns("\n\n   \n", "Bob").is_empty());
    }

    #[test]
    fn test_greeting_seed() {
        let seeded = turns_or_greeting(parse_turns("", "Bob"));
        assert_eq!(seeded.len(), 1);
        assert_eq!(seeded[0].content, DEFAULT_GREETING);
        assert_eq!(seeded[0].role, Role::Other);
    }

    #[test]
    fn test_multi_line_content() {
        let raw = "\n\n**Jules**: line one\n  indented two\nline three\n\n\n**Gemini**: ok\n";
        let turns = parse_turns(raw, "Gemini");

        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].content, "line one\n  indented two\nline three");
        assert_eq!(turns[0].content.lines().count(), 3);
        assert!(turns[1].is_own());
    }

    #[test]
    fn test_blank_lines_inside_turn_are_kept() {
        let raw = "**Alice**: first\n   \nthird\n\n\n**Bob**: ok\n";
        let turns = parse_turns(raw, "Bob");
        assert_eq!(turns[0].content, "first\n   \nthird");
        assert_eq!(turns[0].content.lines().count(), 3);
        assert_eq!(turns[1].content, "ok");
    }

    #[test]
    fn test_three_line_entry_round_trips() {
        let entry = LogEntry::new("Alice", "one\n   \nthree").unwrap();
        let entries = parse_entries(&render_log(&[entry.clone()]));
        assert_eq!(entries, vec![entry]);
        assert_eq!(entries[0].content.lines().count(), 3);
    }

    #[test]
    fn test_unknown_speaker_still_starts_turn() {
        let raw = "**Alice**: Hi\n**Mallory**: who am I\n";
        let turns = parse_turns(raw, "Alice");
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].speaker, "Mallory");
        assert_eq!(turns[1].role, Role::Other);
    }

    #[test]
    fn test_preamble_before_first_marker() {
        let raw = "# Meeting log\n\n**Alice**: Hi\n";
        let turns = parse_turns(raw, "Alice");
        assert_eq!(turns[0], Turn::new("", "# Meeting log", Role::Other));
        assert_eq!(turns[1], Turn::new("Alice", "Hi", Role::Own));

        let entries = parse_entries(raw);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].speaker, "Alice");
    }

    #[test]
    fn test_marker_with_empty_content_is_dropped() {
        let raw = "**Alice**: \n**Bob**: there\n";
        let turns = parse_turns(raw, "Bob");
        assert_eq!(turns, vec![Turn::new("Bob", "there", Role::Own)]);
    }

    #[test]
    fn test_round_trip() {
        let entries = vec![
            LogEntry::new("Alice", "Hi").unwrap(),
            LogEntry::new("Deep Agent", "Two\nlines").unwrap(),
            LogEntry::new("Alice", "  spaced   out ").unwrap(),
            LogEntry::new("Jules", "a\n   b with indent\nc").unwrap(),
        ];

        let raw = render_log(&entries);
        assert_eq!(parse_entries(&raw), entries);
    }

    #[test]
    fn test_round_trip_after_appends_to_existing_text() {
        let mut raw = String::from("**Alice**: Hi");
        raw.push_str(&LogEntry::new("Bob", "Hello back").unwrap().render());

        let turns = parse_turns(&raw, "Alice");
        assert_eq!(turns[0], Turn::new("Alice", "Hi", Role::Own));
        assert_eq!(turns[1], Turn::new("Bob", "Hello back", Role::Other));
    }

    #[test]
    fn test_attributed() {
        assert_eq!(Turn::new("Alice", "Hi", Role::Other).attributed(), "Alice: Hi");
        assert_eq!(Turn::greeting().attributed(), DEFAULT_GREETING);
    }
}
