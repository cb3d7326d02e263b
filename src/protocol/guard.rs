//! Self-reply guard.
//!
//! Looks only at the literal last non-blank line of the log, so it can run
//! before the log is parsed. A multi-line reply whose last line is a
//! continuation does not trip it.

use super::log::speaker_marker;

/// Last non-blank line of the raw log, if any.
pub fn last_line(raw: &str) -> Option<&str> {
    raw.lines().rev().find(|line| !line.trim().is_empty())
}

/// True when the last non-blank line starts with `display_name`'s marker,
/// meaning the agent spoke last and must not answer itself.
pub fn spoke_last(raw: &str, display_name: &str) -> bool {
    let marker = speaker_marker(display_name);
    last_line(raw).is_some_and(|line| line.starts_with(&marker))
}
