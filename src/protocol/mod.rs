//! Meeting log turn protocol.
//!
//! This module defines how agents take turns on the shared log:
//! - Log entries and their bold-marker text form
//! - The turn parser (raw text to role-tagged turns)
//! - The self-reply guard

pub mod guard;
pub mod log;
pub mod parser;

pub use guard::spoke_last;
pub use log::{render_log, speaker_marker, AgentIdentity, LogEntry};
pub use parser::{parse_entries, parse_turns, turns_or_greeting, Role, Turn};
