//! HiveMind library root.

pub mod cli;
pub mod config;
pub mod cycle;
pub mod error;
pub mod heartbeat;
pub mod logging;
pub mod mailbox;
pub mod protocol;
pub mod providers;
pub mod store;
pub mod sync;
pub mod web;

pub use cli::Commands;
pub use config::{load_settings, Settings};
pub use cycle::{CycleOutcome, CycleReport, TurnCycle};
pub use error::{Error, Result};
pub use mailbox::Mailbox;
pub use protocol::{parse_turns, AgentIdentity, LogEntry, Turn};
pub use providers::{Reply, Responder};
pub use store::LogStore;
pub use sync::{GitSync, RemoteSync};
