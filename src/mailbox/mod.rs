//! Mailbox layer: file-based request/response between an orchestrator and
//! agents that cannot be called directly.
//!
//! Independent from the turn protocol, it only shares the storage root.

pub mod store;
pub mod types;

pub use store::{validate_name, Mailbox, ARTIFACTS_DIR, COMMS_DIR};
pub use types::{MailboxStatus, Priority, ResponseState, TaskHeader, PENDING_SENTINEL};
