//! API endpoints module.

pub mod agents;
pub mod artifacts;
pub mod error;
pub mod log;

pub use agents::{agent_status, create_task, list_agents, read_response, register_agent};
pub use artifacts::store_artifact;
pub use error::ApiError;
pub use log::read_log;
