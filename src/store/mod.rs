//! Local storage of the meeting log.

pub mod lock;
pub mod log_file;

pub use lock::{acquire_lock, with_lock, LockHandle};
pub use log_file::{LogStore, DEFAULT_LOG_FILE};
