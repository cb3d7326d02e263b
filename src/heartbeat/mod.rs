//! Repeated turn cycles.

pub mod daemon;
pub mod scheduler;

pub use daemon::{run_watch, run_watch_until, WatchSummary};
pub use scheduler::CycleSchedule;
