//! When to run the next turn cycle.

use chrono::{DateTime, Utc};
use cron::Schedule;
use std::str::FromStr;
use std::time::Duration;

/// Minimum spacing between cycles, whatever the schedule says.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Cycle schedule.
#[derive(Debug, Clone)]
pub enum CycleSchedule {
    /// Fixed pause between the end of one cycle and the start of the next.
    Interval(Duration),
    /// Cron expression (seconds field included), e.g. `0 */5 * * * *`.
    Cron { expr: String, schedule: Box<Schedule> },
}

impl CycleSchedule {
    /// Create an interval schedule (every N seconds).
    pub fn interval(seconds: u64) -> Self {
        CycleSchedule::Interval(Duration::from_secs(seconds).max(MIN_INTERVAL))
    }

    /// Parse a cron expression.
    pub fn cron(expr: &str) -> Result<Self, String> {
        Schedule::from_str(expr)
            .map(|s| CycleSchedule::Cron {
                expr: expr.to_string(),
                schedule: Box::new(s),
            })
            .map_err(|e| format!("Invalid cron expression '{}': {}", expr, e))
    }

    /// Next run time after `now`.
    pub fn next_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            CycleSchedule::Interval(every) => {
                chrono::Duration::from_std(*every).ok().map(|d| now + d)
            }
            CycleSchedule::Cron { schedule, .. } => schedule.after(&now).next(),
        }
    }

    /// How long to sleep from `now` until the next run.
    pub fn delay_from(&self, now: DateTime<Utc>) -> Option<Duration> {
        let next = self.next_after(now)?;
        let delay = (next - now).to_std().unwrap_or_default();
        Some(delay.max(MIN_INTERVAL))
    }
}

impl std::fmt::Display for CycleSchedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CycleSchedule::Interval(every) => write!(f, "every {}s", every.as_secs()),
            CycleSchedule::Cron { expr, .. } => write!(f, "cron '{}'", expr),
        }
    }
}
