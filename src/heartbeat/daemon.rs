//! Watch loop: runs an agent's turn cycle over and over on a schedule.

use chrono::Utc;
use std::future::Future;
use tokio::time::sleep;

use crate::cycle::{CycleOutcome, TurnCycle};
use crate::error::{Error, Result};

use super::scheduler::CycleSchedule;

/// Counters for a finished watch loop.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WatchSummary {
    pub cycles: u64,
    pub published: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl WatchSummary {
    fn record(&mut self, result: &Result<CycleOutcome>) {
        self.cycles += 1;
        match result {
            Ok(CycleOutcome::Published { .. }) => self.published += 1,
            Ok(_) => self.skipped += 1,
            Err(_) => self.failed += 1,
        }
    }
}

/// Run cycles until Ctrl-C, or until `max_cycles` have run.
///
/// A failed cycle is logged and the loop keeps going; only one cycle is ever
/// in flight.
pub async fn run_watch(
    cycle: &TurnCycle,
    schedule: &CycleSchedule,
    max_cycles: Option<u64>,
) -> Result<WatchSummary> {
    run_watch_until(cycle, schedule, max_cycles, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

/// Like [`run_watch`], stopping as soon as `shutdown` resolves, whether the
/// loop is sleeping or waiting on a cycle.
pub async fn run_watch_until<F>(
    cycle: &TurnCycle,
    schedule: &CycleSchedule,
    max_cycles: Option<u64>,
    shutdown: F,
) -> Result<WatchSummary>
where
    F: Future<Output = ()>,
{
    let agent = cycle.identity().id.clone();
    tracing::info!("Watching as {} ({})", agent, schedule);

    let mut summary = WatchSummary::default();
    tokio::pin!(shutdown);

    loop {
        let result = tokio::select! {
            result = cycle.run() => result.map(|report| report.outcome),
            _ = &mut shutdown => {
                tracing::info!("Watch loop for {} stopping mid-cycle", agent);
                break;
            }
        };
        match &result {
            Ok(outcome) => tracing::info!("Cycle for {} finished: {:?}", agent, outcome),
            Err(e) => tracing::error!("Cycle for {} failed: {}", agent, e),
        }
        summary.record(&result);

        if max_cycles.is_some_and(|max| summary.cycles >= max) {
            break;
        }

        let delay = schedule
            .delay_from(Utc::now())
            .ok_or_else(|| Error::Other(format!("schedule {} has no upcoming run", schedule)))?;
        tracing::debug!("Next cycle for {} in {}s", agent, delay.as_secs());

        tokio::select! {
            _ = sleep(delay) => {}
            _ = &mut shutdown => {
                tracing::info!("Watch loop for {} stopping", agent);
                break;
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{AgentIdentity, Turn};
    use crate::providers::{Reply, Responder, Result as ProviderResult};
    use crate::store::LogStore;
    use crate::sync::NoopSync;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;

    struct Echo;

    #[async_trait]
    impl Responder for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        async fn respond(&self, turns: &[Turn], _persona: &str) -> ProviderResult<Reply> {
            Ok(Reply::Text(format!("heard {} turns", turns.len())))
        }
    }

    /// Never answers within a test's lifetime.
    struct Stalled;

    #[async_trait]
    impl Responder for Stalled {
        fn name(&self) -> &str {
            "stalled"
        }

        async fn respond(&self, _turns: &[Turn], _persona: &str) -> ProviderResult<Reply> {
            sleep(Duration::from_secs(3600)).await;
            Ok(Reply::NoReply)
        }
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_running_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("meeting_log.md");
        let cycle = TurnCycle::new(
            AgentIdentity::new("slow", "Slow"),
            "persona",
            LogStore::new(&log),
            Arc::new(NoopSync),
            Arc::new(Stalled),
        );
        let schedule = CycleSchedule::Interval(Duration::from_secs(60));

        let summary = tokio::time::timeout(
            Duration::from_secs(5),
            run_watch_until(&cycle, &schedule, None, sleep(Duration::from_millis(20))),
        )
        .await
        .expect("shutdown during a provider call ends the loop")
        .unwrap();

        assert_eq!(summary, WatchSummary::default());
        assert_eq!(std::fs::read_to_string(&log).unwrap_or_default(), "");
    }

    #[tokio::test]
    async fn test_second_cycle_is_guarded() {
        let dir = tempfile::tempdir().unwrap();
        let cycle = TurnCycle::new(
            AgentIdentity::new("echo", "Echo"),
            "persona",
            LogStore::new(dir.path().join("meeting_log.md")),
            Arc::new(NoopSync),
            Arc::new(Echo),
        );
        let schedule = CycleSchedule::Interval(Duration::from_millis(10));

        let summary = run_watch(&cycle, &schedule, Some(2)).await.unwrap();

        assert_eq!(
            summary,
            WatchSummary {
                cycles: 2,
                published: 1,
                skipped: 1,
                failed: 0,
            }
        );
    }
}
