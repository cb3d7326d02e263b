//! Integration tests: full turn cycles against a temp log with counting
//! responder and sync fakes.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hivemind::config::{Policy, PushRejectedPolicy};
use hivemind::cycle::{CycleOutcome, SkipReason};
use hivemind::protocol::{parse_turns, spoke_last, Role};
use hivemind::providers::{Reply, Responder, Result as ProviderResult};
use hivemind::{AgentIdentity, Error, LogStore, RemoteSync, Result, Turn, TurnCycle};

struct CountingResponder {
    reply: Reply,
    calls: Mutex<Vec<Vec<Turn>>>,
}

impl CountingResponder {
    fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Responder for CountingResponder {
    fn name(&self) -> &str {
        "counting"
    }

    async fn respond(&self, turns: &[Turn], _persona: &str) -> ProviderResult<Reply> {
        self.calls.lock().unwrap().push(turns.to_vec());
        Ok(self.reply.clone())
    }
}

/// Records calls; pushes fail until `accept_push_after` attempts were made.
#[derive(Default)]
struct CountingSync {
    pulls: AtomicUsize,
    commits: AtomicUsize,
    pushes: AtomicUsize,
    accept_push_after: usize,
}

impl CountingSync {
    fn rejecting(attempts: usize) -> Arc<Self> {
        Arc::new(Self {
            accept_push_after: attempts,
            ..Default::default()
        })
    }
}

impl RemoteSync for CountingSync {
    fn name(&self) -> &str {
        "counting"
    }

    fn stash_local(&self) -> Result<()> {
        Ok(())
    }

    fn pull(&self) -> Result<()> {
        self.pulls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn restore_local_stash(&self) -> Result<()> {
        Ok(())
    }

    fn commit(&self, _path: &Path, _message: &str) -> Result<()> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn push(&self) -> Result<()> {
        let attempt = self.pushes.fetch_add(1, Ordering::SeqCst);
        if attempt < self.accept_push_after {
            return Err(Error::Sync("rejected: non-fast-forward".to_string()));
        }
        Ok(())
    }
}

fn log_in(dir: &tempfile::TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("meeting_log.md");
    std::fs::write(&path, content).unwrap();
    path
}

fn cycle_for(
    display: &str,
    log: &Path,
    sync: Arc<CountingSync>,
    responder: Arc<CountingResponder>,
) -> TurnCycle {
    TurnCycle::new(
        AgentIdentity::new(display.to_lowercase(), display),
        format!("You are {}.", display),
        LogStore::new(log),
        sync,
        responder,
    )
}

const TWO_TURNS: &str = "\n\n**Alice**: Hi\n\n\n**Bob**: Hello back\n";

#[tokio::test]
async fn last_speaker_makes_no_append_and_no_call() {
    let dir = tempfile::tempdir().unwrap();
    let log = log_in(&dir, TWO_TURNS);
    let responder = CountingResponder::new(Reply::Text("me again".into()));
    let sync = Arc::new(CountingSync::default());

    let report = cycle_for("Bob", &log, sync.clone(), responder.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(
        report.outcome,
        CycleOutcome::Skipped {
            reason: SkipReason::OwnLastLine
        }
    );
    assert_eq!(responder.call_count(), 0);
    assert_eq!(sync.pushes.load(Ordering::SeqCst), 0);
    assert_eq!(std::fs::read_to_string(&log).unwrap(), TWO_TURNS);
}

#[tokio::test]
async fn other_agent_replies_to_two_turn_log() {
    let dir = tempfile::tempdir().unwrap();
    let log = log_in(&dir, TWO_TURNS);
    let responder = CountingResponder::new(Reply::Text("Welcome both".into()));
    let sync = Arc::new(CountingSync::default());

    let report = cycle_for("Alice", &log, sync.clone(), responder.clone())
        .run()
        .await
        .unwrap();

    assert!(matches!(report.outcome, CycleOutcome::Published { .. }));
    assert_eq!(
        std::fs::read_to_string(&log).unwrap(),
        format!("{}\n\n**Alice**: Welcome both\n", TWO_TURNS)
    );
    assert_eq!(sync.commits.load(Ordering::SeqCst), 1);
    assert_eq!(sync.pushes.load(Ordering::SeqCst), 1);

    let seen = responder.calls.lock().unwrap()[0].clone();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].role, Role::Own);
    assert_eq!(seen[1].speaker, "Bob");
    assert_eq!(seen[1].role, Role::Other);
}

#[test]
fn two_turn_log_parses_from_bobs_view() {
    let turns = parse_turns(TWO_TURNS, "Bob");
    assert_eq!(
        turns,
        vec![
            Turn::new("Alice", "Hi", Role::Other),
            Turn::new("Bob", "Hello back", Role::Own),
        ]
    );
    assert!(spoke_last(TWO_TURNS, "Bob"));
    assert!(!spoke_last(TWO_TURNS, "Alice"));
}

#[tokio::test]
async fn empty_log_seeds_one_greeting_turn() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("nested").join("meeting_log.md");
    let responder = CountingResponder::new(Reply::Text("Good morning".into()));
    let sync = Arc::new(CountingSync::default());

    cycle_for("Alice", &log, sync, responder.clone())
        .run()
        .await
        .unwrap();

    let calls = responder.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0], vec![Turn::greeting()]);
    assert_eq!(
        std::fs::read_to_string(&log).unwrap(),
        "\n\n**Alice**: Good morning\n"
    );
}

#[tokio::test]
async fn no_reply_makes_no_append_and_no_publish() {
    let dir = tempfile::tempdir().unwrap();
    let log = log_in(&dir, "\n\n**Alice**: Anyone?\n");
    let responder = CountingResponder::new(Reply::NoReply);
    let sync = Arc::new(CountingSync::default());

    let report = cycle_for("Bob", &log, sync.clone(), responder.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(report.outcome, CycleOutcome::NoReply);
    assert_eq!(responder.call_count(), 1);
    assert_eq!(sync.commits.load(Ordering::SeqCst), 0);
    assert_eq!(sync.pushes.load(Ordering::SeqCst), 0);
    assert_eq!(
        std::fs::read_to_string(&log).unwrap(),
        "\n\n**Alice**: Anyone?\n"
    );
}

#[tokio::test]
async fn rejected_push_fails_cycle_but_keeps_entry() {
    let dir = tempfile::tempdir().unwrap();
    let log = log_in(&dir, "\n\n**Alice**: Status?\n");
    let responder = CountingResponder::new(Reply::Text("Green".into()));
    let sync = CountingSync::rejecting(1);

    let err = cycle_for("Bob", &log, sync.clone(), responder)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Publish(_)));
    assert_eq!(sync.pushes.load(Ordering::SeqCst), 1);
    assert!(std::fs::read_to_string(&log)
        .unwrap()
        .ends_with("**Bob**: Green\n"));
}

#[tokio::test]
async fn rebase_retry_pushes_again_once() {
    let dir = tempfile::tempdir().unwrap();
    let log = log_in(&dir, "\n\n**Alice**: Status?\n");
    let responder = CountingResponder::new(Reply::Text("Green".into()));
    let sync = CountingSync::rejecting(1);
    let policy = Policy {
        push_rejected: PushRejectedPolicy::RebaseRetry,
        ..Default::default()
    };

    let report = cycle_for("Bob", &log, sync.clone(), responder)
        .with_policy(policy)
        .run()
        .await
        .unwrap();

    assert!(matches!(report.outcome, CycleOutcome::Published { .. }));
    assert_eq!(sync.pushes.load(Ordering::SeqCst), 2);
    // one pull during refresh, one before the retry
    assert_eq!(sync.pulls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn multi_line_reply_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let log = log_in(&dir, "\n\n**Alice**: Plan?\n");
    let responder = CountingResponder::new(Reply::Text("one\ntwo\nthree".into()));
    let sync = Arc::new(CountingSync::default());

    cycle_for("Bob", &log, sync, responder).run().await.unwrap();

    let raw = std::fs::read_to_string(&log).unwrap();
    let turns = parse_turns(&raw, "Alice");
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[1].content.lines().count(), 3);
    // Bob's marker is no longer the last line, but his turn still ends the log
    assert!(!spoke_last(&raw, "Bob"));
}

#[tokio::test]
async fn blank_text_reply_counts_as_no_reply() {
    let dir = tempfile::tempdir().unwrap();
    let log = log_in(&dir, "\n\n**Alice**: Anyone?\n");
    let responder = CountingResponder::new(Reply::Text("  \n".into()));
    let sync = Arc::new(CountingSync::default());

    let report = cycle_for("Bob", &log, sync.clone(), responder)
        .run()
        .await
        .unwrap();

    assert_eq!(report.outcome, CycleOutcome::NoReply);
    assert_eq!(sync.commits.load(Ordering::SeqCst), 0);
    assert_eq!(sync.pushes.load(Ordering::SeqCst), 0);
    assert_eq!(
        std::fs::read_to_string(&log).unwrap(),
        "\n\n**Alice**: Anyone?\n"
    );
}

#[tokio::test]
async fn no_reply_marker_text_is_never_published() {
    let dir = tempfile::tempdir().unwrap();
    let log = log_in(&dir, "\n\n**Alice**: Anyone?\n");
    let responder = CountingResponder::new(Reply::Text(" [NO REPLY] ".into()));
    let sync = Arc::new(CountingSync::default());

    let report = cycle_for("Bob", &log, sync.clone(), responder)
        .run()
        .await
        .unwrap();

    assert_eq!(report.outcome, CycleOutcome::NoReply);
    assert_eq!(sync.pushes.load(Ordering::SeqCst), 0);
    assert!(!std::fs::read_to_string(&log).unwrap().contains("[NO REPLY]"));
}
