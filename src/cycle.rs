//! Turn cycle controller.
//!
//! One invocation walks `Idle → Syncing → Guarding → Responding → Publishing →
//! Idle`, leaving early when the agent spoke last or has nothing to say. The
//! controller is re-entrant and meant to be driven from a timer; it keeps no
//! state between runs.

use std::sync::Arc;

use serde::Serialize;

use crate::config::{Policy, PushRejectedPolicy, ResponderErrorPolicy, Settings};
use crate::error::{Error, Result};
use crate::protocol::{parse_turns, spoke_last, turns_or_greeting, AgentIdentity, LogEntry};
use crate::providers::{Reply, Responder};
use crate::store::LogStore;
use crate::sync::{commit_message, refresh, GitSync, NoopSync, RemoteSync};

/// States of a single cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleState {
    Idle,
    Syncing,
    Guarding,
    Responding,
    Publishing,
}

/// Why a cycle stopped before calling the responder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The literal last line of the log carries this agent's marker.
    OwnLastLine,
    /// The last parsed turn belongs to this agent.
    OwnLastTurn,
}

/// How a cycle ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum CycleOutcome {
    Skipped { reason: SkipReason },
    NoReply,
    /// The provider failed and the discard policy kept it out of the log.
    ResponderFailed { error: String },
    Published { entry: LogEntry },
}

/// States visited and the final outcome of one cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub agent: String,
    pub states: Vec<CycleState>,
    pub outcome: CycleOutcome,
}

/// Everything one agent needs to take a turn.
pub struct TurnCycle {
    identity: AgentIdentity,
    persona: String,
    store: LogStore,
    sync: Arc<dyn RemoteSync>,
    responder: Arc<dyn Responder>,
    policy: Policy,
}

impl TurnCycle {
    pub fn new(
        identity: AgentIdentity,
        persona: impl Into<String>,
        store: LogStore,
        sync: Arc<dyn RemoteSync>,
        responder: Arc<dyn Responder>,
    ) -> Self {
        Self {
            identity,
            persona: persona.into(),
            store,
            sync,
            responder,
            policy: Policy::default(),
        }
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    /// Wire a cycle for `agent_id` from settings.
    pub fn from_settings(settings: &Settings, agent_id: &str) -> Result<Self> {
        let identity = settings.identity(agent_id)?;
        let persona = settings.persona(agent_id)?;
        let responder = crate::providers::create_responder(settings.agent(agent_id)?)?;

        Ok(Self::new(
            identity,
            persona,
            LogStore::new(settings.log_path()),
            sync_from_settings(settings),
            responder,
        )
        .with_policy(settings.policy))
    }

    pub fn identity(&self) -> &AgentIdentity {
        &self.identity
    }

    fn enter(&self, states: &mut Vec<CycleState>, state: CycleState) {
        tracing::debug!(agent = %self.identity.id, ?state, "cycle transition");
        states.push(state);
    }

    fn finish(&self, mut states: Vec<CycleState>, outcome: CycleOutcome) -> CycleReport {
        self.enter(&mut states, CycleState::Idle);
        CycleReport {
            agent: self.identity.id.clone(),
            states,
            outcome,
        }
    }

    /// Run one full cycle.
    ///
    /// Sync problems are logged and ignored. A rejected push is returned as
    /// [`Error::Publish`]; the entry stays appended to the local log.
    pub async fn run(&self) -> Result<CycleReport> {
        let name = &self.identity.display_name;
        tracing::info!("Agent {} starting process cycle.", name);

        let mut states = vec![CycleState::Idle];

        self.enter(&mut states, CycleState::Syncing);
        refresh(self.sync.as_ref());
        let raw = self.store.read()?;

        self.enter(&mut states, CycleState::Guarding);
        if spoke_last(&raw, name) {
            tracing::info!("Last message was mine. Skipping.");
            return Ok(self.finish(
                states,
                CycleOutcome::Skipped {
                    reason: SkipReason::OwnLastLine,
                },
            ));
        }

        self.enter(&mut states, CycleState::Responding);
        let turns = parse_turns(&raw, name);
        if turns.last().is_some_and(|t| t.is_own()) {
            tracing::info!("Last turn was mine. Skipping.");
            return Ok(self.finish(
                states,
                CycleOutcome::Skipped {
                    reason: SkipReason::OwnLastTurn,
                },
            ));
        }

        let turns = turns_or_greeting(turns);
        tracing::info!(
            "Generating response via {} from {} turns...",
            self.responder.name(),
            turns.len()
        );

        let reply = self
            .responder
            .respond(&turns, &self.persona)
            .await
            .map(|reply| match reply {
                // responders outside this crate may skip the no-reply rules
                Reply::Text(text) => Reply::from_text(&text),
                Reply::NoReply => Reply::NoReply,
            });
        let text = match reply {
            Ok(Reply::Text(text)) => text,
            Ok(Reply::NoReply) => {
                tracing::info!("No response generated.");
                return Ok(self.finish(states, CycleOutcome::NoReply));
            }
            Err(e) => {
                tracing::error!("{} responder error: {}", self.responder.name(), e);
                let error = format!("Error communicating with {}: {}", name, e);
                match self.policy.responder_errors {
                    ResponderErrorPolicy::Publish => error,
                    ResponderErrorPolicy::Discard => {
                        return Ok(self.finish(states, CycleOutcome::ResponderFailed { error }));
                    }
                }
            }
        };

        self.enter(&mut states, CycleState::Publishing);
        let entry = LogEntry::new(name.clone(), &text)?;
        self.store.append(&entry)?;
        self.publish(&entry)?;
        tracing::info!("Response posted and pushed.");

        Ok(self.finish(states, CycleOutcome::Published { entry }))
    }

    /// Append a hand-written entry as this agent and publish it, without
    /// asking the responder. The self-reply guard does not apply.
    pub fn post(&self, text: &str) -> Result<LogEntry> {
        refresh(self.sync.as_ref());
        let entry = LogEntry::new(self.identity.display_name.clone(), text)?;
        self.store.append(&entry)?;
        self.publish(&entry)?;
        tracing::info!("Manual entry from {} posted.", entry.speaker);
        Ok(entry)
    }

    fn publish(&self, entry: &LogEntry) -> Result<()> {
        let message = commit_message(&entry.speaker, &entry.content);
        if let Err(e) = self.sync.commit(self.store.path(), &message) {
            tracing::warn!("Commit failed, pushing anyway: {}", e);
        }

        let first = match self.sync.push() {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        match self.policy.push_rejected {
            PushRejectedPolicy::Fail => {
                tracing::error!("Push rejected, entry remains local only: {}", first);
                Err(Error::Publish(first.to_string()))
            }
            PushRejectedPolicy::RebaseRetry => {
                tracing::warn!("Push rejected ({}), rebasing and retrying once", first);
                if let Err(e) = self.sync.pull() {
                    tracing::warn!("Rebase before retry failed: {}", e);
                }
                self.sync.push().map_err(|e| {
                    tracing::error!("Push retry rejected, entry remains local only: {}", e);
                    Error::Publish(e.to_string())
                })
            }
        }
    }
}

/// Sync backend selected by settings.
pub fn sync_from_settings(settings: &Settings) -> Arc<dyn RemoteSync> {
    if settings.sync.enabled {
        Arc::new(GitSync::with_binary(
            settings.root_dir(),
            settings.sync.git_binary.clone(),
        ))
    } else {
        Arc::new(NoopSync)
    }
}
