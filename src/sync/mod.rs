//! Replication of the meeting log between agents.
//!
//! The engine only ever talks to [`RemoteSync`]; `git` is one implementation,
//! [`NoopSync`] keeps everything local.

pub mod git;

use std::path::Path;

use crate::error::Result;

pub use git::GitSync;

/// Remote synchronization collaborator.
///
/// Every call reports success or failure on its own. Callers decide which
/// failures matter: only `push` ends a cycle.
pub trait RemoteSync: Send + Sync {
    /// Backend name, for logs.
    fn name(&self) -> &str;

    /// Set local uncommitted edits aside.
    fn stash_local(&self) -> Result<()>;

    /// Bring remote changes into the local copy.
    fn pull(&self) -> Result<()>;

    /// Re-apply edits set aside by `stash_local`.
    fn restore_local_stash(&self) -> Result<()>;

    /// Record the log file change locally.
    fn commit(&self, path: &Path, message: &str) -> Result<()>;

    /// Send local commits to the remote.
    fn push(&self) -> Result<()>;
}

/// Stash, pull, restore. Failures are logged and swallowed, the caller carries
/// on with whatever the local copy holds.
pub fn refresh(sync: &dyn RemoteSync) {
    tracing::info!("Syncing repository via {}...", sync.name());

    if let Err(e) = sync.stash_local() {
        tracing::warn!("Stash failed, continuing: {}", e);
    }
    if let Err(e) = sync.pull() {
        tracing::warn!("Pull failed, continuing on local state: {}", e);
    }
    if let Err(e) = sync.restore_local_stash() {
        tracing::warn!("Restoring stash failed, continuing: {}", e);
    }
}

/// Sync backend that does nothing, for single-machine runs.
#[derive(Debug, Default, Clone)]
pub struct NoopSync;

impl RemoteSync for NoopSync {
    fn name(&self) -> &str {
        "noop"
    }

    fn stash_local(&self) -> Result<()> {
        Ok(())
    }

    fn pull(&self) -> Result<()> {
        Ok(())
    }

    fn restore_local_stash(&self) -> Result<()> {
        Ok(())
    }

    fn commit(&self, _path: &Path, _message: &str) -> Result<()> {
        Ok(())
    }

    fn push(&self) -> Result<()> {
        Ok(())
    }
}

/// Commit message for a published reply: speaker plus the first 50 characters.
pub fn commit_message(speaker: &str, reply: &str) -> String {
    let head: String = reply.chars().take(50).collect();
    format!("{}: {}...", speaker, head)
}
