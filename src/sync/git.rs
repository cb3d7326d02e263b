//! Git-backed log replication.
//!
//! Shells out to the `git` binary in the repository root holding the log.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Error, Result};

use super::RemoteSync;

/// `git stash` prints this when the working tree is clean.
const NOTHING_TO_STASH: &str = "No local changes to save";

#[derive(Debug)]
pub struct GitSync {
    repo_dir: PathBuf,
    binary: String,
    stashed: AtomicBool,
}

impl GitSync {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self::with_binary(repo_dir, "git")
    }

    pub fn with_binary(repo_dir: impl Into<PathBuf>, binary: impl Into<String>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
            binary: binary.into(),
            stashed: AtomicBool::new(false),
        }
    }

    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    /// Run a git command in the repo root, returning trimmed stdout.
    fn run(&self, args: &[&str]) -> Result<String> {
        let output = Command::new(&self.binary)
            .args(args)
            .current_dir(&self.repo_dir)
            .output()
            .map_err(|e| Error::Sync(format!("failed to run {} {}: {}", self.binary, args.join(" "), e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!("Git command '{}' failed: {}", args.join(" "), stderr.trim());
            return Err(Error::Sync(format!(
                "git {} failed: {}",
                args.join(" "),
                stderr.trim()
            )));
        }

        tracing::info!("Git command '{}' success.", args.join(" "));
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl RemoteSync for GitSync {
    fn name(&self) -> &str {
        "git"
    }

    fn stash_local(&self) -> Result<()> {
        let stdout = self.run(&["stash"])?;
        self.stashed
            .store(!stdout.contains(NOTHING_TO_STASH), Ordering::SeqCst);
        Ok(())
    }

    fn pull(&self) -> Result<()> {
        self.run(&["pull", "--rebase"]).map(|_| ())
    }

    fn restore_local_stash(&self) -> Result<()> {
        if !self.stashed.swap(false, Ordering::SeqCst) {
            tracing::debug!("Nothing stashed, skipping stash pop");
            return Ok(());
        }
        self.run(&["stash", "pop"]).map(|_| ())
    }

    fn commit(&self, path: &Path, message: &str) -> Result<()> {
        let target = path
            .strip_prefix(&self.repo_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string();
        self.run(&["add", &target])?;
        self.run(&["commit", "-m", message]).map(|_| ())
    }

    fn push(&self) -> Result<()> {
        self.run(&["push"]).map(|_| ())
    }
}
