//! The meeting log file: append-only, created empty on first access.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::protocol::{parse_entries, LogEntry};

use super::lock::with_lock;

/// Default log file name, relative to the repository root.
pub const DEFAULT_LOG_FILE: &str = "meeting_log.md";

/// File-backed meeting log.
#[derive(Debug, Clone)]
pub struct LogStore {
    path: PathBuf,
}

impl LogStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the log (and its parent directory) if it does not exist yet.
    pub fn ensure_exists(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        OpenOptions::new().create(true).append(true).open(&self.path)?;
        tracing::info!("Created empty meeting log at {}", self.path.display());
        Ok(())
    }

    /// Read the full raw log.
    pub fn read(&self) -> Result<String> {
        self.ensure_exists()?;
        Ok(fs::read_to_string(&self.path)?)
    }

    /// Read and parse the log into entries.
    pub fn entries(&self) -> Result<Vec<LogEntry>> {
        Ok(parse_entries(&self.read()?))
    }

    /// Append one entry. Returns the exact text written.
    pub fn append(&self, entry: &LogEntry) -> Result<String> {
        self.ensure_exists()?;
        let text = entry.render();

        with_lock(&self.path, || {
            let mut file = OpenOptions::new().append(true).open(&self.path)?;
            file.write_all(text.as_bytes())?;
            file.flush()?;
            Ok(())
        })?;

        tracing::debug!(
            "Appended {} bytes for {} to {}",
            text.len(),
            entry.speaker,
            self.path.display()
        );
        Ok(text)
    }
}
