//! Advisory file locking for log appends.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use crate::error::{Error, Result};

/// Age after which a lock file is considered abandoned.
const LOCK_STALE_MS: u64 = 5000;

/// How long `acquire_lock` keeps retrying a held lock.
const LOCK_WAIT_MS: u64 = 2000;

const LOCK_POLL_MS: u64 = 50;

fn lock_path_for(path: &Path) -> PathBuf {
    PathBuf::from(format!("{}.lock", path.display()))
}

fn lock_age_ms(lock_path: &Path) -> Option<u64> {
    let modified = lock_path.metadata().ok()?.modified().ok()?;
    let age = SystemTime::now().duration_since(modified).unwrap_or_default();
    Some(age.as_millis() as u64)
}

fn try_create(lock_path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(lock_path)
}

/// Acquire an exclusive lock on a file, waiting briefly if another local
/// process holds it.
pub fn acquire_lock(path: &Path) -> Result<LockHandle> {
    let lock_path = lock_path_for(path);
    let deadline = Instant::now() + Duration::from_millis(LOCK_WAIT_MS);

    loop {
        match try_create(&lock_path) {
            Ok(mut lock_file) => {
                lock_file.write_all(format!("{}\n", std::process::id()).as_bytes())?;
                lock_file.sync_all()?;
                tracing::debug!("Acquired lock: {}", lock_path.display());
                return Ok(LockHandle { lock_path });
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                if lock_age_ms(&lock_path).is_some_and(|age| age >= LOCK_STALE_MS) {
                    tracing::warn!("Removing stale lock: {}", lock_path.display());
                    std::fs::remove_file(&lock_path).ok();
                    continue;
                }
                if Instant::now() >= deadline {
                    return Err(Error::Log(format!(
                        "Lock file is held: {}",
                        lock_path.display()
                    )));
                }
                std::thread::sleep(Duration::from_millis(LOCK_POLL_MS));
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Lock handle - releases lock when dropped.
#[derive(Debug)]
pub struct LockHandle {
    lock_path: PathBuf,
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.lock_path) {
            tracing::warn!("Failed to release lock {}: {}", self.lock_path.display(), e);
        } else {
            tracing::debug!("Released lock: {}", self.lock_path.display());
        }
    }
}

/// Acquire lock, execute function, release lock.
pub fn with_lock<T, F>(path: &Path, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let _lock = acquire_lock(path)?;
    f()
}
