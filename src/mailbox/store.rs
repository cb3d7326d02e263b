//! File-based agent mailboxes and job artifacts.
//!
//! Layout under the storage root:
//! - `hivemind-comms/<agent>/inbox/<job_id>.md`: tasks for the agent
//! - `hivemind-comms/<agent>/outbox/<job_id>_response.md`: its answers
//! - `artifacts/<job_id>/<filename>`: immutable job outputs

use regex::Regex;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::error::{Error, Result};

use super::types::{MailboxStatus, Priority, ResponseState, TaskHeader};

/// Mailbox directory name.
pub const COMMS_DIR: &str = "hivemind-comms";

/// Artifact directory name.
pub const ARTIFACTS_DIR: &str = "artifacts";

const INBOX: &str = "inbox";
const OUTBOX: &str = "outbox";

const SAFE_NAME_PATTERN: &str = r"^[A-Za-z0-9._-]+$";

/// Reject anything that is not a single plain path component.
pub fn validate_name(name: &str) -> Result<&str> {
    static SAFE: OnceLock<Regex> = OnceLock::new();
    let safe = SAFE.get_or_init(|| Regex::new(SAFE_NAME_PATTERN).expect("valid name pattern"));

    if !safe.is_match(name) || name == "." || name == ".." {
        return Err(Error::InvalidName(name.to_string()));
    }
    Ok(name)
}

/// Store for all agent mailboxes.
#[derive(Debug, Clone)]
pub struct Mailbox {
    comms_dir: PathBuf,
    artifacts_dir: PathBuf,
}

impl Mailbox {
    /// Open the mailbox under `root`, creating the top-level directories.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let mailbox = Self {
            comms_dir: root.join(COMMS_DIR),
            artifacts_dir: root.join(ARTIFACTS_DIR),
        };
        fs::create_dir_all(&mailbox.comms_dir)?;
        fs::create_dir_all(&mailbox.artifacts_dir)?;
        Ok(mailbox)
    }

    fn agent_dir(&self, agent: &str) -> Result<PathBuf> {
        Ok(self.comms_dir.join(validate_name(agent)?))
    }

    /// Registered agent names, sorted.
    pub fn list_agents(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.comms_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Create inbox and outbox for an agent. Registering twice is harmless.
    pub fn register_agent(&self, agent: &str) -> Result<PathBuf> {
        let dir = self.agent_dir(agent)?;
        fs::create_dir_all(dir.join(INBOX))?;
        fs::create_dir_all(dir.join(OUTBOX))?;
        tracing::info!("Agent {} registered at {}", agent, dir.display());
        Ok(dir)
    }

    /// Write a task into an agent's inbox, keyed by job id.
    pub fn create_task(
        &self,
        agent: &str,
        job_id: &str,
        content: &str,
        priority: Priority,
    ) -> Result<PathBuf> {
        let inbox = self.agent_dir(agent)?.join(INBOX);
        if !inbox.is_dir() {
            return Err(Error::NotFound(format!(
                "Agent {} not found. Register it first.",
                agent
            )));
        }

        let path = inbox.join(format!("{}.md", validate_name(job_id)?));
        let header = TaskHeader::new(job_id, priority);
        fs::write(&path, format!("{}{}", header.render(), content))?;

        tracing::info!("Task {} ({}) created at {}", job_id, priority, path.display());
        Ok(path)
    }

    /// Read an agent's response for a job.
    pub fn read_response(&self, agent: &str, job_id: &str) -> Result<ResponseState> {
        let path = self
            .agent_dir(agent)?
            .join(OUTBOX)
            .join(format!("{}_response.md", validate_name(job_id)?));

        match fs::read_to_string(&path) {
            Ok(text) => Ok(ResponseState::Ready(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(ResponseState::Pending),
            Err(e) => Err(e.into()),
        }
    }

    /// Store an artifact under the job's directory. Existing artifacts are
    /// never overwritten.
    pub fn store_artifact(&self, job_id: &str, filename: &str, content: &str) -> Result<PathBuf> {
        let dir = self.artifacts_dir.join(validate_name(job_id)?);
        fs::create_dir_all(&dir)?;

        let path = dir.join(validate_name(filename)?);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(Error::Conflict(format!(
                    "artifact {}/{} is immutable",
                    job_id, filename
                )));
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(content.as_bytes())?;

        tracing::info!("Artifact stored: {}", path.display());
        Ok(path)
    }

    /// Inbox and outbox counts for an agent.
    pub fn status(&self, agent: &str) -> Result<MailboxStatus> {
        let dir = self.agent_dir(agent)?;
        if !dir.is_dir() {
            return Err(Error::NotFound(format!("Agent {} not found", agent)));
        }

        Ok(MailboxStatus {
            name: agent.to_string(),
            inbox_count: count_files(&dir.join(INBOX))?,
            outbox_count: count_files(&dir.join(OUTBOX))?,
        })
    }
}

fn count_files(dir: &Path) -> Result<usize> {
    if !dir.is_dir() {
        return Ok(0);
    }
    let mut count = 0;
    for entry in fs::read_dir(dir)? {
        if entry?.file_type()?.is_file() {
            count += 1;
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailbox::types::PENDING_SENTINEL;

    fn mailbox() -> (tempfile::TempDir, Mailbox) {
        let temp_dir = tempfile::tempdir().unwrap();
        let mailbox = Mailbox::open(temp_dir.path()).unwrap();
        (temp_dir, mailbox)
    }

    #[test]
    fn test_register_and_list() {
        let (_dir, mailbox) = mailbox();
        assert!(mailbox.list_agents().unwrap().is_empty());

        mailbox.register_agent("jules").unwrap();
        mailbox.register_agent("abacus-compute").unwrap();
        mailbox.register_agent("jules").unwrap();

        assert_eq!(mailbox.list_agents().unwrap(), vec!["abacus-compute", "jules"]);
    }

    #[test]
    fn test_task_requires_registration() {
        let (_dir, mailbox) = mailbox();
        let err = mailbox
            .create_task("ghost", "job-1", "do things", Priority::Normal)
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(ref msg) if msg.contains("Register it first")));
    }

    #[test]
    fn test_task_file_format() {
        let (_dir, mailbox) = mailbox();
        mailbox.register_agent("jules").unwrap();

        let path = mailbox
            .create_task("jules", "job-1", "Refactor the parser.", Priority::High)
            .unwrap();
        let text = fs::read_to_string(&path).unwrap();

        assert!(path.ends_with("hivemind-comms/jules/inbox/job-1.md"));
        assert!(text.starts_with("---\njob_id: job-1\nfrom: orchestrator\npriority: high\ncreated_at: "));
        assert!(text.ends_with("---\n\nRefactor the parser."));
        assert_eq!(mailbox.status("jules").unwrap().inbox_count, 1);
    }

    #[test]
    fn test_read_response_pending_then_ready() {
        let (dir, mailbox) = mailbox();
        mailbox.register_agent("jules").unwrap();

        let state = mailbox.read_response("jules", "job-1").unwrap();
        assert_eq!(state.clone().into_text(), PENDING_SENTINEL);
        assert_eq!(state, ResponseState::Pending);

        fs::write(
            dir.path().join("hivemind-comms/jules/outbox/job-1_response.md"),
            "All done.",
        )
        .unwrap();

        assert_eq!(
            mailbox.read_response("jules", "job-1").unwrap(),
            ResponseState::Ready("All done.".to_string())
        );
        assert_eq!(mailbox.status("jules").unwrap().outbox_count, 1);
    }

    #[test]
    fn test_artifacts_are_immutable() {
        let (dir, mailbox) = mailbox();

        let path = mailbox.store_artifact("job-1", "report.md", "v1").unwrap();
        assert_eq!(path, dir.path().join("artifacts/job-1/report.md"));

        let err = mailbox.store_artifact("job-1", "report.md", "v2").unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(fs::read_to_string(path).unwrap(), "v1");
    }

    #[test]
    fn test_rejects_path_traversal() {
        let (_dir, mailbox) = mailbox();
        assert!(matches!(mailbox.register_agent("../etc"), Err(Error::InvalidName(_))));
        assert!(matches!(mailbox.register_agent(".."), Err(Error::InvalidName(_))));
        assert!(matches!(
            mailbox.store_artifact("job-1", "a/b.txt", "x"),
            Err(Error::InvalidName(_))
        ));
        assert!(matches!(mailbox.read_response("jules", ""), Err(Error::InvalidName(_))));
    }

    #[test]
    fn test_validate_name_accepts_plain_components() {
        for name in ["jules", "abacus-compute", "job_1.v2", "..x"] {
            assert_eq!(validate_name(name).unwrap(), name);
        }
        for name in ["", ".", "..", "a b", "a/b", "a\\b", "jules\n"] {
            assert!(matches!(validate_name(name), Err(Error::InvalidName(_))), "{:?}", name);
        }
    }

    #[test]
    fn test_status_unknown_agent() {
        let (_dir, mailbox) = mailbox();
        assert!(matches!(mailbox.status("nobody"), Err(Error::NotFound(_))));
    }
}
