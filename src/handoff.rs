//! Post-commit hand-off.
//!
//! After a successful commit the engine can notify one downstream command,
//! passing the commit identifier and summary through the environment. The
//! hand-off is fire-and-forget: the child is spawned detached, its exit is
//! awaited in a background task purely for logging, and nothing here can
//! roll back or fail the commit that triggered it.

use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::engine::changeset::ChangeCounts;

/// The hook gets this long to exit before its outcome stops being logged.
const HOOK_WAIT_SECS: u64 = 120;

/// What a downstream consumer learns about one commit.
#[derive(Debug, Clone)]
pub struct CommitNote {
    pub commit_id: Option<String>,
    pub sequence: u64,
    pub summary: String,
    pub counts: ChangeCounts,
}

/// Spawn the configured hook command with the commit details in its
/// environment. Never returns an error; every failure mode is a warning.
pub fn dispatch(hook: &str, note: &CommitNote) {
    let mut parts = hook.split_whitespace();
    let Some(program) = parts.next() else {
        warn!("Post-commit hook is configured but empty, skipping");
        return;
    };

    let mut command = Command::new(program);
    command
        .args(parts)
        .env("GRAPHIS_COMMIT_ID", note.commit_id.as_deref().unwrap_or(""))
        .env("GRAPHIS_COMMIT_SEQUENCE", note.sequence.to_string())
        .env("GRAPHIS_COMMIT_SUMMARY", &note.summary)
        .env("GRAPHIS_COMMIT_NEW", note.counts.new.to_string())
        .env("GRAPHIS_COMMIT_MODIFIED", note.counts.modified.to_string())
        .env("GRAPHIS_COMMIT_DELETED", note.counts.deleted.to_string())
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null());

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            warn!("Failed to spawn post-commit hook '{}': {}", hook, e);
            return;
        }
    };

    let label = program.to_string();
    tokio::spawn(async move {
        match timeout(Duration::from_secs(HOOK_WAIT_SECS), child.wait()).await {
            Ok(Ok(status)) if status.success() => {
                debug!("Post-commit hook '{}' finished", label);
            }
            Ok(Ok(status)) => {
                warn!(
                    "Post-commit hook '{}' exited with code {}",
                    label,
                    status.code().unwrap_or(-1)
                );
            }
            Ok(Err(e)) => {
                warn!("Failed to wait on post-commit hook '{}': {}", label, e);
            }
            Err(_) => {
                warn!(
                    "Post-commit hook '{}' still running after {}s, leaving it be",
                    label, HOOK_WAIT_SECS
                );
            }
        }
    });
}
