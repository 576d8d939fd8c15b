//! git subprocess spawning.
//!
//! Everything the engine asks of git goes through [`GitRunner`], so tests can
//! substitute a mock and the four-operation boundary (status, stage, remove,
//! commit) stays visible in one place.

use std::env;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::warn;

use crate::error::GitError;

/// Default timeout for git subprocess execution.
pub const DEFAULT_GIT_TIMEOUT_SECS: u64 = 10;

/// Environment variable overriding the configured subprocess timeout.
pub const TIMEOUT_ENV_VAR: &str = "GRAPHIS_GIT_TIMEOUT";

/// Resolve the effective subprocess timeout.
///
/// The `GRAPHIS_GIT_TIMEOUT` environment variable (seconds) takes precedence
/// over the configured value. Logs a warning if the variable is set but
/// contains an invalid value (non-numeric or empty) and falls back.
pub fn effective_timeout(configured_secs: u64) -> Duration {
    match env::var(TIMEOUT_ENV_VAR) {
        Ok(v) if !v.is_empty() => match v.parse::<u64>() {
            Ok(secs) => Duration::from_secs(secs),
            Err(_) => {
                warn!(
                    "Invalid {} value '{}', using configured {}s",
                    TIMEOUT_ENV_VAR, v, configured_secs
                );
                Duration::from_secs(configured_secs)
            }
        },
        _ => Duration::from_secs(configured_secs),
    }
}

/// Check if a git executable is installed and accessible.
///
/// Uses the `which` crate for cross-platform executable detection.
pub async fn check_git_installed() -> Result<(), GitError> {
    if which::which("git").is_err() {
        return Err(GitError::NotInstalled);
    }

    let version_check = Command::new("git")
        .arg("--version")
        .output()
        .await
        .map_err(GitError::SpawnFailed)?;

    if !version_check.status.success() {
        return Err(GitError::NotInstalled);
    }

    Ok(())
}

/// Captured result of one git invocation.
///
/// Non-zero exits are data, not errors: the commit path needs to inspect
/// git's "nothing to commit" refusal rather than fail on it.
#[derive(Debug, Clone)]
pub struct GitOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl GitOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// Map a non-zero exit to [`GitError::NonZeroExit`] for callers that
    /// require success.
    pub fn require_success(self, operation: &str) -> Result<GitOutput, GitError> {
        if self.success() {
            Ok(self)
        } else {
            Err(GitError::NonZeroExit {
                operation: operation.to_string(),
                code: self.code,
                stderr: self.stderr,
            })
        }
    }
}

/// Boundary trait for git subprocess execution.
///
/// The first element of `args` is the git subcommand; it doubles as the
/// operation label in timeout and exit errors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GitRunner: Send + Sync {
    /// Run one git command in the watched work tree under the timeout.
    ///
    /// Spawn failures and timeouts are errors; any completed invocation is
    /// `Ok`, whatever its exit code.
    async fn run_git(&self, args: &[String]) -> Result<GitOutput, GitError>;
}

/// Production runner spawning the system `git` binary.
#[derive(Debug, Clone)]
pub struct SystemGit {
    work_dir: PathBuf,
    timeout_secs: u64,
}

impl SystemGit {
    pub fn new(work_dir: &Path, timeout_secs: u64) -> Self {
        Self {
            work_dir: work_dir.to_path_buf(),
            timeout_secs,
        }
    }
}

#[async_trait]
impl GitRunner for SystemGit {
    async fn run_git(&self, args: &[String]) -> Result<GitOutput, GitError> {
        let operation = args.first().cloned().unwrap_or_else(|| "git".to_string());
        let timeout_duration = effective_timeout(self.timeout_secs);

        let mut cmd = Command::new("git");
        cmd.args(args)
            .current_dir(&self.work_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = timeout(timeout_duration, cmd.output())
            .await
            .map_err(|_| GitError::Timeout {
                operation,
                seconds: timeout_duration.as_secs(),
            })?
            .map_err(GitError::SpawnFailed)?;

        Ok(GitOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Convenience for building the owned argument vectors [`GitRunner`] takes.
pub fn git_args(args: &[&str]) -> Vec<String> {
    args.iter().map(|a| a.to_string()).collect()
}
