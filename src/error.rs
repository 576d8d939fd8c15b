//! Error types for graphis modules using thiserror.

use thiserror::Error;

/// Errors from git subprocess operations.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("git executable not found in PATH. Install git or adjust PATH before running graphis")]
    NotInstalled,

    #[error("Failed to spawn git process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("git {operation} timed out after {seconds} seconds")]
    Timeout { operation: String, seconds: u64 },

    #[error("git {operation} exited with code {code}: {stderr}")]
    NonZeroExit {
        operation: String,
        code: i32,
        stderr: String,
    },
}

/// Errors from reading or writing the on-disk engine state.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("Failed to read state document: {0}")]
    Read(#[source] std::io::Error),

    #[error("Failed to encode state document: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Failed to write state document: {0}")]
    Write(#[source] std::io::Error),
}

/// Errors from loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[source] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("Invalid ignore pattern '{pattern}': {source}")]
    InvalidIgnorePattern {
        pattern: String,
        #[source]
        source: regex_lite::Error,
    },

    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Errors that abort a single detection/commit cycle.
///
/// Per-file conditions (vanished files, secret matches) are absorbed into the
/// ChangeSet classification and never become a `CycleError`.
#[derive(Error, Debug)]
pub enum CycleError {
    #[error("Working-tree status unavailable: {0}")]
    StatusUnavailable(#[source] GitError),

    #[error("Commit failed, no state was recorded: {0}")]
    CommitFailed(#[source] GitError),

    #[error("State document error: {0}")]
    State(#[from] StateError),
}

/// Errors from daemon startup and lifecycle.
#[derive(Error, Debug)]
pub enum DaemonError {
    #[error(
        "Another graphis instance already holds the lock at {path}. Stop it first or pick a different directory"
    )]
    AlreadyRunning { path: String },

    #[error("Failed to open lock file: {0}")]
    Lock(#[source] std::io::Error),

    #[error("git unavailable: {0}")]
    Git(#[from] GitError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
