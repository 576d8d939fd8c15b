//! Engine configuration.
//!
//! Built-in defaults, overridden by an optional `graphis.toml` in the watched
//! directory, overridden in turn by CLI flags. Values are validated after
//! every layer so a bad flag fails as loudly as a bad file.

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;

/// Config file looked up in the watched directory.
pub const CONFIG_FILE_NAME: &str = "graphis.toml";

/// Default sleep between daemon cycles, in seconds.
pub const DEFAULT_INTERVAL_SECS: u64 = 300;

/// Default minimum number of changes before a commit is considered.
pub const DEFAULT_THRESHOLD: usize = 3;

/// Default number of concurrent hash/scan workers.
pub const DEFAULT_WORKERS: usize = 4;

/// Upper bound on hash/scan workers; larger values are clamped.
pub const MAX_WORKERS: usize = 8;

/// Default TTL for the memoized working-tree status, in seconds.
pub const DEFAULT_STATUS_TTL_SECS: u64 = 15;

/// Default cap on retained commit history records.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Runtime configuration for the engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seconds to sleep between daemon cycles.
    pub interval_secs: u64,

    /// Minimum total change count (new + modified + deleted) to commit.
    pub threshold: usize,

    /// Concurrent workers for per-file hashing and secret scanning.
    pub workers: usize,

    /// Timeout applied to every git subprocess call, in seconds.
    pub git_timeout_secs: u64,

    /// How long a working-tree status query stays memoized, in seconds.
    pub status_cache_ttl_secs: u64,

    /// Additional exclusion rules on top of the built-in ignore set.
    pub ignore_patterns: Vec<String>,

    /// Optional command spawned after each successful commit.
    pub post_commit_hook: Option<String>,

    /// Maximum commit records retained in the history file.
    pub history_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
            threshold: DEFAULT_THRESHOLD,
            workers: DEFAULT_WORKERS,
            git_timeout_secs: crate::git::process::DEFAULT_GIT_TIMEOUT_SECS,
            status_cache_ttl_secs: DEFAULT_STATUS_TTL_SECS,
            ignore_patterns: Vec::new(),
            post_commit_hook: None,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl EngineConfig {
    /// Load configuration for the watched directory.
    ///
    /// Reads `graphis.toml` from the directory when present, otherwise the
    /// built-in defaults apply.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILE_NAME);
        let config: Self = if path.exists() {
            let raw = std::fs::read_to_string(&path).map_err(ConfigError::Read)?;
            toml::from_str(&raw).map_err(ConfigError::Parse)?
        } else {
            Self::default()
        };
        config.validated()
    }

    /// Range-check and clamp values, consuming and returning the config.
    ///
    /// Called after file load and again after CLI overrides.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        if self.threshold == 0 {
            return Err(ConfigError::InvalidValue {
                field: "threshold".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "interval_secs".to_string(),
                reason: "must be at least 1 second".to_string(),
            });
        }
        if self.git_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "git_timeout_secs".to_string(),
                reason: "must be at least 1 second".to_string(),
            });
        }

        let clamped = self.workers.clamp(1, MAX_WORKERS);
        if clamped != self.workers {
            debug!(
                "workers = {} outside 1..={}, clamped to {}",
                self.workers, MAX_WORKERS, clamped
            );
            self.workers = clamped;
        }

        Ok(self)
    }
}
