//! graphis - An autonomous change-detection and auto-commit engine for git working trees.
//!
//! # Overview
//!
//! graphis watches a single working tree, classifies changes by content hash
//! against its own persisted fingerprints, keeps secret-bearing files out of
//! every commit, and batches the rest into deterministic auto-commits through
//! the git CLI.

pub mod config;
pub mod daemon;
pub mod engine;
pub mod error;
pub mod git;
pub mod handoff;
pub mod scan;
pub mod state;

// Re-export commonly used types
pub use config::EngineConfig;
pub use engine::{ChangeCounts, ChangeSet, CycleOutcome, Engine};
pub use error::{ConfigError, CycleError, DaemonError, GitError, StateError};
pub use git::{GitRunner, RepoSnapshot, SystemGit};
pub use state::{CommitRecord, EngineState};
