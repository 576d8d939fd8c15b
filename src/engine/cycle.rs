//! Cycle orchestration.
//!
//! One cycle is: load state, snapshot the working tree, classify, apply the
//! commit policy, execute, record. The engine owns everything that lives
//! across cycles (status cache, worker pool, compiled ignore rules); state
//! itself is re-read every cycle so operator edits to the document are
//! picked up.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::engine::changeset::{ChangeCounts, ChangeSet, ChangeSetBuilder};
use crate::engine::{message, policy};
use crate::error::{ConfigError, CycleError};
use crate::git::commit::{self, CommitOutcome};
use crate::git::process::{GitRunner, SystemGit};
use crate::git::status::StatusReader;
use crate::handoff::{self, CommitNote};
use crate::scan::ignore::IgnoreClassifier;
use crate::state::history::{CommitRecord, HistoryLog};
use crate::state::store::{EngineState, Fingerprint, StateStore};

/// What a single cycle concluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A commit was created and the state document updated.
    Committed {
        sequence: u64,
        commit_id: Option<String>,
        counts: ChangeCounts,
        message: String,
    },
    /// Classification found changes but the tool recorded nothing. State is
    /// left untouched so the next cycle re-evaluates from scratch.
    NothingToCommit,
    /// Changes exist but fewer than the configured minimum.
    BelowThreshold { total: usize, threshold: usize },
    /// Nothing committable this cycle.
    NoChanges,
}

/// Detection and commit engine for one watched working tree.
pub struct Engine {
    work_dir: PathBuf,
    config: EngineConfig,
    store: StateStore,
    history: HistoryLog,
    reader: StatusReader,
    builder: ChangeSetBuilder,
}

impl Engine {
    /// Build an engine for `dir`. Fails if an operator-supplied ignore
    /// pattern does not compile.
    pub fn new(dir: &Path, config: EngineConfig) -> Result<Self, ConfigError> {
        let ignore = IgnoreClassifier::new(&config.ignore_patterns)?;
        Ok(Self {
            work_dir: dir.to_path_buf(),
            store: StateStore::new(dir),
            history: HistoryLog::new(dir, config.history_limit),
            reader: StatusReader::new(Duration::from_secs(config.status_cache_ttl_secs)),
            builder: ChangeSetBuilder::new(dir, ignore, config.workers),
            config,
        })
    }

    /// Run one full cycle against the real git binary.
    pub async fn run_cycle(&self) -> Result<CycleOutcome, CycleError> {
        let runner = SystemGit::new(&self.work_dir, self.config.git_timeout_secs);
        self.run_cycle_with(&runner).await
    }

    pub(crate) async fn run_cycle_with<R: GitRunner>(
        &self,
        runner: &R,
    ) -> Result<CycleOutcome, CycleError> {
        let state = self.store.load()?;

        let snapshot = self
            .reader
            .snapshot(runner)
            .await
            .map_err(CycleError::StatusUnavailable)?;
        if snapshot.is_empty() {
            return Ok(CycleOutcome::NoChanges);
        }

        let changes = self.builder.build(&snapshot, &state).await;
        if changes.is_empty() {
            return Ok(CycleOutcome::NoChanges);
        }
        if !policy::should_commit(&changes, self.config.threshold) {
            debug!(
                "{} change(s) below commit threshold {}",
                changes.total_changes(),
                self.config.threshold
            );
            return Ok(CycleOutcome::BelowThreshold {
                total: changes.total_changes(),
                threshold: self.config.threshold,
            });
        }

        let timestamp = Utc::now();
        let commit_message = message::synthesize(&changes, timestamp);
        let outcome = commit::execute(runner, &changes, &commit_message, state.commit_count + 1)
            .await
            .map_err(CycleError::CommitFailed)?;

        match outcome {
            CommitOutcome::NothingToCommit => Ok(CycleOutcome::NothingToCommit),
            CommitOutcome::Committed {
                sequence,
                commit_id,
            } => {
                let counts = changes.counts();
                let mut state = state;
                apply_commit(&mut state, &changes, timestamp, sequence);
                self.store.persist(&state)?;

                let record = CommitRecord {
                    timestamp,
                    counts,
                    message: commit_message.clone(),
                    sequence_number: sequence,
                };
                if let Err(e) = self.history.append(record) {
                    warn!("Failed to append commit history: {}", e);
                }

                self.reader.invalidate().await;

                if let Some(hook) = &self.config.post_commit_hook {
                    handoff::dispatch(
                        hook,
                        &CommitNote {
                            commit_id: commit_id.clone(),
                            sequence,
                            summary: commit_message
                                .lines()
                                .next()
                                .unwrap_or_default()
                                .to_string(),
                            counts,
                        },
                    );
                }

                info!(
                    "Committed {} change(s) as commit #{}",
                    counts.total(),
                    sequence
                );
                Ok(CycleOutcome::Committed {
                    sequence,
                    commit_id,
                    counts,
                    message: commit_message,
                })
            }
        }
    }
}

/// Fold a successful commit into the state document. Digests were captured
/// at classification time, so the fingerprints always describe the content
/// that was actually committed.
fn apply_commit(
    state: &mut EngineState,
    changes: &ChangeSet,
    timestamp: DateTime<Utc>,
    sequence: u64,
) {
    for (path, digest) in &changes.digests {
        state.fingerprints.insert(
            path.clone(),
            Fingerprint {
                content_hash: digest.clone(),
            },
        );
    }
    for path in &changes.deleted_files {
        state.fingerprints.remove(path);
    }
    state.last_commit_timestamp = Some(timestamp);
    state.commit_count = sequence;
}
