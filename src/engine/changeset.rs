//! ChangeSet classification.
//!
//! Turns a status snapshot plus the persisted state into the four disjoint
//! path lists the rest of the cycle operates on. Hashing and secret scanning
//! run concurrently under a bounded worker pool; everything else is a pure
//! walk over the results in candidate order, so classification is
//! deterministic.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::git::status::RepoSnapshot;
use crate::scan::hash;
use crate::scan::ignore::IgnoreClassifier;
use crate::scan::secrets::SecretScanner;
use crate::state::store::EngineState;

/// Change totals carried into messages and history records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeCounts {
    pub new: usize,
    pub modified: usize,
    pub deleted: usize,
}

impl ChangeCounts {
    pub fn total(&self) -> usize {
        self.new + self.modified + self.deleted
    }
}

/// The classified result of one detection cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    pub new_files: Vec<String>,
    pub modified_files: Vec<String>,
    pub deleted_files: Vec<String>,

    /// Paths excluded by the secret gate. Disjoint from the other three
    /// lists; nothing here may ever be staged.
    pub blocked_files: Vec<String>,

    /// Content digests recorded at classification time for new and modified
    /// paths. The post-commit state update stores exactly these, not a
    /// re-read of files that may have changed since.
    pub digests: HashMap<String, String>,
}

impl ChangeSet {
    pub fn counts(&self) -> ChangeCounts {
        ChangeCounts {
            new: self.new_files.len(),
            modified: self.modified_files.len(),
            deleted: self.deleted_files.len(),
        }
    }

    /// Total the commit policy evaluates; blocked paths do not count.
    pub fn total_changes(&self) -> usize {
        self.counts().total()
    }

    pub fn is_empty(&self) -> bool {
        self.total_changes() == 0
    }
}

/// Which snapshot list a candidate came from; decides what an unreadable
/// file means.
#[derive(Debug, Clone, Copy)]
enum Origin {
    Added,
    Modified,
}

#[derive(Debug)]
enum ScanResult {
    Blocked,
    Hashed(String),
    Vanished,
}

/// Builds classified ChangeSets from a status snapshot and the engine state.
pub struct ChangeSetBuilder {
    work_dir: PathBuf,
    ignore: IgnoreClassifier,
    scanner: Arc<SecretScanner>,
    permits: Arc<Semaphore>,
}

impl ChangeSetBuilder {
    pub fn new(work_dir: &Path, ignore: IgnoreClassifier, workers: usize) -> Self {
        Self {
            work_dir: work_dir.to_path_buf(),
            ignore,
            scanner: Arc::new(SecretScanner::new()),
            permits: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Classify one snapshot against the given state.
    ///
    /// All hash/scan work completes before this returns; the policy never
    /// sees a partially built ChangeSet.
    pub async fn build(&self, snapshot: &RepoSnapshot, state: &EngineState) -> ChangeSet {
        let mut candidates: Vec<(String, Origin)> = Vec::new();
        for path in &snapshot.added {
            if self.ignore.is_ignored(path) {
                debug!("Ignoring {}", path);
            } else {
                candidates.push((path.clone(), Origin::Added));
            }
        }
        for path in &snapshot.modified {
            if self.ignore.is_ignored(path) {
                debug!("Ignoring {}", path);
            } else {
                candidates.push((path.clone(), Origin::Modified));
            }
        }

        let results = self.scan_candidates(&candidates).await;

        let mut changes = ChangeSet::default();
        for ((path, origin), result) in candidates.into_iter().zip(results) {
            match result {
                ScanResult::Blocked => {
                    warn!("Secret pattern matched in {}, excluded from this cycle", path);
                    changes.blocked_files.push(path);
                }
                ScanResult::Vanished => match origin {
                    // Reported modified but unreadable: indistinguishable
                    // from a file deleted mid-cycle.
                    Origin::Modified => changes.deleted_files.push(path),
                    Origin::Added => debug!("{} vanished before it could be hashed", path),
                },
                ScanResult::Hashed(digest) => match state.fingerprints.get(&path) {
                    None => {
                        changes.digests.insert(path.clone(), digest);
                        changes.new_files.push(path);
                    }
                    Some(known) if known.content_hash != digest => {
                        changes.digests.insert(path.clone(), digest);
                        changes.modified_files.push(path);
                    }
                    Some(_) => debug!("{} unchanged since last recorded commit", path),
                },
            }
        }

        for path in &snapshot.deleted {
            if self.ignore.is_ignored(path) {
                debug!("Ignoring deletion of {}", path);
            } else {
                changes.deleted_files.push(path.clone());
            }
        }

        changes
    }

    /// Hash and scan candidates concurrently under the worker bound.
    ///
    /// Results come back in candidate order regardless of task completion
    /// order.
    async fn scan_candidates(&self, candidates: &[(String, Origin)]) -> Vec<ScanResult> {
        let mut handles = Vec::with_capacity(candidates.len());
        for (path, _) in candidates {
            let abs = self.work_dir.join(path);
            let scanner = Arc::clone(&self.scanner);
            let permits = Arc::clone(&self.permits);
            handles.push(tokio::spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .unwrap_or_else(|_| unreachable!("scan semaphore closed"));
                if scanner.scan_path(&abs).await {
                    return ScanResult::Blocked;
                }
                match hash::hash_path(&abs).await {
                    Some(digest) => ScanResult::Hashed(digest),
                    None => ScanResult::Vanished,
                }
            }));
        }

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            // A panicked worker reads the same as an unreadable file for
            // that one path.
            results.push(handle.await.unwrap_or(ScanResult::Vanished));
        }
        results
    }
}
