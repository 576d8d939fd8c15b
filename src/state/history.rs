//! Append-only capped commit history.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::engine::changeset::ChangeCounts;
use crate::error::StateError;

use super::store::{STATE_DIR, write_atomic};

/// History file name within the state directory.
pub const HISTORY_FILE: &str = "history.json";

/// One successful commit, as recorded in the history file. Never mutated
/// after being written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRecord {
    pub timestamp: DateTime<Utc>,
    pub counts: ChangeCounts,
    pub message: String,
    pub sequence_number: u64,
}

/// Capped append-only log beside the state document.
pub struct HistoryLog {
    dir: PathBuf,
    path: PathBuf,
    limit: usize,
}

impl HistoryLog {
    pub fn new(watched_dir: &Path, limit: usize) -> Self {
        let dir = watched_dir.join(STATE_DIR);
        let path = dir.join(HISTORY_FILE);
        Self { dir, path, limit }
    }

    /// Load all retained records, oldest first.
    ///
    /// Missing or corrupt history recovers as empty; the history is an
    /// operator convenience, not required for correctness.
    pub fn load(&self) -> Result<Vec<CommitRecord>, StateError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StateError::Read(e)),
        };

        match serde_json::from_str(&raw) {
            Ok(records) => Ok(records),
            Err(e) => {
                warn!(
                    "History file {} is corrupt ({}), starting a fresh history",
                    self.path.display(),
                    e
                );
                Ok(Vec::new())
            }
        }
    }

    /// Append one record, pruning the oldest entries past the cap.
    pub fn append(&self, record: CommitRecord) -> Result<(), StateError> {
        let mut records = self.load()?;
        records.push(record);
        if records.len() > self.limit {
            let excess = records.len() - self.limit;
            records.drain(..excess);
        }

        let mut json = serde_json::to_string_pretty(&records).map_err(StateError::Encode)?;
        json.push('\n');
        write_atomic(&self.dir, &self.path, json.as_bytes())
    }
}
