//! The on-disk engine state document.
//!
//! One JSON file under the watched tree records the last committed
//! fingerprint of every tracked path. It is read once at the start of a
//! cycle and written once, atomically, after a successful commit.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::warn;

use crate::error::StateError;

/// Directory under the watched tree holding engine artifacts.
pub const STATE_DIR: &str = ".graphis";

/// State document file name within [`STATE_DIR`].
pub const STATE_FILE: &str = "state.json";

/// Last recorded fingerprint of one tracked file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fingerprint {
    pub content_hash: String,
}

/// The persisted state document.
///
/// Unknown top-level fields in an existing document are ignored on read, so
/// older engines can open documents written by newer ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineState {
    /// Fingerprints keyed by repository-relative path. A path appears at
    /// most once.
    pub fingerprints: BTreeMap<String, Fingerprint>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_commit_timestamp: Option<DateTime<Utc>>,

    pub commit_count: u64,
}

/// Owns the state document location and its load/persist lifecycle.
pub struct StateStore {
    dir: PathBuf,
    path: PathBuf,
}

impl StateStore {
    /// Store rooted at the watched directory.
    pub fn new(watched_dir: &Path) -> Self {
        let dir = watched_dir.join(STATE_DIR);
        let path = dir.join(STATE_FILE);
        Self { dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the state document.
    ///
    /// A missing file is the empty initial state. A corrupt document is
    /// recovered as the empty state with a logged warning; the next cycles
    /// re-detect and re-fingerprint from scratch.
    pub fn load(&self) -> Result<EngineState, StateError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(EngineState::default());
            }
            Err(e) => return Err(StateError::Read(e)),
        };

        match serde_json::from_str(&raw) {
            Ok(state) => Ok(state),
            Err(e) => {
                warn!(
                    "State document {} is corrupt ({}), starting from empty state",
                    self.path.display(),
                    e
                );
                Ok(EngineState::default())
            }
        }
    }

    /// Persist the state document atomically.
    pub fn persist(&self, state: &EngineState) -> Result<(), StateError> {
        let mut json = serde_json::to_string_pretty(state).map_err(StateError::Encode)?;
        json.push('\n');
        write_atomic(&self.dir, &self.path, json.as_bytes())
    }
}

/// Write via temp-file-in-same-directory plus rename, so a concurrent reader
/// never observes a partial document.
pub(crate) fn write_atomic(dir: &Path, path: &Path, bytes: &[u8]) -> Result<(), StateError> {
    std::fs::create_dir_all(dir).map_err(StateError::Write)?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(StateError::Write)?;
    tmp.write_all(bytes).map_err(StateError::Write)?;
    tmp.persist(path).map_err(|e| StateError::Write(e.error))?;
    Ok(())
}
