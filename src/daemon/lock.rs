//! Single-instance lock.
//!
//! One engine per watched directory. The lock is an advisory file lock on
//! `.graphis/daemon.lock`, held for the life of the process and released by
//! the OS even if the process dies without dropping the guard.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use fs2::FileExt;

use crate::error::DaemonError;
use crate::state::store::STATE_DIR;

const LOCK_FILE: &str = "daemon.lock";

/// Guard for the instance lock. Dropping it releases the lock.
pub struct InstanceLock {
    #[allow(dead_code)]
    file: std::fs::File,
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

impl InstanceLock {
    /// Try to take the lock for `dir`. Fails fast with `AlreadyRunning` if
    /// another instance holds it.
    pub fn acquire(dir: &Path) -> Result<Self, DaemonError> {
        let lock_dir = dir.join(STATE_DIR);
        std::fs::create_dir_all(&lock_dir).map_err(DaemonError::Lock)?;
        let path = lock_dir.join(LOCK_FILE);

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(DaemonError::Lock)?;

        // Contention surfaces as a platform-specific error code; fs2 owns
        // the mapping on each OS.
        file.try_lock_exclusive().map_err(|e| {
            if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() {
                DaemonError::AlreadyRunning {
                    path: path.display().to_string(),
                }
            } else {
                DaemonError::Lock(e)
            }
        })?;

        // The PID is informational for operators; the lock itself is what
        // enforces exclusivity.
        let mut file = file;
        let _ = file.set_len(0);
        let _ = write!(file, "{}", std::process::id());

        Ok(Self { file })
    }
}
