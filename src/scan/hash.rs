//! Content fingerprints.

use std::path::Path;

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of a byte buffer.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Fingerprint a file's current content.
///
/// Any read failure (missing file, permissions, transient I/O) yields `None`:
/// a file that cannot be read is a vanished candidate, not an error.
pub async fn hash_path(path: &Path) -> Option<String> {
    let bytes = tokio::fs::read(path).await.ok()?;
    Some(hash_bytes(&bytes))
}
