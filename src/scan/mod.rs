//! Per-file classification leaves: exclusion rules, fingerprints, secret gate.

pub mod hash;
pub mod ignore;
pub mod secrets;

pub use hash::{hash_bytes, hash_path};
pub use ignore::IgnoreClassifier;
pub use secrets::SecretScanner;
