//! Persistent engine state: fingerprint document and commit history.

pub mod history;
pub mod store;

pub use history::{CommitRecord, HistoryLog};
pub use store::{EngineState, Fingerprint, StateStore};
