//! Change classification, commit policy, and cycle orchestration.

pub mod changeset;
pub mod cycle;
pub mod message;
pub mod policy;

pub use changeset::{ChangeCounts, ChangeSet, ChangeSetBuilder};
pub use cycle::{CycleOutcome, Engine};
