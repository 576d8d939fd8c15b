//! git subprocess boundary: runner, status reader, commit executor.
//!
//! Exactly four operations cross this boundary (status, stage, remove,
//! commit), each under a bounded timeout.

pub mod commit;
pub mod process;
pub mod status;

pub use commit::{CommitOutcome, execute};
pub use process::{GitOutput, GitRunner, SystemGit, check_git_installed};
pub use status::{RepoSnapshot, StatusReader};
