//! Commit policy.
//!
//! Pure decision over a classified ChangeSet. Blocked paths never count
//! toward the threshold, so a cycle that only found secrets commits nothing.

use crate::engine::changeset::ChangeSet;

/// Whether the cycle should proceed to a commit.
pub fn should_commit(changes: &ChangeSet, threshold: usize) -> bool {
    changes.total_changes() >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changes_of(new: usize, modified: usize, deleted: usize) -> ChangeSet {
        ChangeSet {
            new_files: (0..new).map(|i| format!("n{}", i)).collect(),
            modified_files: (0..modified).map(|i| format!("m{}", i)).collect(),
            deleted_files: (0..deleted).map(|i| format!("d{}", i)).collect(),
            ..ChangeSet::default()
        }
    }

    #[test]
    fn test_below_threshold_rejected() {
        assert!(!should_commit(&changes_of(2, 0, 0), 3));
    }

    #[test]
    fn test_exact_threshold_accepted() {
        assert!(should_commit(&changes_of(1, 1, 1), 3));
    }

    #[test]
    fn test_mixed_kinds_count_together() {
        assert!(should_commit(&changes_of(0, 2, 3), 5));
    }

    #[test]
    fn test_blocked_files_do_not_count() {
        let mut changes = changes_of(2, 0, 0);
        changes.blocked_files = vec!["a".to_string(), "b".to_string()];
        assert!(!should_commit(&changes, 3));
    }

    #[test]
    fn test_empty_changeset_never_commits() {
        assert!(!should_commit(&ChangeSet::default(), 1));
    }
}
