//! Staging and commit execution.

use regex_lite::Regex;
use tracing::{debug, warn};

use crate::engine::changeset::ChangeSet;
use crate::error::GitError;

use super::process::{GitOutput, GitRunner, git_args};

/// Result of a commit attempt.
///
/// Subprocess failures are `GitError`s; an empty staged delta is a benign
/// outcome of its own, not a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed {
        sequence: u64,
        /// Abbreviated id parsed from git's confirmation line, when present.
        commit_id: Option<String>,
    },
    NothingToCommit,
}

/// Stage and commit an approved ChangeSet.
///
/// Stages exactly the new and modified paths, stages the deletions, then
/// commits with the synthesized message. Blocked paths never reach this
/// function; the builder excluded them from every list.
pub async fn execute<R: GitRunner>(
    runner: &R,
    changes: &ChangeSet,
    message: &str,
    sequence: u64,
) -> Result<CommitOutcome, GitError> {
    stage_additions(runner, changes).await?;
    stage_removals(runner, changes).await?;
    commit(runner, message, sequence).await
}

async fn stage_additions<R: GitRunner>(runner: &R, changes: &ChangeSet) -> Result<(), GitError> {
    let paths: Vec<String> = changes
        .new_files
        .iter()
        .chain(changes.modified_files.iter())
        .cloned()
        .collect();
    if paths.is_empty() {
        return Ok(());
    }

    let mut args = git_args(&["add", "--"]);
    let count = paths.len();
    args.extend(paths);
    runner.run_git(&args).await?.require_success("add")?;
    debug!("Staged {} path(s)", count);
    Ok(())
}

async fn stage_removals<R: GitRunner>(runner: &R, changes: &ChangeSet) -> Result<(), GitError> {
    if changes.deleted_files.is_empty() {
        return Ok(());
    }

    // --ignore-unmatch keeps already-pruned paths benign; real failures
    // (index locks, permissions) still surface.
    let mut args = git_args(&["rm", "--ignore-unmatch", "--"]);
    args.extend(changes.deleted_files.iter().cloned());
    runner.run_git(&args).await?.require_success("rm")?;
    debug!("Staged {} removal(s)", changes.deleted_files.len());
    Ok(())
}

async fn commit<R: GitRunner>(
    runner: &R,
    message: &str,
    sequence: u64,
) -> Result<CommitOutcome, GitError> {
    let mut args = git_args(&["commit", "-m"]);
    args.push(message.to_string());

    let output = runner.run_git(&args).await?;
    if output.success() {
        let commit_id = parse_commit_id(&output.stdout);
        if commit_id.is_none() {
            warn!("Commit succeeded but no id found in git output");
        }
        return Ok(CommitOutcome::Committed {
            sequence,
            commit_id,
        });
    }

    if is_nothing_to_commit(&output) {
        return Ok(CommitOutcome::NothingToCommit);
    }

    let stderr = if output.stderr.trim().is_empty() {
        output.stdout
    } else {
        output.stderr
    };
    Err(GitError::NonZeroExit {
        operation: "commit".to_string(),
        code: output.code,
        stderr,
    })
}

/// git refuses an empty commit with exit code 1 and a prose explanation;
/// that refusal is success for our purposes.
fn is_nothing_to_commit(output: &GitOutput) -> bool {
    let text = format!("{}\n{}", output.stdout, output.stderr).to_lowercase();
    text.contains("nothing to commit")
        || text.contains("nothing added to commit")
        || text.contains("no changes added to commit")
}

/// Pull the abbreviated commit id out of git's `[branch abc1234] ...` line.
fn parse_commit_id(stdout: &str) -> Option<String> {
    let first_line = stdout.lines().next()?;
    let re = Regex::new(r"([0-9a-f]{7,40})\]").ok()?;
    Some(re.captures(first_line)?.get(1)?.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::process::MockGitRunner;

    fn ok_output(stdout: &str) -> GitOutput {
        GitOutput {
            code: 0,
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    fn changes_with(new: &[&str], modified: &[&str], deleted: &[&str]) -> ChangeSet {
        ChangeSet {
            new_files: new.iter().map(|s| s.to_string()).collect(),
            modified_files: modified.iter().map(|s| s.to_string()).collect(),
            deleted_files: deleted.iter().map(|s| s.to_string()).collect(),
            ..ChangeSet::default()
        }
    }

    #[test]
    fn test_parse_commit_id_normal_line() {
        let id = parse_commit_id("[main 1a2b3c4] Auto-commit: Add files\n 3 files changed");
        assert_eq!(id.as_deref(), Some("1a2b3c4"));
    }

    #[test]
    fn test_parse_commit_id_root_commit() {
        let id = parse_commit_id("[master (root-commit) 0e312d2] first\n");
        assert_eq!(id.as_deref(), Some("0e312d2"));
    }

    #[test]
    fn test_parse_commit_id_absent() {
        assert_eq!(parse_commit_id(""), None);
        assert_eq!(parse_commit_id("no bracket line here"), None);
    }

    #[test]
    fn test_is_nothing_to_commit_clean_tree() {
        let output = GitOutput {
            code: 1,
            stdout: "On branch main\nnothing to commit, working tree clean\n".to_string(),
            stderr: String::new(),
        };
        assert!(is_nothing_to_commit(&output));
    }

    #[test]
    fn test_is_nothing_to_commit_rejects_real_errors() {
        let output = GitOutput {
            code: 128,
            stdout: String::new(),
            stderr: "fatal: unable to write new index file\n".to_string(),
        };
        assert!(!is_nothing_to_commit(&output));
    }

    #[tokio::test]
    async fn test_execute_stages_additions_removals_then_commits() {
        let mut runner = MockGitRunner::new();
        runner
            .expect_run_git()
            .withf(|args: &[String]| {
                args[0] == "add" && args[1] == "--" && args[2..] == ["a.rs", "b.rs", "c.rs"]
            })
            .times(1)
            .returning(|_| Ok(ok_output("")));
        runner
            .expect_run_git()
            .withf(|args: &[String]| {
                args[0] == "rm" && args[1] == "--ignore-unmatch" && args[3] == "gone.txt"
            })
            .times(1)
            .returning(|_| Ok(ok_output("")));
        runner
            .expect_run_git()
            .withf(|args: &[String]| args[0] == "commit" && args[1] == "-m")
            .times(1)
            .returning(|_| Ok(ok_output("[main abcdef0] msg\n")));

        let changes = changes_with(&["a.rs", "b.rs"], &["c.rs"], &["gone.txt"]);
        let outcome = execute(&runner, &changes, "msg", 4).await.unwrap();
        assert_eq!(
            outcome,
            CommitOutcome::Committed {
                sequence: 4,
                commit_id: Some("abcdef0".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_execute_skips_stage_calls_for_empty_lists() {
        let mut runner = MockGitRunner::new();
        // Deletions only: no add call may happen.
        runner
            .expect_run_git()
            .withf(|args: &[String]| args[0] == "rm")
            .times(1)
            .returning(|_| Ok(ok_output("")));
        runner
            .expect_run_git()
            .withf(|args: &[String]| args[0] == "commit")
            .times(1)
            .returning(|_| Ok(ok_output("[main 1234567] msg\n")));

        let changes = changes_with(&[], &[], &["gone.txt"]);
        let outcome = execute(&runner, &changes, "msg", 1).await.unwrap();
        assert!(matches!(outcome, CommitOutcome::Committed { sequence: 1, .. }));
    }

    #[tokio::test]
    async fn test_execute_maps_empty_delta_to_nothing_to_commit() {
        let mut runner = MockGitRunner::new();
        runner
            .expect_run_git()
            .withf(|args: &[String]| args[0] == "add")
            .times(1)
            .returning(|_| Ok(ok_output("")));
        runner
            .expect_run_git()
            .withf(|args: &[String]| args[0] == "commit")
            .times(1)
            .returning(|_| {
                Ok(GitOutput {
                    code: 1,
                    stdout: "nothing to commit, working tree clean\n".to_string(),
                    stderr: String::new(),
                })
            });

        let changes = changes_with(&["a.rs"], &[], &[]);
        let outcome = execute(&runner, &changes, "msg", 2).await.unwrap();
        assert_eq!(outcome, CommitOutcome::NothingToCommit);
    }

    #[tokio::test]
    async fn test_execute_surfaces_commit_failure() {
        let mut runner = MockGitRunner::new();
        runner
            .expect_run_git()
            .withf(|args: &[String]| args[0] == "add")
            .times(1)
            .returning(|_| Ok(ok_output("")));
        runner
            .expect_run_git()
            .withf(|args: &[String]| args[0] == "commit")
            .times(1)
            .returning(|_| {
                Ok(GitOutput {
                    code: 128,
                    stdout: String::new(),
                    stderr: "fatal: unable to write new index file\n".to_string(),
                })
            });

        let changes = changes_with(&["a.rs"], &[], &[]);
        let err = execute(&runner, &changes, "msg", 2).await.unwrap_err();
        match err {
            GitError::NonZeroExit {
                operation, code, ..
            } => {
                assert_eq!(operation, "commit");
                assert_eq!(code, 128);
            }
            other => panic!("Expected NonZeroExit, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_execute_stage_failure_aborts_before_commit() {
        let mut runner = MockGitRunner::new();
        // Only the add expectation exists; a commit call would panic the mock.
        runner
            .expect_run_git()
            .withf(|args: &[String]| args[0] == "add")
            .times(1)
            .returning(|_| {
                Ok(GitOutput {
                    code: 128,
                    stdout: String::new(),
                    stderr: "fatal: Unable to create index.lock\n".to_string(),
                })
            });

        let changes = changes_with(&["a.rs"], &[], &[]);
        let err = execute(&runner, &changes, "msg", 2).await.unwrap_err();
        assert!(matches!(err, GitError::NonZeroExit { .. }));
    }
}
