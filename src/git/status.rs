//! Working-tree status queries.
//!
//! One porcelain status query per cycle feeds the whole decision pass; the
//! reader memoizes the parsed snapshot for a short TTL so repeated lookups
//! within a pass never re-invoke git.

use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;

use crate::error::GitError;

use super::process::{GitRunner, git_args};

/// Classified working-tree status, relative to git's own index.
///
/// A path appears in at most one list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoSnapshot {
    pub added: Vec<String>,
    pub modified: Vec<String>,
    pub deleted: Vec<String>,
}

impl RepoSnapshot {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }

    pub fn total(&self) -> usize {
        self.added.len() + self.modified.len() + self.deleted.len()
    }
}

struct CachedSnapshot {
    taken: Instant,
    snapshot: RepoSnapshot,
}

/// Memoizing reader for the working-tree status.
pub struct StatusReader {
    ttl: Duration,
    cache: Mutex<Option<CachedSnapshot>>,
}

impl StatusReader {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            cache: Mutex::new(None),
        }
    }

    /// Return the current snapshot, reusing a cached one younger than the TTL.
    ///
    /// A failed query is never cached; the caller sees the error and the next
    /// call queries git again.
    pub async fn snapshot<R: GitRunner>(&self, runner: &R) -> Result<RepoSnapshot, GitError> {
        let mut cache = self.cache.lock().await;

        if let Some(cached) = cache.as_ref() {
            if cached.taken.elapsed() < self.ttl {
                debug!("Reusing working-tree status from cache");
                return Ok(cached.snapshot.clone());
            }
        }

        let output = runner
            .run_git(&git_args(&[
                "status",
                "--porcelain",
                "--untracked-files=all",
            ]))
            .await?
            .require_success("status")?;

        let snapshot = parse_porcelain(&output.stdout);
        debug!(
            "Working-tree status: {} added, {} modified, {} deleted",
            snapshot.added.len(),
            snapshot.modified.len(),
            snapshot.deleted.len()
        );

        *cache = Some(CachedSnapshot {
            taken: Instant::now(),
            snapshot: snapshot.clone(),
        });

        Ok(snapshot)
    }

    /// Drop the memoized snapshot, e.g. right after a commit changed the tree.
    pub async fn invalidate(&self) {
        *self.cache.lock().await = None;
    }
}

/// Parse `git status --porcelain` v1 output into a snapshot.
fn parse_porcelain(stdout: &str) -> RepoSnapshot {
    let mut snapshot = RepoSnapshot::default();

    for line in stdout.lines() {
        let bytes = line.as_bytes();
        if bytes.len() < 4 || bytes[2] != b' ' {
            continue;
        }
        let x = bytes[0] as char;
        let y = bytes[1] as char;
        let rest = &line[3..];

        // Renames and copies carry "old -> new"; the old path is gone and
        // the new one is a fresh candidate.
        if (x == 'R' || x == 'C') && rest.contains(" -> ") {
            if let Some((old, new)) = rest.split_once(" -> ") {
                snapshot.deleted.push(unquote(old));
                snapshot.added.push(unquote(new));
                continue;
            }
        }

        let path = unquote(rest);
        if x == '?' || x == 'A' || y == 'A' {
            snapshot.added.push(path);
        } else if x == 'M' || y == 'M' {
            snapshot.modified.push(path);
        } else if x == 'D' || y == 'D' {
            snapshot.deleted.push(path);
        }
    }

    snapshot
}

/// Strip git's C-style quoting from a porcelain path.
///
/// With `core.quotePath` at its default, git renders every non-ASCII byte
/// as a 3-digit octal escape, so the path has to be rebuilt byte by byte
/// before it can name anything on the filesystem.
fn unquote(raw: &str) -> String {
    if raw.len() < 2 || !raw.starts_with('"') || !raw.ends_with('"') {
        return raw.to_string();
    }

    let inner = raw[1..raw.len() - 1].as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(inner.len());
    let mut i = 0;
    while i < inner.len() {
        if inner[i] != b'\\' || i + 1 == inner.len() {
            out.push(inner[i]);
            i += 1;
            continue;
        }

        i += 1;
        if let Some(decoded) = named_escape(inner[i]) {
            out.push(decoded);
            i += 1;
        } else if matches!(inner[i], b'0'..=b'7') {
            let mut value: u32 = 0;
            let mut digits = 0;
            while digits < 3 && i < inner.len() && matches!(inner[i], b'0'..=b'7') {
                value = value * 8 + u32::from(inner[i] - b'0');
                digits += 1;
                i += 1;
            }
            out.push(value as u8);
        } else {
            out.push(b'\\');
            out.push(inner[i]);
            i += 1;
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}

/// The single-character escapes git's quoting emits besides octal.
fn named_escape(escape: u8) -> Option<u8> {
    match escape {
        b'a' => Some(0x07),
        b'b' => Some(0x08),
        b'f' => Some(0x0c),
        b'n' => Some(b'\n'),
        b'r' => Some(b'\r'),
        b't' => Some(b'\t'),
        b'v' => Some(0x0b),
        b'"' => Some(b'"'),
        b'\\' => Some(b'\\'),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::process::{GitOutput, MockGitRunner};

    fn status_output(stdout: &str) -> GitOutput {
        GitOutput {
            code: 0,
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    #[test]
    fn test_parse_untracked_and_staged_new() {
        let snapshot = parse_porcelain("?? notes.md\nA  staged.rs\n");
        assert_eq!(snapshot.added, vec!["notes.md", "staged.rs"]);
        assert!(snapshot.modified.is_empty());
        assert!(snapshot.deleted.is_empty());
    }

    #[test]
    fn test_parse_modified_in_either_column() {
        let snapshot = parse_porcelain(" M worktree.rs\nM  index.rs\nMM both.rs\n");
        assert_eq!(snapshot.modified, vec!["worktree.rs", "index.rs", "both.rs"]);
    }

    #[test]
    fn test_parse_deleted() {
        let snapshot = parse_porcelain(" D gone.txt\nD  staged_gone.txt\n");
        assert_eq!(snapshot.deleted, vec!["gone.txt", "staged_gone.txt"]);
    }

    #[test]
    fn test_parse_added_wins_over_modified_flag() {
        // "AM" is a staged-new file with unstaged edits; it is one new file.
        let snapshot = parse_porcelain("AM fresh.rs\n");
        assert_eq!(snapshot.added, vec!["fresh.rs"]);
        assert!(snapshot.modified.is_empty());
    }

    #[test]
    fn test_parse_rename_splits_into_delete_and_add() {
        let snapshot = parse_porcelain("R  old_name.rs -> new_name.rs\n");
        assert_eq!(snapshot.deleted, vec!["old_name.rs"]);
        assert_eq!(snapshot.added, vec!["new_name.rs"]);
    }

    #[test]
    fn test_parse_quoted_path() {
        let snapshot = parse_porcelain("?? \"sp\\\"ecial.txt\"\n");
        assert_eq!(snapshot.added, vec!["sp\"ecial.txt"]);
    }

    #[test]
    fn test_parse_empty_output() {
        let snapshot = parse_porcelain("");
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.total(), 0);
    }

    #[test]
    fn test_parse_skips_malformed_lines() {
        let snapshot = parse_porcelain("??\nx\n M ok.txt\n");
        assert_eq!(snapshot.modified, vec!["ok.txt"]);
        assert_eq!(snapshot.total(), 1);
    }

    #[test]
    fn test_unquote_plain_path_unchanged() {
        assert_eq!(unquote("src/lib.rs"), "src/lib.rs");
    }

    #[test]
    fn test_unquote_escapes() {
        assert_eq!(unquote("\"tab\\there\""), "tab\there");
        assert_eq!(unquote("\"back\\\\slash\""), "back\\slash");
    }

    #[test]
    fn test_unquote_octal_escapes_decode_to_utf8() {
        // core.quotePath renders "ä" as the octal escapes of its UTF-8 bytes.
        assert_eq!(unquote("\"\\303\\244.txt\""), "ä.txt");
        assert_eq!(unquote("\"docs/\\303\\274bersicht.md\""), "docs/übersicht.md");
    }

    #[test]
    fn test_parse_octal_quoted_path_names_the_real_file() {
        let snapshot = parse_porcelain("?? \"\\303\\244.txt\"\n");
        assert_eq!(snapshot.added, vec!["ä.txt"]);
    }

    #[tokio::test]
    async fn test_snapshot_memoized_within_ttl() {
        let mut runner = MockGitRunner::new();
        runner
            .expect_run_git()
            .times(1)
            .returning(|_| Ok(status_output("?? a.txt\n")));

        let reader = StatusReader::new(Duration::from_secs(60));
        let first = reader.snapshot(&runner).await.unwrap();
        let second = reader.snapshot(&runner).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.added, vec!["a.txt"]);
    }

    #[tokio::test]
    async fn test_snapshot_requeries_after_invalidate() {
        let mut runner = MockGitRunner::new();
        runner
            .expect_run_git()
            .times(2)
            .returning(|_| Ok(status_output("?? a.txt\n")));

        let reader = StatusReader::new(Duration::from_secs(60));
        reader.snapshot(&runner).await.unwrap();
        reader.invalidate().await;
        reader.snapshot(&runner).await.unwrap();
    }

    #[tokio::test]
    async fn test_snapshot_zero_ttl_never_caches() {
        let mut runner = MockGitRunner::new();
        runner
            .expect_run_git()
            .times(2)
            .returning(|_| Ok(status_output("")));

        let reader = StatusReader::new(Duration::from_secs(0));
        reader.snapshot(&runner).await.unwrap();
        reader.snapshot(&runner).await.unwrap();
    }

    #[tokio::test]
    async fn test_snapshot_failure_not_cached() {
        let mut runner = MockGitRunner::new();
        let mut attempts = 0;
        runner.expect_run_git().times(2).returning(move |_| {
            attempts += 1;
            if attempts == 1 {
                Ok(GitOutput {
                    code: 128,
                    stdout: String::new(),
                    stderr: "fatal: not a git repository".to_string(),
                })
            } else {
                Ok(status_output("?? a.txt\n"))
            }
        });

        let reader = StatusReader::new(Duration::from_secs(60));
        let err = reader.snapshot(&runner).await.unwrap_err();
        assert!(matches!(err, GitError::NonZeroExit { .. }));

        let snapshot = reader.snapshot(&runner).await.unwrap();
        assert_eq!(snapshot.added, vec!["a.txt"]);
    }
}
