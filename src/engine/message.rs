//! Commit message synthesis.
//!
//! Deterministic: the same ChangeSet and timestamp always render the same
//! message. The first line carries the dominant action and file kind, a
//! parenthesized suffix carries the non-zero counts, and the footer pins the
//! cycle's wall-clock time.

use chrono::{DateTime, Utc};

use crate::engine::changeset::ChangeSet;

/// Render the commit message for a classified ChangeSet.
pub fn synthesize(changes: &ChangeSet, timestamp: DateTime<Utc>) -> String {
    let counts = changes.counts();

    let action = if counts.new > counts.modified && counts.new > counts.deleted {
        "Add"
    } else if counts.deleted > counts.modified {
        "Remove"
    } else {
        "Update"
    };

    let description = describe_dominant_kind(changes);

    let mut message = if counts.new > 0 && counts.modified > 0 {
        format!("Auto-commit: {} and modify {}", action, description)
    } else {
        format!("Auto-commit: {} {}", action, description)
    };

    let mut details = Vec::new();
    if counts.new > 0 {
        details.push(format!("{} new", counts.new));
    }
    if counts.modified > 0 {
        details.push(format!("{} modified", counts.modified));
    }
    if counts.deleted > 0 {
        details.push(format!("{} deleted", counts.deleted));
    }
    if !details.is_empty() {
        message.push_str(&format!(" ({})", details.join(", ")));
    }

    message.push_str(&format!(
        "\n\nTimestamp: {}",
        timestamp.format("%Y-%m-%d %H:%M")
    ));

    message
}

/// Dominant extension bucket over the new and modified paths, ties broken
/// by first-seen order. Deleted paths carry no content kind and are left
/// out.
fn describe_dominant_kind(changes: &ChangeSet) -> String {
    let mut buckets: Vec<(String, usize)> = Vec::new();
    for path in changes.new_files.iter().chain(&changes.modified_files) {
        let ext = std::path::Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_string();
        match buckets.iter_mut().find(|(key, _)| *key == ext) {
            Some((_, count)) => *count += 1,
            None => buckets.push((ext, 1)),
        }
    }

    // Strictly-greater keeps the first-seen bucket on ties.
    let mut dominant: Option<(&str, usize)> = None;
    for (ext, count) in &buckets {
        if dominant.is_none_or(|(_, best)| *count > best) {
            dominant = Some((ext.as_str(), *count));
        }
    }

    match dominant {
        None | Some(("", _)) => "files".to_string(),
        Some(("py", _)) => "Python scripts".to_string(),
        Some(("md", _)) => "documentation".to_string(),
        Some(("sh", _)) => "shell scripts".to_string(),
        Some(("json", _)) | Some(("toml", _)) => "configuration".to_string(),
        Some(("rs", _)) => "Rust sources".to_string(),
        Some((other, _)) => format!(".{} files", other),
    }
}
