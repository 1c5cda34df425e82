//! Per-file history via the `git` CLI

use std::collections::HashSet;
use std::path::Path;
use std::process::Command;

use crate::model::{parse_timestamp, GitMetadata};

/// True when `root` sits inside a git work tree
pub fn is_repository(root: &Path) -> bool {
    Command::new("git")
        .arg("-C")
        .arg(root)
        .args(["rev-parse", "--is-inside-work-tree"])
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

/// Commits, distinct authors and last commit date for one file.
/// `None` for untracked files or when git fails.
pub fn file_history(root: &Path, relative: &Path) -> Option<GitMetadata> {
    let output = Command::new("git")
        .arg("-C")
        .arg(root)
        .args(["log", "--follow", "--format=%H%x09%an%x09%cI", "--"])
        .arg(relative)
        .output();

    let output = match output {
        Ok(out) => out,
        Err(e) => {
            tracing::debug!("git log failed for {}: {}", relative.display(), e);
            return None;
        }
    };
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::debug!("git log failed for {}: {}", relative.display(), stderr.trim());
        return None;
    }
    parse_log(&String::from_utf8_lossy(&output.stdout))
}

/// Parse `hash<TAB>author<TAB>date` lines, newest first
pub fn parse_log(text: &str) -> Option<GitMetadata> {
    let mut commits = 0u64;
    let mut authors = HashSet::new();
    let mut last_modified = None;

    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        let mut fields = line.split('\t');
        let (Some(_hash), Some(author), Some(date)) = (fields.next(), fields.next(), fields.next()) else {
            continue;
        };
        commits += 1;
        authors.insert(author.trim());
        if last_modified.is_none() {
            last_modified = parse_timestamp(date.trim());
        }
    }

    (commits > 0).then(|| GitMetadata {
        commits,
        authors: authors.len() as u64,
        last_modified,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log() {
        let log = "a1\tAda\t2025-06-10T09:00:00+02:00\n\
                   b2\tLinus\t2025-01-02T10:00:00Z\n\
                   c3\tAda\t2024-12-24T08:00:00Z\n";
        let meta = parse_log(log).unwrap();
        assert_eq!(meta.commits, 3);
        assert_eq!(meta.authors, 2);
        assert_eq!(meta.last_modified, parse_timestamp("2025-06-10T07:00:00Z"));
    }

    #[test]
    fn test_parse_log_skips_malformed_lines() {
        assert!(parse_log("").is_none());
        assert!(parse_log("garbage without tabs\n").is_none());
        let meta = parse_log("\nx\tBob\tnot-a-date\n").unwrap();
        assert_eq!(meta.commits, 1);
        assert!(meta.last_modified.is_none());
    }

    #[test]
    fn test_plain_directory_is_not_a_repository() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!is_repository(dir.path()));
    }
}
