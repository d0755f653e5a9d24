//! Normalized commit records, the input to every analysis in this crate.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strata_core::StrataError;

/// One commit, reduced to what segmentation needs.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use strata_history::commit::{CommitRecord, FileStat};
///
/// let commit = CommitRecord {
///     hash: "abc1234".into(),
///     title: "fix: auth bug".into(),
///     author: "alice alice@example.com".into(),
///     date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
///     files: vec![FileStat::new("src/auth.rs", 10, 2)],
/// };
/// assert_eq!(commit.churn(), 12);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRecord {
    /// Short commit hash. Not required to be unique.
    pub hash: String,
    /// First line of the commit message.
    pub title: String,
    /// Author identity; equal strings are the same author.
    pub author: String,
    /// Commit day.
    pub date: NaiveDate,
    /// Per-file line counts, possibly empty.
    #[serde(default)]
    pub files: Vec<FileStat>,
}

/// Lines added and deleted in a single file by one commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStat {
    /// File path relative to the repository root, `/`-separated.
    pub path: String,
    /// Lines added.
    pub added: u64,
    /// Lines deleted.
    pub deleted: u64,
}

impl FileStat {
    /// Build a file stat from a path and its line counts.
    pub fn new(path: impl Into<String>, added: u64, deleted: u64) -> Self {
        Self {
            path: path.into(),
            added,
            deleted,
        }
    }
}

impl CommitRecord {
    /// Total lines added across all files.
    pub fn added(&self) -> u64 {
        self.files.iter().map(|f| f.added).sum()
    }

    /// Total lines deleted across all files.
    pub fn deleted(&self) -> u64 {
        self.files.iter().map(|f| f.deleted).sum()
    }

    /// Added plus deleted lines.
    pub fn churn(&self) -> u64 {
        self.added() + self.deleted()
    }
}

/// Order commits newest-first by day, keeping the relative order of commits
/// made on the same day.
pub fn sort_newest_first(commits: &mut [CommitRecord]) {
    commits.sort_by(|a, b| b.date.cmp(&a.date));
}

/// Check that `commits` is a usable newest-first history.
///
/// # Errors
///
/// Returns [`StrataError::EmptyHistory`] for an empty slice and
/// [`StrataError::MalformedCommit`] when an author is blank or a commit is
/// dated after the one listed before it.
pub fn validate_newest_first(commits: &[CommitRecord]) -> Result<(), StrataError> {
    if commits.is_empty() {
        return Err(StrataError::EmptyHistory);
    }

    for commit in commits {
        if commit.author.trim().is_empty() {
            return Err(StrataError::malformed(&commit.hash, "missing author"));
        }
    }

    for pair in commits.windows(2) {
        if pair[1].date > pair[0].date {
            return Err(StrataError::malformed(
                &pair[1].hash,
                format!(
                    "dated {} but listed after a commit from {}; expected newest-first order",
                    pair[1].date, pair[0].date
                ),
            ));
        }
    }

    Ok(())
}
