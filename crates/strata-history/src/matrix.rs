//! Day × directory activity matrix.
//!
//! Each row is a rollup group, each column a calendar day between the first
//! and last commit. A cell holds `author_index + 1` of the most recent commit
//! that touched the group that day, or 0 when nothing happened.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strata_core::StrataError;

use crate::commit::CommitRecord;
use crate::rollup::Rollup;

/// Activity matrix ready for a heat-map style front end.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use strata_history::commit::{CommitRecord, FileStat};
/// use strata_history::matrix::ActivityMatrix;
/// use strata_history::rollup::Rollup;
///
/// let commits = vec![CommitRecord {
///     hash: "a1".into(),
///     title: "init".into(),
///     author: "alice".into(),
///     date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
///     files: vec![FileStat::new("src/main.rs", 5, 0)],
/// }];
/// let matrix = ActivityMatrix::build(&commits, &Rollup::new(1)).unwrap();
/// assert_eq!(matrix.groups, vec!["src/*"]);
/// assert_eq!(matrix.cells, vec![vec![1]]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityMatrix {
    /// Authors that touched at least one file, sorted.
    pub authors: Vec<String>,
    /// Every day from the first to the last commit.
    pub dates: Vec<NaiveDate>,
    /// Row labels, sorted.
    pub groups: Vec<String>,
    /// `cells[row][day]`.
    pub cells: Vec<Vec<usize>>,
    /// Prefix the rows were narrowed to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_path: Option<String>,
}

impl ActivityMatrix {
    /// Build the matrix from a newest-first history.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::EmptyHistory`] if `commits` is empty.
    pub fn build(commits: &[CommitRecord], rollup: &Rollup) -> Result<Self, StrataError> {
        let first = commits
            .iter()
            .map(|c| c.date)
            .min()
            .ok_or(StrataError::EmptyHistory)?;
        let last = commits.iter().map(|c| c.date).max().unwrap_or(first);

        let mut activity: BTreeMap<String, HashMap<NaiveDate, &str>> = BTreeMap::new();
        let mut authors: BTreeSet<&str> = BTreeSet::new();

        for commit in commits {
            for file in &commit.files {
                activity
                    .entry(rollup.key(&file.path))
                    .or_default()
                    .entry(commit.date)
                    .or_insert(commit.author.as_str());
                authors.insert(commit.author.as_str());
            }
        }

        let author_index: HashMap<&str, usize> = authors
            .iter()
            .enumerate()
            .map(|(i, a)| (*a, i + 1))
            .collect();
        let dates: Vec<NaiveDate> = first.iter_days().take_while(|d| *d <= last).collect();

        let cells: Vec<Vec<usize>> = activity
            .values()
            .map(|by_day| {
                let mut row = vec![0; dates.len()];
                for (date, author) in by_day {
                    let column = (*date - first).num_days() as usize;
                    row[column] = author_index[author];
                }
                row
            })
            .collect();

        Ok(Self {
            authors: authors.into_iter().map(String::from).collect(),
            dates,
            groups: activity.into_keys().collect(),
            cells,
            current_path: None,
        })
    }

    /// Keep only rows whose group starts with `prefix`.
    pub fn for_path(&self, prefix: &str) -> Self {
        let mut narrowed = self.retain_rows(|group| group.starts_with(prefix));
        narrowed.current_path = Some(prefix.to_string());
        narrowed
    }

    /// Drop rows whose group contains any of `patterns`.
    pub fn hide(&self, patterns: &[String]) -> Self {
        self.retain_rows(|group| !patterns.iter().any(|p| group.contains(p.as_str())))
    }

    fn retain_rows(&self, keep: impl Fn(&str) -> bool) -> Self {
        let (groups, cells) = self
            .groups
            .iter()
            .zip(&self.cells)
            .filter(|(group, _)| keep(group))
            .map(|(group, row)| (group.clone(), row.clone()))
            .unzip();

        Self {
            authors: self.authors.clone(),
            dates: self.dates.clone(),
            groups,
            cells,
            current_path: self.current_path.clone(),
        }
    }
}
