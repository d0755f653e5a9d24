//! History segmentation and churn aggregation.
//!
//! Folds a commit history, oldest-first, into contiguous segments. A new
//! segment starts when an author arrives (first commit, or first after a long
//! absence), when the repository goes quiet for longer than the day
//! threshold, and after an author's last commit before leaving. Each segment
//! tallies commits, churn, per-author commit counts and per-directory churn.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strata_core::StrataError;
use tracing::debug;

use crate::activity::{ActivityAnnotations, ActivityFlag};
use crate::commit::{validate_newest_first, CommitRecord};
use crate::rollup::Rollup;

/// Segmentation parameters.
///
/// # Examples
///
/// ```
/// use strata_history::segments::SegmentOptions;
///
/// let opts = SegmentOptions::default();
/// assert_eq!(opts.days_threshold, 10);
/// assert_eq!(opts.author_threshold, 90);
/// assert_eq!(opts.rollup.depth, 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentOptions {
    /// Quiet days between consecutive commits that split a segment.
    pub days_threshold: i64,
    /// Days of author inactivity that count as a departure or return.
    pub author_threshold: i64,
    /// Directory grouping for churn.
    pub rollup: Rollup,
}

impl SegmentOptions {
    /// Options with the given thresholds and an uncapped rollup at `depth`.
    pub fn new(days_threshold: i64, author_threshold: i64, depth: usize) -> Self {
        Self {
            days_threshold,
            author_threshold,
            rollup: Rollup::new(depth),
        }
    }
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self::new(10, 90, 2)
    }
}

/// What opened a segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum BoundaryEvent {
    /// Opened after a quiet gap with no author event.
    None,
    /// An author committed for the first time, or after a long absence.
    NewAuthor {
        /// The arriving author.
        author: String,
        /// `true` when this is the author's first commit in the whole history.
        first_seen: bool,
    },
    /// An author made their last commit before a long absence.
    AuthorDeparted {
        /// The departing author.
        author: String,
        /// `true` when the author never commits again.
        confirmed: bool,
    },
}

impl std::fmt::Display for BoundaryEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoundaryEvent::None => write!(f, "quiet gap"),
            BoundaryEvent::NewAuthor { author, first_seen } => {
                if *first_seen {
                    write!(f, "new author {author}")
                } else {
                    write!(f, "returning author {author}")
                }
            }
            BoundaryEvent::AuthorDeparted { author, confirmed } => {
                if *confirmed {
                    write!(f, "author left {author}")
                } else {
                    write!(f, "author paused {author}")
                }
            }
        }
    }
}

/// Commit count of one author within a segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorCount {
    /// Author identity.
    pub author: String,
    /// Commits in the segment.
    pub commits: u64,
}

/// Churn within one directory group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryChurn {
    /// Group key from [`crate::rollup::group_key`].
    pub group: String,
    /// Lines added.
    pub added: u64,
    /// Lines deleted.
    pub deleted: u64,
}

impl DirectoryChurn {
    /// Added plus deleted lines.
    pub fn churn(&self) -> u64 {
        self.added + self.deleted
    }
}

/// Aggregated statistics of one finalized segment.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use strata_history::commit::CommitRecord;
/// use strata_history::segments::{segment, SegmentOptions};
///
/// let commits = vec![CommitRecord {
///     hash: "a1".into(),
///     title: "init".into(),
///     author: "alice".into(),
///     date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
///     files: vec![],
/// }];
/// let segments = segment(&commits, &SegmentOptions::default()).unwrap();
/// assert_eq!(segments[0].dates, "2024-05-01 - 2024-05-01");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentStats {
    /// `"{from_date} - {to_date}"`.
    pub dates: String,
    /// Start of the segment, inclusive.
    pub from_date: NaiveDate,
    /// Date of the last commit folded in, inclusive.
    pub to_date: NaiveDate,
    /// Days from `from_date` to the commit that closed the segment.
    pub days_span: i64,
    /// Commits folded into the segment.
    pub commit_count: u64,
    /// Lines added.
    pub added: u64,
    /// Lines deleted.
    pub deleted: u64,
    /// Authors by descending commit count.
    pub authors: Vec<AuthorCount>,
    /// Directory groups by descending churn.
    pub directory_churn: Vec<DirectoryChurn>,
    /// What opened the segment.
    pub boundary_event: BoundaryEvent,
}

impl SegmentStats {
    /// Added plus deleted lines.
    pub fn churn(&self) -> u64 {
        self.added + self.deleted
    }
}

/// Segment still receiving commits.
#[derive(Debug, Clone)]
struct OpenSegment {
    from_date: NaiveDate,
    to_date: NaiveDate,
    commit_count: u64,
    added: u64,
    deleted: u64,
    authors: HashMap<String, u64>,
    directories: HashMap<String, (u64, u64)>,
    boundary_event: BoundaryEvent,
}

impl OpenSegment {
    fn new(from_date: NaiveDate, boundary_event: BoundaryEvent) -> Self {
        Self {
            from_date,
            to_date: from_date,
            commit_count: 0,
            added: 0,
            deleted: 0,
            authors: HashMap::new(),
            directories: HashMap::new(),
            boundary_event,
        }
    }

    fn is_empty(&self) -> bool {
        self.commit_count == 0
    }

    fn fold(&mut self, commit: &CommitRecord, rollup: &Rollup) {
        self.commit_count += 1;
        *self.authors.entry(commit.author.clone()).or_default() += 1;

        for file in &commit.files {
            self.added += file.added;
            self.deleted += file.deleted;
            let entry = self.directories.entry(rollup.key(&file.path)).or_default();
            entry.0 += file.added;
            entry.1 += file.deleted;
        }

        self.to_date = commit.date;
    }

    fn close(self, closing_date: NaiveDate) -> ClosedSegment {
        ClosedSegment {
            days_span: (closing_date - self.from_date).num_days(),
            segment: self,
        }
    }
}

/// Segment that will receive no more commits but is not yet sorted.
#[derive(Debug, Clone)]
struct ClosedSegment {
    segment: OpenSegment,
    days_span: i64,
}

impl ClosedSegment {
    fn finalize(self) -> SegmentStats {
        let ClosedSegment { segment, days_span } = self;

        let mut authors: Vec<AuthorCount> = segment
            .authors
            .into_iter()
            .map(|(author, commits)| AuthorCount { author, commits })
            .collect();
        authors.sort_by(|a, b| {
            b.commits
                .cmp(&a.commits)
                .then_with(|| a.author.cmp(&b.author))
        });

        let mut directory_churn: Vec<DirectoryChurn> = segment
            .directories
            .into_iter()
            .map(|(group, (added, deleted))| DirectoryChurn {
                group,
                added,
                deleted,
            })
            .collect();
        directory_churn.sort_by(|a, b| {
            b.churn()
                .cmp(&a.churn())
                .then_with(|| a.group.cmp(&b.group))
        });

        SegmentStats {
            dates: format!("{} - {}", segment.from_date, segment.to_date),
            from_date: segment.from_date,
            to_date: segment.to_date,
            days_span,
            commit_count: segment.commit_count,
            added: segment.added,
            deleted: segment.deleted,
            authors,
            directory_churn,
            boundary_event: segment.boundary_event,
        }
    }
}

/// Fold state threaded through the oldest-first walk.
///
/// Each [`SegmentFold::step`] consumes the state and returns the next one
/// together with whatever segments that commit closed. Segments that would
/// close without commits are dropped, so a boundary immediately followed by
/// another one only keeps the later one.
#[derive(Debug, Clone)]
struct SegmentFold {
    open: Option<OpenSegment>,
    last_date: Option<NaiveDate>,
    days_threshold: i64,
    rollup: Rollup,
}

impl SegmentFold {
    fn new(options: &SegmentOptions) -> Self {
        Self {
            open: None,
            last_date: None,
            days_threshold: options.days_threshold,
            rollup: options.rollup,
        }
    }

    fn step(
        mut self,
        commit: &CommitRecord,
        arrival: ActivityFlag,
        departure: ActivityFlag,
    ) -> (Self, Vec<ClosedSegment>) {
        let mut closed = Vec::new();

        if arrival.stale_gap {
            let from_date = self.last_date.unwrap_or(commit.date);
            let event = BoundaryEvent::NewAuthor {
                author: commit.author.clone(),
                first_seen: arrival.first_sighting,
            };
            closed.extend(self.reopen(commit.date, from_date, event));
        } else if let Some(last_date) = self.last_date {
            if (commit.date - last_date).num_days() > self.days_threshold {
                match self.open.as_mut() {
                    // A departure segment still waiting for commits keeps its
                    // event and starts after the gap instead.
                    Some(open) if open.is_empty() => open.from_date = commit.date,
                    _ => {
                        let segment = self.reopen(commit.date, commit.date, BoundaryEvent::None);
                        closed.extend(segment);
                    }
                }
            }
        }

        let rollup = self.rollup;
        self.open
            .get_or_insert_with(|| OpenSegment::new(commit.date, BoundaryEvent::None))
            .fold(commit, &rollup);
        self.last_date = Some(commit.date);

        if departure.stale_gap {
            let event = BoundaryEvent::AuthorDeparted {
                author: commit.author.clone(),
                confirmed: departure.first_sighting,
            };
            closed.extend(self.reopen(commit.date, commit.date, event));
        }

        (self, closed)
    }

    /// Close the open segment at `closing_date` and start a new one.
    fn reopen(
        &mut self,
        closing_date: NaiveDate,
        from_date: NaiveDate,
        event: BoundaryEvent,
    ) -> Option<ClosedSegment> {
        self.open
            .replace(OpenSegment::new(from_date, event))
            .filter(|segment| !segment.is_empty())
            .map(|segment| segment.close(closing_date))
    }

    fn finish(self) -> Option<ClosedSegment> {
        self.open
            .filter(|segment| !segment.is_empty())
            .map(|segment| {
                let to_date = segment.to_date;
                segment.close(to_date)
            })
    }
}

/// Split a newest-first commit history into finalized segments.
///
/// Segments are returned oldest-first.
///
/// # Errors
///
/// Returns [`StrataError::EmptyHistory`] for an empty history and
/// [`StrataError::MalformedCommit`] if a commit has no author or the input
/// is not newest-first.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use strata_history::commit::{CommitRecord, FileStat};
/// use strata_history::segments::{segment, SegmentOptions};
///
/// let commits = vec![CommitRecord {
///     hash: "a1".into(),
///     title: "add parser".into(),
///     author: "alice".into(),
///     date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
///     files: vec![FileStat::new("src/a.rb", 10, 2), FileStat::new("src/b.rb", 1, 1)],
/// }];
/// let segments = segment(&commits, &SegmentOptions::new(10, 90, 1)).unwrap();
/// assert_eq!(segments.len(), 1);
/// assert_eq!(segments[0].directory_churn[0].group, "src/*");
/// assert_eq!(segments[0].directory_churn[0].added, 11);
/// ```
pub fn segment(
    commits: &[CommitRecord],
    options: &SegmentOptions,
) -> Result<Vec<SegmentStats>, StrataError> {
    validate_newest_first(commits)?;

    let annotations = ActivityAnnotations::compute(commits, options.author_threshold);

    let (fold, mut closed) = commits.iter().rev().enumerate().fold(
        (SegmentFold::new(options), Vec::new()),
        |(fold, mut closed), (index, commit)| {
            let (arrival, departure) = annotations.at(index);
            let (next, done) = fold.step(commit, arrival, departure);
            closed.extend(done);
            (next, closed)
        },
    );
    closed.extend(fold.finish());

    let segments: Vec<SegmentStats> = closed.into_iter().map(ClosedSegment::finalize).collect();
    debug!(
        commits = commits.len(),
        segments = segments.len(),
        "segmented history"
    );
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::fixtures::{commit, day, history};
    use crate::commit::FileStat;

    fn opts() -> SegmentOptions {
        SegmentOptions::new(10, 90, 1)
    }

    #[test]
    fn steady_single_author_is_one_segment() {
        let commits = history(&[("alice", 1), ("alice", 2), ("alice", 3)]);
        let segments = segment(&commits, &opts()).unwrap();

        assert_eq!(segments.len(), 1);
        let s = &segments[0];
        assert_eq!(s.commit_count, 3);
        assert_eq!((s.added, s.deleted), (0, 0));
        assert_eq!(
            s.authors,
            vec![AuthorCount {
                author: "alice".into(),
                commits: 3
            }]
        );
        assert_eq!(s.from_date, day(1));
        assert_eq!(s.to_date, day(3));
        assert_eq!(s.days_span, 2);
        assert_eq!(
            s.boundary_event,
            BoundaryEvent::NewAuthor {
                author: "alice".into(),
                first_seen: true
            }
        );
    }

    #[test]
    fn new_author_opens_segment_from_previous_date() {
        let commits = history(&[("alice", 1), ("bob", 50)]);
        let segments = segment(&commits, &opts()).unwrap();

        assert_eq!(segments.len(), 2);
        assert_eq!(
            segments[1].boundary_event,
            BoundaryEvent::NewAuthor {
                author: "bob".into(),
                first_seen: true
            }
        );
        assert_eq!(segments[1].from_date, day(1));
        assert_eq!(segments[1].to_date, day(50));
        assert_eq!(segments[1].authors[0].author, "bob");
    }

    #[test]
    fn quiet_gap_splits_segment() {
        let commits = history(&[("alice", 1), ("alice", 2), ("alice", 30)]);
        let segments = segment(&commits, &opts()).unwrap();

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].commit_count, 2);
        assert_eq!(segments[0].days_span, 29);
        assert_eq!(segments[1].boundary_event, BoundaryEvent::None);
        assert_eq!(segments[1].from_date, day(30));
        assert_eq!(segments[1].commit_count, 1);
    }

    #[test]
    fn gap_exactly_at_threshold_does_not_split() {
        let commits = history(&[("alice", 1), ("alice", 11)]);
        let segments = segment(&commits, &opts()).unwrap();
        assert_eq!(segments.len(), 1);
    }

    #[test]
    fn single_commit_author_gets_isolated_segment() {
        let commits = history(&[
            ("alice", 1),
            ("alice", 2),
            ("bob", 3),
            ("alice", 4),
            ("alice", 5),
        ]);
        let segments = segment(&commits, &opts()).unwrap();

        assert_eq!(segments.len(), 3);
        assert_eq!(segments[1].commit_count, 1);
        assert_eq!(segments[1].authors[0].author, "bob");
        assert_eq!(
            segments[2].boundary_event,
            BoundaryEvent::AuthorDeparted {
                author: "bob".into(),
                confirmed: true
            }
        );
        assert_eq!(segments[2].from_date, day(3));
        assert_eq!(segments[2].commit_count, 2);
    }

    #[test]
    fn quiet_gap_after_departure_moves_start_and_keeps_event() {
        let commits = history(&[("alice", 1), ("bob", 2), ("alice", 40)]);
        let segments = segment(&commits, &opts()).unwrap();

        assert_eq!(segments.len(), 3);
        let last = &segments[2];
        assert_eq!(last.from_date, day(40));
        assert_eq!(
            last.boundary_event,
            BoundaryEvent::AuthorDeparted {
                author: "bob".into(),
                confirmed: true
            }
        );
    }

    #[test]
    fn returning_author_is_not_first_seen() {
        let commits = history(&[("alice", 1), ("alice", 200), ("alice", 201)]);
        let segments = segment(&commits, &opts()).unwrap();

        assert_eq!(segments.len(), 2);
        assert_eq!(
            segments[1].boundary_event,
            BoundaryEvent::NewAuthor {
                author: "alice".into(),
                first_seen: false
            }
        );
        assert_eq!(segments[1].commit_count, 2);
    }

    #[test]
    fn directory_churn_is_sorted_by_combined_churn() {
        let commits = vec![commit(
            "alice",
            1,
            vec![
                FileStat::new("docs/readme.md", 1, 0),
                FileStat::new("src/a.rb", 10, 2),
                FileStat::new("src/b.rb", 1, 1),
                FileStat::new("Gemfile", 3, 3),
            ],
        )];
        let segments = segment(&commits, &opts()).unwrap();
        let groups: Vec<_> = segments[0]
            .directory_churn
            .iter()
            .map(|d| (d.group.as_str(), d.added, d.deleted))
            .collect();
        assert_eq!(
            groups,
            vec![("src/*", 11, 3), ("Gemfile", 3, 3), ("docs/*", 1, 0)]
        );
        assert_eq!(segments[0].added, 15);
        assert_eq!(segments[0].deleted, 6);
    }

    #[test]
    fn authors_sorted_by_descending_count() {
        let commits = history(&[("bob", 1), ("alice", 1), ("alice", 2), ("bob", 2), ("alice", 3)]);
        let segments = segment(&commits, &SegmentOptions::new(10, 90, 0)).unwrap();
        let all: Vec<_> = segments.iter().flat_map(|s| s.authors.iter()).collect();
        assert!(!all.is_empty());
        for s in &segments {
            assert!(s.authors.windows(2).all(|w| w[0].commits >= w[1].commits));
        }
    }

    #[test]
    fn empty_history_fails() {
        assert!(matches!(
            segment(&[], &opts()),
            Err(StrataError::EmptyHistory)
        ));
    }

    #[test]
    fn unordered_history_fails() {
        let mut commits = history(&[("alice", 1), ("alice", 2)]);
        commits.reverse();
        assert!(matches!(
            segment(&commits, &opts()),
            Err(StrataError::MalformedCommit { .. })
        ));
    }

    #[test]
    fn boundary_event_serializes_with_kind_tag() {
        let event = BoundaryEvent::NewAuthor {
            author: "bob".into(),
            first_seen: true,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "new_author");
        assert_eq!(json["author"], "bob");
        assert_eq!(json["firstSeen"], true);

        let none = serde_json::to_value(BoundaryEvent::None).unwrap();
        assert_eq!(none["kind"], "none");
    }

    #[test]
    fn segment_stats_serialize_camel_case() {
        let commits = history(&[("alice", 1)]);
        let segments = segment(&commits, &opts()).unwrap();
        let json = serde_json::to_value(&segments[0]).unwrap();
        assert_eq!(json["commitCount"], 1);
        assert_eq!(json["fromDate"], "2024-01-01");
        assert!(json["directoryChurn"].is_array());
        assert_eq!(json["boundaryEvent"]["kind"], "new_author");
    }
}
