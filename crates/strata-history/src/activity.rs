//! Author arrival and departure detection.
//!
//! Both directions use the same stale-gap test. Walking oldest-first, a
//! first sighting or a long silence before a commit marks an author as
//! arriving; walking newest-first, the same test marks an author as leaving
//! after that commit.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::commit::CommitRecord;

/// Result of the stale-gap test for one commit in one traversal direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActivityFlag {
    /// The author had not been seen before in this scan.
    pub first_sighting: bool,
    /// First sighting, or the gap to the author's previous commit in this
    /// scan exceeds the threshold.
    pub stale_gap: bool,
}

/// Run the stale-gap test over `commits` in the order given.
///
/// The returned flags are index-aligned with the iteration order.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use strata_history::activity::annotate;
/// use strata_history::commit::CommitRecord;
///
/// let mk = |d: u32| CommitRecord {
///     hash: format!("c{d}"),
///     title: String::new(),
///     author: "alice".into(),
///     date: NaiveDate::from_ymd_opt(2024, 1, d).unwrap(),
///     files: vec![],
/// };
/// let commits = [mk(1), mk(2)];
/// let flags = annotate(commits.iter(), 90);
/// assert!(flags[0].first_sighting);
/// assert!(!flags[1].stale_gap);
/// ```
pub fn annotate<'a, I>(commits: I, threshold_days: i64) -> Vec<ActivityFlag>
where
    I: IntoIterator<Item = &'a CommitRecord>,
{
    let mut last_seen: HashMap<&'a str, NaiveDate> = HashMap::new();

    commits
        .into_iter()
        .map(|commit| {
            let flag = match last_seen.get(commit.author.as_str()) {
                None => ActivityFlag {
                    first_sighting: true,
                    stale_gap: true,
                },
                Some(&previous) => {
                    let gap = (commit.date - previous).num_days().abs();
                    ActivityFlag {
                        first_sighting: false,
                        stale_gap: gap > threshold_days,
                    }
                }
            };
            last_seen.insert(commit.author.as_str(), commit.date);
            flag
        })
        .collect()
}

/// Arrival and departure flags for one history, both indexed oldest-first.
#[derive(Debug, Clone, Default)]
pub struct ActivityAnnotations {
    /// Arrival scan, run oldest-first.
    pub arrivals: Vec<ActivityFlag>,
    /// Departure scan, run newest-first and re-indexed oldest-first.
    pub departures: Vec<ActivityFlag>,
}

impl ActivityAnnotations {
    /// Annotate a newest-first history with both scans.
    pub fn compute(newest_first: &[CommitRecord], author_threshold: i64) -> Self {
        let arrivals = annotate(newest_first.iter().rev(), author_threshold);
        let mut departures = annotate(newest_first.iter(), author_threshold);
        departures.reverse();
        Self {
            arrivals,
            departures,
        }
    }

    /// Flags for the commit at oldest-first position `index`.
    pub fn at(&self, index: usize) -> (ActivityFlag, ActivityFlag) {
        (self.arrivals[index], self.departures[index])
    }

    /// Number of annotated commits.
    pub fn len(&self) -> usize {
        self.arrivals.len()
    }

    /// Whether no commits were annotated.
    pub fn is_empty(&self) -> bool {
        self.arrivals.is_empty()
    }
}
