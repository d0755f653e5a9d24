//! Git history segmentation: contributor turnover, activity bursts, and
//! directory churn over time.
//!
//! Commits come from a repository ([`mining`]) or from `git log --numstat`
//! text ([`numstat`]) as newest-first [`commit::CommitRecord`]s. The
//! [`activity`] scans flag author arrivals and departures, [`segments`] folds
//! the history into [`segments::SegmentStats`], and [`report`] renders them.
//! [`matrix`] builds a day × directory activity grid from the same records.

pub mod activity;
pub mod commit;
pub mod matrix;
pub mod mining;
pub mod numstat;
pub mod report;
pub mod rollup;
pub mod segments;

pub use segments::{segment, SegmentOptions, SegmentStats};
