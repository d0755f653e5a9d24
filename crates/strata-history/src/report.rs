//! Rendering of segment statistics as text, Markdown, or JSON.

use std::fmt::Write;

use serde::{Deserialize, Serialize};
use strata_core::{OutputFormat, StrataError};

use crate::segments::SegmentStats;

/// Serializable wrapper around a segmentation run.
///
/// # Examples
///
/// ```
/// use strata_history::report::SegmentReport;
///
/// let report = SegmentReport::new(0, vec![]);
/// let json = serde_json::to_value(&report).unwrap();
/// assert_eq!(json["commitsAnalyzed"], 0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentReport {
    /// Number of commits fed into segmentation.
    pub commits_analyzed: usize,
    /// Segments, oldest first.
    pub segments: Vec<SegmentStats>,
}

impl SegmentReport {
    /// Wrap `segments` produced from `commits_analyzed` commits.
    pub fn new(commits_analyzed: usize, segments: Vec<SegmentStats>) -> Self {
        Self {
            commits_analyzed,
            segments,
        }
    }

    /// Render in `format`, listing at most `limit` authors and directories
    /// per segment in the text and Markdown forms.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::Serialization`] if JSON encoding fails.
    pub fn render(&self, format: OutputFormat, limit: usize) -> Result<String, StrataError> {
        match format {
            OutputFormat::Text => Ok(render_text(&self.segments, limit)),
            OutputFormat::Markdown => Ok(render_markdown(self.commits_analyzed, &self.segments, limit)),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

/// Plain-text rendering, one block per segment.
pub fn render_text(segments: &[SegmentStats], limit: usize) -> String {
    let mut out = String::new();

    for s in segments {
        let _ = writeln!(
            out,
            "{} | {} | commits={} +{} -{} | {}",
            s.dates, s.days_span, s.commit_count, s.added, s.deleted, s.boundary_event
        );
        let _ = writeln!(out, "{:-<72}", "");

        for a in s.authors.iter().take(limit) {
            let _ = writeln!(out, "  {:>5}  {}", a.commits, a.author);
        }
        if s.authors.len() > limit {
            let _ = writeln!(out, "  ... {} more authors", s.authors.len() - limit);
        }

        for d in s.directory_churn.iter().take(limit) {
            let _ = writeln!(out, "  {:<48} +{:<7} -{}", d.group, d.added, d.deleted);
        }
        if s.directory_churn.len() > limit {
            let _ = writeln!(
                out,
                "  ... {} more groups",
                s.directory_churn.len() - limit
            );
        }
        out.push('\n');
    }

    out
}

/// Markdown rendering: a summary table followed by per-segment details.
pub fn render_markdown(commits_analyzed: usize, segments: &[SegmentStats], limit: usize) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# Activity Segments\n");
    let _ = writeln!(out, "**Commits analyzed:** {commits_analyzed}\n");

    if segments.is_empty() {
        let _ = writeln!(out, "No segments.");
        return out;
    }

    let _ = writeln!(out, "| # | Dates | Days | Commits | Added | Deleted | Boundary |");
    let _ = writeln!(out, "|---|-------|------|---------|-------|---------|----------|");
    for (i, s) in segments.iter().enumerate() {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} | {} |",
            i + 1,
            s.dates,
            s.days_span,
            s.commit_count,
            s.added,
            s.deleted,
            s.boundary_event,
        );
    }
    out.push('\n');

    for (i, s) in segments.iter().enumerate() {
        let _ = writeln!(out, "## {}. {}\n", i + 1, s.dates);
        if !s.authors.is_empty() {
            let _ = writeln!(out, "**Authors**\n");
            for a in s.authors.iter().take(limit) {
                let _ = writeln!(out, "- {} ({})", a.author, a.commits);
            }
            out.push('\n');
        }
        if !s.directory_churn.is_empty() {
            let _ = writeln!(out, "**Churn**\n");
            for d in s.directory_churn.iter().take(limit) {
                let _ = writeln!(out, "- `{}`: +{} -{}", d.group, d.added, d.deleted);
            }
            out.push('\n');
        }
    }

    out
}
