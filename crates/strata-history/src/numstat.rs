//! Adapter for `git log --numstat` text.
//!
//! Lets the CLI read history piped from git instead of opening the
//! repository. The expected input is produced by:
//!
//! ```text
//! git log --no-merges --numstat --date=short \
//!     --format='--commit--%h%x09%cd%x09%an %ae%x09%s'
//! ```

use chrono::NaiveDate;
use strata_core::StrataError;

use crate::commit::{CommitRecord, FileStat};

/// Marker that starts each commit header line.
pub const COMMIT_MARKER: &str = "--commit--";

/// The `git log` invocation whose output [`parse_log`] understands.
pub const LOG_COMMAND: &str = "git log --no-merges --numstat --date=short --format='--commit--%h%x09%cd%x09%an %ae%x09%s'";

/// Parse `git log` numstat output into commit records, keeping input order.
///
/// Binary files (`-` counts) contribute zero lines.
///
/// # Errors
///
/// Returns [`StrataError::MalformedCommit`] for a header with missing fields,
/// an unparseable date, an empty author, a non-numeric or negative line
/// count, or file lines that appear before any header.
///
/// # Examples
///
/// ```
/// use strata_history::numstat::parse_log;
///
/// let log = "--commit--abc1234\t2024-03-01\tAlice alice@example.com\tfix parser\n\
///            \n\
///            10\t2\tsrc/a.rb\n\
///            -\t-\tlogo.png\n";
/// let commits = parse_log(log).unwrap();
/// assert_eq!(commits.len(), 1);
/// assert_eq!(commits[0].files[0].added, 10);
/// assert_eq!(commits[0].files[1].added, 0);
/// ```
pub fn parse_log(text: &str) -> Result<Vec<CommitRecord>, StrataError> {
    let mut commits: Vec<CommitRecord> = Vec::new();

    for line in text.lines() {
        if let Some(header) = line.strip_prefix(COMMIT_MARKER) {
            commits.push(parse_header(header)?);
            continue;
        }

        if line.trim().is_empty() {
            continue;
        }

        let commit = commits.last_mut().ok_or_else(|| {
            StrataError::malformed("", format!("file line before any commit header: {line:?}"))
        })?;
        let file = parse_file_line(&commit.hash, line)?;
        commit.files.push(file);
    }

    Ok(commits)
}

fn parse_header(header: &str) -> Result<CommitRecord, StrataError> {
    let mut fields = header.splitn(4, '\t');
    let hash = fields.next().unwrap_or_default().trim().to_string();

    let (Some(date), Some(author)) = (fields.next(), fields.next()) else {
        return Err(StrataError::malformed(hash, "commit header is missing fields"));
    };
    let title = fields.next().unwrap_or_default().to_string();

    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|e| StrataError::malformed(&hash, format!("unparseable date {date:?}: {e}")))?;

    let author = author.trim();
    if author.is_empty() {
        return Err(StrataError::malformed(hash, "missing author"));
    }

    Ok(CommitRecord {
        hash,
        title,
        author: author.to_string(),
        date,
        files: Vec::new(),
    })
}

fn parse_file_line(hash: &str, line: &str) -> Result<FileStat, StrataError> {
    let mut fields = line.splitn(3, '\t');
    let (Some(added), Some(deleted), Some(path)) = (fields.next(), fields.next(), fields.next())
    else {
        return Err(StrataError::malformed(
            hash,
            format!("expected `added<TAB>deleted<TAB>path`, got {line:?}"),
        ));
    };

    Ok(FileStat {
        path: path.to_string(),
        added: parse_count(hash, added)?,
        deleted: parse_count(hash, deleted)?,
    })
}

fn parse_count(hash: &str, field: &str) -> Result<u64, StrataError> {
    if field == "-" {
        return Ok(0);
    }
    field
        .parse::<u64>()
        .map_err(|_| StrataError::malformed(hash, format!("invalid line count {field:?}")))
}
