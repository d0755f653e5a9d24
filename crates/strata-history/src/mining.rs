//! Git history extraction via git2.
//!
//! Walks commit history from a repository and turns each commit into a
//! [`CommitRecord`] with per-file line counts, an author identity and the
//! commit day.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, FixedOffset, NaiveDate};
use git2::{DiffFindOptions, DiffOptions, Repository, Sort};
use indicatif::{ProgressBar, ProgressStyle};
use strata_core::{MiningConfig, StrataError};
use tracing::{debug, info};

use crate::commit::{sort_newest_first, CommitRecord, FileStat};

/// Options for history mining.
///
/// # Examples
///
/// ```
/// use strata_history::mining::MiningOptions;
///
/// let opts = MiningOptions::default();
/// assert!(opts.since_days.is_none());
/// assert!(!opts.include_merges);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MiningOptions {
    /// Only include commits from the last N days (default: whole history).
    pub since_days: Option<u64>,
    /// Skip commits touching more files than this (default: no limit).
    pub max_files_per_commit: Option<usize>,
    /// Branch to walk (default: HEAD).
    pub branch: Option<String>,
    /// Keep merge commits (default: skipped, like `git log --no-merges`).
    pub include_merges: bool,
    /// Show a spinner while walking.
    pub progress: bool,
}

impl From<&MiningConfig> for MiningOptions {
    fn from(config: &MiningConfig) -> Self {
        Self {
            since_days: config.since_days,
            max_files_per_commit: config.max_files_per_commit,
            branch: config.branch.clone(),
            include_merges: config.include_merges,
            progress: false,
        }
    }
}

/// Mine commit history from a git repository.
///
/// Returns commits newest first, ordered by commit day. Commits on the same
/// day keep the revwalk order.
///
/// # Errors
///
/// Returns [`StrataError::Git`] if the repository cannot be opened or walked.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use strata_history::mining::{mine_history, MiningOptions};
///
/// let commits = mine_history(Path::new("."), &MiningOptions::default()).unwrap();
/// for c in &commits {
///     println!("{} {}: {} ({})", c.date, c.hash, c.title, c.author);
/// }
/// ```
pub fn mine_history(
    repo_path: &Path,
    options: &MiningOptions,
) -> Result<Vec<CommitRecord>, StrataError> {
    let repo = Repository::discover(repo_path)
        .map_err(|e| StrataError::Git(format!("failed to open repository: {e}")))?;

    let mut revwalk = repo
        .revwalk()
        .map_err(|e| StrataError::Git(format!("failed to create revwalk: {e}")))?;

    revwalk.set_sorting(Sort::TIME).ok();

    if let Some(ref branch) = options.branch {
        let reference = repo
            .resolve_reference_from_short_name(branch)
            .map_err(|e| StrataError::Git(format!("failed to resolve branch '{branch}': {e}")))?;
        let oid = reference
            .target()
            .ok_or_else(|| StrataError::Git("branch has no target".into()))?;
        revwalk
            .push(oid)
            .map_err(|e| StrataError::Git(format!("failed to push oid: {e}")))?;
    } else {
        revwalk
            .push_head()
            .map_err(|e| StrataError::Git(format!("failed to push HEAD: {e}")))?;
    }

    let cutoff = options.since_days.map(compute_cutoff);
    let spinner = options.progress.then(|| {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})") {
            pb.set_style(style);
        }
        pb
    });

    let mut commits = Vec::new();
    let mut skipped = 0usize;

    for oid_result in revwalk {
        let oid = oid_result.map_err(|e| StrataError::Git(format!("revwalk error: {e}")))?;

        let commit = repo
            .find_commit(oid)
            .map_err(|e| StrataError::Git(format!("failed to find commit: {e}")))?;

        let time = commit.time();
        if cutoff.is_some_and(|c| time.seconds() < c) {
            break;
        }

        if commit.parent_count() > 1 && !options.include_merges {
            skipped += 1;
            continue;
        }

        let files = extract_file_stats(&repo, &commit)?;

        if options
            .max_files_per_commit
            .is_some_and(|max| files.len() > max)
        {
            skipped += 1;
            continue;
        }

        let hash = oid.to_string();
        let author = commit.author();

        commits.push(CommitRecord {
            hash: hash[..hash.len().min(8)].to_string(),
            title: commit.summary().unwrap_or("").to_string(),
            author: format!(
                "{} {}",
                author.name().unwrap_or("unknown"),
                author.email().unwrap_or("unknown")
            ),
            date: commit_day(time.seconds(), time.offset_minutes())?,
            files,
        });

        if let Some(ref pb) = spinner {
            pb.set_message(format!("Mining history: {} commits", commits.len()));
            pb.tick();
        }
    }

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    // The revwalk can still yield a child dated before its parent.
    sort_newest_first(&mut commits);

    info!(commits = commits.len(), skipped, "mined history");
    Ok(commits)
}

fn compute_cutoff(since_days: u64) -> i64 {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64;
    now - (since_days as i64 * 86400)
}

/// Calendar day of a commit in its own timezone, as `git log --date=short`
/// prints it.
fn commit_day(seconds: i64, offset_minutes: i32) -> Result<NaiveDate, StrataError> {
    let offset = FixedOffset::east_opt(offset_minutes * 60)
        .ok_or_else(|| StrataError::Git(format!("invalid timezone offset {offset_minutes}")))?;
    let utc = DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| StrataError::Git(format!("invalid commit timestamp {seconds}")))?;
    Ok(utc.with_timezone(&offset).date_naive())
}

fn extract_file_stats(
    repo: &Repository,
    commit: &git2::Commit,
) -> Result<Vec<FileStat>, StrataError> {
    let commit_tree = commit
        .tree()
        .map_err(|e| StrataError::Git(format!("failed to get commit tree: {e}")))?;

    let parent_tree = if commit.parent_count() > 0 {
        let parent = commit
            .parent(0)
            .map_err(|e| StrataError::Git(format!("failed to get parent: {e}")))?;
        Some(
            parent
                .tree()
                .map_err(|e| StrataError::Git(format!("failed to get parent tree: {e}")))?,
        )
    } else {
        None
    };

    let mut diff_opts = DiffOptions::new();
    let mut diff = repo
        .diff_tree_to_tree(
            parent_tree.as_ref(),
            Some(&commit_tree),
            Some(&mut diff_opts),
        )
        .map_err(|e| StrataError::Git(format!("failed to compute diff: {e}")))?;

    let mut find_opts = DiffFindOptions::new();
    find_opts.renames(true);
    diff.find_similar(Some(&mut find_opts))
        .map_err(|e| StrataError::Git(format!("failed to find renames: {e}")))?;

    // One entry per delta, in diff order; deleted files keep their old path.
    let mut files: Vec<FileStat> = diff
        .deltas()
        .filter_map(|delta| {
            delta
                .new_file()
                .path()
                .or_else(|| delta.old_file().path())
                .map(|p| FileStat::new(p.to_string_lossy(), 0, 0))
        })
        .filter(|f| !f.path.is_empty())
        .collect();

    let mut line_counts: HashMap<String, (u64, u64)> = HashMap::new();

    diff.foreach(
        &mut |_delta, _progress| true,
        None,
        None,
        Some(&mut |delta, _hunk, line| {
            let path = delta
                .new_file()
                .path()
                .or_else(|| delta.old_file().path())
                .unwrap_or(Path::new(""))
                .to_string_lossy()
                .to_string();

            let entry = line_counts.entry(path).or_insert((0, 0));
            match line.origin() {
                '+' => entry.0 += 1,
                '-' => entry.1 += 1,
                _ => {}
            }
            true
        }),
    )
    .map_err(|e| StrataError::Git(format!("failed to iterate diff lines: {e}")))?;

    for file in &mut files {
        if let Some((added, deleted)) = line_counts.get(&file.path) {
            file.added = *added;
            file.deleted = *deleted;
        }
    }

    debug!(commit = %commit.id(), files = files.len(), "extracted file stats");
    Ok(files)
}
