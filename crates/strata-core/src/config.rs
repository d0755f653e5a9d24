use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::StrataError;

/// Top-level configuration loaded from `.strata.toml`.
///
/// Resolution order: CLI flags > local config file > defaults.
///
/// # Examples
///
/// ```
/// use strata_core::StrataConfig;
///
/// let config = StrataConfig::default();
/// assert_eq!(config.segments.days_threshold, 10);
/// assert_eq!(config.segments.author_threshold, 90);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrataConfig {
    /// Segmentation thresholds and directory rollup.
    #[serde(default)]
    pub segments: SegmentsConfig,
    /// Commit source settings.
    #[serde(default)]
    pub mining: MiningConfig,
}

impl StrataConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::FileNotFound`] if `path` does not exist,
    /// [`StrataError::Io`] if it cannot be read, or [`StrataError::Toml`]
    /// if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use strata_core::StrataConfig;
    /// use std::path::Path;
    ///
    /// let config = StrataConfig::from_file(Path::new(".strata.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, StrataError> {
        if !path.exists() {
            return Err(StrataError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata_core::StrataConfig;
    ///
    /// let toml = r#"
    /// [segments]
    /// depth = 1
    /// "#;
    /// let config = StrataConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.segments.depth, 1);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, StrataError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}

/// Segmentation settings.
///
/// # Examples
///
/// ```
/// use strata_core::SegmentsConfig;
///
/// let config = SegmentsConfig::default();
/// assert_eq!(config.depth, 2);
/// assert!(config.max_group_depth.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentsConfig {
    /// Quiet days between two commits that start a new segment (default: 10).
    #[serde(default = "default_days_threshold")]
    pub days_threshold: i64,
    /// Days of author inactivity that count as leaving or returning (default: 90).
    #[serde(default = "default_author_threshold")]
    pub author_threshold: i64,
    /// Directory depth used to group file churn; 0 keeps every file (default: 2).
    #[serde(default = "default_depth")]
    pub depth: usize,
    /// Upper bound on the number of path components kept in a group key.
    pub max_group_depth: Option<usize>,
}

fn default_days_threshold() -> i64 {
    10
}

fn default_author_threshold() -> i64 {
    90
}

fn default_depth() -> usize {
    2
}

impl Default for SegmentsConfig {
    fn default() -> Self {
        Self {
            days_threshold: default_days_threshold(),
            author_threshold: default_author_threshold(),
            depth: default_depth(),
            max_group_depth: None,
        }
    }
}

/// Settings for reading history out of a git repository.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MiningConfig {
    /// Only include commits from the last N days.
    pub since_days: Option<u64>,
    /// Skip commits touching more files than this.
    pub max_files_per_commit: Option<usize>,
    /// Branch to walk instead of HEAD.
    pub branch: Option<String>,
    /// Keep merge commits (default: false, like `git log --no-merges`).
    #[serde(default)]
    pub include_merges: bool,
}
