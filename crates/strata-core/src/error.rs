use std::path::PathBuf;

/// Errors that can occur across strata.
///
/// Library crates use this type directly; the binary converts to
/// `miette::Report` at the boundary.
///
/// # Examples
///
/// ```
/// use strata_core::StrataError;
///
/// let err = StrataError::MalformedCommit {
///     hash: "abc123".into(),
///     reason: "missing author".into(),
/// };
/// assert!(err.to_string().contains("missing author"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum StrataError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Git operation failure.
    #[error("git error: {0}")]
    Git(String),

    /// No commits were supplied, so there is nothing to segment.
    #[error("history is empty: no commits to analyze")]
    #[diagnostic(help("widen --since or check that the branch has non-merge commits"))]
    EmptyHistory,

    /// A commit record violates an input invariant.
    #[error("malformed commit {hash}: {reason}")]
    MalformedCommit {
        /// Hash of the offending commit (may be empty if unknown).
        hash: String,
        /// What is wrong with it.
        reason: String,
    },

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

impl StrataError {
    /// Shorthand for a [`StrataError::MalformedCommit`].
    pub fn malformed(hash: impl Into<String>, reason: impl Into<String>) -> Self {
        StrataError::MalformedCommit {
            hash: hash.into(),
            reason: reason.into(),
        }
    }
}
