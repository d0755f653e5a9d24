//! Directory rollup: map file paths to depth-limited group keys.

/// Marker appended to a truncated group key.
pub const WILDCARD: &str = "*";

/// Stands in for an empty directory prefix.
pub const ROOT_KEY: &str = "(root)";

/// Compute the group key of `file_path` at `depth`.
///
/// Paths with `depth` or fewer components, and every path when `depth` is
/// zero, are their own group. Longer paths are cut to their first `depth`
/// components (further limited by `cap`, if set) and suffixed with `/*`.
///
/// # Examples
///
/// ```
/// use strata_history::rollup::group_key;
///
/// assert_eq!(group_key("src/a.rb", 1, None), "src/*");
/// assert_eq!(group_key("src/a.rb", 2, None), "src/a.rb");
/// assert_eq!(group_key("src/a.rb", 0, None), "src/a.rb");
/// assert_eq!(group_key("a/b/c/d.rs", 3, Some(2)), "a/b/*");
/// ```
pub fn group_key(file_path: &str, depth: usize, cap: Option<usize>) -> String {
    let parts: Vec<&str> = file_path.split('/').collect();
    if depth == 0 || parts.len() <= depth {
        return file_path.to_string();
    }

    let keep = cap.map_or(depth, |c| depth.min(c));
    let prefix = parts[..keep].join("/");
    if prefix.is_empty() {
        format!("{ROOT_KEY}/{WILDCARD}")
    } else {
        format!("{prefix}/{WILDCARD}")
    }
}

/// Rollup parameters bundled for repeated use.
///
/// # Examples
///
/// ```
/// use strata_history::rollup::Rollup;
///
/// let rollup = Rollup::new(2);
/// assert_eq!(rollup.key("crates/core/src/lib.rs"), "crates/core/*");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rollup {
    /// Requested grouping depth; 0 disables grouping.
    pub depth: usize,
    /// Optional hard limit on kept components.
    pub max_group_depth: Option<usize>,
}

impl Rollup {
    /// Rollup at `depth` without a cap.
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            max_group_depth: None,
        }
    }

    /// Limit group keys to at most `cap` components.
    pub fn with_cap(mut self, cap: Option<usize>) -> Self {
        self.max_group_depth = cap;
        self
    }

    /// Group key for `file_path`.
    pub fn key(&self, file_path: &str) -> String {
        group_key(file_path, self.depth, self.max_group_depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_zero_is_identity() {
        for p in ["", "a", "a/b", "/abs/path.rs", "x/y/z/w.txt"] {
            assert_eq!(group_key(p, 0, None), p);
            assert_eq!(group_key(p, 0, Some(1)), p);
        }
    }

    #[test]
    fn short_paths_are_not_truncated() {
        assert_eq!(group_key("README.md", 1, None), "README.md");
        assert_eq!(group_key("src/main.rs", 2, None), "src/main.rs");
    }

    #[test]
    fn long_paths_get_wildcard() {
        assert_eq!(group_key("src/a/b.rs", 1, None), "src/*");
        assert_eq!(group_key("src/a/b.rs", 2, None), "src/a/*");
    }

    #[test]
    fn truncated_key_differs_from_any_exact_path() {
        assert_ne!(group_key("src/x.rs", 1, None), "src");
        assert!(group_key("src/x.rs", 1, None).ends_with("/*"));
    }

    #[test]
    fn cap_limits_kept_components() {
        assert_eq!(group_key("a/b/c/d/e.rs", 4, Some(2)), "a/b/*");
        assert_eq!(group_key("a/b/c/d/e.rs", 1, Some(2)), "a/*");
        assert_eq!(group_key("a/b/c/d/e.rs", 4, None), "a/b/c/d/*");
    }

    #[test]
    fn cap_does_not_change_the_truncation_decision() {
        // Three components at depth 3 stay exact even with a cap of 2.
        assert_eq!(group_key("a/b/c.rs", 3, Some(2)), "a/b/c.rs");
    }

    #[test]
    fn empty_prefix_uses_root_sentinel() {
        assert_eq!(group_key("/etc/hosts", 1, None), "(root)/*");
    }

    #[test]
    fn rollup_wraps_group_key() {
        let rollup = Rollup::new(3).with_cap(Some(2));
        assert_eq!(rollup.key("a/b/c/d.rs"), "a/b/*");
        assert_eq!(Rollup::default().key("a/b/c/d.rs"), "a/b/c/d.rs");
    }
}
