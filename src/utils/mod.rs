//! Utility functions and helpers.
//!
//! - Path input handling (tilde expansion, absolutizing)
//! - Ignore pattern matching for watched paths
//!
//! # Submodules
//!
//! - [`thread_pool`]: Worker pool configuration
//!
//! # Examples
//!
//! ```
//! use shadowsync::utils::{IgnoreSet, expand_tilde};
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let path = expand_tilde("~/projects/site/resources")?;
//!
//! let ignore = IgnoreSet::new(&[".git".to_string(), "*.swp".to_string()])?;
//! assert!(ignore.is_ignored(Path::new("/ws/resources/.git/HEAD")));
//! assert!(!ignore.is_ignored(Path::new("/ws/resources/index.html")));
//! # Ok(())
//! # }
//! ```

/// Thread pool configuration for mirroring operations
pub mod thread_pool;

use anyhow::{Context, Result};
use glob::{MatchOptions, Pattern};
use std::path::{Component, Path, PathBuf};

/// Expands a path starting with `~` to the user's home directory.
///
/// # Errors
///
/// Returns an error if the path is empty.
pub fn expand_tilde(path: &str) -> Result<PathBuf> {
    if path.is_empty() {
        anyhow::bail!("Path cannot be empty");
    }
    if let Some(home) = dirs::home_dir() {
        if path == "~" {
            return Ok(home);
        }
        if let Some(rest) = path.strip_prefix("~/") {
            return Ok(home.join(rest));
        }
    }
    Ok(PathBuf::from(path))
}

/// Turns user input into an absolute path, resolving `~` and relative paths
/// against `base`.
///
/// # Errors
///
/// Returns an error if the input is empty.
pub fn absolutize(input: &str, base: &Path) -> Result<PathBuf> {
    let path = expand_tilde(input.trim())?;
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(base.join(path))
    }
}

/// Compiled ignore patterns, matched against every component of a path.
#[derive(Debug, Clone, Default)]
pub struct IgnoreSet {
    patterns: Vec<Pattern>,
}

impl IgnoreSet {
    /// Compiles glob patterns such as `.git` or `*.swp`.
    ///
    /// # Errors
    ///
    /// Returns an error if any pattern is not a valid glob.
    pub fn new(patterns: &[String]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| Pattern::new(p).with_context(|| format!("Invalid ignore pattern: {p}")))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Returns `true` if any component of `path` matches any pattern.
    #[must_use]
    pub fn is_ignored(&self, path: &Path) -> bool {
        let options = MatchOptions {
            case_sensitive: !cfg!(windows),
            require_literal_separator: true,
            require_literal_leading_dot: false,
        };

        path.components().any(|component| match component {
            Component::Normal(name) => {
                let name = name.to_string_lossy();
                self.patterns
                    .iter()
                    .any(|pattern| pattern.matches_with(&name, options))
            }
            _ => false,
        })
    }
}
