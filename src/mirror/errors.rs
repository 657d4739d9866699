use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single mirroring operation.
///
/// Every variant keeps the path involved and the underlying I/O error. None of
/// these are retried; the operation is abandoned and the failure reported.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// The source object (copy/create) or shadow object (delete) could not be inspected.
    #[error("Failed to stat {}: {source}", path.display())]
    Stat {
        /// Path that was inspected
        path: PathBuf,
        /// Underlying cause
        source: io::Error,
    },

    /// A shadow directory or one of its ancestors could not be created.
    #[error("Failed to create directory {}: {source}", path.display())]
    CreateDir {
        /// Directory that was being created
        path: PathBuf,
        /// Underlying cause
        source: io::Error,
    },

    /// File contents could not be copied into the shadow tree.
    #[error("Failed to copy file {} to {}: {source}", from.display(), to.display())]
    Copy {
        /// Source file
        from: PathBuf,
        /// Shadow destination
        to: PathBuf,
        /// Underlying cause
        source: io::Error,
    },

    /// A shadow directory could not be removed.
    #[error("Failed to delete directory {}: {source}", path.display())]
    RemoveDir {
        /// Shadow directory
        path: PathBuf,
        /// Underlying cause
        source: io::Error,
    },

    /// A shadow file could not be removed.
    #[error("Failed to delete file {}: {source}", path.display())]
    RemoveFile {
        /// Shadow file
        path: PathBuf,
        /// Underlying cause
        source: io::Error,
    },

    /// A shadow object could not be moved.
    #[error("Failed to rename {} to {}: {source}", from.display(), to.display())]
    Rename {
        /// Shadow object before the move
        from: PathBuf,
        /// Intended shadow location after the move
        to: PathBuf,
        /// Underlying cause
        source: io::Error,
    },
}

impl MirrorError {
    /// Returns `true` for failures to inspect a path, as opposed to failures to change one.
    #[must_use]
    pub const fn is_stat_failure(&self) -> bool {
        matches!(self, Self::Stat { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_error_message() {
        let error = MirrorError::Stat {
            path: PathBuf::from("/ws/resources/a.txt"),
            source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        };
        assert_eq!(
            error.to_string(),
            "Failed to stat /ws/resources/a.txt: No such file or directory"
        );
        assert!(error.is_stat_failure());
    }

    #[test]
    fn test_rename_error_message() {
        let error = MirrorError::Rename {
            from: PathBuf::from("/shadow/a"),
            to: PathBuf::from("/shadow/b"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "Permission denied"),
        };
        assert!(error.to_string().starts_with("Failed to rename /shadow/a to /shadow/b"));
        assert!(!error.is_stat_failure());
    }

    #[test]
    fn test_source_chain_is_preserved() {
        use std::error::Error as _;

        let error = MirrorError::Copy {
            from: PathBuf::from("/src/a"),
            to: PathBuf::from("/dst/a"),
            source: io::Error::other("disk full"),
        };
        let source = error.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("disk full"));
    }
}
