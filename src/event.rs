//! Change notifications consumed by the mirroring engine.

use std::fmt;
use std::path::{Path, PathBuf};

/// A single change reported for the source tree.
///
/// Each event is consumed exactly once by [`crate::mirror::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// File contents were written.
    Saved(PathBuf),
    /// A file or directory appeared.
    Created(PathBuf),
    /// A file or directory disappeared.
    Deleted(PathBuf),
    /// A file or directory moved from `from` to `to`.
    Renamed {
        /// Location before the move.
        from: PathBuf,
        /// Location after the move.
        to: PathBuf,
    },
}

impl ChangeEvent {
    /// Short lowercase name of the event kind, used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Saved(_) => "saved",
            Self::Created(_) => "created",
            Self::Deleted(_) => "deleted",
            Self::Renamed { .. } => "renamed",
        }
    }

    /// The path the event is primarily about (the destination for renames).
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Saved(path) | Self::Created(path) | Self::Deleted(path) => path,
            Self::Renamed { to, .. } => to,
        }
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Renamed { from, to } => {
                write!(f, "renamed {} -> {}", from.display(), to.display())
            }
            other => write!(f, "{} {}", other.kind(), other.path().display()),
        }
    }
}
