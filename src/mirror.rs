//! # Shadow Tree Mirroring
//!
//! The mirror module replays source-tree changes against the shadow tree.
//!
//! ```text
//! ┌──────────────┐   ChangeEvent   ┌────────────┐   stat/copy/mkdir/   ┌─────────────┐
//! │ Notification │ ──────────────> │  dispatch  │ ───────────────────> │ Shadow tree │
//! │   source     │                 │            │   remove/rename      │             │
//! └──────────────┘                 └────────────┘                      └─────────────┘
//!                                        │ MirrorResult
//!                                        v
//!                                  ┌────────────┐
//!                                  │  Reporter  │
//!                                  └────────────┘
//! ```
//!
//! ## Operations
//!
//! - **Copy/Create** (`Saved`, `Created`): stats the source. Directories are
//!   created with all missing ancestors; files get their parent chain created
//!   and are then copied over any existing shadow file.
//! - **Delete** (`Deleted`): stats the *shadow* object, since the source is
//!   already gone. A missing shadow object is a skip, not an error.
//! - **Rename** (`Renamed`): renames the shadow object. No fallback is tried
//!   when the rename fails.
//!
//! Each operation is independent of every other one. Nothing is retried and
//! nothing is rolled back; a failed copy may leave a partial shadow file.
//!
//! ## Scope
//!
//! Paths outside the source root produce no result at all. Renames crossing
//! the boundary degrade to a copy (moved in) or a delete (moved out).

use crate::event::ChangeEvent;
use crate::paths::{CaseSensitivity, RootConfig, ShadowPath, translate};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Typed failures of mirroring operations
pub mod errors;

pub use errors::MirrorError;

/// What a successful operation did to the shadow tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorAction {
    /// A directory (and any missing ancestors) now exists.
    CreatedDirectory,
    /// A file's contents were copied over.
    CopiedFile,
    /// A directory and everything below it was removed.
    RemovedDirectory,
    /// A single file was removed.
    RemovedFile,
    /// A file or directory was moved.
    Renamed,
}

/// Why an operation made no change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The shadow object to delete does not exist.
    NotPresent,
}

/// Outcome of one mirroring operation.
#[derive(Debug)]
pub enum MirrorOutcome {
    /// The shadow tree was changed.
    Success(MirrorAction),
    /// Nothing needed doing.
    Skipped(SkipReason),
    /// The operation was abandoned.
    Failed(MirrorError),
}

impl From<Result<MirrorAction, MirrorError>> for MirrorOutcome {
    fn from(result: Result<MirrorAction, MirrorError>) -> Self {
        match result {
            Ok(action) => Self::Success(action),
            Err(error) => Self::Failed(error),
        }
    }
}

/// Outcome of one mirroring operation together with the path it concerned.
#[derive(Debug)]
pub struct MirrorResult {
    /// Path relative to the roots; empty when the root itself was affected.
    pub relative_path: PathBuf,
    /// What happened.
    pub outcome: MirrorOutcome,
}

impl MirrorResult {
    /// Human-readable description of the outcome.
    #[must_use]
    pub fn message(&self) -> String {
        let relative = if self.relative_path.as_os_str().is_empty() {
            ".".to_string()
        } else {
            self.relative_path.display().to_string()
        };

        match &self.outcome {
            MirrorOutcome::Success(MirrorAction::CreatedDirectory) => {
                format!("Directory created in shadow tree: {relative}")
            }
            MirrorOutcome::Success(MirrorAction::CopiedFile) => {
                format!("File copied to shadow tree: {relative}")
            }
            MirrorOutcome::Success(MirrorAction::RemovedDirectory) => {
                format!("Directory deleted from shadow tree: {relative}")
            }
            MirrorOutcome::Success(MirrorAction::RemovedFile) => {
                format!("File deleted from shadow tree: {relative}")
            }
            MirrorOutcome::Success(MirrorAction::Renamed) => {
                format!("File or directory renamed in shadow tree: {relative}")
            }
            MirrorOutcome::Skipped(SkipReason::NotPresent) => {
                format!("Nothing to delete in shadow tree: {relative}")
            }
            MirrorOutcome::Failed(error) => error.to_string(),
        }
    }

    /// Returns `true` if the operation failed.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.outcome, MirrorOutcome::Failed(_))
    }

    /// Returns `true` if the operation changed the shadow tree.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.outcome, MirrorOutcome::Success(_))
    }

    /// Returns `true` if there was nothing to do.
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self.outcome, MirrorOutcome::Skipped(_))
    }
}

/// Mirrors one change using the host's case rule.
///
/// Returns `None` when no path in the event lies under the source root; such
/// events are not reported anywhere.
#[must_use]
pub fn dispatch(event: &ChangeEvent, roots: &RootConfig) -> Option<MirrorResult> {
    dispatch_with(event, roots, CaseSensitivity::host())
}

fn dispatch_with(
    event: &ChangeEvent,
    roots: &RootConfig,
    case: CaseSensitivity,
) -> Option<MirrorResult> {
    let result = match event {
        ChangeEvent::Saved(path) | ChangeEvent::Created(path) => {
            let shadow = translate(path, roots, case).into_shadow_path()?;
            copy_result(path, shadow)
        }
        ChangeEvent::Deleted(path) => {
            let shadow = translate(path, roots, case).into_shadow_path()?;
            delete_result(shadow)
        }
        ChangeEvent::Renamed { from, to } => {
            let old = translate(from, roots, case).into_shadow_path();
            let new = translate(to, roots, case).into_shadow_path();
            match (old, new) {
                (Some(old), Some(new)) => MirrorResult {
                    outcome: rename_in_shadow(old.as_path(), new.as_path()).into(),
                    relative_path: new.relative().to_path_buf(),
                },
                (None, Some(new)) => {
                    debug!(from = %from.display(), "rename into source tree, copying");
                    copy_result(to, new)
                }
                (Some(old), None) => {
                    debug!(to = %to.display(), "rename out of source tree, deleting");
                    delete_result(old)
                }
                (None, None) => return None,
            }
        }
    };

    match &result.outcome {
        MirrorOutcome::Failed(error) => {
            warn!(event = %event, error = %error, "mirroring failed");
        }
        outcome => debug!(event = %event, ?outcome, "mirrored"),
    }

    Some(result)
}

fn copy_result(source: &Path, shadow: ShadowPath) -> MirrorResult {
    MirrorResult {
        outcome: copy_into_shadow(source, shadow.as_path()).into(),
        relative_path: shadow.relative().to_path_buf(),
    }
}

fn delete_result(shadow: ShadowPath) -> MirrorResult {
    MirrorResult {
        outcome: delete_from_shadow(shadow.as_path()),
        relative_path: shadow.relative().to_path_buf(),
    }
}

/// Mirrors a created or saved source object into the shadow tree.
///
/// Directories are created together with missing ancestors; creating one that
/// already exists succeeds. Files overwrite any existing shadow file.
///
/// # Errors
///
/// Returns an error if:
/// - The source path cannot be inspected
/// - A shadow directory cannot be created
/// - The file contents cannot be copied
pub fn copy_into_shadow(source: &Path, shadow: &Path) -> Result<MirrorAction, MirrorError> {
    let metadata = fs::metadata(source).map_err(|source_err| MirrorError::Stat {
        path: source.to_path_buf(),
        source: source_err,
    })?;

    if metadata.is_dir() {
        create_dir_all(shadow)?;
        return Ok(MirrorAction::CreatedDirectory);
    }

    if let Some(parent) = shadow.parent() {
        create_dir_all(parent)?;
    }

    fs::copy(source, shadow).map_err(|err| MirrorError::Copy {
        from: source.to_path_buf(),
        to: shadow.to_path_buf(),
        source: err,
    })?;

    Ok(MirrorAction::CopiedFile)
}

/// Removes the shadow counterpart of a deleted source object.
///
/// A shadow object that does not exist, or disappears while being removed,
/// yields [`MirrorOutcome::Skipped`]. Symbolic links are removed, never followed.
#[must_use]
pub fn delete_from_shadow(shadow: &Path) -> MirrorOutcome {
    let metadata = match fs::symlink_metadata(shadow) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return MirrorOutcome::Skipped(SkipReason::NotPresent);
        }
        Err(err) => {
            return MirrorOutcome::Failed(MirrorError::Stat {
                path: shadow.to_path_buf(),
                source: err,
            });
        }
    };

    if metadata.is_dir() {
        match fs::remove_dir_all(shadow) {
            Ok(()) => MirrorOutcome::Success(MirrorAction::RemovedDirectory),
            Err(err) if err.kind() == io::ErrorKind::NotFound && !shadow.exists() => {
                MirrorOutcome::Skipped(SkipReason::NotPresent)
            }
            Err(err) => MirrorOutcome::Failed(MirrorError::RemoveDir {
                path: shadow.to_path_buf(),
                source: err,
            }),
        }
    } else {
        match fs::remove_file(shadow) {
            Ok(()) => MirrorOutcome::Success(MirrorAction::RemovedFile),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                MirrorOutcome::Skipped(SkipReason::NotPresent)
            }
            Err(err) => MirrorOutcome::Failed(MirrorError::RemoveFile {
                path: shadow.to_path_buf(),
                source: err,
            }),
        }
    }
}

/// Moves a shadow object to its new location.
///
/// # Errors
///
/// Returns an error if the rename fails, including when the old shadow object
/// never existed. No alternative action is attempted.
pub fn rename_in_shadow(old: &Path, new: &Path) -> Result<MirrorAction, MirrorError> {
    fs::rename(old, new).map_err(|err| MirrorError::Rename {
        from: old.to_path_buf(),
        to: new.to_path_buf(),
        source: err,
    })?;
    Ok(MirrorAction::Renamed)
}

fn create_dir_all(path: &Path) -> Result<(), MirrorError> {
    fs::create_dir_all(path).map_err(|err| MirrorError::CreateDir {
        path: path.to_path_buf(),
        source: err,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::TempDir;

    struct Workspace {
        _dir: TempDir,
        roots: RootConfig,
    }

    impl Workspace {
        fn new() -> Result<Self> {
            let dir = TempDir::new()?;
            let roots = RootConfig::from_workspace(dir.path());
            fs::create_dir_all(&roots.source_root)?;
            Ok(Self { _dir: dir, roots })
        }

        fn source(&self, relative: &str) -> PathBuf {
            self.roots.source_root.join(relative)
        }

        fn shadow(&self, relative: &str) -> PathBuf {
            self.roots.shadow_root.join(relative)
        }

        fn write_source(&self, relative: &str, content: &str) -> Result<PathBuf> {
            let path = self.source(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, content)?;
            Ok(path)
        }
    }

    #[test]
    fn test_copy_creates_missing_ancestors() -> Result<()> {
        let ws = Workspace::new()?;
        let source = ws.write_source("a/b/c.txt", "x")?;

        let action = copy_into_shadow(&source, &ws.shadow("a/b/c.txt"))?;

        assert_eq!(action, MirrorAction::CopiedFile);
        assert_eq!(fs::read_to_string(ws.shadow("a/b/c.txt"))?, "x");
        Ok(())
    }

    #[test]
    fn test_copy_overwrites_existing_shadow_file() -> Result<()> {
        let ws = Workspace::new()?;
        let source = ws.write_source("f.txt", "new")?;
        fs::create_dir_all(&ws.roots.shadow_root)?;
        fs::write(ws.shadow("f.txt"), "a much longer old content")?;

        copy_into_shadow(&source, &ws.shadow("f.txt"))?;

        assert_eq!(fs::read_to_string(ws.shadow("f.txt"))?, "new");
        Ok(())
    }

    #[test]
    fn test_create_directory_is_idempotent() -> Result<()> {
        let ws = Workspace::new()?;
        let dir = ws.source("nested/dir");
        fs::create_dir_all(&dir)?;

        assert_eq!(
            copy_into_shadow(&dir, &ws.shadow("nested/dir"))?,
            MirrorAction::CreatedDirectory
        );
        assert_eq!(
            copy_into_shadow(&dir, &ws.shadow("nested/dir"))?,
            MirrorAction::CreatedDirectory
        );
        assert!(ws.shadow("nested/dir").is_dir());
        Ok(())
    }

    #[test]
    fn test_copy_of_vanished_source_is_stat_failure() -> Result<()> {
        let ws = Workspace::new()?;
        let error = copy_into_shadow(&ws.source("gone.txt"), &ws.shadow("gone.txt"))
            .expect_err("stat should fail");
        assert!(error.is_stat_failure());
        assert!(!ws.shadow("gone.txt").exists());
        Ok(())
    }

    #[test]
    fn test_delete_missing_shadow_is_skipped() -> Result<()> {
        let ws = Workspace::new()?;
        let outcome = delete_from_shadow(&ws.shadow("missing.txt"));
        assert!(matches!(
            outcome,
            MirrorOutcome::Skipped(SkipReason::NotPresent)
        ));
        Ok(())
    }

    #[test]
    fn test_delete_below_a_shadow_file_fails() -> Result<()> {
        let ws = Workspace::new()?;
        fs::create_dir_all(&ws.roots.shadow_root)?;
        fs::write(ws.shadow("a"), "not a directory")?;

        let outcome = delete_from_shadow(&ws.shadow("a/b.txt"));

        assert!(matches!(
            outcome,
            MirrorOutcome::Failed(MirrorError::Stat { .. })
        ));
        assert!(ws.shadow("a").is_file());
        Ok(())
    }

    #[test]
    fn test_copy_below_a_shadow_file_fails_creating_directory() -> Result<()> {
        let ws = Workspace::new()?;
        let source = ws.write_source("a/b.txt", "b")?;
        fs::create_dir_all(&ws.roots.shadow_root)?;
        fs::write(ws.shadow("a"), "not a directory")?;

        let error = copy_into_shadow(&source, &ws.shadow("a/b.txt"))
            .expect_err("parent cannot be created");

        assert!(matches!(error, MirrorError::CreateDir { .. }));
        assert_eq!(fs::read_to_string(ws.shadow("a"))?, "not a directory");
        Ok(())
    }

    #[test]
    fn test_dispatch_reports_io_failure_as_error() -> Result<()> {
        let ws = Workspace::new()?;
        let source = ws.write_source("a/b.txt", "b")?;
        fs::create_dir_all(&ws.roots.shadow_root)?;
        fs::write(ws.shadow("a"), "not a directory")?;

        let result = dispatch(&ChangeEvent::Saved(source), &ws.roots).expect("path is contained");

        assert!(result.is_error());
        assert_eq!(result.relative_path, PathBuf::from("a/b.txt"));
        assert!(result.message().starts_with("Failed to create directory"));
        Ok(())
    }

    #[test]
    fn test_delete_directory_recursively() -> Result<()> {
        let ws = Workspace::new()?;
        fs::create_dir_all(ws.shadow("d/e"))?;
        fs::write(ws.shadow("d/e/f.txt"), "f")?;

        let outcome = delete_from_shadow(&ws.shadow("d"));

        assert!(matches!(
            outcome,
            MirrorOutcome::Success(MirrorAction::RemovedDirectory)
        ));
        assert!(!ws.shadow("d").exists());
        Ok(())
    }

    #[test]
    fn test_delete_twice_never_fails() -> Result<()> {
        let ws = Workspace::new()?;
        fs::create_dir_all(&ws.roots.shadow_root)?;
        fs::write(ws.shadow("f.txt"), "f")?;

        let first = delete_from_shadow(&ws.shadow("f.txt"));
        let second = delete_from_shadow(&ws.shadow("f.txt"));

        assert!(matches!(
            first,
            MirrorOutcome::Success(MirrorAction::RemovedFile)
        ));
        assert!(matches!(
            second,
            MirrorOutcome::Skipped(SkipReason::NotPresent)
        ));
        Ok(())
    }

    #[test]
    fn test_rename_missing_shadow_fails_without_fallback() -> Result<()> {
        let ws = Workspace::new()?;
        fs::create_dir_all(&ws.roots.shadow_root)?;
        let error = rename_in_shadow(&ws.shadow("old.txt"), &ws.shadow("new.txt"))
            .expect_err("rename should fail");
        assert!(matches!(error, MirrorError::Rename { .. }));
        assert!(!ws.shadow("new.txt").exists());
        Ok(())
    }

    #[test]
    fn test_dispatch_ignores_paths_outside_root() -> Result<()> {
        let ws = Workspace::new()?;
        let event = ChangeEvent::Saved(PathBuf::from("/etc/hosts"));
        assert!(dispatch(&event, &ws.roots).is_none());
        assert!(!ws.roots.shadow_root.exists());
        Ok(())
    }

    #[test]
    fn test_dispatch_rename_out_of_tree_deletes() -> Result<()> {
        let ws = Workspace::new()?;
        fs::create_dir_all(&ws.roots.shadow_root)?;
        fs::write(ws.shadow("leaving.txt"), "bye")?;

        let event = ChangeEvent::Renamed {
            from: ws.source("leaving.txt"),
            to: PathBuf::from("/somewhere/else.txt"),
        };
        let result = dispatch(&event, &ws.roots).expect("old path is contained");

        assert!(result.is_success());
        assert!(!ws.shadow("leaving.txt").exists());
        Ok(())
    }

    #[test]
    fn test_dispatch_rename_into_tree_copies() -> Result<()> {
        let ws = Workspace::new()?;
        let arrived = ws.write_source("arrived.txt", "hello")?;

        let event = ChangeEvent::Renamed {
            from: PathBuf::from("/outside/arrived.txt"),
            to: arrived,
        };
        let result = dispatch(&event, &ws.roots).expect("new path is contained");

        assert_eq!(result.relative_path, PathBuf::from("arrived.txt"));
        assert_eq!(fs::read_to_string(ws.shadow("arrived.txt"))?, "hello");
        Ok(())
    }

    #[test]
    fn test_messages() {
        let result = MirrorResult {
            relative_path: PathBuf::from("a/b.txt"),
            outcome: MirrorOutcome::Success(MirrorAction::CopiedFile),
        };
        assert_eq!(result.message(), "File copied to shadow tree: a/b.txt");
        assert!(!result.is_error());

        let root = MirrorResult {
            relative_path: PathBuf::new(),
            outcome: MirrorOutcome::Success(MirrorAction::CreatedDirectory),
        };
        assert_eq!(root.message(), "Directory created in shadow tree: .");
    }
}
