use crate::SyncContext;
use crate::cli::ApplyChange;
use crate::event::ChangeEvent;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Execute apply command to mirror changes reported on the command line
///
/// Relative paths are resolved against the current directory. Changes outside
/// the source root are skipped silently. Ignore patterns do not apply here.
///
/// # Errors
///
/// Returns an error if:
/// - A relative path cannot be resolved
/// - Any change could not be mirrored
pub fn execute(ctx: &SyncContext, change: ApplyChange) -> Result<()> {
    let session = super::console_session(ctx)?;
    let events = to_events(change)?;

    let mut mirrored = 0usize;
    let mut failed = 0usize;
    for event in &events {
        match session.handle(event) {
            Some(result) if result.is_error() => failed += 1,
            Some(_) => mirrored += 1,
            None => debug!(%event, "outside the source root"),
        }
    }

    if failed > 0 {
        anyhow::bail!(
            "{failed} of {} changes could not be mirrored",
            mirrored + failed
        );
    }
    Ok(())
}

/// Converts the command-line form into change events with absolute paths.
///
/// # Errors
///
/// Returns an error if the current directory is needed and unavailable.
pub fn to_events(change: ApplyChange) -> Result<Vec<ChangeEvent>> {
    let events = match change {
        ApplyChange::Saved { paths } => each(paths, ChangeEvent::Saved)?,
        ApplyChange::Created { paths } => each(paths, ChangeEvent::Created)?,
        ApplyChange::Deleted { paths } => each(paths, ChangeEvent::Deleted)?,
        ApplyChange::Renamed { from, to } => vec![ChangeEvent::Renamed {
            from: absolute(&from)?,
            to: absolute(&to)?,
        }],
    };
    Ok(events)
}

fn each(paths: Vec<PathBuf>, make: fn(PathBuf) -> ChangeEvent) -> Result<Vec<ChangeEvent>> {
    paths
        .iter()
        .map(|path| absolute(path).map(make))
        .collect()
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("Failed to resolve {}", path.display()))
}
