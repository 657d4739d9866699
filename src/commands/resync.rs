use crate::SyncContext;
use crate::event::ChangeEvent;
use crate::mirror::{self, MirrorResult};
use crate::output::{self, Progress};
use crate::utils::{IgnoreSet, thread_pool};
use anyhow::Result;
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use walkdir::WalkDir;

/// Execute resync command to copy the whole source tree into the shadow tree
///
/// Every entry below the source root that the ignore patterns do not exclude
/// is mirrored as if it had just been created. Shadow entries with no source
/// counterpart are left alone.
///
/// # Errors
///
/// Returns an error if:
/// - The source root does not exist
/// - The ignore patterns are invalid
/// - Any entry could not be mirrored
pub fn execute(ctx: &SyncContext) -> Result<()> {
    let roots = ctx.roots();
    if !roots.source_root.is_dir() {
        anyhow::bail!(
            "Source root does not exist: {}",
            roots.source_root.display()
        );
    }
    let ignore = IgnoreSet::new(&ctx.config.watch.ignore_patterns)?;

    let entries: Vec<PathBuf> = WalkDir::new(&roots.source_root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| {
            roots
                .relative(entry.path())
                .is_some_and(|relative| !ignore.is_ignored(&relative))
        })
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.into_path()),
            Err(err) => {
                output::warning(&format!("Skipping unreadable entry: {err}"));
                None
            }
        })
        .collect();

    if entries.is_empty() {
        output::info("Nothing to mirror.");
        return Ok(());
    }

    let progress = Mutex::new(Progress::new("Mirroring", entries.len()));
    let pool = thread_pool::get_thread_pool()?;
    let failures: Vec<MirrorResult> = pool.install(|| {
        entries
            .par_iter()
            .filter_map(|path| {
                let result = mirror::dispatch(&ChangeEvent::Created(path.clone()), &roots);
                progress
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .record(result.as_ref());
                result.filter(MirrorResult::is_error)
            })
            .collect()
    });

    let progress = progress.into_inner().unwrap_or_else(PoisonError::into_inner);
    progress.finish();
    for failure in &failures {
        output::error(&failure.message());
    }
    output::info(&progress.summary());

    if progress.failed() > 0 {
        anyhow::bail!("{} entries could not be mirrored", progress.failed());
    }
    Ok(())
}
