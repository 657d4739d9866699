use crate::SyncContext;
use crate::config::Config;
use crate::output;
use crate::paths::RootConfig;
use crate::watcher::{MirrorWatcher, WatchOptions};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Execute watch command to mirror changes until interrupted
///
/// The config file is followed too; editing it (or running `set-paths` from
/// another terminal) switches the running session to the new roots.
///
/// # Errors
///
/// Returns an error if:
/// - The watch options in the config are invalid
/// - The source root or config directory cannot be watched
/// - The Ctrl-C handler cannot be installed
pub fn execute(ctx: &SyncContext) -> Result<()> {
    let session = super::console_session(ctx)?;
    let options = WatchOptions::from_config(&ctx.config)?;
    let mut watcher = MirrorWatcher::new(Arc::clone(&session), options)?;

    let workspace = ctx.workspace.clone();
    let config_path = ctx.config_path.clone();
    watcher.watch_config(
        ctx.config_path.clone(),
        Box::new(move || -> Result<(RootConfig, WatchOptions)> {
            let config = Config::load(&config_path)?;
            Ok((
                config.resolve_roots(&workspace),
                WatchOptions::from_config(&config)?,
            ))
        }),
    )?;

    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = Arc::clone(&stop);
    ctrlc::set_handler(move || handler_stop.store(true, Ordering::SeqCst))
        .context("Failed to install Ctrl-C handler")?;

    let roots = session.roots();
    output::info(&format!(
        "Mirroring {} into {}",
        roots.source_root.display(),
        roots.shadow_root.display()
    ));
    output::info("Press Ctrl-C to stop.");

    watcher.run_until(&stop)?;

    while !session.is_idle() {
        std::thread::sleep(Duration::from_millis(20));
    }
    output::info("Stopped watching.");
    Ok(())
}
