pub mod apply;
pub mod config;
pub mod resync;
pub mod set_paths;
pub mod watch;

use crate::SyncContext;
use crate::output::ConsoleReporter;
use crate::session::Session;
use crate::utils::thread_pool;
use anyhow::Result;
use std::sync::Arc;

/// Builds a session on the context's roots that reports to the console.
///
/// # Errors
///
/// Returns an error if the worker pool cannot be created.
pub fn console_session(ctx: &SyncContext) -> Result<Arc<Session>> {
    let pool = thread_pool::get_thread_pool()?;
    Ok(Arc::new(Session::new(
        ctx.roots(),
        Arc::new(ConsoleReporter),
        pool,
    )))
}
