use once_cell::sync::OnceCell;
use rayon::ThreadPoolBuilder;
use std::sync::Arc;

static THREAD_POOL: OnceCell<Arc<rayon::ThreadPool>> = OnceCell::new();

/// Builds a pool of mirroring workers.
///
/// # Errors
///
/// Returns an error if the pool threads cannot be spawned
pub fn build_pool(num_threads: usize) -> anyhow::Result<rayon::ThreadPool> {
    Ok(ThreadPoolBuilder::new()
        .num_threads(num_threads.max(1))
        .thread_name(|i| format!("shadowsync-worker-{i}"))
        .build()?)
}

/// Initialize the global worker pool with the specified number of threads
///
/// # Errors
///
/// Returns an error if the pool cannot be built or was already initialized
pub fn init_thread_pool(num_threads: usize) -> anyhow::Result<()> {
    let pool = build_pool(num_threads)?;

    THREAD_POOL
        .set(Arc::new(pool))
        .map_err(|_| anyhow::anyhow!("Thread pool already initialized"))?;

    Ok(())
}

/// Get the global worker pool, initializing it with a single worker per
/// available CPU (at most 8) if nothing configured it first
///
/// # Errors
///
/// Returns an error if the pool has to be created and cannot be
pub fn get_thread_pool() -> anyhow::Result<Arc<rayon::ThreadPool>> {
    THREAD_POOL
        .get_or_try_init(|| {
            let num_threads = std::thread::available_parallelism()
                .map(std::num::NonZeroUsize::get)
                .unwrap_or(1)
                .min(8);
            build_pool(num_threads).map(Arc::new)
        })
        .cloned()
}

/// Configure the global worker pool from config
///
/// # Errors
///
/// Returns an error if the thread pool has already been initialized
pub fn configure_from_config(config: &crate::config::Config) -> anyhow::Result<()> {
    init_thread_pool(config.performance.parallel_threads)
}
