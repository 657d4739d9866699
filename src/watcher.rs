//! Filesystem watching for the source tree.
//!
//! ```text
//!  notify backend ──► mpsc channel ──► EventTranslator ──► scope filter ──► Session::submit
//!                                           ▲                                   │
//!                              rename window expiry                     worker pool
//! ```
//!
//! The watcher also follows the config file. When it changes, the roots and
//! watch options are reloaded and the source watch moves to the new root.

mod events;

pub use events::EventTranslator;

use crate::config::Config;
use crate::event::ChangeEvent;
use crate::output;
use crate::paths::RootConfig;
use crate::session::Session;
use crate::utils::IgnoreSet;
use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Longest single wait for a notification before checking the stop flag.
const TICK: Duration = Duration::from_millis(200);

/// Settings that shape which notifications become mirroring work.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Paths with a component matching any of these are never mirrored.
    pub ignore: IgnoreSet,
    /// How long to wait for the second half of a rename.
    pub rename_window: Duration,
}

impl WatchOptions {
    /// Builds the options from the `[watch]` config section.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern or the rename window is invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            ignore: IgnoreSet::new(&config.watch.ignore_patterns)?,
            rename_window: config.watch.rename_window()?,
        })
    }
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            ignore: IgnoreSet::default(),
            rename_window: Duration::from_millis(250),
        }
    }
}

/// Produces fresh roots and options after the config file changed.
pub type Reloader = Box<dyn FnMut() -> Result<(RootConfig, WatchOptions)>>;

/// Watches the source root and feeds changes into a [`Session`].
pub struct MirrorWatcher {
    session: Arc<Session>,
    options: WatchOptions,
    translator: EventTranslator,
    watcher: RecommendedWatcher,
    events: Receiver<notify::Result<Event>>,
    watched_source: Option<PathBuf>,
    config_file: Option<PathBuf>,
    reload: Option<Reloader>,
}

impl MirrorWatcher {
    /// Starts watching the session's source root recursively.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform watcher cannot be created or the
    /// source root cannot be watched (for example because it does not exist).
    pub fn new(session: Arc<Session>, options: WatchOptions) -> Result<Self> {
        let (tx, rx) = mpsc::channel();
        let watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;

        let mut this = Self {
            session,
            translator: EventTranslator::new(options.rename_window),
            options,
            watcher,
            events: rx,
            watched_source: None,
            config_file: None,
            reload: None,
        };
        this.watch_source()?;
        Ok(this)
    }

    /// Also follows `path`, calling `reload` whenever it is written, created,
    /// replaced or removed.
    ///
    /// The file's directory is watched, so the file does not need to exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory containing `path` cannot be watched.
    pub fn watch_config(&mut self, path: PathBuf, reload: Reloader) -> Result<()> {
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

        self.watcher
            .watch(&parent, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch config directory: {}", parent.display()))?;

        debug!(config = %path.display(), "following config file");
        self.config_file = Some(path);
        self.reload = Some(reload);
        Ok(())
    }

    /// The directory currently watched for changes, if any.
    #[must_use]
    pub fn watched_source(&self) -> Option<&Path> {
        self.watched_source.as_deref()
    }

    /// Processes notifications until `stop` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform watcher shuts down.
    pub fn run_until(&mut self, stop: &AtomicBool) -> Result<()> {
        while !stop.load(Ordering::Relaxed) {
            self.poll(TICK)?;
        }
        Ok(())
    }

    /// Waits up to `timeout` for one notification, then forwards everything
    /// that became ready, including renames whose window just closed.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform watcher shuts down.
    pub fn poll(&mut self, timeout: Duration) -> Result<()> {
        let wait = self.translator.next_deadline().map_or(timeout, |deadline| {
            deadline
                .saturating_duration_since(Instant::now())
                .min(timeout)
        });

        match self.events.recv_timeout(wait) {
            Ok(Ok(event)) => self.on_event(event),
            Ok(Err(error)) => {
                warn!(%error, "watch error");
                output::warning(&format!("File watcher error: {error}"));
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                anyhow::bail!("File watcher stopped unexpectedly");
            }
        }

        for change in self.translator.expire(Instant::now()) {
            self.forward(change);
        }
        Ok(())
    }

    fn on_event(&mut self, event: Event) {
        if self.touches_config(&event) {
            self.reload();
            return;
        }
        for change in self.translator.push(event, Instant::now()) {
            self.forward(change);
        }
    }

    fn touches_config(&self, event: &Event) -> bool {
        if matches!(event.kind, EventKind::Access(_)) {
            return false;
        }
        self.config_file
            .as_ref()
            .is_some_and(|config| event.paths.iter().any(|path| path == config))
    }

    fn forward(&self, change: ChangeEvent) {
        let roots = self.session.roots();
        if let Some(change) = scope(change, &roots, &self.options.ignore) {
            self.session.submit(change);
        }
    }

    fn reload(&mut self) {
        let Some(reload) = self.reload.as_mut() else {
            return;
        };

        match reload() {
            Ok((roots, options)) => {
                self.translator.set_window(options.rename_window);
                self.options = options;

                if *self.session.roots() == roots {
                    debug!("config changed, roots unchanged");
                    return;
                }

                info!(
                    source = %roots.source_root.display(),
                    shadow = %roots.shadow_root.display(),
                    "roots changed"
                );
                self.session.replace_roots(roots);
                match self.watch_source() {
                    Ok(()) => output::info("Configuration reloaded, now mirroring the new roots."),
                    Err(error) => output::error(&format!("{error:#}")),
                }
            }
            Err(error) => {
                output::error(&format!("Failed to reload configuration: {error:#}"));
            }
        }
    }

    fn watch_source(&mut self) -> Result<()> {
        if let Some(previous) = self.watched_source.take()
            && let Err(error) = self.watcher.unwatch(&previous)
        {
            debug!(%error, path = %previous.display(), "unwatch failed");
        }

        let roots = self.session.roots();
        if roots.is_unset() {
            warn!("roots are not configured, nothing to watch");
            return Ok(());
        }

        self.watcher
            .watch(&roots.source_root, RecursiveMode::Recursive)
            .with_context(|| {
                format!(
                    "Failed to watch source root: {}",
                    roots.source_root.display()
                )
            })?;

        info!(source = %roots.source_root.display(), "watching");
        self.watched_source = Some(roots.source_root.clone());
        Ok(())
    }
}

/// Drops changes that must not be mirrored.
///
/// A path is mirrored when it lies under the source root, outside the shadow
/// tree, and no component below the source root is ignored. A rename with only
/// one mirrored side becomes a create or delete of that side.
#[must_use]
pub fn scope(change: ChangeEvent, roots: &RootConfig, ignore: &IgnoreSet) -> Option<ChangeEvent> {
    let mirrored = |path: &Path| {
        !roots.in_shadow_tree(path)
            && roots
                .relative(path)
                .is_some_and(|relative| !ignore.is_ignored(&relative))
    };

    match change {
        ChangeEvent::Renamed { from, to } => match (mirrored(&from), mirrored(&to)) {
            (true, true) => Some(ChangeEvent::Renamed { from, to }),
            (false, true) => Some(ChangeEvent::Created(to)),
            (true, false) => Some(ChangeEvent::Deleted(from)),
            (false, false) => None,
        },
        other => mirrored(other.path()).then_some(other),
    }
}
