//! The running mirroring session.
//!
//! A [`Session`] owns the active [`RootConfig`] and hands it, read-only, to
//! every operation. Changing roots replaces the whole value; operations
//! already running keep the roots they started with.
//!
//! Submitted events run on a worker pool. Events about the same path form a
//! lane and run one after another in submission order; different lanes run
//! in parallel.

use crate::event::ChangeEvent;
use crate::mirror::{self, MirrorResult};
use crate::output::Reporter;
use crate::paths::RootConfig;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{debug, trace};

/// Active roots plus the means to run and report operations.
pub struct Session {
    roots: RwLock<Arc<RootConfig>>,
    reporter: Arc<dyn Reporter>,
    pool: Arc<rayon::ThreadPool>,
    /// Events waiting behind a running event for the same path
    lanes: Mutex<HashMap<PathBuf, VecDeque<ChangeEvent>>>,
}

impl Session {
    /// Creates a session that runs submitted operations on `pool`.
    #[must_use]
    pub fn new(
        roots: RootConfig,
        reporter: Arc<dyn Reporter>,
        pool: Arc<rayon::ThreadPool>,
    ) -> Self {
        Self {
            roots: RwLock::new(Arc::new(roots)),
            reporter,
            pool,
            lanes: Mutex::new(HashMap::new()),
        }
    }

    /// The roots currently in effect.
    #[must_use]
    pub fn roots(&self) -> Arc<RootConfig> {
        Arc::clone(&self.roots.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replaces the roots used by every operation started from now on.
    pub fn replace_roots(&self, roots: RootConfig) {
        debug!(
            source = %roots.source_root.display(),
            shadow = %roots.shadow_root.display(),
            "replacing roots"
        );
        *self.roots.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(roots);
    }

    /// Mirrors one event on the calling thread and reports the result.
    ///
    /// Returns `None`, and reports nothing, when the event is out of scope.
    pub fn handle(&self, event: &ChangeEvent) -> Option<MirrorResult> {
        let roots = self.roots();
        let result = mirror::dispatch(event, &roots)?;
        self.reporter.report(&result);
        Some(result)
    }

    /// Queues one event on the worker pool and returns immediately.
    ///
    /// The event runs after every earlier submitted event about the same
    /// path (the destination, for renames).
    pub fn submit(self: &Arc<Self>, event: ChangeEvent) {
        let key = event.path().to_path_buf();
        {
            let mut lanes = self.lanes.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(queue) = lanes.get_mut(&key) {
                trace!(event = %event, "queued behind running event");
                queue.push_back(event);
                return;
            }
            lanes.insert(key.clone(), VecDeque::new());
        }

        let session = Arc::clone(self);
        self.pool.spawn(move || session.drain(&key, event));
    }

    fn drain(&self, key: &Path, first: ChangeEvent) {
        let mut next = Some(first);
        while let Some(event) = next {
            self.handle(&event);

            let mut lanes = self.lanes.lock().unwrap_or_else(PoisonError::into_inner);
            next = lanes.get_mut(key).and_then(VecDeque::pop_front);
            if next.is_none() {
                lanes.remove(key);
            }
        }
    }

    /// Returns `true` when no submitted event is queued or running.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.lanes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Severity;
    use crate::utils::thread_pool::build_pool;
    use anyhow::Result;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recorder {
        messages: Mutex<Vec<(Severity, String)>>,
    }

    impl Reporter for Recorder {
        fn message(&self, severity: Severity, message: &str) {
            self.messages
                .lock()
                .unwrap()
                .push((severity, message.to_string()));
        }
    }

    fn session(roots: RootConfig) -> Result<(Arc<Session>, Arc<Recorder>)> {
        let recorder = Arc::new(Recorder::default());
        let pool = Arc::new(build_pool(2)?);
        let session = Session::new(roots, recorder.clone(), pool);
        Ok((Arc::new(session), recorder))
    }

    #[test]
    fn test_out_of_scope_events_report_nothing() -> Result<()> {
        let (session, recorder) = session(RootConfig::new("/ws/resources", "/ws/temp"))?;
        let result = session.handle(&ChangeEvent::Saved(PathBuf::from("/etc/hosts")));
        assert!(result.is_none());
        assert!(recorder.messages.lock().unwrap().is_empty());
        Ok(())
    }

    #[test]
    fn test_unset_roots_ignore_everything() -> Result<()> {
        let (session, recorder) = session(RootConfig::default())?;
        assert!(
            session
                .handle(&ChangeEvent::Deleted(PathBuf::from("/ws/resources/a")))
                .is_none()
        );
        assert!(recorder.messages.lock().unwrap().is_empty());
        Ok(())
    }

    #[test]
    fn test_handle_reports_errors_as_errors() -> Result<()> {
        let dir = TempDir::new()?;
        let roots = RootConfig::from_workspace(dir.path());
        let (session, recorder) = session(roots.clone())?;

        let missing = roots.source_root.join("vanished.txt");
        let result = session.handle(&ChangeEvent::Saved(missing)).unwrap();

        assert!(result.is_error());
        let messages = recorder.messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, Severity::Error);
        Ok(())
    }

    #[test]
    fn test_replace_roots_applies_to_next_event() -> Result<()> {
        let dir = TempDir::new()?;
        let first = RootConfig::new(dir.path().join("one"), dir.path().join("one_shadow"));
        let second = RootConfig::new(dir.path().join("two"), dir.path().join("two_shadow"));
        fs::create_dir_all(&second.source_root)?;
        fs::write(second.source_root.join("f.txt"), "f")?;

        let (session, _recorder) = session(first)?;
        let event = ChangeEvent::Saved(second.source_root.join("f.txt"));
        assert!(session.handle(&event).is_none());

        session.replace_roots(second.clone());
        assert_eq!(*session.roots(), second);
        assert!(session.handle(&event).unwrap().is_success());
        assert!(second.shadow_root.join("f.txt").exists());
        Ok(())
    }

    #[test]
    fn test_submit_runs_on_pool() -> Result<()> {
        let dir = TempDir::new()?;
        let roots = RootConfig::from_workspace(dir.path());
        fs::create_dir_all(&roots.source_root)?;
        fs::write(roots.source_root.join("a.txt"), "a")?;
        let (session, recorder) = session(roots.clone())?;

        session.submit(ChangeEvent::Created(roots.source_root.join("a.txt")));

        for _ in 0..250 {
            if !recorder.messages.lock().unwrap().is_empty() {
                break;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        assert_eq!(recorder.messages.lock().unwrap().len(), 1);
        assert_eq!(fs::read_to_string(roots.shadow_root.join("a.txt"))?, "a");
        Ok(())
    }

    #[test]
    fn test_submit_keeps_same_path_in_order() -> Result<()> {
        let dir = TempDir::new()?;
        let roots = RootConfig::from_workspace(dir.path());
        fs::create_dir_all(&roots.source_root)?;
        let page = roots.source_root.join("index.html");
        fs::write(&page, "saved")?;
        let (session, recorder) = session(roots.clone())?;

        // An editor replacing the file: delete then create, many times over
        for _ in 0..25 {
            session.submit(ChangeEvent::Deleted(page.clone()));
            session.submit(ChangeEvent::Created(page.clone()));
        }

        for _ in 0..500 {
            if session.is_idle() {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(session.is_idle());

        let messages = recorder.messages.lock().unwrap();
        assert_eq!(messages.len(), 50);
        assert!(messages.last().unwrap().1.starts_with("File copied"));
        assert_eq!(fs::read_to_string(roots.shadow_root.join("index.html"))?, "saved");
        Ok(())
    }

    #[test]
    fn test_different_paths_use_separate_lanes() -> Result<()> {
        let dir = TempDir::new()?;
        let roots = RootConfig::from_workspace(dir.path());
        fs::create_dir_all(&roots.source_root)?;
        for name in ["a.txt", "b.txt", "c.txt"] {
            fs::write(roots.source_root.join(name), name)?;
        }
        let (session, _recorder) = session(roots.clone())?;

        for name in ["a.txt", "b.txt", "c.txt"] {
            session.submit(ChangeEvent::Saved(roots.source_root.join(name)));
        }
        for _ in 0..500 {
            if session.is_idle() {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }

        for name in ["a.txt", "b.txt", "c.txt"] {
            assert_eq!(fs::read_to_string(roots.shadow_root.join(name))?, name);
        }
        Ok(())
    }
}
