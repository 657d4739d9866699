#![allow(dead_code)]

use anyhow::Result;
use shadowsync::output::{Reporter, Severity};
use shadowsync::paths::RootConfig;
use shadowsync::session::Session;
use shadowsync::utils::thread_pool::build_pool;
use shadowsync::{DEFAULT_CONFIG_FILE, SyncContext};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Workspace fixture with the default `resources` / `temp_resources` pair.
pub struct TestWorkspace {
    pub temp_dir: TempDir,
    pub roots: RootConfig,
}

impl TestWorkspace {
    /// Creates a workspace with an empty source root and no shadow root.
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let roots = RootConfig::from_workspace(temp_dir.path());
        fs::create_dir_all(&roots.source_root)?;
        Ok(Self { temp_dir, roots })
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.path().join(DEFAULT_CONFIG_FILE)
    }

    pub fn context(&self) -> Result<SyncContext> {
        SyncContext::new_explicit(self.path().to_path_buf(), self.config_path())
    }

    /// Absolute source path for `relative`.
    pub fn source(&self, relative: &str) -> PathBuf {
        self.roots.source_root.join(relative)
    }

    /// Absolute shadow path for `relative`.
    pub fn shadow(&self, relative: &str) -> PathBuf {
        self.roots.shadow_root.join(relative)
    }

    /// Writes a source file, creating its parents.
    pub fn write_source(&self, relative: &str, contents: &str) -> Result<PathBuf> {
        write(&self.source(relative), contents)
    }

    /// Writes a shadow file, creating its parents.
    pub fn write_shadow(&self, relative: &str, contents: &str) -> Result<PathBuf> {
        write(&self.shadow(relative), contents)
    }

    /// A session on this workspace's roots that records every message.
    pub fn session(&self) -> Result<(Arc<Session>, Arc<RecordingReporter>)> {
        let reporter = Arc::new(RecordingReporter::default());
        let pool = Arc::new(build_pool(2)?);
        let session = Session::new(self.roots.clone(), reporter.clone(), pool);
        Ok((Arc::new(session), reporter))
    }
}

fn write(path: &Path, contents: &str) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    Ok(path.to_path_buf())
}

/// Reporter that keeps every message for later assertions.
#[derive(Default)]
pub struct RecordingReporter {
    messages: Mutex<Vec<(Severity, String)>>,
}

impl RecordingReporter {
    pub fn messages(&self) -> Vec<(Severity, String)> {
        self.messages.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|(severity, _)| *severity == Severity::Error)
            .map(|(_, message)| message)
            .collect()
    }
}

impl Reporter for RecordingReporter {
    fn message(&self, severity: Severity, message: &str) {
        self.messages
            .lock()
            .unwrap()
            .push((severity, message.to_string()));
    }
}

/// Polls `condition` every 20ms for up to ten seconds.
pub fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..500 {
        if condition() {
            return true;
        }
        std::thread::sleep(std::time::Duration::from_millis(20));
    }
    condition()
}
