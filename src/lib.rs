#![warn(missing_docs)]

//! # Shadowsync - Live Shadow Copies of a Resources Folder
//!
//! Shadowsync keeps a second folder (the *shadow tree*) in step with a source
//! folder while it is being edited. Every save, creation, deletion and rename
//! under the source root is replayed at the same relative location under the
//! shadow root.
//!
//! ## Architecture
//!
//! - [`paths`]: Root configuration and source-to-shadow path translation
//! - [`event`]: The change notifications the engine consumes
//! - [`mirror`]: The mirroring engine (copy, delete, rename)
//! - [`session`]: Active roots plus the worker pool operations run on
//! - [`watcher`]: Filesystem watching and rename pairing
//! - [`config`]: Configuration parsing and validation
//! - [`commands`]: Command implementations
//! - [`output`]: Console output and outcome reporting
//! - [`utils`]: Path input handling, ignore patterns and the worker pool
//!
//! ## Example Usage
//!
//! ```no_run
//! use shadowsync::SyncContext;
//! use shadowsync::event::ChangeEvent;
//! use shadowsync::mirror;
//!
//! # fn main() -> anyhow::Result<()> {
//! let ctx = SyncContext::new(Some("/home/me/site".into()))?;
//! let roots = ctx.roots();
//!
//! let event = ChangeEvent::Saved(roots.source_root.join("index.html"));
//! if let Some(result) = mirror::dispatch(&event, &roots) {
//!     println!("{}", result.message());
//! }
//! # Ok(())
//! # }
//! ```

/// Command-line interface definitions (argument parsing structures).
pub mod cli;

/// Commands module containing all CLI command implementations.
pub mod commands;

/// Configuration parsing, validation, and management.
pub mod config;

/// Change notifications.
pub mod event;

/// The mirroring engine.
pub mod mirror;

/// Output formatting and outcome reporting.
pub mod output;

/// Root configuration and path translation.
pub mod paths;

/// The running mirroring session.
pub mod session;

/// Utility functions and helpers.
pub mod utils;

/// Filesystem watching.
pub mod watcher;

use anyhow::{Context, Result};
use paths::RootConfig;
use std::path::PathBuf;

/// Current version of the shadowsync binary.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the per-workspace configuration file.
pub const DEFAULT_CONFIG_FILE: &str = ".shadowsync.toml";

/// Everything a command needs: where the workspace is, where its config lives
/// and what that config says.
///
/// # Examples
///
/// ```no_run
/// use shadowsync::SyncContext;
///
/// # fn main() -> anyhow::Result<()> {
/// // Workspace from the argument, the environment, or the current directory
/// let ctx = SyncContext::new(None)?;
///
/// // Fully explicit, for tests
/// let ctx = SyncContext::new_explicit(
///     "/tmp/site".into(),
///     "/tmp/site/.shadowsync.toml".into(),
/// )?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SyncContext {
    /// Workspace folder; default roots are resolved against it.
    pub workspace: PathBuf,

    /// Path to the configuration file.
    pub config_path: PathBuf,

    /// Loaded configuration settings.
    pub config: config::Config,
}

impl SyncContext {
    /// Creates a context for `workspace`, or the current directory if `None`.
    ///
    /// `SHADOWSYNC_CONFIG_PATH` overrides the config file location. Unknown
    /// config keys are reported as warnings.
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be determined or the
    /// configuration file exists but cannot be read or parsed.
    pub fn new(workspace: Option<PathBuf>) -> Result<Self> {
        let workspace = match workspace {
            Some(path) if path.is_absolute() => path,
            Some(path) => std::env::current_dir()
                .context("Could not determine current directory")?
                .join(path),
            None => std::env::current_dir().context("Could not determine current directory")?,
        };

        let config_path = std::env::var_os("SHADOWSYNC_CONFIG_PATH")
            .map_or_else(|| workspace.join(DEFAULT_CONFIG_FILE), PathBuf::from);

        if config_path.exists() {
            let validator = config::validator::ConfigValidator::new();
            if let Err(e) = validator.validate_config_file(&config_path) {
                output::warning(&format!("Configuration validation failed: {e}"));
            }
        }

        let ctx = Self::new_explicit(workspace, config_path)?;

        if let Err(e) = utils::thread_pool::configure_from_config(&ctx.config) {
            output::warning(&format!("Failed to configure thread pool: {e}"));
        }

        Ok(ctx)
    }

    /// Creates a context with explicit paths and no environment lookups.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or parsed.
    pub fn new_explicit(workspace: PathBuf, config_path: PathBuf) -> Result<Self> {
        let config = config::Config::load(&config_path)?;
        Ok(Self {
            workspace,
            config_path,
            config,
        })
    }

    /// The roots currently configured for this workspace.
    #[must_use]
    pub fn roots(&self) -> RootConfig {
        self.config.resolve_roots(&self.workspace)
    }

    /// Writes the configuration back to its file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_config(&self) -> Result<()> {
        self.config.save(&self.config_path)
    }
}
