/// TOML parsing and value validation.
pub mod parser;
/// Warnings for unrecognized config keys.
pub mod validator;

use crate::paths::RootConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;

/// Contents of `.shadowsync.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    /// User-entered root override. Absent means "use the workspace defaults".
    #[serde(default, skip_serializing_if = "RootsConfig::is_empty")]
    pub roots: RootsConfig,

    /// Settings for the `watch` command.
    #[serde(default)]
    pub watch: WatchConfig,

    /// Worker pool sizing.
    #[serde(default)]
    pub performance: PerformanceConfig,
}

/// The persisted pair of root paths. Either both are set or neither is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RootsConfig {
    /// Folder being edited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_root: Option<PathBuf>,
    /// Folder kept in step with it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow_root: Option<PathBuf>,
}

/// The `[watch]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Paths matching any of these patterns never reach the mirroring engine
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,
    /// How long an unpaired rename half waits for its partner, e.g. "250ms"
    #[serde(default = "default_rename_window")]
    pub rename_window: String,
}

/// The `[performance]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceConfig {
    /// Worker threads used for mirroring.
    #[serde(default = "default_parallel_threads")]
    pub parallel_threads: usize,
}

impl RootsConfig {
    /// Returns `true` when no override is stored.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.source_root.is_none() && self.shadow_root.is_none()
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            ignore_patterns: default_ignore_patterns(),
            rename_window: default_rename_window(),
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            parallel_threads: default_parallel_threads(),
        }
    }
}

impl WatchConfig {
    /// Parsed form of `rename_window`
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a duration like "250ms" or "1s"
    pub fn rename_window(&self) -> Result<Duration> {
        humantime::parse_duration(&self.rename_window)
            .with_context(|| format!("Invalid rename window: {}", self.rename_window))
    }
}

impl Config {
    /// Load configuration from a file
    ///
    /// A missing file yields the default configuration; nothing is written.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file exists but cannot be read
    /// - The file contains invalid TOML
    /// - The values fail validation
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        parser::parse_config_file(path)
    }

    /// Save configuration to a file
    ///
    /// The new contents are written to a temporary file next to `path` and
    /// moved over it, so readers never see a partly written config.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Cannot create parent directories
    /// - Cannot write to the file
    /// - TOML serialization fails
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)?;

        let toml_str = toml::to_string_pretty(self)?;
        let mut file = NamedTempFile::new_in(parent)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        file.write_all(toml_str.as_bytes())?;
        file.persist(path)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// The roots to mirror with: the stored override, or the defaults under `workspace`.
    #[must_use]
    pub fn resolve_roots(&self, workspace: &Path) -> RootConfig {
        match (&self.roots.source_root, &self.roots.shadow_root) {
            (Some(source), Some(shadow)) => RootConfig::new(source, shadow),
            _ => RootConfig::from_workspace(workspace),
        }
    }

    /// Returns `true` if the roots come from a user override rather than the defaults.
    #[must_use]
    pub const fn has_root_override(&self) -> bool {
        self.roots.source_root.is_some() && self.roots.shadow_root.is_some()
    }

    /// Replace the stored root override
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting pair fails validation
    pub fn set_roots(&mut self, source_root: PathBuf, shadow_root: PathBuf) -> Result<()> {
        let roots = RootsConfig {
            source_root: Some(source_root),
            shadow_root: Some(shadow_root),
        };
        parser::validate_roots(&roots)?;
        self.roots = roots;
        Ok(())
    }

    /// Get a configuration value by key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();
        if parts.len() != 2 {
            return None;
        }

        match (parts[0], parts[1]) {
            ("roots", "source_root") => self
                .roots
                .source_root
                .as_ref()
                .map(|p| p.display().to_string()),
            ("roots", "shadow_root") => self
                .roots
                .shadow_root
                .as_ref()
                .map(|p| p.display().to_string()),
            ("watch", "ignore_patterns") => Some(self.watch.ignore_patterns.join(",")),
            ("watch", "rename_window") => Some(self.watch.rename_window.clone()),
            ("performance", "parallel_threads") => {
                Some(self.performance.parallel_threads.to_string())
            }
            _ => None,
        }
    }

    /// Set a configuration value by key
    ///
    /// Roots are not settable here; they change together through `set-paths`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The key format is invalid (must be section.key)
    /// - The key is unknown or read-only
    /// - The value is invalid for the key
    pub fn set(&mut self, key: &str, value: String) -> Result<()> {
        let parts: Vec<&str> = key.split('.').collect();
        if parts.len() != 2 {
            return Err(anyhow::anyhow!("Invalid configuration key: {key}"));
        }

        match (parts[0], parts[1]) {
            ("roots", _) => {
                return Err(anyhow::anyhow!(
                    "Roots are changed together: use 'shadowsync set-paths'"
                ));
            }
            ("watch", "ignore_patterns") => {
                let patterns: Vec<String> = value
                    .split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(String::from)
                    .collect();
                parser::validate_patterns(&patterns)?;
                self.watch.ignore_patterns = patterns;
            }
            ("watch", "rename_window") => {
                humantime::parse_duration(&value)
                    .with_context(|| format!("Invalid duration: {value}"))?;
                self.watch.rename_window = value;
            }
            ("performance", "parallel_threads") => {
                let threads: usize = value
                    .parse()
                    .with_context(|| format!("Invalid number: {value}"))?;
                if threads == 0 {
                    return Err(anyhow::anyhow!("Parallel threads must be at least 1"));
                }
                self.performance.parallel_threads = threads;
            }
            _ => return Err(anyhow::anyhow!("Unknown configuration key: {key}")),
        }
        Ok(())
    }

    /// Unset a configuration value by key
    ///
    /// `roots` drops the override so the workspace defaults apply again.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or cannot be unset
    pub fn unset(&mut self, key: &str) -> Result<()> {
        match key {
            "roots" | "roots.source_root" | "roots.shadow_root" => {
                self.roots = RootsConfig::default();
            }
            "watch.ignore_patterns" => self.watch.ignore_patterns = default_ignore_patterns(),
            "watch.rename_window" => self.watch.rename_window = default_rename_window(),
            "performance.parallel_threads" => {
                self.performance.parallel_threads = default_parallel_threads();
            }
            _ => return Err(anyhow::anyhow!("Cannot unset configuration key: {key}")),
        }
        Ok(())
    }
}

static NUM_CPUS: std::sync::LazyLock<usize> = std::sync::LazyLock::new(|| {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1)
});

// Default functions for serde
fn default_ignore_patterns() -> Vec<String> {
    vec![
        ".git".to_string(),
        "*.swp".to_string(),
        "*.tmp".to_string(),
        "*~".to_string(),
        "4913".to_string(), // vim's write-permission probe
    ]
}

fn default_rename_window() -> String {
    "250ms".to_string()
}

fn default_parallel_threads() -> usize {
    (*NUM_CPUS).min(8)
}
