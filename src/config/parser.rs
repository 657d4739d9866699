use super::{Config, RootsConfig};
use crate::paths::{CaseSensitivity, relative_to_root};
use anyhow::{Context, Result};
use std::path::Path;

/// Reads and validates the config file at `path`.
///
/// # Errors
///
/// Returns an error naming `path` if it cannot be read, parsed or validated.
pub fn parse_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config_str(&content)
        .with_context(|| format!("Invalid config file: {}", path.display()))
}

fn parse_config_str(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse TOML config")?;

    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &Config) -> Result<()> {
    validate_roots(&config.roots)?;
    validate_patterns(&config.watch.ignore_patterns)?;
    config.watch.rename_window()?;

    if config.performance.parallel_threads == 0 {
        anyhow::bail!("Parallel threads must be at least 1");
    }

    Ok(())
}

/// Checks a root override: both or neither, absolute, and neither tree
/// nested inside the other.
///
/// # Errors
///
/// Returns an error describing the first rule the pair breaks.
pub fn validate_roots(roots: &RootsConfig) -> Result<()> {
    let (source, shadow) = match (&roots.source_root, &roots.shadow_root) {
        (None, None) => return Ok(()),
        (Some(source), Some(shadow)) => (source, shadow),
        _ => anyhow::bail!("Both source_root and shadow_root must be set, or neither"),
    };

    for root in [source, shadow] {
        if !root.is_absolute() {
            anyhow::bail!("Root must be an absolute path: {}", root.display());
        }
    }

    let case = CaseSensitivity::host();
    if relative_to_root(shadow, source, case).is_some() {
        anyhow::bail!(
            "Shadow root {} must not be inside source root {}",
            shadow.display(),
            source.display()
        );
    }
    if relative_to_root(source, shadow, case).is_some() {
        anyhow::bail!(
            "Source root {} must not be inside shadow root {}",
            source.display(),
            shadow.display()
        );
    }

    Ok(())
}

/// Checks that every ignore pattern is a valid glob.
///
/// # Errors
///
/// Returns an error naming the first invalid pattern.
pub fn validate_patterns(patterns: &[String]) -> Result<()> {
    for pattern in patterns {
        glob::Pattern::new(pattern)
            .with_context(|| format!("Invalid ignore pattern: {pattern}"))?;
    }
    Ok(())
}
