use anyhow::Result;
use colored::Colorize;
use std::collections::HashSet;
use std::path::Path;

/// Tracks which configuration fields are recognized
pub struct ConfigValidator {
    /// Set of valid configuration fields that are recognized by shadowsync
    known_fields: HashSet<String>,
}

impl ConfigValidator {
    /// Create a new validator with known configuration fields
    #[must_use]
    pub fn new() -> Self {
        let known_fields = [
            "roots",
            "roots.source_root",
            "roots.shadow_root",
            "watch",
            "watch.ignore_patterns",
            "watch.rename_window",
            "performance",
            "performance.parallel_threads",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        Self { known_fields }
    }

    /// Validate a configuration file and warn about unknown fields
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub fn validate_config_file(&self, config_path: &Path) -> Result<()> {
        if !config_path.exists() {
            return Ok(());
        }

        let content = std::fs::read_to_string(config_path)?;
        let parsed: toml::Value = toml::from_str(&content)?;

        let unknown_fields = self.unknown_fields(&parsed);

        if !unknown_fields.is_empty() {
            eprintln!("{}", "Configuration warnings:".yellow().bold());
            for field in &unknown_fields {
                eprintln!("  Unknown configuration field: {}", field.yellow());
            }
            eprintln!();
        }

        Ok(())
    }

    /// Returns every field in `value` that shadowsync does not recognize
    #[must_use]
    pub fn unknown_fields(&self, value: &toml::Value) -> Vec<String> {
        let mut unknown = Vec::new();
        self.check_table(value, "", &mut unknown);
        unknown
    }

    /// Recursively checks a TOML table for unknown fields
    ///
    /// Unknown sections are reported once, without descending into them.
    fn check_table(&self, table: &toml::Value, prefix: &str, unknown: &mut Vec<String>) {
        if let toml::Value::Table(map) = table {
            for (key, value) in map {
                let full_key = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };

                if !self.known_fields.contains(&full_key) {
                    unknown.push(full_key);
                } else if let toml::Value::Table(_) = value {
                    self.check_table(value, &full_key, unknown);
                }
            }
        }
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}
