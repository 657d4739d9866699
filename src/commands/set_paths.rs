use crate::SyncContext;
use crate::output;
use crate::utils::absolutize;
use anyhow::{Context, Result};
use std::io::{BufRead, Write};

/// Prompt for the source folder.
pub const SOURCE_PROMPT: &str = "Enter the path to the resources folder";

/// Prompt for the shadow folder.
pub const SHADOW_PROMPT: &str = "Enter the path to the temp resources folder";

/// Execute set-paths command to replace the configured roots
///
/// Values not given on the command line are read from `input`, one line per
/// prompt. Relative answers are resolved against the workspace.
///
/// # Errors
///
/// Returns an error if:
/// - Either path is empty (the configuration is left untouched)
/// - The pair fails validation (relative paths, shadow inside source)
/// - The configuration file cannot be written
pub fn execute<R: BufRead>(
    ctx: &mut SyncContext,
    source: Option<String>,
    shadow: Option<String>,
    input: &mut R,
) -> Result<()> {
    let source = match source {
        Some(value) => value,
        None => prompt(input, SOURCE_PROMPT)?,
    };
    let shadow = match shadow {
        Some(value) => value,
        None => prompt(input, SHADOW_PROMPT)?,
    };

    if source.trim().is_empty() || shadow.trim().is_empty() {
        anyhow::bail!("Paths not updated. Both paths must be provided.");
    }

    let source_root = absolutize(&source, &ctx.workspace)?;
    let shadow_root = absolutize(&shadow, &ctx.workspace)?;

    ctx.config
        .set_roots(source_root.clone(), shadow_root)
        .context("Paths not updated")?;
    ctx.save_config()?;

    if !source_root.is_dir() {
        output::warning(&format!(
            "Source folder does not exist yet: {}",
            source_root.display()
        ));
    }
    output::success("Paths updated successfully.");
    Ok(())
}

/// Shows `message` on stderr and reads one line; end of input reads as empty.
fn prompt<R: BufRead>(input: &mut R, message: &str) -> Result<String> {
    eprint!("{message}: ");
    std::io::stderr().flush()?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("Failed to read from standard input")?;
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_CONFIG_FILE;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn context(dir: &TempDir) -> Result<SyncContext> {
        SyncContext::new_explicit(
            dir.path().to_path_buf(),
            dir.path().join(DEFAULT_CONFIG_FILE),
        )
    }

    #[test]
    fn test_prompted_paths_are_saved() -> Result<()> {
        let dir = TempDir::new()?;
        let mut ctx = context(&dir)?;
        let mut input = Cursor::new("site/src\nsite/out\n");

        execute(&mut ctx, None, None, &mut input)?;

        let reloaded = context(&dir)?;
        assert_eq!(reloaded.roots().source_root, dir.path().join("site/src"));
        assert_eq!(reloaded.roots().shadow_root, dir.path().join("site/out"));
        Ok(())
    }

    #[test]
    fn test_empty_answer_leaves_config_untouched() -> Result<()> {
        let dir = TempDir::new()?;
        let mut ctx = context(&dir)?;
        let mut input = Cursor::new("\n");

        let err = execute(&mut ctx, Some("/abs/src".to_string()), None, &mut input).unwrap_err();

        assert_eq!(
            err.to_string(),
            "Paths not updated. Both paths must be provided."
        );
        assert!(!ctx.config.has_root_override());
        assert!(!ctx.config_path.exists());
        Ok(())
    }

    #[test]
    fn test_end_of_input_counts_as_empty() -> Result<()> {
        let dir = TempDir::new()?;
        let mut ctx = context(&dir)?;
        let mut input = Cursor::new("");

        assert!(execute(&mut ctx, None, None, &mut input).is_err());
        assert!(!ctx.config_path.exists());
        Ok(())
    }

    #[test]
    fn test_shadow_inside_source_is_rejected() -> Result<()> {
        let dir = TempDir::new()?;
        let mut ctx = context(&dir)?;
        let mut input = Cursor::new("");

        let result = execute(
            &mut ctx,
            Some("res".to_string()),
            Some("res/shadow".to_string()),
            &mut input,
        );

        assert!(result.is_err());
        assert!(!ctx.config_path.exists());
        Ok(())
    }
}
