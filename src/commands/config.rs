use crate::SyncContext;
use crate::output;
use anyhow::Result;
use colored::Colorize;

/// Execute config command to get/set configuration values
///
/// # Errors
///
/// Returns an error if:
/// - Failed to set or unset configuration value
/// - Failed to save configuration
pub fn execute(
    ctx: &mut SyncContext,
    key: Option<&str>,
    value: Option<String>,
    unset: bool,
    list: bool,
) -> Result<()> {
    let Some(key) = key.filter(|_| !list) else {
        show_all_config(ctx);
        return Ok(());
    };

    if unset {
        ctx.config.unset(key)?;
        ctx.save_config()?;
        output::success(&format!("Unset {key}"));
    } else if let Some(val) = value {
        ctx.config.set(key, val.clone())?;
        ctx.save_config()?;
        output::success(&format!("Set {key} = {val}"));
    } else if let Some(val) = ctx.config.get(key) {
        println!("{val}");
    } else {
        output::warning(&format!("Configuration key '{key}' is not set"));
    }

    Ok(())
}

/// Show the effective configuration, including defaulted roots
fn show_all_config(ctx: &SyncContext) {
    let roots = ctx.roots();
    let origin = if ctx.config.has_root_override() {
        ""
    } else {
        " (default)"
    };

    println!("{} {}", "config file:".dimmed(), ctx.config_path.display());

    println!("\n{}", "[roots]".bold());
    println!("  source_root = {}{origin}", roots.source_root.display());
    println!("  shadow_root = {}{origin}", roots.shadow_root.display());

    println!("\n{}", "[watch]".bold());
    println!(
        "  ignore_patterns = {}",
        ctx.config.watch.ignore_patterns.join(", ")
    );
    println!("  rename_window = {}", ctx.config.watch.rename_window);

    println!("\n{}", "[performance]".bold());
    println!(
        "  parallel_threads = {}",
        ctx.config.performance.parallel_threads
    );
}
