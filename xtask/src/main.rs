//! xtask for shadowsync - build automation and tooling

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "xtask", about = "Build automation for shadowsync")]
enum Task {
    /// Generate man pages from clap definitions
    GenerateManPages {
        /// Output directory for man pages (default: ./man)
        #[arg(short, long, default_value = "man")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    match Task::parse() {
        Task::GenerateManPages { output } => generate_man_pages(&output),
    }
}

fn render(cmd: clap::Command, path: &Path) -> Result<()> {
    let file = fs::File::create(path)
        .with_context(|| format!("Failed to create man page: {}", path.display()))?;
    clap_mangen::Man::new(cmd).render(&mut std::io::BufWriter::new(file))?;
    println!("✓ Generated: {}", path.display());
    Ok(())
}

fn generate_man_pages(output_dir: &Path) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create directory: {}", output_dir.display()))?;

    let cmd = shadowsync::cli::Cli::command();
    render(cmd.clone(), &output_dir.join("shadowsync.1"))?;

    for subcmd in cmd.get_subcommands().filter(|s| s.get_name() != "completion") {
        let name = format!("shadowsync-{}", subcmd.get_name());
        render(subcmd.clone(), &output_dir.join(format!("{name}.1")))?;
    }

    println!("\nTo view: man {}/shadowsync.1", output_dir.display());
    Ok(())
}
