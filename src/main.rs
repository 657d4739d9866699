use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::{Generator, generate};
use colored::Colorize;
use shadowsync::cli::{Cli, Commands};
use shadowsync::output::{self, Verbosity};
use shadowsync::{SyncContext, commands};
use std::io;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);
    output::set_verbosity(if cli.quiet {
        Verbosity::Quiet
    } else if cli.verbose {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    });

    if let Commands::Completion { shell } = cli.command {
        print_completions(shell, &mut Cli::command());
        return Ok(());
    }

    let mut ctx = SyncContext::new(cli.workspace)?;

    match cli.command {
        Commands::Watch => commands::watch::execute(&ctx)?,
        Commands::Apply { change } => commands::apply::execute(&ctx, change)?,
        Commands::SetPaths { source, shadow } => {
            let stdin = io::stdin();
            commands::set_paths::execute(&mut ctx, source, shadow, &mut stdin.lock())?;
        }
        Commands::Config {
            key,
            value,
            unset,
            list,
        } => commands::config::execute(&mut ctx, key.as_deref(), value, unset, list)?,
        Commands::Resync => commands::resync::execute(&ctx)?,
        Commands::Completion { .. } => {}
    }

    Ok(())
}

/// Diagnostics go to stderr, filtered by `SHADOWSYNC_LOG` when set.
fn init_logging(verbose: bool) {
    let fallback = if verbose { "shadowsync=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("SHADOWSYNC_LOG")
        .unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn print_completions<G: Generator>(g: G, cmd: &mut clap::Command) {
    generate(g, cmd, cmd.get_name().to_string(), &mut io::stdout());
}
