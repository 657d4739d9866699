//! Command-line interface definitions for shadowsync.
//!
//! The definitions are shared between the main binary and the xtask man page
//! generator.
//!
//! Field-level documentation comes from clap attributes, so missing docs are
//! allowed here.

#![allow(missing_docs)]

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Main CLI structure for shadowsync.
#[derive(Parser)]
#[command(
    name = "shadowsync",
    version = crate::VERSION,
    about = "Mirror a resources folder into a shadow copy as it changes",
    long_about = "Watches a source folder and keeps a shadow folder in step with it: \
                  saves and creations are copied, deletions removed and renames replayed."
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace folder holding the config file and the default roots
    #[arg(short, long, global = true, env = "SHADOWSYNC_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress informational messages
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// All available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Watch the source root and mirror every change until interrupted
    Watch,

    /// Mirror a single change without watching
    Apply {
        #[command(subcommand)]
        change: ApplyChange,
    },

    /// Set the source and shadow roots, prompting for any that are missing
    SetPaths {
        /// Source folder to mirror
        #[arg(long)]
        source: Option<String>,

        /// Shadow folder that receives the copies
        #[arg(long)]
        shadow: Option<String>,
    },

    /// Get and set configuration values
    Config {
        /// Configuration key (e.g. watch.rename_window)
        key: Option<String>,

        /// Value to set
        value: Option<String>,

        /// Restore the key to its default
        #[arg(long)]
        unset: bool,

        /// Show all configuration values
        #[arg(short, long)]
        list: bool,
    },

    /// Copy the whole source tree into the shadow tree
    Resync,

    /// Generate shell completions
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// A change to replay through the mirroring engine.
#[derive(Subcommand, Debug, Clone)]
pub enum ApplyChange {
    /// Files were saved
    Saved {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Files or directories were created
    Created {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Files or directories were deleted
    Deleted {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// A file or directory was renamed
    Renamed { from: PathBuf, to: PathBuf },
}
