//! Output formatting and outcome reporting for the shadowsync CLI.
//!
//! - Green for changes made to the shadow tree
//! - Dimmed for routine messages (skips, informational notes)
//! - Bold red for failures, which are always shown
//! - Verbosity control (quiet, normal, verbose)
//!
//! The mirroring engine never prints. Its results reach the terminal through a
//! [`Reporter`], which keeps the engine testable without a console.

mod progress;

use crate::mirror::{MirrorOutcome, MirrorResult};
use colored::Colorize;
use std::sync::atomic::{AtomicU8, Ordering};

pub use progress::Progress;

/// Verbosity level for output messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Suppress informational messages, show only warnings and errors.
    Quiet = 0,
    /// Default verbosity level, show all standard messages.
    Normal = 1,
    /// Show verbose debug messages in addition to standard output.
    Verbose = 2,
}

/// Global verbosity setting (default: Normal).
static VERBOSITY: AtomicU8 = AtomicU8::new(1);

/// Sets the global verbosity level for all output functions.
pub fn set_verbosity(level: Verbosity) {
    VERBOSITY.store(level as u8, Ordering::Relaxed);
}

/// Gets the current global verbosity level.
pub fn get_verbosity() -> Verbosity {
    match VERBOSITY.load(Ordering::Relaxed) {
        0 => Verbosity::Quiet,
        2 => Verbosity::Verbose,
        _ => Verbosity::Normal,
    }
}

/// Prints a success message in green (respects quiet mode).
pub fn success(message: &str) {
    if get_verbosity() == Verbosity::Quiet {
        return;
    }
    eprintln!("{}", message.green());
}

/// Prints an error message in bold red (always shown).
pub fn error(message: &str) {
    eprintln!("{}", message.red().bold());
}

/// Prints a warning message in bold yellow (always shown).
pub fn warning(message: &str) {
    eprintln!("{}", message.yellow().bold());
}

/// Prints an informational message in dimmed color (respects quiet mode).
pub fn info(message: &str) {
    if get_verbosity() == Verbosity::Quiet {
        return;
    }
    eprintln!("{}", message.dimmed());
}

/// Classification of a reported message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Success or skip.
    Info,
    /// Failure.
    Error,
}

impl Severity {
    /// Severity of a mirroring result.
    #[must_use]
    pub const fn of(result: &MirrorResult) -> Self {
        if result.is_error() {
            Self::Error
        } else {
            Self::Info
        }
    }
}

/// Receives one human-readable message per mirroring operation.
///
/// Implementations decide how messages are shown; they are called from worker
/// threads, so they must be shareable.
pub trait Reporter: Send + Sync {
    /// Handles one message.
    fn message(&self, severity: Severity, message: &str);

    /// Reports a mirroring result.
    fn report(&self, result: &MirrorResult) {
        self.message(Severity::of(result), &result.message());
    }
}

/// Prints outcomes to stderr using the global verbosity.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn message(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Info => info(message),
            Severity::Error => error(message),
        }
    }

    fn report(&self, result: &MirrorResult) {
        let message = result.message();
        match result.outcome {
            MirrorOutcome::Success(_) => success(&message),
            MirrorOutcome::Skipped(_) => info(&message),
            MirrorOutcome::Failed(_) => error(&message),
        }
    }
}
