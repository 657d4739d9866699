//! Inline progress for whole-tree mirroring.

use crate::mirror::MirrorResult;
use colored::Colorize;
use std::io::{self, IsTerminal, Write};

/// Progress of a batch of mirroring operations, redrawn in place on a TTY.
///
/// Renders as "Mirroring: 40% (4/10)" and finishes with a per-outcome tally.
pub struct Progress {
    /// Title displayed before the counters
    title: String,
    /// Total number of operations expected
    total: usize,
    /// Operations recorded so far
    current: usize,
    succeeded: usize,
    skipped: usize,
    failed: usize,
    /// Whether stderr is a TTY (enables inline updating)
    is_tty: bool,
    /// Last displayed percentage, to avoid redundant redraws
    last_percent: u8,
}

impl Progress {
    /// Creates a progress display for `total` operations.
    #[must_use]
    pub fn new(title: &str, total: usize) -> Self {
        Self {
            title: title.to_string(),
            total,
            current: 0,
            succeeded: 0,
            skipped: 0,
            failed: 0,
            is_tty: io::stderr().is_terminal(),
            last_percent: 0,
        }
    }

    /// Counts one finished operation and redraws if the percentage moved.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn record(&mut self, result: Option<&MirrorResult>) {
        self.current = (self.current + 1).min(self.total);
        match result {
            Some(r) if r.is_error() => self.failed += 1,
            Some(r) if r.is_success() => self.succeeded += 1,
            _ => self.skipped += 1,
        }

        let percent = if self.total > 0 {
            ((self.current as f64 / self.total as f64) * 100.0) as u8
        } else {
            0
        };

        if percent != self.last_percent {
            self.last_percent = percent;
            if self.is_tty {
                eprint!(
                    "\r{}: {}% ({}/{})",
                    self.title.dimmed(),
                    percent.to_string().dimmed(),
                    self.current,
                    self.total
                );
                let _ = io::stderr().flush();
            }
        }
    }

    /// Number of failed operations recorded.
    #[must_use]
    pub const fn failed(&self) -> usize {
        self.failed
    }

    /// One-line tally of everything recorded.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} mirrored, {} skipped, {} failed",
            self.succeeded, self.skipped, self.failed
        )
    }

    /// Ends the inline display.
    pub fn finish(&self) {
        if self.is_tty && self.total > 0 {
            eprintln!(
                "\r{}: 100% ({}/{}), done.",
                self.title.dimmed(),
                self.current,
                self.total
            );
        }
    }
}
