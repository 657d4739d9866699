//! Conversion of raw `notify` events into [`ChangeEvent`]s.
//!
//! Backends report renames differently. inotify sends a `From` half, a `To`
//! half and then a combined `Both` event, all sharing a tracker cookie.
//! Windows sends the two halves. FSEvents and kqueue only say "something was
//! renamed here". [`EventTranslator`] pairs halves by cookie; a half whose
//! partner never shows up within the rename window means the object left
//! (or entered) the watched tree, and becomes a delete (or create).

use crate::event::ChangeEvent;
use notify::event::{EventKind, ModifyKind, RenameMode};
use notify::Event;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Half {
    From,
    To,
}

#[derive(Debug)]
struct Pending {
    half: Half,
    path: PathBuf,
    deadline: Instant,
}

/// Stateful converter from backend events to change events.
#[derive(Debug)]
pub struct EventTranslator {
    window: Duration,
    /// Unpaired rename halves keyed by tracker cookie (`None` for untracked backends)
    pending: HashMap<Option<usize>, Pending>,
    /// Cookies already turned into a rename from their halves; the trailing
    /// `Both` for them is dropped
    completed: HashMap<usize, Instant>,
}

impl EventTranslator {
    /// Creates a translator that waits up to `window` for rename halves to pair.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: HashMap::new(),
            completed: HashMap::new(),
        }
    }

    /// Changes the rename window for halves received from now on.
    pub fn set_window(&mut self, window: Duration) {
        self.window = window;
    }

    /// Converts one backend event, received at `now`.
    pub fn push(&mut self, event: Event, now: Instant) -> Vec<ChangeEvent> {
        if event.need_rescan() {
            warn!("filesystem events were dropped; run 'shadowsync resync' to catch up");
        }

        let tracker = event.tracker();
        let mut paths = event.paths;
        if paths.is_empty() {
            return Vec::new();
        }

        match event.kind {
            EventKind::Create(_) => paths.into_iter().map(ChangeEvent::Created).collect(),
            EventKind::Remove(_) => paths.into_iter().map(ChangeEvent::Deleted).collect(),
            EventKind::Modify(ModifyKind::Name(mode)) => match mode {
                RenameMode::Both if paths.len() >= 2 => {
                    let to = paths.swap_remove(1);
                    let from = paths.swap_remove(0);
                    self.both(tracker, from, to)
                }
                RenameMode::From => self.half(tracker, Half::From, paths.swap_remove(0), now),
                RenameMode::To => self.half(tracker, Half::To, paths.swap_remove(0), now),
                _ => paths
                    .into_iter()
                    .map(|path| {
                        if path.exists() {
                            ChangeEvent::Created(path)
                        } else {
                            ChangeEvent::Deleted(path)
                        }
                    })
                    .collect(),
            },
            EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
            EventKind::Modify(_) => paths.into_iter().map(ChangeEvent::Saved).collect(),
            kind => {
                trace!(?kind, "ignoring notification");
                Vec::new()
            }
        }
    }

    fn both(&mut self, tracker: Option<usize>, from: PathBuf, to: PathBuf) -> Vec<ChangeEvent> {
        if let Some(cookie) = tracker
            && self.completed.remove(&cookie).is_some()
        {
            return Vec::new();
        }
        self.pending.remove(&tracker);
        vec![ChangeEvent::Renamed { from, to }]
    }

    fn half(
        &mut self,
        tracker: Option<usize>,
        half: Half,
        path: PathBuf,
        now: Instant,
    ) -> Vec<ChangeEvent> {
        match self.pending.remove(&tracker) {
            Some(partner) if partner.half != half => {
                if let Some(cookie) = tracker {
                    self.completed.insert(cookie, now + self.window);
                }
                let (from, to) = match half {
                    Half::To => (partner.path, path),
                    Half::From => (path, partner.path),
                };
                vec![ChangeEvent::Renamed { from, to }]
            }
            stale => {
                let events: Vec<ChangeEvent> = stale.map(resolve).into_iter().collect();
                self.pending.insert(
                    tracker,
                    Pending {
                        half,
                        path,
                        deadline: now + self.window,
                    },
                );
                events
            }
        }
    }

    /// Resolves rename halves whose window closed before `now`.
    pub fn expire(&mut self, now: Instant) -> Vec<ChangeEvent> {
        self.completed.retain(|_, deadline| *deadline > now);

        let expired: Vec<Option<usize>> = self
            .pending
            .iter()
            .filter(|(_, pending)| pending.deadline <= now)
            .map(|(key, _)| *key)
            .collect();

        expired
            .into_iter()
            .filter_map(|key| self.pending.remove(&key))
            .map(resolve)
            .collect()
    }

    /// The earliest moment [`EventTranslator::expire`] has work to do.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|pending| pending.deadline).min()
    }
}

/// An unpaired `From` left the tree; an unpaired `To` arrived in it.
fn resolve(pending: Pending) -> ChangeEvent {
    match pending.half {
        Half::From => ChangeEvent::Deleted(pending.path),
        Half::To => ChangeEvent::Created(pending.path),
    }
}
