//! Observable per-domain sync progress.
//!
//! The engine is the only writer; observers subscribe to a domain's
//! `watch` channel (UI progress indicators) or take one-off snapshots.
//! Counters are ephemeral: reset to `(0, 0)` at the end of every pass
//! regardless of outcome, and never persisted.

use tokio::sync::watch;

use crate::domain::Domain;
use crate::metrics;

/// A point-in-time `(synced, total)` pair for one domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    /// Items upserted so far in the current pass.
    pub synced: usize,
    /// Total items the current pass expects to cover.
    pub total: usize,
}

impl Progress {
    /// Completion in `[0.0, 1.0]`; `0.0` when no pass is running.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.synced as f64 / self.total as f64).min(1.0)
        }
    }

    /// True outside a pass (both counters zero).
    pub fn is_idle(&self) -> bool {
        self.synced == 0 && self.total == 0
    }
}

/// Per-domain progress counters, written only by the engine.
#[derive(Debug)]
pub struct ProgressTracker {
    channels: [watch::Sender<Progress>; 6],
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    /// Create a tracker with all domains idle.
    pub fn new() -> Self {
        Self {
            channels: std::array::from_fn(|_| watch::channel(Progress::default()).0),
        }
    }

    /// Subscribe to a domain's progress updates.
    pub fn subscribe(&self, domain: Domain) -> watch::Receiver<Progress> {
        self.channels[domain.index()].subscribe()
    }

    /// Current progress for a domain.
    pub fn snapshot(&self, domain: Domain) -> Progress {
        *self.channels[domain.index()].borrow()
    }

    /// Begin a pass: set the expected total, zero the synced count.
    pub(crate) fn begin(&self, domain: Domain, total: usize) {
        self.send(domain, Progress { synced: 0, total });
    }

    /// Advance the synced count as a page completes.
    pub(crate) fn add_synced(&self, domain: Domain, count: usize) {
        let current = self.snapshot(domain);
        self.send(
            domain,
            Progress {
                synced: current.synced + count,
                total: current.total,
            },
        );
    }

    /// Reset to idle at pass end (success, skip, or abort).
    pub(crate) fn reset(&self, domain: Domain) {
        self.send(domain, Progress::default());
    }

    fn send(&self, domain: Domain, progress: Progress) {
        metrics::set_progress(domain, progress.synced, progress.total);
        // send_replace never fails even with no subscribers
        self.channels[domain.index()].send_replace(progress);
    }
}
