// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! The reconciliation engine.
//!
//! One [`sync()`](SyncEngine::sync) call runs one pass for one domain:
//!
//! 1. Probe page 0 (mandatory; failure aborts before any mutation)
//! 2. Fast-path skip when the `(total, first identity)` fingerprint matches
//! 3. Delta against the local count decides the page range: incremental
//!    (`ceil(delta / C)` pages) when the remote grew, full listing when it
//!    shrank or diverged at equal counts
//! 4. Concurrent page fetch tasks, one per page, bounded by a bulkhead;
//!    each page's items route through the domain adapter into one bulk
//!    upsert as the page completes
//! 5. Prune records absent from the fetched identity set, only when the
//!    pass covered the complete listing and no page failed
//! 6. One terminal `save()`
//!
//! # Failure Policy
//!
//! An unauthorized response aborts the pass immediately; remaining page
//! tasks are cancelled and nothing beyond already-applied upserts is
//! mutated. A failed non-mandatory page degrades the pass instead: its
//! items are simply absent, pruning is suppressed so transiently
//! unreachable items are never deleted, and the fingerprint is left
//! un-updated so the next trigger reconciles again.
//!
//! # Mutual Exclusion
//!
//! The engine owns one running flag per domain. Overlapping triggers
//! (pull-to-refresh during a background pass) observe the flag and return
//! [`SyncOutcome::Skipped`]; call sites carry no correctness duties.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::adapter::{adapter_for, DomainAdapter};
use crate::config::MirrorConfig;
use crate::domain::Domain;
use crate::envelope::RemoteEnvelope;
use crate::error::{MirrorError, Result};
use crate::fingerprint::{FingerprintCache, SyncFingerprint};
use crate::metrics;
use crate::progress::ProgressTracker;
use crate::remote::{RemotePage, RemoteSource};
use crate::resilience::Bulkhead;
use crate::store::LocalStore;

/// Outcome of one sync pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The pass ran and the store now mirrors the fetched snapshot
    /// (possibly degraded if pages failed).
    Converged,
    /// Nothing to do: fingerprint matched, content already present, or a
    /// pass for this domain was already in flight.
    Skipped,
    /// Cancellation observed between phases; the store is consistent
    /// through the last completed page, nothing was pruned.
    Aborted,
}

impl std::fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncOutcome::Converged => write!(f, "converged"),
            SyncOutcome::Skipped => write!(f, "skipped"),
            SyncOutcome::Aborted => write!(f, "aborted"),
        }
    }
}

/// Accounting for one pass, logged at completion.
#[derive(Debug, Default)]
struct PassStats {
    pages_fetched: usize,
    pages_failed: usize,
    upserted: usize,
    skipped_items: usize,
    pruned: usize,
}

/// Clears the per-domain running flag when the pass ends, however it ends.
struct RunningGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Number of pages needed to cover `items` at chunk size `chunk`.
pub fn pages_for(items: usize, chunk: usize) -> usize {
    items.div_ceil(chunk.max(1))
}

/// The sync engine: one reconciliation pass per domain on demand.
pub struct SyncEngine<R: RemoteSource, S: LocalStore> {
    config: MirrorConfig,
    remote: Arc<R>,
    store: Arc<S>,
    progress: Arc<ProgressTracker>,
    fingerprints: FingerprintCache,
    running: [AtomicBool; 6],
    /// Set when a degraded pass left a possible hole; forces the next
    /// pass for that domain to cover the complete listing.
    needs_full: [AtomicBool; 6],
    pages: Arc<Bulkhead>,
    cancelled: AtomicBool,
}

impl<R: RemoteSource, S: LocalStore> SyncEngine<R, S> {
    /// Create an engine over a remote source and a local store.
    pub fn new(config: MirrorConfig, remote: Arc<R>, store: Arc<S>) -> Self {
        let max_pages = config.settings.sync.max_concurrent_pages.max(1);
        Self {
            config,
            remote,
            store,
            progress: Arc::new(ProgressTracker::new()),
            fingerprints: FingerprintCache::new(),
            running: std::array::from_fn(|_| AtomicBool::new(false)),
            needs_full: std::array::from_fn(|_| AtomicBool::new(false)),
            pages: Arc::new(Bulkhead::new(max_pages)),
            cancelled: AtomicBool::new(false),
        }
    }

    /// The progress surface observers subscribe to.
    pub fn progress(&self) -> &Arc<ProgressTracker> {
        &self.progress
    }

    /// The local store this engine writes to.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Whether a pass for this domain is currently in flight.
    pub fn is_running(&self, domain: Domain) -> bool {
        self.running[domain.index()].load(Ordering::SeqCst)
    }

    /// Signal cooperative cancellation.
    ///
    /// In-flight passes observe this between phases: after the page join,
    /// before pruning, and before the terminal save. A cancelled pass
    /// returns [`SyncOutcome::Aborted`] and never performs a partial delete.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been signalled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Drop a domain's fingerprint and force the next pass to cover the
    /// complete listing, pruning included.
    ///
    /// This is the explicit "force refresh" gesture: an incremental pass
    /// only fetches the head of the listing, so a true refresh must walk
    /// all of it.
    pub fn invalidate_fingerprint(&self, domain: Domain) {
        self.fingerprints.invalidate(domain);
        self.needs_full[domain.index()].store(true, Ordering::SeqCst);
    }

    /// Run one pass for every domain, in sync order.
    pub async fn sync_all(&self) -> Vec<(Domain, Result<SyncOutcome>)> {
        let mut outcomes = Vec::with_capacity(Domain::ALL.len());
        for domain in Domain::ALL {
            let outcome = self.sync(domain).await;
            outcomes.push((domain, outcome));
        }
        outcomes
    }

    /// Run one reconciliation pass for a domain.
    pub async fn sync(&self, domain: Domain) -> Result<SyncOutcome> {
        let flag = &self.running[domain.index()];
        if flag
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(domain = %domain, "Pass already in flight, skipping");
            metrics::record_skip(domain, "in_flight");
            return Ok(SyncOutcome::Skipped);
        }
        let _guard = RunningGuard { flag };

        let started = Instant::now();
        let result = self.run_pass(domain).await;

        // The progress indicator always returns to empty at pass end,
        // whatever the outcome.
        self.progress.reset(domain);

        let label = match &result {
            Ok(outcome) => match outcome {
                SyncOutcome::Converged => "converged",
                SyncOutcome::Skipped => "skipped",
                SyncOutcome::Aborted => "aborted",
            },
            Err(e) if e.is_unauthorized() => "unauthorized",
            Err(_) => "error",
        };
        metrics::record_pass_outcome(domain, label);
        metrics::record_pass_duration(domain, started.elapsed());

        if let Err(e) = &result {
            warn!(domain = %domain, error = %e, "Pass failed");
        }

        result
    }

    async fn run_pass(&self, domain: Domain) -> Result<SyncOutcome> {
        let chunk = self.config.settings.sync.effective_chunk_size();

        // Probe (mandatory). Failure here aborts before any mutation.
        let probe = match self.remote.page(domain, 0, chunk).await {
            Ok(page) => page,
            Err(e) => {
                if e.is_unauthorized() {
                    metrics::record_unauthorized(domain);
                }
                return Err(e);
            }
        };
        let total = probe.total_elements;
        let first_identity = probe.first_identity();

        // A pass that mutated without completing cleanly (degraded, aborted,
        // failed save) leaves this set; the fingerprint fast path must not
        // mask the hole it may have left.
        let force_full = self.needs_full[domain.index()].load(Ordering::SeqCst);

        if !force_full && self.fingerprints.matches(domain, total, first_identity) {
            debug!(domain = %domain, total, "Fingerprint unchanged, skipping pass");
            metrics::record_skip(domain, "fingerprint");
            return Ok(SyncOutcome::Skipped);
        }

        let local_count = self.store.count(domain).await?;
        let delta = total as i64 - local_count as i64;

        if delta == 0 && !force_full {
            // Same count: converged if the probe page is already mirrored
            // at the same modification timestamps.
            let local: std::collections::HashMap<Uuid, chrono::DateTime<chrono::Utc>> = self
                .store
                .fetch(domain, None)
                .await?
                .iter()
                .map(|r| (r.identity(), r.modified_at()))
                .collect();
            if probe
                .items
                .iter()
                .all(|e| local.get(&e.id) == Some(&e.modified_at))
            {
                self.fingerprints
                    .record(domain, SyncFingerprint::new(total, first_identity));
                debug!(domain = %domain, total, "Probe content already present, converged");
                return Ok(SyncOutcome::Converged);
            }
        }

        let total_pages = pages_for(total, chunk);
        let pages_needed = if delta > 0 && !force_full {
            // Remote grew: the new items sit at the head of the listing.
            pages_for(delta as usize, chunk).min(total_pages)
        } else {
            // Shrink, equal-count divergence, or a hole left by an earlier
            // degraded pass: reconcile against the complete live listing.
            total_pages
        };
        let complete = pages_needed >= total_pages;

        info!(
            domain = %domain,
            total,
            local = local_count,
            delta,
            pages = pages_needed,
            complete,
            "Starting reconcile"
        );

        // From here the pass mutates. Stays set until a clean completion,
        // so an abnormal exit forces the next pass to cover everything.
        self.needs_full[domain.index()].store(true, Ordering::SeqCst);

        self.progress.begin(domain, total);
        let adapter = adapter_for(domain);

        let mut fetched: HashSet<Uuid> = HashSet::with_capacity(total);
        let mut stats = PassStats::default();

        // Page 0 was already fetched by the probe.
        self.apply_page(domain, adapter, &probe.items, &mut fetched, &mut stats)
            .await?;

        let mut join_set: JoinSet<(u32, Result<RemotePage>)> = JoinSet::new();
        for index in 1..pages_needed as u32 {
            let remote = Arc::clone(&self.remote);
            let limiter = Arc::clone(&self.pages);
            join_set.spawn(async move {
                let permit = match limiter.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => return (index, Err(MirrorError::Shutdown)),
                };
                let page = remote.page(domain, index, chunk).await;
                drop(permit);
                (index, page)
            });
        }

        let mut degraded = false;
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((_, Ok(page))) => {
                    self.apply_page(domain, adapter, &page.items, &mut fetched, &mut stats)
                        .await?;
                }
                Ok((_, Err(e))) if e.is_unauthorized() => {
                    // Abort immediately: cancel outstanding fetches, keep
                    // what was already applied, surface distinctly.
                    metrics::record_unauthorized(domain);
                    join_set.shutdown().await;
                    return Err(e);
                }
                Ok((index, Err(e))) => {
                    warn!(
                        domain = %domain,
                        page = index,
                        error = %e,
                        "Page fetch failed, pass degrades"
                    );
                    metrics::record_page_failure(domain);
                    stats.pages_failed += 1;
                    degraded = true;
                }
                Err(e) => {
                    warn!(domain = %domain, error = %e, "Page task panicked");
                    metrics::record_page_failure(domain);
                    stats.pages_failed += 1;
                    degraded = true;
                }
            }
        }

        if self.is_cancelled() {
            info!(domain = %domain, "Cancelled before prune");
            return Ok(SyncOutcome::Aborted);
        }

        if complete && !degraded {
            let pruned = self
                .store
                .delete_absent(domain, std::mem::take(&mut fetched))
                .await?;
            stats.pruned = pruned;
            if pruned > 0 {
                metrics::record_pruned(domain, pruned);
            }
        } else if degraded {
            debug!(domain = %domain, "Degraded pass, prune suppressed");
        }

        if self.is_cancelled() {
            info!(domain = %domain, "Cancelled before save");
            return Ok(SyncOutcome::Aborted);
        }

        self.store.save().await?;

        self.needs_full[domain.index()].store(degraded, Ordering::SeqCst);
        if !degraded {
            self.fingerprints
                .record(domain, SyncFingerprint::new(total, first_identity));
        }

        info!(
            domain = %domain,
            total,
            pages = stats.pages_fetched,
            failed = stats.pages_failed,
            upserted = stats.upserted,
            skipped_items = stats.skipped_items,
            pruned = stats.pruned,
            "Pass complete"
        );

        Ok(SyncOutcome::Converged)
    }

    /// Adapt one page's envelopes and issue one bulk upsert.
    async fn apply_page(
        &self,
        domain: Domain,
        adapter: &dyn DomainAdapter,
        items: &[RemoteEnvelope],
        fetched: &mut HashSet<Uuid>,
        stats: &mut PassStats,
    ) -> Result<()> {
        let mut batch = Vec::with_capacity(items.len());
        for envelope in items {
            fetched.insert(envelope.id);
            match adapter.adapt(envelope) {
                Some(record) => batch.push(record),
                None => {
                    // Shape mismatch is a skip, not an error.
                    debug!(
                        domain = %domain,
                        id = %envelope.id,
                        "Envelope shape does not belong to domain, skipping"
                    );
                    stats.skipped_items += 1;
                }
            }
        }

        let upserted = batch.len();
        if !batch.is_empty() {
            self.store.upsert_batch(batch).await?;
        }

        stats.pages_fetched += 1;
        stats.upserted += upserted;
        metrics::record_pages_fetched(domain, 1);
        metrics::record_items_upserted(domain, upserted);
        self.progress.add_synced(domain, items.len());
        Ok(())
    }
}
