// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Change fingerprints for pass short-circuiting.
//!
//! A fingerprint is the pair `(previous_total, first_identity)` observed at
//! the end of the last successful pass for a domain. If the page-0 probe of
//! the next pass reports the same pair, nothing appears to have changed and
//! the pass is skipped without touching the store or fetching further pages.
//!
//! # A Heuristic, Not a Guarantee
//!
//! A same-count reorder whose first item happens to match is
//! indistinguishable from "unchanged". The fingerprint exists to make the
//! common no-change poll cheap; correctness comes from the full pass.
//!
//! # Deliberately Memory-Only
//!
//! The cache is not persisted. Every cold start begins with no fingerprints,
//! so the first trigger per domain always runs a real reconcile. There is no
//! durable change cursor anywhere in this engine.

use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::domain::Domain;

/// The `(previous_total, first_identity)` pair for one domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncFingerprint {
    /// `totalElements` reported by the probe of the last successful pass.
    pub previous_total: usize,
    /// Identity of the first listed item, `None` for an empty listing.
    pub first_identity: Option<Uuid>,
}

impl SyncFingerprint {
    /// Build a fingerprint from a probe observation.
    pub fn new(total: usize, first_identity: Option<Uuid>) -> Self {
        Self {
            previous_total: total,
            first_identity,
        }
    }

    /// Check whether a fresh probe observation matches this fingerprint.
    pub fn matches(&self, total: usize, first_identity: Option<Uuid>) -> bool {
        self.previous_total == total && self.first_identity == first_identity
    }
}

/// In-memory fingerprint cache, one entry per domain.
#[derive(Debug, Default)]
pub struct FingerprintCache {
    entries: Mutex<HashMap<Domain, SyncFingerprint>>,
}

impl FingerprintCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the fingerprint for a domain, if one has been recorded.
    pub fn get(&self, domain: Domain) -> Option<SyncFingerprint> {
        self.entries.lock().expect("fingerprint lock poisoned").get(&domain).copied()
    }

    /// Record the fingerprint observed by a successful pass.
    pub fn record(&self, domain: Domain, fingerprint: SyncFingerprint) {
        self.entries
            .lock()
            .expect("fingerprint lock poisoned")
            .insert(domain, fingerprint);
    }

    /// Drop the fingerprint for a domain, forcing the next pass to reconcile.
    pub fn invalidate(&self, domain: Domain) {
        self.entries.lock().expect("fingerprint lock poisoned").remove(&domain);
    }

    /// Check whether a probe observation matches the recorded fingerprint.
    ///
    /// Returns `false` when no fingerprint has been recorded yet.
    pub fn matches(&self, domain: Domain, total: usize, first_identity: Option<Uuid>) -> bool {
        self.get(domain)
            .map(|fp| fp.matches(total, first_identity))
            .unwrap_or(false)
    }
}
