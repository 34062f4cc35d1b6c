// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Local store integration trait.
//!
//! Defines the interface the engine needs from the device's persisted
//! store. The host application provides an implementation over its real
//! persistence layer; [`MemoryStore`] ships in-crate for tests and
//! standalone use.
//!
//! # Contract
//!
//! - `upsert`/`upsert_batch` replace by identity, unconditionally: no
//!   field-level diffing, last write wins within a domain.
//! - Mutations issued before the pass's terminal [`save()`](LocalStore::save)
//!   must be visible to it and must not corrupt or lose records; the store,
//!   not the engine, serializes internal writes.
//! - `save()` is the sole durability boundary. State before it is visible
//!   in-process but not guaranteed persisted.
//! - `delete_absent` must never remove records representing local drafts
//!   that have not been pushed to the remote yet.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::Domain;
use crate::error::{MirrorError, Result};
use crate::record::LocalRecord;

/// Type alias for boxed async futures (reduces trait signature complexity).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Trait defining what the engine needs from the persisted store.
///
/// The host application provides an implementation of this trait, allowing
/// the engine to:
/// 1. Measure the mirrored set (`count`, `identities`)
/// 2. Write fetched projections (`upsert`, `upsert_batch`)
/// 3. Prune records absent from the latest remote snapshot (`delete_absent`)
/// 4. Commit one durability point per pass (`save`)
///
/// This trait allows testing with mocks and decouples the engine from the
/// platform persistence layer.
pub trait LocalStore: Send + Sync + 'static {
    /// Number of records currently stored for a domain.
    fn count(&self, domain: Domain) -> BoxFuture<'_, usize>;

    /// The identity set currently stored for a domain.
    fn identities(&self, domain: Domain) -> BoxFuture<'_, HashSet<Uuid>>;

    /// Fetch up to `limit` records for a domain (`None` = all).
    fn fetch(&self, domain: Domain, limit: Option<usize>) -> BoxFuture<'_, Vec<LocalRecord>>;

    /// Insert or replace one record by identity.
    fn upsert(&self, record: LocalRecord) -> BoxFuture<'_, ()>;

    /// Insert or replace a batch of records by identity.
    ///
    /// The engine issues one batch per fetched page.
    fn upsert_batch(&self, records: Vec<LocalRecord>) -> BoxFuture<'_, ()>;

    /// Delete one record by identity. Returns whether it existed.
    fn delete(&self, domain: Domain, identity: Uuid) -> BoxFuture<'_, bool>;

    /// Delete every record of a domain whose identity is not in `keep`,
    /// excluding local drafts. Returns the number deleted.
    fn delete_absent(&self, domain: Domain, keep: HashSet<Uuid>) -> BoxFuture<'_, usize>;

    /// Commit all mutations since the last save.
    fn save(&self) -> BoxFuture<'_, ()>;
}

/// In-memory implementation of [`LocalStore`].
///
/// Used by the test suite and for standalone/demo runs. Supports draft
/// marking (records pruning must skip) and save-failure injection.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<Domain, HashMap<Uuid, LocalRecord>>>,
    drafts: RwLock<HashMap<Domain, HashSet<Uuid>>>,
    save_count: AtomicUsize,
    fail_next_save: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an identity as a not-yet-pushed local draft.
    ///
    /// Draft records survive pruning even when absent from the remote
    /// listing.
    pub async fn mark_draft(&self, domain: Domain, identity: Uuid) {
        self.drafts
            .write()
            .await
            .entry(domain)
            .or_default()
            .insert(identity);
    }

    /// Clear the draft flag (e.g., after the record is pushed).
    pub async fn clear_draft(&self, domain: Domain, identity: Uuid) {
        if let Some(set) = self.drafts.write().await.get_mut(&domain) {
            set.remove(&identity);
        }
    }

    /// Number of successful `save()` calls.
    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }

    /// Make the next `save()` call fail once.
    pub fn fail_next_save(&self) {
        self.fail_next_save.store(true, Ordering::SeqCst);
    }

    /// Whether a record with this identity exists in the domain's store.
    pub async fn contains(&self, domain: Domain, identity: Uuid) -> bool {
        self.records
            .read()
            .await
            .get(&domain)
            .map(|m| m.contains_key(&identity))
            .unwrap_or(false)
    }
}

impl LocalStore for MemoryStore {
    fn count(&self, domain: Domain) -> BoxFuture<'_, usize> {
        Box::pin(async move {
            Ok(self
                .records
                .read()
                .await
                .get(&domain)
                .map(|m| m.len())
                .unwrap_or(0))
        })
    }

    fn identities(&self, domain: Domain) -> BoxFuture<'_, HashSet<Uuid>> {
        Box::pin(async move {
            Ok(self
                .records
                .read()
                .await
                .get(&domain)
                .map(|m| m.keys().copied().collect())
                .unwrap_or_default())
        })
    }

    fn fetch(&self, domain: Domain, limit: Option<usize>) -> BoxFuture<'_, Vec<LocalRecord>> {
        Box::pin(async move {
            let records = self.records.read().await;
            let iter = records.get(&domain).into_iter().flat_map(|m| m.values());
            Ok(match limit {
                Some(n) => iter.take(n).cloned().collect(),
                None => iter.cloned().collect(),
            })
        })
    }

    fn upsert(&self, record: LocalRecord) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.records
                .write()
                .await
                .entry(record.domain())
                .or_default()
                .insert(record.identity(), record);
            Ok(())
        })
    }

    fn upsert_batch(&self, batch: Vec<LocalRecord>) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let mut records = self.records.write().await;
            for record in batch {
                records
                    .entry(record.domain())
                    .or_default()
                    .insert(record.identity(), record);
            }
            Ok(())
        })
    }

    fn delete(&self, domain: Domain, identity: Uuid) -> BoxFuture<'_, bool> {
        Box::pin(async move {
            Ok(self
                .records
                .write()
                .await
                .get_mut(&domain)
                .and_then(|m| m.remove(&identity))
                .is_some())
        })
    }

    fn delete_absent(&self, domain: Domain, keep: HashSet<Uuid>) -> BoxFuture<'_, usize> {
        Box::pin(async move {
            let drafts = self
                .drafts
                .read()
                .await
                .get(&domain)
                .cloned()
                .unwrap_or_default();

            let mut records = self.records.write().await;
            let Some(map) = records.get_mut(&domain) else {
                return Ok(0);
            };

            let before = map.len();
            map.retain(|id, _| keep.contains(id) || drafts.contains(id));
            Ok(before - map.len())
        })
    }

    fn save(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            if self.fail_next_save.swap(false, Ordering::SeqCst) {
                return Err(MirrorError::Store("simulated save failure".to_string()));
            }
            self.save_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}
