//! Mock RemoteSource for testing.
//!
//! Serves fixed listings per domain with the real pagination shape.
//! Records all page() calls for assertions. Configurable failures:
//! per-page errors, a standing unauthorized switch, unauthorized after N
//! calls, and artificial latency for overlap tests.

use mirror_engine::domain::Domain;
use mirror_engine::envelope::RemoteEnvelope;
use mirror_engine::error::MirrorError;
use mirror_engine::remote::{RemotePage, RemoteSource};
use mirror_engine::store::BoxFuture;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::Duration;

/// A recorded page() call.
#[derive(Debug, Clone)]
pub struct PageCall {
    pub domain: Domain,
    pub index: u32,
    pub size: usize,
}

/// Mock implementation of RemoteSource that records all calls.
///
/// # Example
/// ```rust,ignore
/// let remote = MockRemoteSource::new();
/// remote.set_listing(Domain::Notes, note_listing(25));
/// remote.fail_page(Domain::Notes, 1);
///
/// // Use in tests...
///
/// assert_eq!(remote.calls_for(Domain::Notes), 3);
/// ```
pub struct MockRemoteSource {
    /// Current listing per domain, in listing order.
    listings: RwLock<HashMap<Domain, Vec<RemoteEnvelope>>>,
    /// Recorded page() calls.
    calls: Mutex<Vec<PageCall>>,
    /// Pages that fail with a transient HTTP error.
    failing_pages: Mutex<HashSet<(Domain, u32)>>,
    /// When set, every call returns Unauthorized.
    unauthorized: AtomicBool,
    /// Return Unauthorized starting with the Nth call (0-based).
    unauthorized_after: AtomicUsize,
    /// Artificial latency per call, for overlap tests.
    latency_ms: AtomicUsize,
}

impl Default for MockRemoteSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRemoteSource {
    /// Create a mock with empty listings everywhere.
    pub fn new() -> Self {
        Self {
            listings: RwLock::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            failing_pages: Mutex::new(HashSet::new()),
            unauthorized: AtomicBool::new(false),
            unauthorized_after: AtomicUsize::new(usize::MAX),
            latency_ms: AtomicUsize::new(0),
        }
    }

    /// Replace a domain's listing.
    pub fn set_listing(&self, domain: Domain, listing: Vec<RemoteEnvelope>) {
        self.listings.write().unwrap().insert(domain, listing);
    }

    /// Current listing for a domain.
    pub fn listing(&self, domain: Domain) -> Vec<RemoteEnvelope> {
        self.listings
            .read()
            .unwrap()
            .get(&domain)
            .cloned()
            .unwrap_or_default()
    }

    /// Make one page of one domain fail with a transient error.
    pub fn fail_page(&self, domain: Domain, index: u32) {
        self.failing_pages.lock().unwrap().insert((domain, index));
    }

    /// Clear all configured page failures.
    pub fn clear_failures(&self) {
        self.failing_pages.lock().unwrap().clear();
    }

    /// Toggle the standing unauthorized switch.
    pub fn set_unauthorized(&self, value: bool) {
        self.unauthorized.store(value, Ordering::SeqCst);
    }

    /// Return Unauthorized starting with the Nth call (0-based).
    pub fn unauthorized_after(&self, n: usize) {
        self.unauthorized_after.store(n, Ordering::SeqCst);
    }

    /// Add artificial latency to every call.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as usize, Ordering::SeqCst);
    }

    /// All recorded calls.
    pub fn recorded_calls(&self) -> Vec<PageCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Total page() calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Page() calls for one domain.
    pub fn calls_for(&self, domain: Domain) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.domain == domain)
            .count()
    }

    /// Clear recorded calls.
    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl RemoteSource for MockRemoteSource {
    fn page(&self, domain: Domain, index: u32, size: usize) -> BoxFuture<'_, RemotePage> {
        Box::pin(async move {
            let call_number = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(PageCall {
                    domain,
                    index,
                    size,
                });
                calls.len() - 1
            };

            let latency = self.latency_ms.load(Ordering::SeqCst);
            if latency > 0 {
                tokio::time::sleep(Duration::from_millis(latency as u64)).await;
            }

            if self.unauthorized.load(Ordering::SeqCst)
                || call_number >= self.unauthorized_after.load(Ordering::SeqCst)
            {
                return Err(MirrorError::Unauthorized);
            }

            if self
                .failing_pages
                .lock()
                .unwrap()
                .contains(&(domain, index))
            {
                return Err(MirrorError::http_msg("page", "simulated transient failure"));
            }

            let listing = self.listing(domain);
            let total = listing.len();
            let total_pages = total.div_ceil(size.max(1)) as u32;
            let start = (index as usize).saturating_mul(size).min(total);
            let end = (start + size).min(total);

            Ok(RemotePage {
                items: listing[start..end].to_vec(),
                total_elements: total,
                total_pages,
                page_number: index,
            })
        })
    }
}
