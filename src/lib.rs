//! # Mirror Engine
//!
//! An incremental synchronization engine that mirrors a user's cloud-hosted
//! assistant data (notes, captures, transcripts, calls, translations, music
//! sessions) into a local on-device cache for fast, offline-capable
//! browsing.
//!
//! ## Architecture
//!
//! The engine sits between the remote paginated API and the device's
//! persisted store, reconciling one domain per pass:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                           mirror-engine                             │
//! │                                                                     │
//! │  ┌──────────────┐    ┌────────────────┐    ┌─────────────────────┐  │
//! │  │ RemoteSource │───►│   SyncEngine   │───►│ DomainAdapter       │  │
//! │  │ (paged REST) │    │ probe → delta  │    │ (envelope → record) │  │
//! │  └──────────────┘    │ → fan-out      │    └─────────────────────┘  │
//! │         ▲            │ → prune → save │              │              │
//! │         │            └────────────────┘              ▼              │
//! │  ┌──────────────┐            │             ┌─────────────────────┐  │
//! │  │MirrorService │            ▼             │ LocalStore          │  │
//! │  │ (triggers)   │   ┌─────────────────┐    │ (device store)      │  │
//! │  └──────────────┘   │ ProgressTracker │    └─────────────────────┘  │
//! │                     │ (synced, total) │                             │
//! │                     └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## One Pass
//!
//! 1. **Probe** page 0 for `(total, first identity)`; skip the pass when
//!    the fingerprint says nothing changed
//! 2. **Delta** against the local count decides incremental vs. full fetch
//! 3. **Fan out** one task per page, bounded, each page bulk-upserted
//!    through the domain's adapter as it lands
//! 4. **Prune** records absent from the complete fetched snapshot
//! 5. **Save** once, the pass's single durability boundary
//!
//! The remote is always authoritative: upserts are unconditional, local
//! drafts are never pruned, and conflicts are not merged.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use mirror_engine::{MirrorConfig, MirrorService, HttpRemoteSource, MemoryStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = MirrorConfig::default();
//!     let remote = Arc::new(HttpRemoteSource::new(&config, "bearer-token").expect("client"));
//!     let store = Arc::new(MemoryStore::new());
//!
//!     let mut service = MirrorService::new(config, remote, store);
//!     service.start().await.expect("Failed to start");
//!
//!     // Service polls until shutdown signal
//!     service.shutdown().await;
//! }
//! ```

pub mod adapter;
pub mod config;
pub mod domain;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod fingerprint;
pub mod metrics;
pub mod progress;
pub mod record;
pub mod remote;
pub mod resilience;
pub mod service;
pub mod store;

// Re-exports for convenience
pub use adapter::{adapter_for, DomainAdapter};
pub use config::{MirrorConfig, MirrorSettings, PollConfig, SyncSettings};
pub use domain::Domain;
pub use engine::{SyncEngine, SyncOutcome};
pub use envelope::{Page, Payload, RemoteEnvelope};
pub use error::{MirrorError, Result};
pub use fingerprint::SyncFingerprint;
pub use progress::{Progress, ProgressTracker};
pub use record::LocalRecord;
pub use remote::{HttpRemoteSource, RemotePage, RemoteSource};
pub use service::{MirrorService, ServiceState};
pub use store::{LocalStore, MemoryStore};
