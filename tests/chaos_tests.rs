// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Chaos tests: simulate failures and verify graceful degradation.
//!
//! These tests verify the engine handles failures gracefully without
//! panics, deadlocks, or store corruption.
//!
//! Run with: cargo test --test chaos_tests -- --nocapture

mod common;

use common::mock_remote::MockRemoteSource;
use common::note_listing;
use mirror_engine::{Domain, LocalStore, MemoryStore, MirrorConfig, SyncEngine, SyncOutcome};
use std::sync::Arc;
use std::time::Duration;

fn engine(
    remote: &Arc<MockRemoteSource>,
    store: &Arc<MemoryStore>,
) -> SyncEngine<MockRemoteSource, MemoryStore> {
    SyncEngine::new(
        MirrorConfig::for_testing("http://test"),
        Arc::clone(remote),
        Arc::clone(store),
    )
}

// =============================================================================
// Save Failures
// =============================================================================

/// Test: a failing terminal save surfaces the error and the next pass
/// recovers cleanly.
#[tokio::test]
async fn save_failure_then_recovery() {
    let remote = Arc::new(MockRemoteSource::new());
    let store = Arc::new(MemoryStore::new());
    remote.set_listing(Domain::Notes, note_listing(25));
    store.fail_next_save();

    let engine = engine(&remote, &store);

    let err = engine.sync(Domain::Notes).await.unwrap_err();
    assert!(!err.is_unauthorized());
    assert_eq!(store.save_count(), 0);

    // In-process upserts were not rolled back
    assert_eq!(store.count(Domain::Notes).await.unwrap(), 25);

    // Next trigger converges and commits
    let outcome = engine.sync(Domain::Notes).await.unwrap();
    assert_eq!(outcome, SyncOutcome::Converged);
    assert_eq!(store.save_count(), 1);
}

// =============================================================================
// Mid-Pass Unauthorized
// =============================================================================

/// Test: a token expiring between the probe and a page fetch aborts the
/// pass distinctly; already-applied pages remain.
#[tokio::test]
async fn token_expires_mid_pass() {
    let remote = Arc::new(MockRemoteSource::new());
    let store = Arc::new(MemoryStore::new());
    remote.set_listing(Domain::Notes, note_listing(30));
    // Probe (call 0) succeeds, every later call is unauthorized
    remote.unauthorized_after(1);

    let engine = engine(&remote, &store);
    let err = engine.sync(Domain::Notes).await.unwrap_err();

    assert!(err.is_unauthorized());
    // Probe page was applied before the abort; nothing was pruned or saved
    assert_eq!(store.count(Domain::Notes).await.unwrap(), 10);
    assert_eq!(store.save_count(), 0);

    // After re-auth the next pass converges fully
    remote.unauthorized_after(usize::MAX);
    engine.sync(Domain::Notes).await.unwrap();
    assert_eq!(store.count(Domain::Notes).await.unwrap(), 30);
    assert_eq!(store.save_count(), 1);
}

// =============================================================================
// Cancellation
// =============================================================================

/// Test: cancellation between phases aborts without partial deletes.
#[tokio::test]
async fn cancellation_never_partially_deletes() {
    let remote = Arc::new(MockRemoteSource::new());
    let store = Arc::new(MemoryStore::new());
    let listing = note_listing(25);
    remote.set_listing(Domain::Notes, listing.clone());

    let engine = engine(&remote, &store);
    engine.sync(Domain::Notes).await.unwrap();

    // Remote shrinks drastically, then shutdown arrives before the pass
    remote.set_listing(Domain::Notes, listing[..5].to_vec());
    engine.cancel();

    let outcome = engine.sync(Domain::Notes).await.unwrap();
    assert_eq!(outcome, SyncOutcome::Aborted);

    // The 20 departed records were NOT deleted by the aborted pass
    assert_eq!(store.count(Domain::Notes).await.unwrap(), 25);
    // Progress is back to empty
    assert!(engine.progress().snapshot(Domain::Notes).is_idle());
}

// =============================================================================
// Trigger Storms
// =============================================================================

/// Test: many concurrent triggers for one domain run exactly one pass.
#[tokio::test]
async fn trigger_storm_runs_one_pass() {
    let remote = Arc::new(MockRemoteSource::new());
    let store = Arc::new(MemoryStore::new());
    remote.set_listing(Domain::Notes, note_listing(40));
    remote.set_latency(Duration::from_millis(30));

    let engine = Arc::new(engine(&remote, &store));

    let mut handles = Vec::new();
    for _ in 0..10 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(
            async move { engine.sync(Domain::Notes).await },
        ));
    }

    let mut converged = 0;
    let mut skipped = 0;
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            SyncOutcome::Converged => converged += 1,
            SyncOutcome::Skipped => skipped += 1,
            SyncOutcome::Aborted => panic!("no pass should abort"),
        }
    }

    assert_eq!(converged, 1, "exactly one trigger should run the pass");
    assert_eq!(skipped, 9);
    assert_eq!(store.count(Domain::Notes).await.unwrap(), 40);
    assert_eq!(store.save_count(), 1);
}

/// Test: concurrent triggers across different domains all run.
#[tokio::test]
async fn concurrent_domains_do_not_block_each_other() {
    let remote = Arc::new(MockRemoteSource::new());
    let store = Arc::new(MemoryStore::new());
    remote.set_listing(Domain::Notes, note_listing(10));
    remote.set_listing(Domain::Captures, vec![common::capture_envelope()]);
    remote.set_latency(Duration::from_millis(20));

    let engine = Arc::new(engine(&remote, &store));

    let notes = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.sync(Domain::Notes).await.unwrap() })
    };
    let captures = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.sync(Domain::Captures).await.unwrap() })
    };

    assert_eq!(notes.await.unwrap(), SyncOutcome::Converged);
    assert_eq!(captures.await.unwrap(), SyncOutcome::Converged);
    assert_eq!(store.count(Domain::Notes).await.unwrap(), 10);
    assert_eq!(store.count(Domain::Captures).await.unwrap(), 1);
}

// =============================================================================
// Repeated Failure Cycles
// =============================================================================

/// Test: alternating failing and clean passes never corrupt the mirror.
#[tokio::test]
async fn flapping_page_failures_converge_eventually() {
    let remote = Arc::new(MockRemoteSource::new());
    let store = Arc::new(MemoryStore::new());
    let listing = note_listing(50);
    remote.set_listing(Domain::Notes, listing.clone());

    let engine = engine(&remote, &store);

    for round in 0..6 {
        if round % 2 == 0 {
            remote.fail_page(Domain::Notes, 1 + (round as u32 % 4));
        } else {
            remote.clear_failures();
        }
        // Force each round to actually reconcile
        engine.invalidate_fingerprint(Domain::Notes);
        let outcome = engine.sync(Domain::Notes).await.unwrap();
        assert_ne!(outcome, SyncOutcome::Aborted);
        // Never more records than the remote reports
        assert!(store.count(Domain::Notes).await.unwrap() <= 50);
    }

    remote.clear_failures();
    engine.sync(Domain::Notes).await.unwrap();
    assert_eq!(store.count(Domain::Notes).await.unwrap(), 50);
    assert_eq!(
        store.identities(Domain::Notes).await.unwrap(),
        common::ids(&listing)
    );
}

/// Test: an empty remote listing wipes the mirror (and only the mirror).
#[tokio::test]
async fn empty_remote_clears_domain() {
    let remote = Arc::new(MockRemoteSource::new());
    let store = Arc::new(MemoryStore::new());
    remote.set_listing(Domain::Notes, note_listing(15));

    let engine = engine(&remote, &store);
    engine.sync(Domain::Notes).await.unwrap();
    assert_eq!(store.count(Domain::Notes).await.unwrap(), 15);

    remote.set_listing(Domain::Notes, Vec::new());
    let outcome = engine.sync(Domain::Notes).await.unwrap();

    assert_eq!(outcome, SyncOutcome::Converged);
    assert_eq!(store.count(Domain::Notes).await.unwrap(), 0);
}
