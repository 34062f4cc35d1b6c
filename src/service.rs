// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Mirror service coordinator.
//!
//! The main orchestrator that ties together:
//! - One [`SyncEngine`] over the caller's remote source and local store
//! - The foreground periodic poll task
//! - Per-domain background refresh tasks, re-armed after each completion
//! - Graceful shutdown with task draining
//!
//! # Trigger Surface
//!
//! Three triggers feed the engine, all funnelling into
//! [`SyncEngine::sync()`]:
//! 1. [`sync_now()`](MirrorService::sync_now): manual pull-to-refresh
//! 2. The foreground poll task: one pass over every domain per interval
//! 3. Background refresh tasks: one per domain, re-armed after each
//!    completion with a minimum one-minute earliest-begin delay
//!
//! Overlap between triggers is harmless: the engine's per-domain running
//! flag turns the second trigger into a no-op skip.
//!
//! # State Transitions
//!
//! ```text
//!              start()              shutdown()
//! Created ───────────────→ Running ───────────→ ShuttingDown ──→ Stopped
//! ```

use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

use crate::config::MirrorConfig;
use crate::domain::Domain;
use crate::engine::{SyncEngine, SyncOutcome};
use crate::error::{MirrorError, Result};
use crate::metrics;
use crate::remote::RemoteSource;
use crate::store::LocalStore;

/// State of the mirror service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// Service created but not started.
    Created,
    /// Poll and background tasks are running.
    Running,
    /// `shutdown()` called; tasks are draining.
    ShuttingDown,
    /// Graceful shutdown complete. Safe to drop.
    Stopped,
}

impl std::fmt::Display for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceState::Created => write!(f, "Created"),
            ServiceState::Running => write!(f, "Running"),
            ServiceState::ShuttingDown => write!(f, "ShuttingDown"),
            ServiceState::Stopped => write!(f, "Stopped"),
        }
    }
}

/// The mirror service: owns the engine and its trigger tasks.
pub struct MirrorService<R: RemoteSource, S: LocalStore> {
    config: MirrorConfig,
    engine: Arc<SyncEngine<R, S>>,
    state_tx: watch::Sender<ServiceState>,
    state_rx: watch::Receiver<ServiceState>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    task_handles: RwLock<Vec<tokio::task::JoinHandle<()>>>,
}

impl<R: RemoteSource, S: LocalStore> MirrorService<R, S> {
    /// Create a service over a remote source and a local store.
    ///
    /// The service starts in `Created` state. Call
    /// [`start()`](Self::start) to spawn the trigger tasks.
    pub fn new(config: MirrorConfig, remote: Arc<R>, store: Arc<S>) -> Self {
        let engine = Arc::new(SyncEngine::new(config.clone(), remote, store));
        let (state_tx, state_rx) = watch::channel(ServiceState::Created);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            config,
            engine,
            state_tx,
            state_rx,
            shutdown_tx,
            shutdown_rx,
            task_handles: RwLock::new(Vec::new()),
        }
    }

    /// The underlying engine (progress surface, manual triggers).
    pub fn engine(&self) -> &Arc<SyncEngine<R, S>> {
        &self.engine
    }

    /// Get current service state.
    pub fn state(&self) -> ServiceState {
        *self.state_rx.borrow()
    }

    /// Get a receiver to watch state changes.
    pub fn state_receiver(&self) -> watch::Receiver<ServiceState> {
        self.state_rx.clone()
    }

    /// Check if the service is running.
    pub fn is_running(&self) -> bool {
        matches!(self.state(), ServiceState::Running)
    }

    /// Manual pull-to-refresh trigger for one domain.
    pub async fn sync_now(&self, domain: Domain) -> Result<SyncOutcome> {
        self.engine.sync(domain).await
    }

    /// Force a full reconcile for one domain, bypassing the fingerprint.
    pub async fn force_refresh(&self, domain: Domain) -> Result<SyncOutcome> {
        self.engine.invalidate_fingerprint(domain);
        self.engine.sync(domain).await
    }

    /// Start the service.
    ///
    /// 1. Spawns the foreground poll task (if enabled)
    /// 2. Spawns one background refresh task per domain (if enabled)
    pub async fn start(&mut self) -> Result<()> {
        if self.state() != ServiceState::Created {
            return Err(MirrorError::InvalidState {
                expected: "Created".to_string(),
                actual: self.state().to_string(),
            });
        }

        info!(
            poll = self.config.settings.poll.enabled,
            background = self.config.settings.background.enabled,
            "Starting mirror service"
        );

        if self.config.settings.poll.enabled {
            self.spawn_poll_task().await;
        }

        if self.config.settings.background.enabled {
            for domain in Domain::ALL {
                self.spawn_background_task(domain).await;
            }
        }

        let _ = self.state_tx.send(ServiceState::Running);
        metrics::set_service_state("Running");
        info!("Mirror service running");

        Ok(())
    }

    /// Spawn the foreground poll task: one pass over every domain per tick.
    async fn spawn_poll_task(&self) {
        let engine = Arc::clone(&self.engine);
        let mut shutdown_rx = self.shutdown_rx.clone();
        let interval = self.config.settings.poll.interval_duration();

        let handle = tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            // First tick fires immediately; skip it so start() returns
            // before the first poll pass.
            timer.tick().await;

            loop {
                tokio::select! {
                    _ = timer.tick() => {
                        for domain in Domain::ALL {
                            if let Err(e) = engine.sync(domain).await {
                                if e.is_unauthorized() {
                                    warn!(domain = %domain, "Poll pass unauthorized, re-auth required");
                                } else {
                                    warn!(domain = %domain, error = %e, "Poll pass failed");
                                }
                            }
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            debug!("Poll task stopping");
                            break;
                        }
                    }
                }
            }
        });

        info!(interval_secs = interval.as_secs(), "Spawned poll task");
        self.task_handles.write().await.push(handle);
    }

    /// Spawn the background refresh task for one domain.
    ///
    /// The task sleeps the earliest-begin delay, runs a pass, then re-arms
    /// itself; the delay is floored at one minute by the config layer.
    async fn spawn_background_task(&self, domain: Domain) {
        let engine = Arc::clone(&self.engine);
        let mut shutdown_rx = self.shutdown_rx.clone();
        let delay = self.config.settings.background.min_delay_duration();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {
                        match engine.sync(domain).await {
                            Ok(outcome) => {
                                debug!(domain = %domain, outcome = %outcome, "Background pass complete");
                            }
                            Err(e) => {
                                warn!(domain = %domain, error = %e, "Background pass failed");
                            }
                        }
                        // Loop re-arms with the same earliest-begin delay
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            debug!(domain = %domain, "Background task stopping");
                            break;
                        }
                    }
                }
            }
        });

        debug!(domain = %domain, delay_secs = delay.as_secs(), "Spawned background refresh task");
        self.task_handles.write().await.push(handle);
    }

    /// Shutdown the service gracefully.
    ///
    /// Shutdown sequence:
    /// 1. Signal all trigger tasks to stop
    /// 2. Signal cooperative cancellation to in-flight passes
    /// 3. Wait for tasks to complete (with timeout)
    pub async fn shutdown(&mut self) {
        info!("Shutting down mirror service");
        let _ = self.state_tx.send(ServiceState::ShuttingDown);
        metrics::set_service_state("ShuttingDown");

        let _ = self.shutdown_tx.send(true);
        self.engine.cancel();

        let handles: Vec<_> = {
            let mut guard = self.task_handles.write().await;
            std::mem::take(&mut *guard)
        };

        let task_count = handles.len();
        if task_count > 0 {
            info!(task_count, "Waiting for trigger tasks to complete");
        }

        let drain_timeout = std::time::Duration::from_secs(10);
        for (i, handle) in handles.into_iter().enumerate() {
            match tokio::time::timeout(drain_timeout, handle).await {
                Ok(Ok(())) => {
                    debug!(task = i + 1, "Task completed gracefully");
                }
                Ok(Err(e)) => {
                    warn!(task = i + 1, error = %e, "Task panicked during shutdown");
                }
                Err(_) => {
                    warn!(task = i + 1, "Task timed out during shutdown");
                }
            }
        }

        let _ = self.state_tx.send(ServiceState::Stopped);
        metrics::set_service_state("Stopped");
        info!("Mirror service stopped");
    }
}
