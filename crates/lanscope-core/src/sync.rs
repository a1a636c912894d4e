// ── Polling synchronizer ──
//
// Sole writer of the device Snapshot. A scope (the active range selection)
// owns one poll task; entering a new scope cancels the previous task before
// the next one starts. Every fetch carries a submission sequence number and
// the scope generation it was issued for, and its completion is checked
// against both inside a single `send_modify`, so an older or superseded
// response can never overwrite newer data.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::ScanBackend;
use crate::error::{CoreError, Operation};
use crate::model::Device;

// ── State ────────────────────────────────────────────────────────

/// Lifecycle phase of the current scope, derived from [`SyncState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SyncPhase {
    /// No fetch has completed for this scope yet.
    Idle,
    /// At least one fetch is in flight.
    Loading,
    /// The last applied fetch succeeded.
    Ready,
    /// The last applied fetch failed; the Snapshot is stale.
    Failed,
}

/// Everything observers need to render the synchronizer.
#[derive(Debug, Clone, Default)]
pub struct SyncState {
    /// Devices from the last successful fetch. Replaced, never merged.
    pub snapshot: Arc<Vec<Device>>,
    /// Range expression the current scope is filtered to.
    pub active_range: Option<String>,
    /// A poll task is mounted for the current scope.
    pub mounted: bool,
    /// Bumped on every scope entry or teardown.
    pub generation: u64,
    /// Fetches issued but not yet completed, across all scopes.
    pub in_flight: usize,
    /// Fixed user-facing message of the last applied failure.
    pub error: Option<String>,
    /// A fetch has been applied since the current scope was entered.
    pub loaded: bool,
    pub last_success: Option<DateTime<Utc>>,
    pub(crate) last_applied_seq: u64,
}

impl SyncState {
    pub fn phase(&self) -> SyncPhase {
        if self.in_flight > 0 {
            SyncPhase::Loading
        } else if self.error.is_some() {
            SyncPhase::Failed
        } else if self.loaded {
            SyncPhase::Ready
        } else {
            SyncPhase::Idle
        }
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight > 0
    }
}

/// What happened to a completed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The result became the current Snapshot.
    Applied,
    /// A newer fetch or a scope change superseded it; it was dropped.
    Stale,
}

// ── PollingSynchronizer ──────────────────────────────────────────

/// Owns the Snapshot and the per-scope poll task.
///
/// Cheaply cloneable; clones share the same state.
pub struct PollingSynchronizer<B> {
    inner: Arc<SyncInner<B>>,
}

struct SyncInner<B> {
    backend: Arc<B>,
    state: watch::Sender<SyncState>,
    next_seq: AtomicU64,
    poll_interval: Duration,
    /// Parent of every scope token; cancelled on session shutdown.
    cancel: CancellationToken,
    scope_cancel: watch::Sender<CancellationToken>,
}

impl<B> Clone for PollingSynchronizer<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: ScanBackend> PollingSynchronizer<B> {
    pub fn new(backend: Arc<B>, poll_interval: Duration, cancel: CancellationToken) -> Self {
        let (state, _) = watch::channel(SyncState::default());
        let (scope_cancel, _) = watch::channel(cancel.child_token());
        Self {
            inner: Arc::new(SyncInner {
                backend,
                state,
                next_seq: AtomicU64::new(0),
                poll_interval,
                cancel,
                scope_cancel,
            }),
        }
    }

    // ── Observation ──────────────────────────────────────────────

    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.inner.state.subscribe()
    }

    pub fn state(&self) -> SyncState {
        self.inner.state.borrow().clone()
    }

    pub fn snapshot(&self) -> Arc<Vec<Device>> {
        Arc::clone(&self.inner.state.borrow().snapshot)
    }

    pub fn active_range(&self) -> Option<String> {
        self.inner.state.borrow().active_range.clone()
    }

    pub fn phase(&self) -> SyncPhase {
        self.inner.state.borrow().phase()
    }

    /// The "currently fetching" signal.
    pub fn is_fetching(&self) -> bool {
        self.inner.state.borrow().is_fetching()
    }

    // ── Scope lifecycle ──────────────────────────────────────────

    /// Mount a new scope: cancel the previous poll task, then fetch
    /// immediately and every `poll_interval` after that.
    ///
    /// The last Snapshot stays visible until the first fetch of the new
    /// scope is applied.
    pub fn enter_scope(&self, active_range: Option<String>) {
        let token = self.inner.cancel.child_token();
        self.inner.scope_cancel.send_replace(token.clone()).cancel();

        let mut generation = 0;
        self.inner.state.send_modify(|s| {
            s.generation += 1;
            s.active_range.clone_from(&active_range);
            s.mounted = true;
            s.loaded = false;
            s.error = None;
            generation = s.generation;
        });
        info!(
            generation,
            range = active_range.as_deref().unwrap_or("*"),
            "entered scope"
        );

        tokio::spawn(poll_task(
            self.clone(),
            generation,
            self.inner.poll_interval,
            token,
        ));
    }

    /// Tear down the current scope. In-flight completions issued for it
    /// are discarded.
    pub fn stop(&self) {
        self.inner.scope_cancel.borrow().cancel();
        self.inner.state.send_modify(|s| {
            s.generation += 1;
            s.active_range = None;
            s.mounted = false;
            s.loaded = false;
            s.error = None;
        });
        debug!("scope unmounted");
    }

    /// Drop the range filter. A mounted scope is re-entered unfiltered
    /// and keeps polling; an unmounted one is only reset.
    pub fn reset_scope(&self) {
        let mounted = self.inner.state.borrow().mounted;
        if mounted {
            self.enter_scope(None);
        } else {
            self.stop();
        }
    }

    /// Fetch now for the current scope.
    ///
    /// Returns the fetch error even when the completion itself was stale.
    pub async fn refresh(&self) -> Result<FetchOutcome, CoreError> {
        let generation = self.inner.state.borrow().generation;
        self.fetch(generation).await
    }

    // ── Fetch cycle ──────────────────────────────────────────────

    async fn fetch(&self, generation: u64) -> Result<FetchOutcome, CoreError> {
        let seq = self.inner.next_seq.fetch_add(1, Ordering::Relaxed) + 1;
        self.inner.state.send_modify(|s| s.in_flight += 1);
        let guard = InFlightGuard {
            state: &self.inner.state,
            armed: true,
        };

        let result = self.inner.backend.list_devices().await;
        guard.disarm();

        let (devices, error) = match result {
            Ok(devices) => (Some(devices), None),
            Err(e) => (None, Some(e)),
        };

        let mut outcome = FetchOutcome::Stale;
        self.inner.state.send_modify(|s| {
            s.in_flight = s.in_flight.saturating_sub(1);
            if s.generation != generation || seq <= s.last_applied_seq {
                return;
            }
            s.last_applied_seq = seq;
            outcome = FetchOutcome::Applied;
            match devices {
                Some(devices) => {
                    s.snapshot = Arc::new(devices);
                    s.error = None;
                    s.loaded = true;
                    s.last_success = Some(Utc::now());
                }
                None => {
                    s.error = Some(Operation::FetchDevices.failure_message().to_owned());
                    s.loaded = true;
                }
            }
        });

        match error {
            Some(e) => {
                warn!(seq, generation, error = %e, ?outcome, "device fetch failed");
                Err(CoreError::transport(Operation::FetchDevices)(e))
            }
            None => {
                debug!(seq, generation, ?outcome, "device fetch completed");
                Ok(outcome)
            }
        }
    }
}

/// Decrements `in_flight` if a fetch future is dropped before completing.
struct InFlightGuard<'a> {
    state: &'a watch::Sender<SyncState>,
    armed: bool,
}

impl InFlightGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state
                .send_modify(|s| s.in_flight = s.in_flight.saturating_sub(1));
        }
    }
}

// ── Background task ──────────────────────────────────────────────

/// Fetch immediately, then once per `period` until the scope is cancelled.
/// A zero period performs only the immediate fetch.
async fn poll_task<B: ScanBackend>(
    sync: PollingSynchronizer<B>,
    generation: u64,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = (!period.is_zero()).then(|| {
        let start = tokio::time::Instant::now() + period;
        let mut interval = tokio::time::interval_at(start, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    });

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = sync.fetch(generation) => {}
        }

        let Some(interval) = interval.as_mut() else { break };
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }
    }
    debug!(generation, "poll task stopped");
}
