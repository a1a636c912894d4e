// ── View projection ──
//
// The displayed device list is never stored. It is derived on demand from
// the synchronizer's Snapshot, the active range and the search override.
// The override is held here; the Snapshot is only ever read.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::backend::ScanBackend;
use crate::error::{CoreError, Operation};
use crate::matcher::matches;
use crate::model::Device;
use crate::sync::{SyncPhase, SyncState};

/// Derive the displayed list.
///
/// A present override is returned verbatim, even when empty, and the range
/// is ignored. Otherwise the snapshot is filtered to `active_range` in
/// snapshot order; with no range selected it is returned unfiltered.
pub fn project(
    snapshot: &[Device],
    active_range: Option<&str>,
    search_override: Option<&[Device]>,
) -> Vec<Device> {
    if let Some(results) = search_override {
        return results.to_vec();
    }
    match active_range {
        Some(range) => snapshot
            .iter()
            .filter(|d| matches(&d.address, range))
            .cloned()
            .collect(),
        None => snapshot.to_vec(),
    }
}

// ── Search state ────────────────────────────────────────────────

/// The search override and the query that produced it.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    pub query: Option<String>,
    /// `None` means no search is active. `Some(empty)` is a search that
    /// matched nothing.
    pub results: Option<Arc<Vec<Device>>>,
}

/// Result of [`ViewProjector::search`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Blank query: the override was removed.
    Cleared,
    /// The results became the override.
    Applied { matches: usize },
    /// A newer search or a clear superseded this one.
    Stale,
}

// ── ViewProjector ───────────────────────────────────────────────

pub struct ViewProjector<B> {
    backend: Arc<B>,
    search: watch::Sender<SearchState>,
    latest: AtomicU64,
}

impl<B: ScanBackend> ViewProjector<B> {
    pub fn new(backend: Arc<B>) -> Self {
        let (search, _) = watch::channel(SearchState::default());
        Self {
            backend,
            search,
            latest: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.search.subscribe()
    }

    pub fn search_state(&self) -> SearchState {
        self.search.borrow().clone()
    }

    pub fn is_searching(&self) -> bool {
        self.search.borrow().results.is_some()
    }

    /// Project the given synchronizer state through the current override.
    pub fn view(&self, state: &SyncState) -> Vec<Device> {
        let search = self.search.borrow();
        project(
            &state.snapshot,
            state.active_range.as_deref(),
            search.results.as_deref().map(Vec::as_slice),
        )
    }

    /// Run a remote search and freeze its results as the override.
    ///
    /// A blank query deactivates search without a network call. A failed
    /// search leaves the previous override in place.
    pub async fn search(&self, query: &str) -> Result<SearchOutcome, CoreError> {
        let query = query.trim();
        if query.is_empty() {
            self.clear();
            return Ok(SearchOutcome::Cleared);
        }

        let seq = self.latest.fetch_add(1, Ordering::Relaxed) + 1;
        let results = self
            .backend
            .search_devices(query)
            .await
            .inspect_err(|e| warn!(query, error = %e, "device search failed"))
            .map_err(CoreError::transport(Operation::SearchDevices))?;

        let matches = results.len();
        let applied = self.search.send_if_modified(|s| {
            if self.latest.load(Ordering::Relaxed) != seq {
                return false;
            }
            s.query = Some(query.to_owned());
            s.results = Some(Arc::new(results));
            true
        });

        if applied {
            debug!(query, matches, "search override applied");
            Ok(SearchOutcome::Applied { matches })
        } else {
            debug!(query, "discarding superseded search");
            Ok(SearchOutcome::Stale)
        }
    }

    /// Remove the override. In-flight searches are discarded when they land.
    pub fn clear(&self) {
        self.latest.fetch_add(1, Ordering::Relaxed);
        self.search.send_if_modified(|s| {
            let changed = s.results.is_some() || s.query.is_some();
            *s = SearchState::default();
            changed
        });
    }
}

// ── ViewWatcher ─────────────────────────────────────────────────

/// One rendered state of the view.
#[derive(Debug, Clone)]
pub struct ViewFrame {
    pub devices: Vec<Device>,
    pub phase: SyncPhase,
    pub error: Option<String>,
    pub active_range: Option<String>,
    pub query: Option<String>,
    pub last_success: Option<DateTime<Utc>>,
}

/// Yields a fresh [`ViewFrame`] whenever the Snapshot, scope or search
/// override changes.
pub struct ViewWatcher {
    sync: watch::Receiver<SyncState>,
    search: watch::Receiver<SearchState>,
}

impl ViewWatcher {
    pub fn new(sync: watch::Receiver<SyncState>, search: watch::Receiver<SearchState>) -> Self {
        Self { sync, search }
    }

    /// The current frame; marks both sources as seen.
    pub fn current(&mut self) -> ViewFrame {
        let state = self.sync.borrow_and_update().clone();
        let search = self.search.borrow_and_update().clone();
        ViewFrame {
            devices: project(
                &state.snapshot,
                state.active_range.as_deref(),
                search.results.as_deref().map(Vec::as_slice),
            ),
            phase: state.phase(),
            error: state.error,
            active_range: state.active_range,
            query: search.query,
            last_success: state.last_success,
        }
    }

    /// Wait for the next change and return the new frame.
    pub async fn changed(&mut self) -> Result<ViewFrame, CoreError> {
        tokio::select! {
            r = self.sync.changed() => r.map_err(|_| CoreError::SessionClosed)?,
            r = self.search.changed() => r.map_err(|_| CoreError::SessionClosed)?,
        }
        Ok(self.current())
    }
}
