// ── Session façade ──
//
// Wires the synchronizer, projector, registries and coordinator over one
// backend. Cheaply cloneable; every clone drives the same engine. Dropping
// the last clone cancels all background tasks.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use lanscope_api::ScanClient;

use crate::backend::ScanBackend;
use crate::config::SessionConfig;
use crate::coordinator::MutationCoordinator;
use crate::error::CoreError;
use crate::model::Device;
use crate::registry::{HistoryRegistry, RangeRegistry};
use crate::sync::{FetchOutcome, PollingSynchronizer, SyncState};
use crate::view::{SearchOutcome, ViewProjector, ViewWatcher};

/// Entry point for views.
pub struct Session<B = ScanClient> {
    inner: Arc<SessionInner<B>>,
}

struct SessionInner<B> {
    config: SessionConfig,
    sync: PollingSynchronizer<B>,
    view: Arc<ViewProjector<B>>,
    ranges: Arc<RangeRegistry<B>>,
    history: Arc<HistoryRegistry<B>>,
    coordinator: MutationCoordinator<B>,
    cancel: CancellationToken,
    history_polling: AtomicBool,
}

impl<B> Drop for SessionInner<B> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl<B> Clone for Session<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Session<ScanClient> {
    /// Build an HTTP-backed session. Does not fetch anything until
    /// [`start`](Self::start) or [`select_range`](Self::select_range).
    pub fn connect(config: SessionConfig) -> Result<Self, CoreError> {
        let client = ScanClient::new(config.base_endpoint.clone(), &config.transport()).map_err(
            |e| CoreError::Config {
                message: format!("cannot build HTTP client: {e}"),
            },
        )?;
        debug!(endpoint = %config.base_endpoint, "session client built");
        Ok(Self::with_backend(config, client))
    }
}

impl<B: ScanBackend> Session<B> {
    pub fn with_backend(config: SessionConfig, backend: B) -> Self {
        Self::with_shared_backend(config, Arc::new(backend))
    }

    /// Like [`with_backend`](Self::with_backend) for a backend the caller
    /// keeps a handle to.
    pub fn with_shared_backend(config: SessionConfig, backend: Arc<B>) -> Self {
        let cancel = CancellationToken::new();
        let sync = PollingSynchronizer::new(
            Arc::clone(&backend),
            config.poll_interval,
            cancel.child_token(),
        );
        let view = Arc::new(ViewProjector::new(Arc::clone(&backend)));
        let ranges = Arc::new(RangeRegistry::new(Arc::clone(&backend)));
        let history = Arc::new(HistoryRegistry::new(Arc::clone(&backend)));
        let coordinator = MutationCoordinator::new(
            backend,
            sync.clone(),
            Arc::clone(&view),
            Arc::clone(&ranges),
            Arc::clone(&history),
        );

        Self {
            inner: Arc::new(SessionInner {
                config,
                sync,
                view,
                ranges,
                history,
                coordinator,
                cancel,
                history_polling: AtomicBool::new(false),
            }),
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Mount the unfiltered device view and start background polling.
    pub fn start(&self) {
        self.select_range(None);
        self.start_history_polling();
        info!(endpoint = %self.inner.config.base_endpoint, "session started");
    }

    /// Make `range` the active scope. Fetches immediately; the previous
    /// scope's timer is cancelled first. A blank range clears the filter.
    pub fn select_range(&self, range: Option<&str>) {
        let range = range.map(str::trim).filter(|r| !r.is_empty());
        self.inner.sync.enter_scope(range.map(str::to_owned));
    }

    fn start_history_polling(&self) {
        let config = &self.inner.config;
        if !config.poll_history || config.poll_interval.is_zero() {
            return;
        }
        if self.inner.history_polling.swap(true, Ordering::AcqRel) {
            return;
        }
        tokio::spawn(
            Arc::clone(&self.inner.history)
                .poll(config.poll_interval, self.inner.cancel.child_token()),
        );
    }

    /// Cancel every background task. The session stays readable.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
        info!("session shut down");
    }

    // ── Accessors ────────────────────────────────────────────────

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn sync(&self) -> &PollingSynchronizer<B> {
        &self.inner.sync
    }

    pub fn projector(&self) -> &ViewProjector<B> {
        &self.inner.view
    }

    pub fn ranges(&self) -> &RangeRegistry<B> {
        &self.inner.ranges
    }

    pub fn history(&self) -> &HistoryRegistry<B> {
        &self.inner.history
    }

    pub fn coordinator(&self) -> &MutationCoordinator<B> {
        &self.inner.coordinator
    }

    // ── Convenience ──────────────────────────────────────────────

    pub fn state(&self) -> SyncState {
        self.inner.sync.state()
    }

    /// The devices a view should display right now.
    pub fn view(&self) -> Vec<Device> {
        self.inner.view.view(&self.inner.sync.state())
    }

    pub fn watch_view(&self) -> ViewWatcher {
        ViewWatcher::new(self.inner.sync.subscribe(), self.inner.view.subscribe())
    }

    pub async fn refresh(&self) -> Result<FetchOutcome, CoreError> {
        self.inner.sync.refresh().await
    }

    pub async fn search(&self, query: &str) -> Result<SearchOutcome, CoreError> {
        self.inner.view.search(query).await
    }
}
