// ── Range and history registries ──
//
// Thin CRUD façades over saved ranges and past scans. Each keeps its list
// in a `watch` channel so views can observe it. Local removal only happens
// after the backend confirms a delete.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::backend::ScanBackend;
use crate::error::{CoreError, Operation};
use crate::matcher::Cidr;
use crate::model::{AddressRange, ScanRecord};

const REQUIRED_FIELDS: &str = "All fields are required";

// ── RangeRegistry ────────────────────────────────────────────────

pub struct RangeRegistry<B> {
    backend: Arc<B>,
    ranges: watch::Sender<Arc<Vec<AddressRange>>>,
}

impl<B: ScanBackend> RangeRegistry<B> {
    pub fn new(backend: Arc<B>) -> Self {
        let (ranges, _) = watch::channel(Arc::new(Vec::new()));
        Self { backend, ranges }
    }

    pub fn list(&self) -> Arc<Vec<AddressRange>> {
        Arc::clone(&self.ranges.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<AddressRange>>> {
        self.ranges.subscribe()
    }

    pub fn get(&self, id: &str) -> Option<AddressRange> {
        self.ranges.borrow().iter().find(|r| r.id == id).cloned()
    }

    /// Like [`get`](Self::get), but a missing range is an error.
    pub fn require(&self, id: &str) -> Result<AddressRange, CoreError> {
        self.get(id)
            .ok_or_else(|| CoreError::RangeNotFound { id: id.to_owned() })
    }

    pub async fn reload(&self) -> Result<Arc<Vec<AddressRange>>, CoreError> {
        let ranges = Arc::new(
            self.backend
                .list_ranges()
                .await
                .map_err(CoreError::transport(Operation::LoadRanges))?,
        );
        self.ranges.send_replace(Arc::clone(&ranges));
        debug!(count = ranges.len(), "ranges reloaded");
        Ok(ranges)
    }

    /// Save a new range, then reload the list.
    ///
    /// Blank fields and malformed CIDR expressions are rejected before any
    /// network call.
    pub async fn create(&self, name: &str, range: &str) -> Result<(), CoreError> {
        let (name, range) = (name.trim(), range.trim());
        if name.is_empty() || range.is_empty() {
            return Err(CoreError::validation(REQUIRED_FIELDS));
        }
        Cidr::parse(range)?;

        self.backend
            .create_range(name, range)
            .await
            .map_err(CoreError::transport(Operation::AddRange))?;

        if let Err(e) = self.reload().await {
            warn!(error = %e, "range saved but reload failed");
        }
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<(), CoreError> {
        self.backend
            .delete_range(id)
            .await
            .map_err(CoreError::transport(Operation::DeleteRange))?;

        self.ranges.send_if_modified(|ranges| {
            let before = ranges.len();
            let kept: Vec<_> = ranges.iter().filter(|r| r.id != id).cloned().collect();
            let changed = kept.len() != before;
            *ranges = Arc::new(kept);
            changed
        });
        Ok(())
    }
}

// ── HistoryRegistry ──────────────────────────────────────────────

pub struct HistoryRegistry<B> {
    backend: Arc<B>,
    records: watch::Sender<Arc<Vec<ScanRecord>>>,
}

impl<B: ScanBackend> HistoryRegistry<B> {
    pub fn new(backend: Arc<B>) -> Self {
        let (records, _) = watch::channel(Arc::new(Vec::new()));
        Self { backend, records }
    }

    pub fn list(&self) -> Arc<Vec<ScanRecord>> {
        Arc::clone(&self.records.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<ScanRecord>>> {
        self.records.subscribe()
    }

    pub fn get(&self, id: u64) -> Option<ScanRecord> {
        self.records.borrow().iter().find(|r| r.id == id).cloned()
    }

    pub fn require(&self, id: u64) -> Result<ScanRecord, CoreError> {
        self.get(id).ok_or(CoreError::HistoryNotFound { id })
    }

    pub async fn reload(&self) -> Result<Arc<Vec<ScanRecord>>, CoreError> {
        let records = Arc::new(
            self.backend
                .list_history()
                .await
                .map_err(CoreError::transport(Operation::LoadHistory))?,
        );
        self.records.send_replace(Arc::clone(&records));
        debug!(count = records.len(), "scan history reloaded");
        Ok(records)
    }

    /// Re-run the scan recorded under `id`. Returns the backend's status
    /// message.
    pub async fn repeat(&self, id: u64) -> Result<String, CoreError> {
        self.backend
            .repeat_scan(id)
            .await
            .map_err(CoreError::transport(Operation::RepeatScan))
    }

    pub async fn delete(&self, id: u64) -> Result<(), CoreError> {
        self.backend
            .delete_history(id)
            .await
            .map_err(CoreError::transport(Operation::DeleteHistory))?;

        self.records.send_if_modified(|records| {
            let before = records.len();
            let kept: Vec<_> = records.iter().filter(|r| r.id != id).cloned().collect();
            let changed = kept.len() != before;
            *records = Arc::new(kept);
            changed
        });
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), CoreError> {
        self.backend
            .clear_history()
            .await
            .map_err(CoreError::transport(Operation::ClearHistory))?;
        self.records.send_replace(Arc::new(Vec::new()));
        Ok(())
    }

    /// Reload every `period` until cancelled. Failures are logged and the
    /// previous list is kept.
    pub(crate) async fn poll(self: Arc<Self>, period: Duration, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if let Err(e) = self.reload().await {
                        warn!(error = %e, "periodic history refresh failed");
                    }
                }
            }
        }
    }
}
