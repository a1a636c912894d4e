// ── Mutation coordinator ──
//
// User-triggered writes. Each mutation is one remote round trip wrapped in
// a pending marker keyed by record identity. Optimistic UI state is applied
// up front and rolled back on failure. On success the synchronizer is asked
// to re-fetch; the Snapshot itself is never touched here.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::backend::ScanBackend;
use crate::error::{CoreError, Operation};
use crate::registry::{HistoryRegistry, RangeRegistry};
use crate::sync::PollingSynchronizer;
use crate::view::ViewProjector;

// ── Pending markers ──────────────────────────────────────────────

/// Identity of an in-flight mutation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PendingKey {
    /// One tag input per device.
    AddTag { device_id: String },
    RemoveTag { device_id: String, tag: String },
    StartScan,
    ClearDevices,
    /// A history row being repeated.
    RepeatScan(u64),
    AddRange,
    DeleteRange(String),
    DeleteHistory(u64),
    ClearHistory,
}

impl PendingKey {
    pub fn operation(&self) -> Operation {
        match self {
            Self::AddTag { .. } => Operation::AddTag,
            Self::RemoveTag { .. } => Operation::RemoveTag,
            Self::StartScan => Operation::StartScan,
            Self::ClearDevices => Operation::ClearDevices,
            Self::RepeatScan(_) => Operation::RepeatScan,
            Self::AddRange => Operation::AddRange,
            Self::DeleteRange(_) => Operation::DeleteRange,
            Self::DeleteHistory(_) => Operation::DeleteHistory,
            Self::ClearHistory => Operation::ClearHistory,
        }
    }
}

/// Removes its key from the pending set when dropped.
struct PendingGuard<'a> {
    pending: &'a watch::Sender<HashSet<PendingKey>>,
    key: PendingKey,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending.send_if_modified(|set| set.remove(&self.key));
    }
}

/// Result of a tag mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// Blank tag text: nothing was sent.
    Skipped,
    Completed,
}

// ── MutationCoordinator ──────────────────────────────────────────

pub struct MutationCoordinator<B> {
    backend: Arc<B>,
    sync: PollingSynchronizer<B>,
    view: Arc<ViewProjector<B>>,
    ranges: Arc<RangeRegistry<B>>,
    history: Arc<HistoryRegistry<B>>,
    pending: watch::Sender<HashSet<PendingKey>>,
    tag_inputs: DashMap<String, String>,
}

impl<B: ScanBackend> MutationCoordinator<B> {
    pub fn new(
        backend: Arc<B>,
        sync: PollingSynchronizer<B>,
        view: Arc<ViewProjector<B>>,
        ranges: Arc<RangeRegistry<B>>,
        history: Arc<HistoryRegistry<B>>,
    ) -> Self {
        let (pending, _) = watch::channel(HashSet::new());
        Self {
            backend,
            sync,
            view,
            ranges,
            history,
            pending,
            tag_inputs: DashMap::new(),
        }
    }

    // ── Optimistic state ─────────────────────────────────────────

    pub fn is_pending(&self, key: &PendingKey) -> bool {
        self.pending.borrow().contains(key)
    }

    pub fn pending(&self) -> HashSet<PendingKey> {
        self.pending.borrow().clone()
    }

    /// Text currently typed into a device's tag input.
    pub fn tag_input(&self, device_id: &str) -> String {
        self.tag_inputs
            .get(device_id)
            .map(|t| t.value().clone())
            .unwrap_or_default()
    }

    pub fn set_tag_input(&self, device_id: &str, text: impl Into<String>) {
        self.tag_inputs.insert(device_id.to_owned(), text.into());
    }

    fn begin(&self, key: PendingKey) -> Result<PendingGuard<'_>, CoreError> {
        let inserted = self.pending.send_if_modified(|set| set.insert(key.clone()));
        if !inserted {
            debug!(?key, "duplicate submit rejected");
            return Err(CoreError::InFlight {
                operation: key.operation(),
            });
        }
        Ok(PendingGuard {
            pending: &self.pending,
            key,
        })
    }

    /// Ask the synchronizer for fresh data. The write already succeeded,
    /// so a failed fetch is only logged.
    async fn refetch(&self) {
        if let Err(e) = self.sync.refresh().await {
            warn!(error = %e, "refresh after mutation failed");
        }
    }

    async fn reload_history(&self) {
        if let Err(e) = self.history.reload().await {
            warn!(error = %e, "history reload after scan failed");
        }
    }

    // ── Tags ─────────────────────────────────────────────────────

    /// Add `tag` to a device. The device's tag input is cleared at once
    /// and restored verbatim if the backend rejects the write.
    pub async fn add_tag(&self, device_id: &str, input: &str) -> Result<MutationOutcome, CoreError> {
        let tag = input.trim();
        if tag.is_empty() {
            return Ok(MutationOutcome::Skipped);
        }
        let _guard = self.begin(PendingKey::AddTag {
            device_id: device_id.to_owned(),
        })?;
        self.tag_inputs.remove(device_id);

        if let Err(e) = self.backend.add_tag(device_id, tag).await {
            self.tag_inputs
                .entry(device_id.to_owned())
                .or_insert_with(|| input.to_owned());
            warn!(device_id, tag, error = %e, "add tag failed");
            return Err(CoreError::transport(Operation::AddTag)(e));
        }

        info!(device_id, tag, "tag added");
        self.refetch().await;
        Ok(MutationOutcome::Completed)
    }

    /// Submit whatever is typed in the device's tag input.
    pub async fn submit_tag_input(&self, device_id: &str) -> Result<MutationOutcome, CoreError> {
        let text = self.tag_input(device_id);
        self.add_tag(device_id, &text).await
    }

    pub async fn remove_tag(
        &self,
        device_id: &str,
        tag: &str,
    ) -> Result<MutationOutcome, CoreError> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Ok(MutationOutcome::Skipped);
        }
        let _guard = self.begin(PendingKey::RemoveTag {
            device_id: device_id.to_owned(),
            tag: tag.to_owned(),
        })?;

        self.backend
            .remove_tag(device_id, tag)
            .await
            .inspect_err(|e| warn!(device_id, tag, error = %e, "remove tag failed"))
            .map_err(CoreError::transport(Operation::RemoveTag))?;

        info!(device_id, tag, "tag removed");
        self.refetch().await;
        Ok(MutationOutcome::Completed)
    }

    // ── Scans ────────────────────────────────────────────────────

    /// Start a scan and mount the device view on the scanned range.
    pub async fn start_scan(&self, ip_range: &str) -> Result<String, CoreError> {
        let ip_range = ip_range.trim();
        if ip_range.is_empty() {
            return Err(CoreError::validation("IP range is required"));
        }
        let _guard = self.begin(PendingKey::StartScan)?;

        let status = self
            .backend
            .start_scan(ip_range)
            .await
            .map_err(CoreError::transport(Operation::StartScan))?;

        info!(ip_range, %status, "scan started");
        self.sync.enter_scope(Some(ip_range.to_owned()));
        self.reload_history().await;
        Ok(status)
    }

    /// Scan a saved range. The range must already be loaded.
    pub async fn scan_range(&self, id: &str) -> Result<String, CoreError> {
        let range = self.ranges.require(id)?;
        debug!(id, range = %range.range, "scanning saved range");
        self.start_scan(&range.range).await
    }

    /// Re-run a historical scan and mount the view on its range.
    pub async fn repeat_scan(&self, id: u64) -> Result<String, CoreError> {
        let record = self.history.require(id)?;
        let _guard = self.begin(PendingKey::RepeatScan(id))?;

        let status = self.history.repeat(id).await?;

        info!(id, ip_range = %record.ip_range, %status, "scan repeated");
        self.sync.enter_scope(Some(record.ip_range));
        self.reload_history().await;
        Ok(status)
    }

    /// Remove every device on the backend. The range selection and the
    /// search override go with them.
    pub async fn clear_devices(&self) -> Result<(), CoreError> {
        let _guard = self.begin(PendingKey::ClearDevices)?;

        self.backend
            .clear_devices()
            .await
            .map_err(CoreError::transport(Operation::ClearDevices))?;

        info!("devices cleared");
        self.view.clear();
        self.sync.reset_scope();
        self.refetch().await;
        Ok(())
    }

    // ── Ranges and history ───────────────────────────────────────

    pub async fn add_range(&self, name: &str, range: &str) -> Result<(), CoreError> {
        let _guard = self.begin(PendingKey::AddRange)?;
        self.ranges.create(name, range).await
    }

    pub async fn delete_range(&self, id: &str) -> Result<(), CoreError> {
        let _guard = self.begin(PendingKey::DeleteRange(id.to_owned()))?;
        self.ranges.delete(id).await
    }

    pub async fn delete_history(&self, id: u64) -> Result<(), CoreError> {
        let _guard = self.begin(PendingKey::DeleteHistory(id))?;
        self.history.delete(id).await
    }

    pub async fn clear_history(&self) -> Result<(), CoreError> {
        let _guard = self.begin(PendingKey::ClearHistory)?;
        self.history.clear().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::fake::FakeBackend;
    use crate::model::{Device, ScanRecord};
    use pretty_assertions::assert_eq;

    struct Harness {
        fake: Arc<FakeBackend>,
        sync: PollingSynchronizer<FakeBackend>,
        view: Arc<ViewProjector<FakeBackend>>,
        history: Arc<HistoryRegistry<FakeBackend>>,
        coordinator: Arc<MutationCoordinator<FakeBackend>>,
    }

    fn harness(devices: Vec<Device>) -> Harness {
        polling_harness(devices, Duration::ZERO)
    }

    fn polling_harness(devices: Vec<Device>, period: Duration) -> Harness {
        let fake = Arc::new(FakeBackend::with_devices(devices));
        let sync = PollingSynchronizer::new(Arc::clone(&fake), period, CancellationToken::new());
        let view = Arc::new(ViewProjector::new(Arc::clone(&fake)));
        let ranges = Arc::new(RangeRegistry::new(Arc::clone(&fake)));
        let history = Arc::new(HistoryRegistry::new(Arc::clone(&fake)));
        let coordinator = Arc::new(MutationCoordinator::new(
            Arc::clone(&fake),
            sync.clone(),
            Arc::clone(&view),
            ranges,
            Arc::clone(&history),
        ));
        Harness {
            fake,
            sync,
            view,
            history,
            coordinator,
        }
    }

    fn displayed_tags(h: &Harness, id: &str) -> Vec<String> {
        h.view
            .view(&h.sync.state())
            .into_iter()
            .find(|d| d.id == id)
            .map(|d| d.tags.into_iter().collect())
            .unwrap_or_default()
    }

    async fn wait_pending(h: &Harness, key: &PendingKey) {
        let mut rx = h.coordinator.pending.subscribe();
        rx.wait_for(|set| set.contains(key)).await.unwrap();
    }

    // ── Tags ────────────────────────────────────────────────────────

    #[tokio::test]
    async fn blank_tag_is_a_no_op() {
        let h = harness(vec![Device::new("1", "10.0.0.5").with_tags(["lab"])]);
        h.sync.refresh().await.unwrap();
        h.coordinator.set_tag_input("1", "   ");

        let outcome = h.coordinator.submit_tag_input("1").await.unwrap();
        assert_eq!(outcome, MutationOutcome::Skipped);
        assert_eq!(
            h.coordinator.remove_tag("1", "").await.unwrap(),
            MutationOutcome::Skipped
        );
        assert_eq!(h.fake.calls("add_tag"), 0);
        assert_eq!(h.fake.calls("remove_tag"), 0);
        assert_eq!(displayed_tags(&h, "1"), ["lab"]);
    }

    #[tokio::test]
    async fn added_tag_shows_up_after_refetch() {
        let h = harness(vec![Device::new("1", "10.0.0.5")]);
        h.sync.refresh().await.unwrap();
        h.coordinator.set_tag_input("1", " lab ");

        let outcome = h.coordinator.submit_tag_input("1").await.unwrap();
        assert_eq!(outcome, MutationOutcome::Completed);
        assert_eq!(h.fake.last_arg("add_tag").as_deref(), Some("1:lab"));
        assert_eq!(h.coordinator.tag_input("1"), "");
        assert_eq!(displayed_tags(&h, "1"), ["lab"]);
    }

    #[tokio::test]
    async fn failed_add_restores_input_and_keeps_tags() {
        let h = harness(vec![Device::new("1", "10.0.0.5")]);
        h.sync.refresh().await.unwrap();
        h.fake.fail("add_tag");
        h.coordinator.set_tag_input("1", " lab ");

        let err = h.coordinator.submit_tag_input("1").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to add tag");
        assert_eq!(h.coordinator.tag_input("1"), " lab ");
        assert!(displayed_tags(&h, "1").is_empty());
        assert!(h.coordinator.pending().is_empty());
    }

    #[tokio::test]
    async fn input_is_cleared_while_in_flight() {
        let h = harness(vec![Device::new("1", "10.0.0.5")]);
        let release = h.fake.hold("add_tag");
        h.coordinator.set_tag_input("1", "lab");

        let task = tokio::spawn({
            let c = Arc::clone(&h.coordinator);
            async move { c.submit_tag_input("1").await }
        });
        let key = PendingKey::AddTag {
            device_id: "1".into(),
        };
        wait_pending(&h, &key).await;
        assert_eq!(h.coordinator.tag_input("1"), "");

        release.send(()).unwrap();
        task.await.unwrap().unwrap();
        assert!(!h.coordinator.is_pending(&key));
    }

    #[tokio::test]
    async fn failed_remove_keeps_tag_displayed() {
        let h = harness(vec![Device::new("1", "10.0.0.5").with_tags(["lab", "office"])]);
        h.sync.refresh().await.unwrap();
        h.fake.fail("remove_tag");

        let err = h.coordinator.remove_tag("1", "lab").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to remove tag");
        assert_eq!(displayed_tags(&h, "1"), ["lab", "office"]);
    }

    #[tokio::test]
    async fn duplicate_submit_is_rejected_without_network() {
        let h = harness(vec![Device::new("1", "10.0.0.5"), Device::new("2", "10.0.0.6")]);
        let release = h.fake.hold("add_tag");

        let first = tokio::spawn({
            let c = Arc::clone(&h.coordinator);
            async move { c.add_tag("1", "lab").await }
        });
        wait_pending(
            &h,
            &PendingKey::AddTag {
                device_id: "1".into(),
            },
        )
        .await;

        let err = h.coordinator.add_tag("1", "other").await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::InFlight {
                operation: Operation::AddTag
            }
        ));

        // Another row is independent.
        h.coordinator.add_tag("2", "office").await.unwrap();
        assert_eq!(h.fake.calls("add_tag"), 2);

        release.send(()).unwrap();
        first.await.unwrap().unwrap();
    }

    // ── Scans ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn blank_scan_range_is_rejected() {
        let h = harness(Vec::new());
        let err = h.coordinator.start_scan("  ").await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(h.fake.calls("start_scan"), 0);
    }

    #[tokio::test]
    async fn start_scan_mounts_scanned_range() {
        let h = harness(vec![Device::new("1", "10.0.0.5"), Device::new("2", "10.0.1.5")]);
        let mut rx = h.sync.subscribe();

        let status = h.coordinator.start_scan("10.0.0.0/24").await.unwrap();
        assert_eq!(status, "scan started");
        rx.wait_for(|s| s.loaded).await.unwrap();

        let ids: Vec<String> = h.view.view(&h.sync.state()).into_iter().map(|d| d.id).collect();
        assert_eq!(ids, ["1"]);
        assert_eq!(h.history.list().len(), 1);
    }

    #[tokio::test]
    async fn failed_scan_leaves_scope_alone() {
        let h = harness(Vec::new());
        h.fake.fail("start_scan");

        let err = h.coordinator.start_scan("10.0.0.0/24").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to start scan");
        assert_eq!(h.sync.active_range(), None);
        assert!(!h.coordinator.is_pending(&PendingKey::StartScan));
    }

    #[tokio::test]
    async fn scan_saved_range_uses_its_expression() {
        let h = harness(vec![Device::new("1", "10.0.0.5")]);
        h.coordinator.add_range("Lab", "10.0.0.0/24").await.unwrap();

        h.coordinator.scan_range("1").await.unwrap();
        assert_eq!(h.fake.last_arg("start_scan").as_deref(), Some("10.0.0.0/24"));
        assert_eq!(h.sync.active_range().as_deref(), Some("10.0.0.0/24"));

        let err = h.coordinator.scan_range("99").await.unwrap_err();
        assert!(matches!(err, CoreError::RangeNotFound { .. }));
        assert_eq!(h.fake.calls("start_scan"), 1);
    }

    #[tokio::test]
    async fn repeat_unknown_record_makes_no_call() {
        let h = harness(Vec::new());
        let err = h.coordinator.repeat_scan(42).await.unwrap_err();
        assert!(matches!(err, CoreError::HistoryNotFound { id: 42 }));
        assert_eq!(h.fake.calls("repeat_scan"), 0);
    }

    #[tokio::test]
    async fn repeat_marks_row_and_mounts_its_range() {
        let h = harness(Vec::new());
        h.fake.set_history(vec![ScanRecord {
            id: 3,
            ip_range: "192.168.1.0/24".into(),
            started_at: None,
            device_count: 4,
        }]);
        h.history.reload().await.unwrap();
        let release = h.fake.hold("repeat_scan");

        let task = tokio::spawn({
            let c = Arc::clone(&h.coordinator);
            async move { c.repeat_scan(3).await }
        });
        wait_pending(&h, &PendingKey::RepeatScan(3)).await;
        assert!(!h.coordinator.is_pending(&PendingKey::RepeatScan(4)));

        release.send(()).unwrap();
        assert_eq!(task.await.unwrap().unwrap(), "scan repeated");
        assert_eq!(h.sync.active_range().as_deref(), Some("192.168.1.0/24"));
        assert!(h.coordinator.pending().is_empty());
    }

    // ── Clear ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn clear_resets_range_and_search() {
        let h = harness(vec![Device::new("1", "10.0.0.5")]);
        let mut rx = h.sync.subscribe();
        h.sync.enter_scope(Some("10.0.0.0/24".into()));
        rx.wait_for(|s| s.loaded).await.unwrap();
        h.view.search("lab").await.unwrap();

        h.coordinator.clear_devices().await.unwrap();

        let state = h.sync.state();
        assert_eq!(state.active_range, None);
        assert!(!h.view.is_searching());
        assert!(state.snapshot.is_empty());
        assert!(h.fake.devices().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn clear_keeps_unfiltered_polling_alive() {
        let h = polling_harness(vec![Device::new("1", "10.0.0.5")], Duration::from_secs(5));
        let mut rx = h.sync.subscribe();
        h.sync.enter_scope(None);
        rx.wait_for(|s| s.loaded).await.unwrap();

        h.coordinator.clear_devices().await.unwrap();
        assert!(h.sync.state().mounted);
        let after_clear = h.fake.calls("list_devices");

        h.fake.set_devices(vec![Device::new("9", "10.0.0.9")]);
        tokio::time::sleep(Duration::from_secs(30)).await;

        assert!(h.fake.calls("list_devices") > after_clear);
        let ids: Vec<String> = h.view.view(&h.sync.state()).into_iter().map(|d| d.id).collect();
        assert_eq!(ids, ["9"]);
    }

    #[tokio::test]
    async fn failed_clear_keeps_everything() {
        let h = harness(vec![Device::new("1", "10.0.0.5")]);
        let mut rx = h.sync.subscribe();
        h.sync.enter_scope(Some("10.0.0.0/24".into()));
        rx.wait_for(|s| s.loaded).await.unwrap();
        h.fake.fail("clear_devices");

        let err = h.coordinator.clear_devices().await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to clear devices");
        assert_eq!(h.sync.active_range().as_deref(), Some("10.0.0.0/24"));
        assert_eq!(h.sync.snapshot().len(), 1);
    }

    // ── Ranges and history ──────────────────────────────────────────

    #[tokio::test]
    async fn range_and_history_mutations_delegate() {
        let h = harness(Vec::new());
        h.coordinator.add_range("Lab", "10.0.0.0/24").await.unwrap();
        h.coordinator.delete_range("1").await.unwrap();
        assert_eq!(h.fake.last_arg("delete_range").as_deref(), Some("1"));

        h.coordinator.start_scan("10.0.0.0/24").await.unwrap();
        h.coordinator.delete_history(1).await.unwrap();
        h.coordinator.clear_history().await.unwrap();
        assert!(h.history.list().is_empty());
        assert!(h.coordinator.pending().is_empty());
    }
}
