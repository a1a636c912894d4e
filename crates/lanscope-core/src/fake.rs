// In-memory `ScanBackend` for engine tests.
//
// Behaves like a tiny backend: mutations change the stored state, reads
// return it. Any method can be made to fail or be held until a test
// releases it, which is how ordering races are staged.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use tokio::sync::oneshot;

use crate::backend::{BackendError, ScanBackend};
use crate::model::{AddressRange, Device, ScanRecord};

#[derive(Default)]
struct FakeState {
    devices: Vec<Device>,
    search_results: Vec<Device>,
    ranges: Vec<AddressRange>,
    history: Vec<ScanRecord>,
    next_id: u64,
    failing: HashSet<&'static str>,
    holds: HashMap<&'static str, VecDeque<oneshot::Receiver<()>>>,
    calls: Vec<(&'static str, String)>,
}

#[derive(Default)]
pub(crate) struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_devices(devices: Vec<Device>) -> Self {
        let fake = Self::new();
        fake.set_devices(devices);
        fake
    }

    // ── Test controls ───────────────────────────────────────────────

    pub(crate) fn set_devices(&self, devices: Vec<Device>) {
        self.state.lock().unwrap().devices = devices;
    }

    pub(crate) fn set_search_results(&self, devices: Vec<Device>) {
        self.state.lock().unwrap().search_results = devices;
    }

    pub(crate) fn set_ranges(&self, ranges: Vec<AddressRange>) {
        self.state.lock().unwrap().ranges = ranges;
    }

    pub(crate) fn set_history(&self, history: Vec<ScanRecord>) {
        let mut state = self.state.lock().unwrap();
        state.next_id = history.iter().map(|r| r.id).max().unwrap_or(0);
        state.history = history;
    }

    pub(crate) fn devices(&self) -> Vec<Device> {
        self.state.lock().unwrap().devices.clone()
    }

    /// Make every subsequent call to `method` fail with HTTP 500.
    pub(crate) fn fail(&self, method: &'static str) {
        self.state.lock().unwrap().failing.insert(method);
    }

    pub(crate) fn recover(&self, method: &'static str) {
        self.state.lock().unwrap().failing.remove(method);
    }

    /// Hold the next call to `method` until the returned sender fires (or
    /// is dropped). The call reads state at release time.
    pub(crate) fn hold(&self, method: &'static str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state
            .lock()
            .unwrap()
            .holds
            .entry(method)
            .or_default()
            .push_back(rx);
        tx
    }

    /// Number of calls made to `method`.
    pub(crate) fn calls(&self, method: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|(m, _)| *m == method)
            .count()
    }

    /// Argument of the most recent call to `method`.
    pub(crate) fn last_arg(&self, method: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .rev()
            .find(|(m, _)| *m == method)
            .map(|(_, arg)| arg.clone())
    }

    // ── Internals ───────────────────────────────────────────────────

    /// Record the call, wait out any hold, then report the failure toggle.
    async fn enter(&self, method: &'static str, arg: String) -> Result<(), BackendError> {
        let hold = {
            let mut state = self.state.lock().unwrap();
            state.calls.push((method, arg));
            state.holds.get_mut(method).and_then(VecDeque::pop_front)
        };
        if let Some(rx) = hold {
            let _ = rx.await;
        }
        if self.state.lock().unwrap().failing.contains(method) {
            return Err(BackendError::Http {
                status: 500,
                body: format!("{method} exploded"),
            });
        }
        Ok(())
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut FakeState) -> T) -> T {
        f(&mut self.state.lock().unwrap())
    }
}

impl ScanBackend for FakeBackend {
    async fn list_devices(&self) -> Result<Vec<Device>, BackendError> {
        self.enter("list_devices", String::new()).await?;
        Ok(self.with_state(|s| s.devices.clone()))
    }

    async fn search_devices(&self, query: &str) -> Result<Vec<Device>, BackendError> {
        self.enter("search_devices", query.to_owned()).await?;
        Ok(self.with_state(|s| s.search_results.clone()))
    }

    async fn clear_devices(&self) -> Result<(), BackendError> {
        self.enter("clear_devices", String::new()).await?;
        self.with_state(|s| s.devices.clear());
        Ok(())
    }

    async fn add_tag(&self, device_id: &str, tag: &str) -> Result<(), BackendError> {
        self.enter("add_tag", format!("{device_id}:{tag}")).await?;
        self.with_state(|s| {
            if let Some(d) = s.devices.iter_mut().find(|d| d.id == device_id) {
                d.tags.insert(tag.to_owned());
            }
        });
        Ok(())
    }

    async fn remove_tag(&self, device_id: &str, tag: &str) -> Result<(), BackendError> {
        self.enter("remove_tag", format!("{device_id}:{tag}")).await?;
        self.with_state(|s| {
            if let Some(d) = s.devices.iter_mut().find(|d| d.id == device_id) {
                d.tags.shift_remove(tag);
            }
        });
        Ok(())
    }

    async fn start_scan(&self, ip_range: &str) -> Result<String, BackendError> {
        self.enter("start_scan", ip_range.to_owned()).await?;
        self.with_state(|s| {
            s.next_id += 1;
            let record = ScanRecord {
                id: s.next_id,
                ip_range: ip_range.to_owned(),
                started_at: None,
                device_count: 0,
            };
            s.history.push(record);
        });
        Ok("scan started".into())
    }

    async fn list_ranges(&self) -> Result<Vec<AddressRange>, BackendError> {
        self.enter("list_ranges", String::new()).await?;
        Ok(self.with_state(|s| s.ranges.clone()))
    }

    async fn create_range(&self, name: &str, range: &str) -> Result<(), BackendError> {
        self.enter("create_range", format!("{name}:{range}")).await?;
        self.with_state(|s| {
            let id = (s.ranges.len() + 1).to_string();
            s.ranges.push(AddressRange {
                id,
                name: name.to_owned(),
                range: range.to_owned(),
            });
        });
        Ok(())
    }

    async fn delete_range(&self, id: &str) -> Result<(), BackendError> {
        self.enter("delete_range", id.to_owned()).await?;
        self.with_state(|s| s.ranges.retain(|r| r.id != id));
        Ok(())
    }

    async fn list_history(&self) -> Result<Vec<ScanRecord>, BackendError> {
        self.enter("list_history", String::new()).await?;
        Ok(self.with_state(|s| s.history.clone()))
    }

    async fn repeat_scan(&self, id: u64) -> Result<String, BackendError> {
        self.enter("repeat_scan", id.to_string()).await?;
        Ok("scan repeated".into())
    }

    async fn delete_history(&self, id: u64) -> Result<(), BackendError> {
        self.enter("delete_history", id.to_string()).await?;
        self.with_state(|s| s.history.retain(|r| r.id != id));
        Ok(())
    }

    async fn clear_history(&self) -> Result<(), BackendError> {
        self.enter("clear_history", String::new()).await?;
        self.with_state(|s| s.history.clear());
        Ok(())
    }
}
