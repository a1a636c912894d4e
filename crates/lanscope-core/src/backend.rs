// ── Remote collaborator seam ──
//
// Every component talks to the scan backend through `ScanBackend`. The
// production implementation is `lanscope_api::ScanClient`; tests plug in an
// in-memory fake. Methods return domain types so callers never see wire
// shapes.

use std::future::Future;

use lanscope_api::{CreateRangeRequest, ScanClient};

use crate::model::{AddressRange, Device, ScanRecord};

/// Error type produced by every backend call.
pub type BackendError = lanscope_api::Error;

/// Request/response contract of the network-scan backend.
pub trait ScanBackend: Send + Sync + 'static {
    fn list_devices(&self) -> impl Future<Output = Result<Vec<Device>, BackendError>> + Send;

    fn search_devices(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<Device>, BackendError>> + Send;

    fn clear_devices(&self) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn add_tag(
        &self,
        device_id: &str,
        tag: &str,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn remove_tag(
        &self,
        device_id: &str,
        tag: &str,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Begin a scan. Resolves to the backend's status message.
    fn start_scan(&self, ip_range: &str)
    -> impl Future<Output = Result<String, BackendError>> + Send;

    fn list_ranges(&self) -> impl Future<Output = Result<Vec<AddressRange>, BackendError>> + Send;

    fn create_range(
        &self,
        name: &str,
        range: &str,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn delete_range(&self, id: &str) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn list_history(&self) -> impl Future<Output = Result<Vec<ScanRecord>, BackendError>> + Send;

    /// Re-run a historical scan. Resolves to the backend's status message.
    fn repeat_scan(&self, id: u64) -> impl Future<Output = Result<String, BackendError>> + Send;

    fn delete_history(&self, id: u64) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn clear_history(&self) -> impl Future<Output = Result<(), BackendError>> + Send;
}

fn into_domain<W, D: From<W>>(entries: Vec<W>) -> Vec<D> {
    entries.into_iter().map(D::from).collect()
}

impl ScanBackend for ScanClient {
    async fn list_devices(&self) -> Result<Vec<Device>, BackendError> {
        ScanClient::list_devices(self).await.map(into_domain)
    }

    async fn search_devices(&self, query: &str) -> Result<Vec<Device>, BackendError> {
        ScanClient::search_devices(self, query).await.map(into_domain)
    }

    async fn clear_devices(&self) -> Result<(), BackendError> {
        ScanClient::clear_devices(self).await
    }

    async fn add_tag(&self, device_id: &str, tag: &str) -> Result<(), BackendError> {
        ScanClient::add_tag(self, device_id, tag).await
    }

    async fn remove_tag(&self, device_id: &str, tag: &str) -> Result<(), BackendError> {
        ScanClient::remove_tag(self, device_id, tag).await
    }

    async fn start_scan(&self, ip_range: &str) -> Result<String, BackendError> {
        ScanClient::start_scan(self, ip_range).await
    }

    async fn list_ranges(&self) -> Result<Vec<AddressRange>, BackendError> {
        ScanClient::list_ranges(self).await.map(into_domain)
    }

    async fn create_range(&self, name: &str, range: &str) -> Result<(), BackendError> {
        let request = CreateRangeRequest {
            name: name.to_owned(),
            range: range.to_owned(),
        };
        ScanClient::create_range(self, &request).await
    }

    async fn delete_range(&self, id: &str) -> Result<(), BackendError> {
        ScanClient::delete_range(self, id).await
    }

    async fn list_history(&self) -> Result<Vec<ScanRecord>, BackendError> {
        ScanClient::list_history(self).await.map(into_domain)
    }

    async fn repeat_scan(&self, id: u64) -> Result<String, BackendError> {
        ScanClient::repeat_scan(self, id).await
    }

    async fn delete_history(&self, id: u64) -> Result<(), BackendError> {
        ScanClient::delete_history(self, id).await
    }

    async fn clear_history(&self) -> Result<(), BackendError> {
        ScanClient::clear_history(self).await
    }
}
