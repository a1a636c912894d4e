// Scan and scan-history endpoints

use tracing::debug;

use crate::client::{ScanClient, decode};
use crate::error::Error;
use crate::models::{ScanHistoryEntry, ScanRequest, ScanStatusResponse};

impl ScanClient {
    /// Begin a scan over an address range. Returns the backend status text.
    ///
    /// `POST /scan` with `{"ip_range": "..."}`
    pub async fn start_scan(&self, ip_range: &str) -> Result<String, Error> {
        let url = self.url("scan")?;
        debug!(ip_range, "starting scan");
        let body = self.post_text(url, &ScanRequest { ip_range }).await?;
        status_from_body(&body)
    }

    /// List past scans.
    ///
    /// `GET /scan-history`
    pub async fn list_history(&self) -> Result<Vec<ScanHistoryEntry>, Error> {
        let url = self.url("scan-history")?;
        let history: Option<Vec<ScanHistoryEntry>> = self.get(url).await?;
        Ok(history.unwrap_or_default())
    }

    /// Re-run the scan captured by a history record.
    ///
    /// `POST /scan/repeat?id={id}`
    pub async fn repeat_scan(&self, id: u64) -> Result<String, Error> {
        let mut url = self.url("scan/repeat")?;
        url.query_pairs_mut().append_pair("id", &id.to_string());
        debug!(id, "repeating scan");
        let body = self.post_text(url, &serde_json::json!({})).await?;
        status_from_body(&body)
    }

    /// Delete one history record.
    ///
    /// `DELETE /scan-history/{id}`
    pub async fn delete_history(&self, id: u64) -> Result<(), Error> {
        let url = self.url(&format!("scan-history/{id}"))?;
        debug!(id, "deleting history record");
        self.delete(url).await
    }

    /// Delete every history record.
    ///
    /// `DELETE /scan-history`
    pub async fn clear_history(&self) -> Result<(), Error> {
        let url = self.url("scan-history")?;
        debug!("clearing scan history");
        self.delete(url).await
    }
}

/// Extract the status message; an empty 2xx body carries no message.
fn status_from_body(body: &str) -> Result<String, Error> {
    if body.trim().is_empty() {
        return Ok(String::new());
    }
    let resp: ScanStatusResponse = decode(body)?;
    Ok(resp.status)
}
