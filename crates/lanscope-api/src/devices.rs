// Device endpoints
//
// `GET /devices` is the polling hot path. Its body is deliberately
// lenient: a 2xx response that is not a JSON array (`null`, `{}`, empty
// body) is an empty device set, not an error.

use serde_json::Value;
use tracing::debug;

use crate::client::{ScanClient, decode};
use crate::error::Error;
use crate::models::{DeviceEntry, TagRequest};

impl ScanClient {
    /// List every device the backend currently knows about.
    ///
    /// `GET /devices`
    pub async fn list_devices(&self) -> Result<Vec<DeviceEntry>, Error> {
        let url = self.url("devices")?;
        let body = self.get_text(url).await?;
        devices_from_body(&body)
    }

    /// Free-text search over devices (address, hostname, tags).
    ///
    /// `GET /devices/search?q={query}`
    pub async fn search_devices(&self, query: &str) -> Result<Vec<DeviceEntry>, Error> {
        let mut url = self.url("devices/search")?;
        url.query_pairs_mut().append_pair("q", query);
        debug!(query, "searching devices");
        let body = self.get_text(url).await?;
        devices_from_body(&body)
    }

    /// Remove every device from the backend.
    ///
    /// `DELETE /clear`
    pub async fn clear_devices(&self) -> Result<(), Error> {
        let url = self.url("clear")?;
        debug!("clearing all devices");
        self.delete(url).await
    }

    /// Attach a tag to a device.
    ///
    /// `POST /devices/{id}/tags` with `{"tag": "..."}`
    pub async fn add_tag(&self, device_id: &str, tag: &str) -> Result<(), Error> {
        let url = self.tags_url(device_id)?;
        debug!(device_id, tag, "adding tag");
        self.post_unit(url, &TagRequest { tag }).await
    }

    /// Detach a tag from a device.
    ///
    /// `DELETE /devices/{id}/tags` with `{"tag": "..."}`
    pub async fn remove_tag(&self, device_id: &str, tag: &str) -> Result<(), Error> {
        let url = self.tags_url(device_id)?;
        debug!(device_id, tag, "removing tag");
        self.delete_json(url, &TagRequest { tag }).await
    }

    fn tags_url(&self, device_id: &str) -> Result<url::Url, Error> {
        let mut url = self.url("devices")?;
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .push(device_id)
            .push("tags");
        Ok(url)
    }
}

/// Decode a device listing, degrading any non-array payload to `[]`.
fn devices_from_body(body: &str) -> Result<Vec<DeviceEntry>, Error> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let value: Value = decode(body)?;
    if !value.is_array() {
        debug!("device payload is not an array; treating as empty");
        return Ok(Vec::new());
    }
    serde_json::from_value(value).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: body.to_owned(),
    })
}
