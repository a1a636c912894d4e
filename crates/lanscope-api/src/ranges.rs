// Saved address range endpoints

use tracing::debug;

use crate::client::ScanClient;
use crate::error::Error;
use crate::models::{CreateRangeRequest, IpRangeEntry};

impl ScanClient {
    /// List saved ranges.
    ///
    /// `GET /ranges`
    pub async fn list_ranges(&self) -> Result<Vec<IpRangeEntry>, Error> {
        let url = self.url("ranges")?;
        let ranges: Option<Vec<IpRangeEntry>> = self.get(url).await?;
        Ok(ranges.unwrap_or_default())
    }

    /// Save a new range. The backend assigns the identifier.
    ///
    /// `POST /ranges` with `{"name": "...", "range": "..."}`
    pub async fn create_range(&self, request: &CreateRangeRequest) -> Result<(), Error> {
        let url = self.url("ranges")?;
        debug!(name = %request.name, range = %request.range, "creating range");
        self.post_unit(url, request).await
    }

    /// Delete a saved range.
    ///
    /// `DELETE /ranges/{id}`
    pub async fn delete_range(&self, id: &str) -> Result<(), Error> {
        let mut url = self.url("ranges")?;
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .push(id);
        debug!(id, "deleting range");
        self.delete(url).await
    }
}
