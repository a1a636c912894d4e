// Scan backend HTTP client
//
// Wraps `reqwest::Client` with base-URL path construction and status
// handling. Endpoint groups (devices, ranges, scans) are implemented as
// inherent methods in separate files to keep this module focused on
// transport mechanics.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Longest body excerpt carried in an `Error::Http`.
const BODY_PREVIEW_CHARS: usize = 200;

/// Raw HTTP client for the network-scan backend.
///
/// Cheap to clone: the underlying `reqwest::Client` is reference counted.
#[derive(Debug, Clone)]
pub struct ScanClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ScanClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the backend root, e.g. `http://localhost:8080`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for a backend path (`{base}/{path}`).
    ///
    /// Any path prefix on the base URL is preserved.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and decode the JSON body.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);
        let resp = self.http.get(url).send().await?;
        let body = Self::success_body(resp).await?;
        decode(&body)
    }

    /// Send a GET request and return the raw body of a 2xx response.
    pub(crate) async fn get_text(&self, url: Url) -> Result<String, Error> {
        debug!("GET {}", url);
        let resp = self.http.get(url).send().await?;
        Self::success_body(resp).await
    }

    /// Send a POST request with a JSON body and return the raw body of a
    /// 2xx response.
    pub(crate) async fn post_text(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<String, Error> {
        debug!("POST {}", url);
        let resp = self.http.post(url).json(body).send().await?;
        Self::success_body(resp).await
    }

    /// Send a POST request whose response body is irrelevant.
    pub(crate) async fn post_unit(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<(), Error> {
        debug!("POST {}", url);
        let resp = self.http.post(url).json(body).send().await?;
        Self::success_body(resp).await.map(drop)
    }

    /// Send a DELETE request.
    pub(crate) async fn delete(&self, url: Url) -> Result<(), Error> {
        debug!("DELETE {}", url);
        let resp = self.http.delete(url).send().await?;
        Self::success_body(resp).await.map(drop)
    }

    /// Send a DELETE request carrying a JSON body.
    pub(crate) async fn delete_json(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<(), Error> {
        debug!("DELETE {}", url);
        let resp = self.http.delete(url).json(body).send().await?;
        Self::success_body(resp).await.map(drop)
    }

    /// Return the body text of a 2xx response, or an `Error::Http` carrying
    /// the status and a short body preview.
    async fn success_body(resp: reqwest::Response) -> Result<String, Error> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                body: body.chars().take(BODY_PREVIEW_CHARS).collect(),
            });
        }
        Ok(resp.text().await?)
    }
}

pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| {
        let preview: String = body.chars().take(BODY_PREVIEW_CHARS).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.to_owned(),
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ScanClient {
        ScanClient::with_client(reqwest::Client::new(), Url::parse(base).unwrap())
    }

    #[test]
    fn url_joins_without_double_slashes() {
        let c = client("http://localhost:8080/");
        assert_eq!(
            c.url("/devices").unwrap().as_str(),
            "http://localhost:8080/devices"
        );
    }

    #[test]
    fn url_keeps_base_path_prefix() {
        let c = client("http://scanner.lan/api");
        assert_eq!(
            c.url("scan-history").unwrap().as_str(),
            "http://scanner.lan/api/scan-history"
        );
    }

    #[test]
    fn decode_reports_body_preview() {
        let err = decode::<Vec<u32>>("<html>oops</html>").unwrap_err();
        match err {
            Error::Deserialization { message, body } => {
                assert!(message.contains("body preview"));
                assert_eq!(body, "<html>oops</html>");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
