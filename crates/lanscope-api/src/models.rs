// Wire types for the scan backend
//
// These mirror the JSON the backend emits as closely as possible. Field
// normalization (timestamps, status, tag de-duplication) happens in
// `lanscope-core`; this layer only tolerates the shapes seen in the wild.

use serde::{Deserialize, Deserializer, Serialize};

/// Identifiers arrive as either JSON strings or numbers depending on the
/// backend revision. Both are carried as strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(u64),
}

fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

/// Null-tolerant sequence: Go backends serialize an empty slice as `null`.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A device as reported by `GET /devices`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEntry {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub ip_address: String,
    #[serde(default)]
    pub mac_address: String,
    #[serde(default)]
    pub hostname: String,
    /// `"online"` / `"offline"` on current backends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Boolean liveness flag used by older backends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_online: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_seen: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<String>,
}

/// A saved address range (`/ranges`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpRangeEntry {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    pub range: String,
}

/// Body of `POST /ranges`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateRangeRequest {
    pub name: String,
    pub range: String,
}

/// A past scan (`/scan-history`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanHistoryEntry {
    pub id: u64,
    pub ip_range: String,
    pub started_at: String,
    #[serde(default)]
    pub device_count: u32,
}

/// Response of `POST /scan` and `POST /scan/repeat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStatusResponse {
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ScanRequest<'a> {
    pub ip_range: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct TagRequest<'a> {
    pub tag: &'a str,
}
