use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One past scan. Immutable once created; only deletion changes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRecord {
    /// Monotonic identifier assigned by the backend.
    pub id: u64,
    pub ip_range: String,
    pub started_at: Option<DateTime<Utc>>,
    /// Devices found online when the scan ran.
    pub device_count: u32,
}
