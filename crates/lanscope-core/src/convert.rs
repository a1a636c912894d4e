// ── API-to-domain type conversions ──
//
// Bridges raw `lanscope_api` wire types into `lanscope_core::model`. Each
// `From` impl normalizes status and timestamps and de-duplicates tags.

use chrono::{DateTime, Datelike, Utc};

use lanscope_api::models::{DeviceEntry, IpRangeEntry, ScanHistoryEntry};

use crate::model::{AddressRange, Device, DeviceStatus, ScanRecord};

// ── Helpers ────────────────────────────────────────────────────────

/// Backends report "never" as a zero time (`0001-01-01T00:00:00Z`).
/// Anything at or before this year is treated as not seen.
const NOT_SEEN_CUTOFF_YEAR: i32 = 2000;

/// Parse an RFC 3339 timestamp, mapping zero times and garbage to `None`.
fn parse_seen(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .filter(|dt| dt.year() > NOT_SEEN_CUTOFF_YEAR)
}

fn parse_status(status: Option<&str>, is_online: Option<bool>) -> DeviceStatus {
    match status.map(str::trim) {
        Some(s) if s.eq_ignore_ascii_case("online") => DeviceStatus::Online,
        Some(s) if s.eq_ignore_ascii_case("offline") => DeviceStatus::Offline,
        _ if is_online == Some(true) => DeviceStatus::Online,
        _ => DeviceStatus::Offline,
    }
}

// ── Conversions ────────────────────────────────────────────────────

impl From<DeviceEntry> for Device {
    fn from(d: DeviceEntry) -> Self {
        let status = parse_status(d.status.as_deref(), d.is_online);
        Self {
            id: d.id,
            address: d.ip_address,
            mac: d.mac_address,
            hostname: d.hostname,
            status,
            manufacturer: d.manufacturer.filter(|m| !m.trim().is_empty()),
            tags: d.tags.into_iter().collect(),
            first_seen: parse_seen(d.first_seen.as_deref()),
            last_seen: parse_seen(d.last_seen.as_deref()),
        }
    }
}

impl From<IpRangeEntry> for AddressRange {
    fn from(r: IpRangeEntry) -> Self {
        Self {
            id: r.id,
            name: r.name,
            range: r.range,
        }
    }
}

impl From<ScanHistoryEntry> for ScanRecord {
    fn from(h: ScanHistoryEntry) -> Self {
        Self {
            id: h.id,
            ip_range: h.ip_range,
            started_at: parse_seen(Some(&h.started_at)),
            device_count: h.device_count,
        }
    }
}
