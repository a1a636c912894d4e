// ── Device domain types ──

use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Device lifecycle status as last reported by the scanner.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    #[default]
    Offline,
}

/// A discovered network device.
///
/// `id` is the stable identity. The address is a mutable attribute and may
/// repeat across devices over time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub address: String,
    pub mac: String,
    pub hostname: String,
    pub status: DeviceStatus,
    pub manufacturer: Option<String>,
    /// Unique tags in insertion order.
    pub tags: IndexSet<String>,
    pub first_seen: Option<DateTime<Utc>>,
    /// `None` means the device has not been seen yet.
    pub last_seen: Option<DateTime<Utc>>,
}

impl Device {
    /// Minimal device, mostly useful for tests and fixtures.
    pub fn new(id: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            address: address.into(),
            mac: String::new(),
            hostname: String::new(),
            status: DeviceStatus::Offline,
            manufacturer: None,
            tags: IndexSet::new(),
            first_seen: None,
            last_seen: None,
        }
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn is_online(&self) -> bool {
        self.status == DeviceStatus::Online
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Hostname when known, otherwise the address.
    pub fn display_name(&self) -> &str {
        if self.hostname.is_empty() {
            &self.address
        } else {
            &self.hostname
        }
    }
}
