// lanscope-api: Async Rust client for the network-scan backend

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

mod devices;
mod ranges;
mod scan;

pub use client::ScanClient;
pub use error::Error;
pub use models::{
    CreateRangeRequest, DeviceEntry, IpRangeEntry, ScanHistoryEntry, ScanStatusResponse,
};
pub use transport::{TlsMode, TransportConfig};
