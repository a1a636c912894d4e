// ── Domain model ──
//
// Canonical types the engine works with. Wire shapes live in
// `lanscope_api::models`; `crate::convert` bridges the two.

pub mod device;
pub mod history;
pub mod range;

pub use device::{Device, DeviceStatus};
pub use history::ScanRecord;
pub use range::AddressRange;
