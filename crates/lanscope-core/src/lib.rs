//! Client-side device synchronization and view-filtering engine.
//!
//! This crate sits between `lanscope-api` and a view (the CLI, or anything
//! else that renders a device table):
//!
//! - **[`PollingSynchronizer`]**: Sole owner of the device Snapshot.
//!   Fetches on scope entry, on explicit refresh, and on a fixed cadence.
//!   Successful polls replace the Snapshot wholesale; failed polls keep the
//!   last good one and raise a fixed error message. Completions are ordered
//!   by submission so an old response can never overwrite a newer one.
//!
//! - **[`MutationCoordinator`]**: User-triggered writes (tags, scans,
//!   clear, ranges, history). Applies optimistic markers immediately, rolls
//!   them back on failure, and asks the synchronizer to re-fetch on success.
//!   It never touches the Snapshot.
//!
//! - **[`ViewProjector`]**: Derives the displayed device list from the
//!   Snapshot, the active range and an optional search override.
//!
//! - **[`RangeRegistry`] / [`HistoryRegistry`]**: CRUD façades over saved
//!   ranges and past scans.
//!
//! - **[`Session`]**: Wires all of the above over one [`ScanBackend`].
//!
//! Address matching lives in [`matcher`] and is pure.

pub mod backend;
pub mod config;
pub mod convert;
pub mod coordinator;
pub mod error;
pub mod matcher;
pub mod model;
pub mod registry;
pub mod session;
pub mod sync;
pub mod view;

#[cfg(test)]
pub(crate) mod fake;

// ── Primary re-exports ──────────────────────────────────────────────
pub use backend::{BackendError, ScanBackend};
pub use config::{SessionConfig, TlsMode};
pub use coordinator::{MutationCoordinator, MutationOutcome, PendingKey};
pub use error::{CoreError, Operation};
pub use matcher::{Cidr, CidrError};
pub use model::{AddressRange, Device, DeviceStatus, ScanRecord};
pub use registry::{HistoryRegistry, RangeRegistry};
pub use session::Session;
pub use sync::{FetchOutcome, PollingSynchronizer, SyncPhase, SyncState};
pub use view::{SearchOutcome, SearchState, ViewFrame, ViewProjector, ViewWatcher, project};
