// ── Core error types ──
//
// User-facing errors from lanscope-core. Transport failures never reach a
// view as raw HTTP or JSON errors: each one is tagged with the operation
// that failed and displays that operation's fixed message. The backend
// error stays reachable through `source()` for logging.

use thiserror::Error;

use crate::matcher::CidrError;

/// Every remote operation the engine performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
pub enum Operation {
    #[strum(to_string = "fetch devices")]
    FetchDevices,
    #[strum(to_string = "search devices")]
    SearchDevices,
    #[strum(to_string = "start scan")]
    StartScan,
    #[strum(to_string = "clear devices")]
    ClearDevices,
    #[strum(to_string = "add tag")]
    AddTag,
    #[strum(to_string = "remove tag")]
    RemoveTag,
    #[strum(to_string = "repeat scan")]
    RepeatScan,
    #[strum(to_string = "load ranges")]
    LoadRanges,
    #[strum(to_string = "add range")]
    AddRange,
    #[strum(to_string = "delete range")]
    DeleteRange,
    #[strum(to_string = "load scan history")]
    LoadHistory,
    #[strum(to_string = "delete history")]
    DeleteHistory,
    #[strum(to_string = "clear history")]
    ClearHistory,
}

impl Operation {
    /// Short, fixed message shown when this operation fails remotely.
    pub fn failure_message(self) -> &'static str {
        match self {
            Self::FetchDevices => "Failed to fetch devices",
            Self::SearchDevices => "Failed to search devices",
            Self::StartScan => "Failed to start scan",
            Self::ClearDevices => "Failed to clear devices",
            Self::AddTag => "Failed to add tag",
            Self::RemoveTag => "Failed to remove tag",
            Self::RepeatScan => "Failed to repeat scan",
            Self::LoadRanges => "Failed to load IP ranges",
            Self::AddRange => "Failed to add IP range",
            Self::DeleteRange => "Failed to delete range",
            Self::LoadHistory => "Failed to load scan history",
            Self::DeleteHistory => "Failed to delete history",
            Self::ClearHistory => "Failed to clear history",
        }
    }
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Remote failures ──────────────────────────────────────────────
    /// Non-2xx response or network failure.
    #[error("{}", .operation.failure_message())]
    Transport {
        operation: Operation,
        source: lanscope_api::Error,
    },

    // ── Caught before any network call ───────────────────────────────
    #[error("{message}")]
    Validation { message: String },

    #[error("Already in progress: {operation}")]
    InFlight { operation: Operation },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Scan history record not found: {id}")]
    HistoryNotFound { id: u64 },

    #[error("Range not found: {id}")]
    RangeNotFound { id: String },

    // ── Configuration / lifecycle ────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Session closed")]
    SessionClosed,
}

impl CoreError {
    /// Adapter for `map_err`: tag a backend error with its operation.
    pub fn transport(operation: Operation) -> impl FnOnce(lanscope_api::Error) -> Self {
        move |source| Self::Transport { operation, source }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// The remote operation this error belongs to, if any.
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Self::Transport { operation, .. } | Self::InFlight { operation } => Some(*operation),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

impl From<CidrError> for CoreError {
    fn from(err: CidrError) -> Self {
        Self::validation(format!("Invalid CIDR range: {err}"))
    }
}
