//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use lanscope_config::ConfigError;
use lanscope_core::{BackendError, CoreError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("{message}: could not reach the scan backend")]
    #[diagnostic(
        code(lanscope::connection_failed),
        help(
            "Check that the backend is running and reachable.\n\
             Set it with --endpoint, LANSCOPE_ENDPOINT, or: lanscope config init"
        )
    )]
    ConnectionFailed {
        message: String,
        #[source]
        source: BackendError,
    },

    #[error("{message}: the scan backend did not answer in time")]
    #[diagnostic(
        code(lanscope::timeout),
        help("Increase the timeout with --timeout or check backend load.")
    )]
    Timeout {
        message: String,
        #[source]
        source: BackendError,
    },

    // ── Backend ──────────────────────────────────────────────────────

    #[error("{message} ({status})")]
    #[diagnostic(
        code(lanscope::backend),
        help("Run again with -v to log the backend response.")
    )]
    Backend {
        message: String,
        status: String,
        #[source]
        source: BackendError,
    },

    #[error("{operation} is already in progress")]
    #[diagnostic(
        code(lanscope::in_flight),
        help("Wait for the running request to finish and try again.")
    )]
    InFlight { operation: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(lanscope::not_found),
        help("Run: lanscope {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(lanscope::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(
        code(lanscope::config),
        help("Inspect the resolved settings with: lanscope config show")
    )]
    Config(#[from] ConfigError),

    #[error("Session closed unexpectedly")]
    #[diagnostic(code(lanscope::session_closed))]
    SessionClosed,

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(lanscope::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(lanscope::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(lanscope::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to render TOML: {0}")]
    #[diagnostic(code(lanscope::toml))]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::InFlight { .. } => exit_code::CONFLICT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } | Self::Config(_) => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Transport { operation, source } => {
                let message = operation.failure_message().to_owned();
                let (timed_out, unreachable) = match &source {
                    BackendError::Transport(e) => (e.is_timeout(), e.is_connect()),
                    _ => (false, false),
                };
                if timed_out {
                    CliError::Timeout { message, source }
                } else if unreachable {
                    CliError::ConnectionFailed { message, source }
                } else {
                    CliError::Backend {
                        status: source
                            .status()
                            .map_or_else(|| "no status".into(), |s| format!("HTTP {s}")),
                        message,
                        source,
                    }
                }
            }

            CoreError::Validation { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::InFlight { operation } => CliError::InFlight {
                operation: operation.to_string(),
            },

            CoreError::HistoryNotFound { id } => CliError::NotFound {
                resource_type: "scan".into(),
                identifier: id.to_string(),
                list_command: "history list".into(),
            },

            CoreError::RangeNotFound { id } => CliError::NotFound {
                resource_type: "range".into(),
                identifier: id,
                list_command: "ranges list".into(),
            },

            CoreError::Config { message } => CliError::Config(ConfigError::Validation {
                field: "session".into(),
                reason: message,
            }),

            CoreError::SessionClosed => CliError::SessionClosed,
        }
    }
}
