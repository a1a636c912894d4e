//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use lanscope_core::{Device, Session};

use crate::config::{self, Config};
use crate::error::CliError;

/// Build an HTTP session from the resolved config.
///
/// `poll_interval_ms` overrides the configured cadence.
pub fn connect(cfg: &Config, poll_interval_ms: Option<u64>) -> Result<Session, CliError> {
    let session_config = config::session_config(cfg, poll_interval_ms)?;
    Ok(Session::connect(session_config)?)
}

/// Find a device in the current snapshot by ID, MAC or address.
pub fn resolve_device(session: &Session, identifier: &str) -> Result<Device, CliError> {
    let state = session.state();
    state
        .snapshot
        .iter()
        .find(|d| {
            d.id == identifier || d.mac.eq_ignore_ascii_case(identifier) || d.address == identifier
        })
        .cloned()
        .ok_or_else(|| CliError::NotFound {
            resource_type: "device".into(),
            identifier: identifier.into(),
            list_command: "devices list".into(),
        })
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal to prompt on, `--yes` is mandatory.
pub fn confirm(action: &str, message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Stderr spinner for long-running views.
pub fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}
