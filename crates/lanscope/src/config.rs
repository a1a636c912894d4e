//! CLI configuration: thin wrapper around `lanscope_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--endpoint, --timeout, --insecure, --output, --color).

use clap::ValueEnum;

use lanscope_core::SessionConfig;

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

pub use lanscope_config::{Config, config_path, load_config, save_config};

/// Apply CLI flag overrides on top of the loaded config file.
///
/// Flags (and their env vars) win over file values.
pub fn apply_overrides(mut cfg: Config, global: &GlobalOpts) -> Config {
    if let Some(ref endpoint) = global.endpoint {
        cfg.endpoint.clone_from(endpoint);
    }
    if let Some(timeout) = global.timeout {
        cfg.timeout_secs = timeout;
    }
    if global.insecure {
        cfg.insecure = true;
    }
    cfg
}

/// Fill presentation flags the user left unset from `[defaults]`.
///
/// An unrecognised value in the file is a usage error.
pub fn resolve_presentation(global: &mut GlobalOpts, cfg: &Config) -> Result<(), CliError> {
    if global.output.is_none() {
        global.output = Some(parse_value::<OutputFormat>("defaults.output", &cfg.defaults.output)?);
    }
    if global.color.is_none() {
        global.color = Some(parse_value::<ColorMode>("defaults.color", &cfg.defaults.color)?);
    }
    Ok(())
}

fn parse_value<T: ValueEnum>(field: &str, raw: &str) -> Result<T, CliError> {
    T::from_str(raw, true).map_err(|reason| CliError::Validation {
        field: field.into(),
        reason,
    })
}

/// Build the engine's `SessionConfig` from the file plus CLI overrides.
pub fn session_config(cfg: &Config, poll_interval_ms: Option<u64>) -> Result<SessionConfig, CliError> {
    let mut cfg = cfg.clone();
    if let Some(ms) = poll_interval_ms {
        cfg.poll_interval_ms = ms;
    }
    Ok(lanscope_config::to_session_config(&cfg)?)
}
