//! Config subcommand handlers.

use std::io::IsTerminal;

use dialoguer::{Confirm, Input, Select};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Helpers ─────────────────────────────────────────────────────────

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Ask for each setting, seeded with the current values.
fn prompt_config(current: &Config) -> Result<Config, CliError> {
    let endpoint: String = Input::new()
        .with_prompt("Scan backend URL")
        .default(current.endpoint.clone())
        .interact_text()
        .map_err(prompt_err)?;

    let poll_interval_ms: u64 = Input::new()
        .with_prompt("Poll interval in milliseconds (0 disables polling)")
        .default(current.poll_interval_ms)
        .interact_text()
        .map_err(prompt_err)?;

    let history_poll = Confirm::new()
        .with_prompt("Refresh scan history while watching?")
        .default(current.history_poll)
        .interact()
        .map_err(prompt_err)?;

    let formats = &["table", "json", "json-compact", "yaml", "plain"];
    let current_format = formats
        .iter()
        .position(|f| *f == current.defaults.output)
        .unwrap_or(0);
    let format = Select::new()
        .with_prompt("Default output format")
        .items(formats)
        .default(current_format)
        .interact()
        .map_err(prompt_err)?;

    let mut cfg = current.clone();
    cfg.endpoint = endpoint;
    cfg.poll_interval_ms = poll_interval_ms;
    cfg.history_poll = history_poll;
    cfg.defaults.output = formats.get(format).copied().unwrap_or("table").into();
    Ok(cfg)
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => {
            let path = config::config_path();

            if path.exists()
                && !util::confirm(
                    "config init",
                    &format!("Overwrite existing config at {}?", path.display()),
                    global.yes,
                )?
            {
                output::print_status("Aborted", global.quiet);
                return Ok(());
            }

            let new_cfg = if global.yes || !std::io::stdin().is_terminal() {
                cfg.clone()
            } else {
                eprintln!("lanscope configuration wizard");
                eprintln!("   Config path: {}\n", path.display());
                prompt_config(cfg)?
            };

            // Refuse to write a config the next run could not load
            config::session_config(&new_cfg, None)?;
            let saved = config::save_config(&new_cfg)?;
            output::print_status(&format!("Config written to {}", saved.display()), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let rendered = toml::to_string_pretty(cfg)?;
            let out = output::render_single(
                global.format(),
                cfg,
                |_| rendered.trim_end().to_owned(),
                |c| c.endpoint.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            let path = config::config_path();
            let out = output::render_single(
                global.format(),
                &path,
                |p| p.display().to_string(),
                |p| p.display().to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
