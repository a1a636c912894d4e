//! Command dispatch: bridges CLI args -> session operations -> output formatting.

pub mod config_cmd;
pub mod devices;
pub mod history;
pub mod ranges;
pub mod scan;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::config::Config;
use crate::error::CliError;

/// Dispatch a command to its handler.
///
/// `devices` builds its own session because `watch` may override the poll
/// interval; every other backend command shares a default one.
pub async fn dispatch(cmd: Command, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Config(args) => config_cmd::handle(args, cfg, global),
        Command::Devices(args) => devices::handle(args, cfg, global).await,
        Command::Scan(args) => scan::handle(&util::connect(cfg, None)?, args, global).await,
        Command::Ranges(args) => ranges::handle(&util::connect(cfg, None)?, args, global).await,
        Command::History(args) => history::handle(&util::connect(cfg, None)?, args, global).await,
        Command::Clear => devices::clear(&util::connect(cfg, None)?, global).await,
        // Completions are handled before dispatch
        Command::Completions(_) => unreachable!(),
    }
}
