//! Scan command handlers.

use lanscope_core::Session;

use crate::cli::{GlobalOpts, ScanArgs, ScanCommand};
use crate::error::CliError;
use crate::output;

pub async fn handle(session: &Session, args: ScanArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ScanCommand::Start { range } => {
            let status = session.coordinator().start_scan(&range).await?;
            output::print_output(&status, global.quiet);
            Ok(())
        }

        ScanCommand::Repeat { id } => {
            // The record's range is needed to mount the view afterwards
            session.history().reload().await?;
            let status = session.coordinator().repeat_scan(id).await?;
            output::print_output(&status, global.quiet);
            Ok(())
        }
    }
}
