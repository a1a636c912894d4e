//! Scan history handlers.

use tabled::Tabled;

use lanscope_core::{ScanRecord, Session};

use crate::cli::{GlobalOpts, HistoryArgs, HistoryCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Range")]
    range: String,
    #[tabled(rename = "Started")]
    started: String,
    #[tabled(rename = "Devices")]
    devices: u32,
}

impl From<&ScanRecord> for HistoryRow {
    fn from(r: &ScanRecord) -> Self {
        Self {
            id: r.id,
            range: r.ip_range.clone(),
            started: output::timestamp(r.started_at),
            devices: r.device_count,
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: &Session,
    args: HistoryArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        HistoryCommand::List => {
            let records = session.history().reload().await?;
            let out = output::render_list(
                global.format(),
                records.as_slice(),
                |r| HistoryRow::from(r),
                |r| r.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        HistoryCommand::Delete { id } => {
            session.history().reload().await?;
            let record = session.history().require(id)?;
            if !util::confirm(
                "history delete",
                &format!("Delete scan {id} of {}?", record.ip_range),
                global.yes,
            )? {
                output::print_status("Aborted", global.quiet);
                return Ok(());
            }
            session.coordinator().delete_history(id).await?;
            output::print_status(&format!("Scan {id} deleted"), global.quiet);
            Ok(())
        }

        HistoryCommand::Clear => {
            if !util::confirm("history clear", "Delete the entire scan history?", global.yes)? {
                output::print_status("Aborted", global.quiet);
                return Ok(());
            }
            session.coordinator().clear_history().await?;
            output::print_status("Scan history cleared", global.quiet);
            Ok(())
        }
    }
}
