//! Saved address range handlers.

use tabled::Tabled;

use lanscope_core::{AddressRange, Session};

use crate::cli::{GlobalOpts, RangesArgs, RangesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct RangeRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Range")]
    range: String,
    #[tabled(rename = "Addresses")]
    size: String,
}

impl From<&AddressRange> for RangeRow {
    fn from(r: &AddressRange) -> Self {
        Self {
            id: r.id.clone(),
            name: r.name.clone(),
            range: r.range.clone(),
            size: r
                .cidr()
                .map_or_else(|| "invalid".into(), |c| c.size().to_string()),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: &Session,
    args: RangesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        RangesCommand::List => {
            let ranges = session.ranges().reload().await?;
            let out = output::render_list(
                global.format(),
                ranges.as_slice(),
                |r| RangeRow::from(r),
                |r| r.id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        RangesCommand::Add { name, range } => {
            session.coordinator().add_range(&name, &range).await?;
            output::print_status(
                &format!("Range '{}' saved ({})", name.trim(), range.trim()),
                global.quiet,
            );
            Ok(())
        }

        RangesCommand::Delete { id } => {
            session.ranges().reload().await?;
            let range = session.ranges().require(&id)?;
            if !util::confirm(
                "ranges delete",
                &format!("Delete range '{}' ({})?", range.name, range.range),
                global.yes,
            )? {
                output::print_status("Aborted", global.quiet);
                return Ok(());
            }
            session.coordinator().delete_range(&id).await?;
            output::print_status(&format!("Range '{}' deleted", range.name), global.quiet);
            Ok(())
        }

        RangesCommand::Scan { id } => {
            session.ranges().reload().await?;
            let status = session.coordinator().scan_range(&id).await?;
            output::print_output(&status, global.quiet);
            Ok(())
        }
    }
}
