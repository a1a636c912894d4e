//! Device command handlers.

use std::io::IsTerminal;

use owo_colors::OwoColorize;
use tabled::Tabled;
use tracing::debug;

use lanscope_core::{
    Cidr, CoreError, Device, MutationOutcome, SearchOutcome, Session, SyncPhase, ViewFrame, project,
};

use crate::cli::{DeviceFilterArgs, DevicesArgs, DevicesCommand, GlobalOpts};
use crate::config::Config;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Hostname")]
    hostname: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Vendor")]
    vendor: String,
    #[tabled(rename = "Tags")]
    tags: String,
    #[tabled(rename = "Last Seen")]
    last_seen: String,
}

impl DeviceRow {
    fn new(d: &Device, color: bool) -> Self {
        Self {
            id: d.id.clone(),
            address: d.address.clone(),
            mac: d.mac.clone(),
            hostname: d.hostname.clone(),
            status: output::status_label(d.status, color),
            vendor: d.manufacturer.clone().unwrap_or_default(),
            tags: d.tags.iter().cloned().collect::<Vec<_>>().join(", "),
            last_seen: output::timestamp(d.last_seen),
        }
    }
}

fn detail(d: &Device, color: bool) -> String {
    [
        format!("ID:         {}", d.id),
        format!("Name:       {}", d.display_name()),
        format!("Address:    {}", d.address),
        format!("MAC:        {}", d.mac),
        format!("Status:     {}", output::status_label(d.status, color)),
        format!("Vendor:     {}", d.manufacturer.as_deref().unwrap_or("-")),
        format!(
            "Tags:       {}",
            if d.tags.is_empty() {
                "-".into()
            } else {
                d.tags.iter().cloned().collect::<Vec<_>>().join(", ")
            }
        ),
        format!("First Seen: {}", output::timestamp(d.first_seen)),
        format!("Last Seen:  {}", output::timestamp(d.last_seen)),
    ]
    .join("\n")
}

fn render_devices(devices: &[Device], global: &GlobalOpts) -> Result<String, CliError> {
    let color = output::should_color(global.color_mode());
    output::render_list(
        global.format(),
        devices,
        |d| DeviceRow::new(d, color),
        |d| d.id.clone(),
    )
}

// ── Filters ─────────────────────────────────────────────────────────

/// Reject a malformed range up front instead of silently matching nothing.
fn validate_range(filter: &DeviceFilterArgs) -> Result<(), CliError> {
    if let Some(ref range) = filter.range {
        Cidr::parse(range).map_err(CoreError::from)?;
    }
    Ok(())
}

fn keep(filter: &DeviceFilterArgs, device: &Device) -> bool {
    (!filter.online || device.is_online())
        && filter.tag.as_deref().is_none_or(|t| device.has_tag(t))
}

fn apply_filter(filter: &DeviceFilterArgs, devices: Vec<Device>) -> Vec<Device> {
    devices.into_iter().filter(|d| keep(filter, d)).collect()
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: DevicesArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::List(filter) => {
            validate_range(&filter)?;
            let session = util::connect(cfg, None)?;
            session.refresh().await?;

            let state = session.state();
            let devices = apply_filter(
                &filter,
                project(&state.snapshot, filter.range.as_deref(), None),
            );
            output::print_output(&render_devices(&devices, global)?, global.quiet);
            Ok(())
        }

        DevicesCommand::Watch { filter, interval } => {
            validate_range(&filter)?;
            let session = util::connect(cfg, interval)?;
            watch(&session, &filter, global).await
        }

        DevicesCommand::Search { query } => {
            let session = util::connect(cfg, None)?;
            match session.search(&query).await? {
                SearchOutcome::Cleared => {
                    session.refresh().await?;
                }
                SearchOutcome::Applied { matches } => {
                    debug!(matches, "search applied");
                    let search = session.projector().search_state();
                    if let Some(active) = search.query.as_deref() {
                        output::print_status(
                            &format!("{matches} device(s) match '{active}'"),
                            global.quiet,
                        );
                    }
                }
                SearchOutcome::Stale => {}
            }
            output::print_output(&render_devices(&session.view(), global)?, global.quiet);
            Ok(())
        }

        DevicesCommand::Tag { device, tag } => {
            let session = util::connect(cfg, None)?;
            session.refresh().await?;
            let target = util::resolve_device(&session, &device)?;

            match session.coordinator().add_tag(&target.id, &tag).await? {
                MutationOutcome::Skipped => {
                    output::print_status("Nothing to add: tag is blank", global.quiet);
                }
                MutationOutcome::Completed => {
                    output::print_status(
                        &format!("Tag '{}' added to {}", tag.trim(), target.display_name()),
                        global.quiet,
                    );
                    print_device(&session, &target.id, global)?;
                }
            }
            Ok(())
        }

        DevicesCommand::Untag { device, tag } => {
            let session = util::connect(cfg, None)?;
            session.refresh().await?;
            let target = util::resolve_device(&session, &device)?;

            match session.coordinator().remove_tag(&target.id, &tag).await? {
                MutationOutcome::Skipped => {
                    output::print_status("Nothing to remove: tag is blank", global.quiet);
                }
                MutationOutcome::Completed => {
                    output::print_status(
                        &format!("Tag '{}' removed from {}", tag.trim(), target.display_name()),
                        global.quiet,
                    );
                    print_device(&session, &target.id, global)?;
                }
            }
            Ok(())
        }
    }
}

/// Print a device as it stands in the latest snapshot.
fn print_device(session: &Session, id: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let device = util::resolve_device(session, id)?;
    let color = output::should_color(global.color_mode());
    let out = output::render_single(
        global.format(),
        &device,
        |d| detail(d, color),
        |d| d.id.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// `lanscope clear`: delete every device on the backend.
pub async fn clear(session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    if !util::confirm(
        "clear",
        "Delete ALL discovered devices from the backend?",
        global.yes,
    )? {
        output::print_status("Aborted", global.quiet);
        return Ok(());
    }
    session.coordinator().clear_devices().await?;
    output::print_status("All devices cleared", global.quiet);
    Ok(())
}

// ── Watch ───────────────────────────────────────────────────────────

/// Follow the view until Ctrl-C, reprinting whenever the displayed list
/// changes. Fetch progress and errors go to a stderr spinner.
async fn watch(
    session: &Session,
    filter: &DeviceFilterArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(global.color_mode());
    let spinner = (!global.quiet && std::io::stderr().is_terminal()).then(util::spinner);

    let mut watcher = session.watch_view();
    session.select_range(filter.range.as_deref());
    let mut frame = watcher.current();
    let mut shown: Option<Vec<Device>> = None;

    loop {
        if let Some(ref pb) = spinner {
            pb.set_message(status_line(&frame, color));
        } else if let Some(ref error) = frame.error {
            if !global.quiet {
                eprintln!("{error}");
            }
        }

        if matches!(frame.phase, SyncPhase::Ready | SyncPhase::Failed) {
            let devices = apply_filter(filter, frame.devices);
            if shown.as_ref() != Some(&devices) {
                let out = render_devices(&devices, global)?;
                match spinner {
                    Some(ref pb) => pb.suspend(|| output::print_output(&out, global.quiet)),
                    None => output::print_output(&out, global.quiet),
                }
                shown = Some(devices);
            }
        }

        tokio::select! {
            biased;
            signal = tokio::signal::ctrl_c() => {
                signal?;
                break;
            }
            next = watcher.changed() => frame = next?,
        }
    }

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    session.shutdown();
    Ok(())
}

fn status_line(frame: &ViewFrame, color: bool) -> String {
    let scope = frame.active_range.as_deref().unwrap_or("all ranges");
    match (frame.phase, frame.error.as_deref()) {
        (SyncPhase::Loading | SyncPhase::Idle, _) => format!("Loading {scope}..."),
        (SyncPhase::Failed, Some(error)) => {
            let message = format!("{error} (showing last good data)");
            if color {
                message.red().to_string()
            } else {
                message
            }
        }
        _ => format!(
            "{} devices in {scope} · updated {}",
            frame.devices.len(),
            output::timestamp(frame.last_success)
        ),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn filter(online: bool, tag: Option<&str>) -> DeviceFilterArgs {
        DeviceFilterArgs {
            range: None,
            online,
            tag: tag.map(str::to_owned),
        }
    }

    #[test]
    fn online_and_tag_filters_combine() {
        let mut printer = Device::new("1", "10.0.0.5").with_tags(["lab"]);
        printer.status = lanscope_core::DeviceStatus::Online;
        let offline = Device::new("2", "10.0.0.6").with_tags(["lab"]);

        let kept = apply_filter(&filter(true, Some("lab")), vec![printer, offline]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "1");
    }

    #[test]
    fn malformed_range_is_a_usage_error() {
        let args = DeviceFilterArgs {
            range: Some("10.0.0/24".into()),
            online: false,
            tag: None,
        };
        let err = validate_range(&args).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::exit_code::USAGE);
    }

    #[test]
    fn failed_frame_reports_fixed_message() {
        let frame = ViewFrame {
            devices: Vec::new(),
            phase: SyncPhase::Failed,
            error: Some("Failed to fetch devices".into()),
            active_range: None,
            query: None,
            last_success: None,
        };
        assert_eq!(
            status_line(&frame, false),
            "Failed to fetch devices (showing last good data)"
        );
    }
}
