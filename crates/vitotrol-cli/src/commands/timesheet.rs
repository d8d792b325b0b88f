//! Timesheet commands - read and rewrite weekly time programs

use anyhow::{anyhow, Context, Result};
use vitotrol_client::timesheet::{timesheet_by_name, timesheet_ref, Timesheet};
use vitotrol_client::{Device, Session};

use crate::output::OutputContext;

const DISPLAY_DAYS: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

/// Show one or more timesheets, per day in week order.
pub async fn timesheet(
    session: &Session,
    device: &mut Device,
    names: &[String],
    ctx: &OutputContext,
) -> Result<()> {
    let mut ids = Vec::with_capacity(names.len());
    for name in names {
        ids.push(
            timesheet_by_name(name).ok_or_else(|| anyhow!("unknown timesheet `{name}'"))?,
        );
    }

    for id in ids {
        device
            .get_timesheet_data(session, id)
            .await
            .context("GetTimesheetData error")?;

        let Some(timesheet) = device.timesheets.get(&id) else {
            ctx.error(&format!("No data for timesheet {id}"));
            continue;
        };

        if ctx.json {
            ctx.print_json(timesheet);
        } else {
            if let Some(tref) = timesheet_ref(id) {
                ctx.info(&tref.to_string());
            }
            for day in DISPLAY_DAYS {
                ctx.info(&format!("- {day}:"));
                if let Some(slots) = timesheet.get(day) {
                    for slot in slots {
                        ctx.info(&format!("  {slot}"));
                    }
                }
            }
        }
    }
    Ok(())
}

/// Rewrite a whole timesheet from a JSON definition (inline or `@file`)
/// and wait for the server to apply it.
pub async fn set_timesheet(
    session: &Session,
    device: &Device,
    name: &str,
    definition: &str,
    ctx: &OutputContext,
) -> Result<()> {
    let id = timesheet_by_name(name).ok_or_else(|| anyhow!("unknown timesheet `{name}'"))?;

    let data = match definition.strip_prefix('@') {
        Some(path) if !path.is_empty() => std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read file {path}"))?,
        _ => definition.to_string(),
    };
    let timesheet: Timesheet =
        serde_json::from_str(&data).context("JSON definition of timesheet is invalid")?;

    let pending = device
        .write_timesheet_data_wait(session, id, &timesheet)
        .await
        .context("WriteTimesheetData error")?;
    pending.wait().await.context("WriteTimesheetData failed")?;

    ctx.success(&format!("{name} successfully written"));
    Ok(())
}
