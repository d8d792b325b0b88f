//! Devices command - list the devices attached to the account

use anyhow::Result;
use vitotrol_client::Session;

use crate::output::{DeviceRow, OutputContext};

pub async fn devices(session: &Session, ctx: &OutputContext) -> Result<()> {
    let rows: Vec<DeviceRow> = session
        .devices
        .iter()
        .enumerate()
        .map(|(index, d)| DeviceRow {
            index,
            location: format!("{} ({})", d.location_name, d.location_id),
            device: format!("{} ({})", d.device_name, d.device_id),
            has_error: d.has_error,
            is_connected: d.is_connected,
        })
        .collect();

    ctx.print(&rows);
    Ok(())
}
