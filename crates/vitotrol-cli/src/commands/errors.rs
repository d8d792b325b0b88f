//! Errors command - show the device error history

use anyhow::{Context, Result};
use vitotrol_client::{Device, Session};

use crate::output::{ErrorRow, OutputContext};

pub async fn errors(session: &Session, device: &mut Device, ctx: &OutputContext) -> Result<()> {
    device
        .get_error_history(session)
        .await
        .context("GetErrorHistory error")?;

    if device.errors.is_empty() && !ctx.json {
        ctx.info("No errors");
        return Ok(());
    }

    let rows: Vec<ErrorRow> = device
        .errors
        .iter()
        .map(|e| ErrorRow {
            code: e.error.clone(),
            time: e.time.to_string(),
            message: e.message.clone(),
            active: e.is_active,
        })
        .collect();
    ctx.print(&rows);
    Ok(())
}
