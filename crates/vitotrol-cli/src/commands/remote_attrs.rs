//! Remote-attrs command - dump the attributes the device itself exposes

use anyhow::{Context, Result};
use vitotrol_client::{Device, Session};

use crate::output::{OutputContext, RemoteAttrRow};

pub async fn remote_attrs(session: &Session, device: &Device, ctx: &OutputContext) -> Result<()> {
    let infos = device
        .get_type_info(session)
        .await
        .context("GetTypeInfo error")?;

    let rows: Vec<RemoteAttrRow> = infos
        .into_iter()
        .map(|info| RemoteAttrRow {
            id: format!("0x{:04x}", info.id.0),
            name: info.name,
            attr_type: info.attr_type,
            access: match (info.readable, info.writable) {
                (true, true) => "read/write".to_string(),
                (true, false) => "read-only".to_string(),
                (false, true) => "write-only".to_string(),
                (false, false) => "no-access".to_string(),
            },
            group: info.group,
            circuit: info.circuit_id,
            enum_values: info
                .enum_values
                .map(|values| {
                    values
                        .into_iter()
                        .map(|(idx, label)| format!("{idx}={label}"))
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default(),
        })
        .collect();

    ctx.print(&rows);
    Ok(())
}
