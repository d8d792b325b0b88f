//! Get command - read attribute values, optionally forcing a device
//! refresh first

use anyhow::{Context, Result};
use vitotrol_client::attributes::AttrId;
use vitotrol_client::{Device, Session};

use crate::commands::AttrResolver;
use crate::output::{AttributeRow, OutputContext};

#[allow(clippy::too_many_arguments)]
pub async fn get(
    session: &Session,
    device: &mut Device,
    resolver: &mut AttrResolver,
    attrs: &[String],
    all: bool,
    refresh: bool,
    ctx: &OutputContext,
) -> Result<()> {
    let ids: Vec<AttrId> = if all {
        resolver.populate(session, device).await;
        resolver.registry.ids().to_vec()
    } else {
        let mut ids = Vec::with_capacity(attrs.len());
        for name in attrs {
            ids.push(resolver.resolve_read(session, device, name).await?);
        }
        ids
    };

    if refresh {
        let pending = device
            .refresh_data_wait(session, &ids)
            .await
            .context("RefreshData error")?;
        pending.wait().await.context("RefreshData failed")?;
    }

    device
        .get_data(session, &ids)
        .await
        .context("GetData error")?;

    let rows: Vec<AttributeRow> = ids
        .iter()
        .map(|id| attribute_row(device, resolver, *id))
        .collect();
    ctx.print(&rows);
    Ok(())
}

fn attribute_row(device: &Device, resolver: &AttrResolver, id: AttrId) -> AttributeRow {
    let value = device.attributes.get(&id);

    match resolver.registry.get(id) {
        Some(aref) => match value {
            Some(value) => AttributeRow {
                name: aref.name.clone(),
                value: aref
                    .vtype
                    .vitodata_to_human(&value.value)
                    .unwrap_or_else(|_| format!("unknown-value<{}>", value.value)),
                time: value.time.to_string(),
                doc: aref.doc.clone(),
            },
            None => AttributeRow {
                name: aref.name.clone(),
                value: "uninitialized".to_string(),
                time: String::new(),
                doc: aref.doc.clone(),
            },
        },
        None => AttributeRow {
            name: id.to_string(),
            value: value.map(|v| v.value.clone()).unwrap_or_default(),
            time: value.map(|v| v.time.to_string()).unwrap_or_default(),
            doc: String::new(),
        },
    }
}
