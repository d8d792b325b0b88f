//! Set command - write attribute values and wait for completion

use anyhow::{anyhow, bail, Context, Result};
use vitotrol_client::attributes::AttrId;
use vitotrol_client::{Device, Session};

use crate::commands::AttrResolver;
use crate::output::OutputContext;

pub async fn set(
    session: &Session,
    device: &Device,
    resolver: &mut AttrResolver,
    pairs: &[String],
    ctx: &OutputContext,
) -> Result<()> {
    if pairs.is_empty() || pairs.len() % 2 != 0 {
        bail!("PARAMS must be a list of pairs: ATTR_NAME VALUE ...");
    }

    // Validate everything before writing anything.
    let mut writes: Vec<(AttrId, String)> = Vec::with_capacity(pairs.len() / 2);
    for pair in pairs.chunks(2) {
        let (name, human) = (&pair[0], &pair[1]);
        let id = resolver.resolve_write(session, device, name).await?;

        let aref = resolver
            .registry
            .get(id)
            .ok_or_else(|| anyhow!("unknown attribute `{name}'"))?;
        let value = aref
            .vtype
            .human_to_vitodata(human)
            .with_context(|| format!("value `{human}' of attribute {name} is invalid"))?;

        writes.push((id, value));
    }

    for (id, value) in writes {
        let pending = device
            .write_data_wait(session, id, &value)
            .await
            .context("WriteData error")?;
        pending.wait().await.context("WriteData failed")?;

        if let Some(aref) = resolver.registry.get(id) {
            ctx.success(&format!(
                "{} attribute successfully set to `{value}'",
                aref.name
            ));
        }
    }
    Ok(())
}
