//! List command - print known attribute or timesheet names (no auth)

use anyhow::{bail, Result};
use vitotrol_client::attributes::AttributeRegistry;
use vitotrol_client::timesheet::TIMESHEETS;

use crate::output::OutputContext;

pub fn list(what: Option<&str>, ctx: &OutputContext) -> Result<()> {
    match what {
        None | Some("attrs") => {
            let registry = AttributeRegistry::default();
            for (_, aref) in registry.iter() {
                ctx.info(&aref.to_string());
            }
        }
        Some("timesheets") => {
            for (_, tref) in TIMESHEETS {
                ctx.info(&tref.to_string());
            }
        }
        Some(other) => {
            bail!("`list' allows `attrs' or `timesheets', not `{other}'");
        }
    }
    Ok(())
}
