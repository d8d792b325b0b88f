//! Command implementations for vitotrol-cli

pub mod devices;
pub mod errors;
pub mod get;
pub mod list;
pub mod remote_attrs;
pub mod set;
pub mod timesheet;

pub use devices::devices;
pub use errors::errors;
pub use get::get;
pub use list::list;
pub use remote_attrs::remote_attrs;
pub use set::set;
pub use timesheet::{set_timesheet, timesheet};

use anyhow::{anyhow, bail, Context, Result};
use tracing::warn;
use vitotrol_client::attributes::{AttrAccess, AttrId, AttrRef, AttributeRegistry};
use vitotrol_client::{Device, Session, VitodataType};

use crate::config::MergedConfig;
use crate::output::OutputContext;

/// Log in and fetch the device list.
pub async fn login_session(merged: &MergedConfig, debug: bool) -> Result<Session> {
    let login = merged
        .login
        .as_deref()
        .context("login is missing: use --login, VITOTROL_LOGIN or the config file")?;
    let password = merged
        .password
        .as_deref()
        .context("password is missing: use --password, VITOTROL_PASSWORD or the config file")?;

    let mut session =
        Session::with_endpoint(&merged.server).context("Failed to create session")?;
    session.set_debug(debug);

    session
        .login(login, password)
        .await
        .context("Login failed")?;
    session
        .get_devices()
        .await
        .context("GetDevices failed")?;

    if session.devices.is_empty() {
        bail!("No device found");
    }
    Ok(session)
}

/// Pick the device designated by `selector`, or the first one.
///
/// A numeric selector matches a device ID first, then an index in the
/// device list. Otherwise the selector matches a device name,
/// `deviceID@locationID` or `deviceName@locationName`.
pub fn select_device(session: &Session, selector: Option<&str>, ctx: &OutputContext) -> Result<Device> {
    let devices = &session.devices;

    let device = match selector {
        None => &devices[0],
        Some(sel) => {
            if let Ok(num) = sel.parse::<usize>() {
                match devices.iter().find(|d| d.device_id == num as u32) {
                    Some(device) => device,
                    None => devices.get(num).ok_or_else(|| {
                        anyhow!(
                            "{num} is not a device ID and too big to be an index \
                             (>= {} available devices)",
                            devices.len()
                        )
                    })?,
                }
            } else {
                devices
                    .iter()
                    .find(|d| {
                        sel == d.device_name
                            || sel == format!("{}@{}", d.device_id, d.location_id)
                            || sel == format!("{}@{}", d.device_name, d.location_name)
                    })
                    .ok_or_else(|| anyhow!("Cannot find device named `{sel}'"))?
            }
        }
    };

    if ctx.verbose {
        ctx.info(&format!(
            "Working with device {}@{}",
            device.device_name, device.location_name
        ));
    }
    Ok(device.clone())
}

/// Attribute name/ID resolution over the registry, with one lazy
/// server-side discovery pass for attributes the catalog does not know.
pub struct AttrResolver {
    pub registry: AttributeRegistry,
    populated: bool,
}

impl AttrResolver {
    pub fn new() -> Self {
        Self {
            registry: AttributeRegistry::default(),
            populated: false,
        }
    }

    /// Accepts decimal and `0x` hexadecimal attribute IDs.
    pub fn parse_raw_id(name: &str) -> Option<AttrId> {
        match name.strip_prefix("0x").or_else(|| name.strip_prefix("0X")) {
            Some(hex) => u16::from_str_radix(hex, 16).ok().map(AttrId),
            None => name.parse::<u16>().ok().map(AttrId),
        }
    }

    /// Fold the device's `GetTypeInfo` answer into the registry, once. A
    /// discovery failure is reported but does not abort the command.
    pub async fn populate(&mut self, session: &Session, device: &Device) {
        if self.populated {
            return;
        }
        self.populated = true;

        match device.get_type_info(session).await {
            Ok(infos) => self.registry.extend_from_type_info(&infos),
            Err(err) => warn!("GetTypeInfo failed: {err}"),
        }
    }

    fn lookup(&self, name: &str) -> Option<AttrId> {
        match Self::parse_raw_id(name) {
            Some(id) => self.registry.get(id).map(|_| id),
            None => self.registry.id_by_name(name),
        }
    }

    /// Resolve an attribute for reading. An unknown raw ID is registered
    /// with a fallback read-only String reference after discovery.
    pub async fn resolve_read(
        &mut self,
        session: &Session,
        device: &Device,
        name: &str,
    ) -> Result<AttrId> {
        if let Some(id) = self.resolve(session, device, name).await {
            self.registry.check_access(id, AttrAccess::READ_ONLY)?;
            return Ok(id);
        }

        let id = Self::parse_raw_id(name)
            .ok_or_else(|| anyhow!("unknown attribute `{name}'"))?;
        self.registry.register(
            id,
            AttrRef {
                vtype: VitodataType::String,
                access: AttrAccess::READ_ONLY,
                name: format!("0x{:04x}", id.0),
                doc: String::new(),
                custom: true,
            },
        );
        Ok(id)
    }

    /// Resolve an attribute for writing. No fallback here: writes need a
    /// real codec.
    pub async fn resolve_write(
        &mut self,
        session: &Session,
        device: &Device,
        name: &str,
    ) -> Result<AttrId> {
        let id = self
            .resolve(session, device, name)
            .await
            .ok_or_else(|| anyhow!("unknown attribute `{name}'"))?;
        self.registry.check_access(id, AttrAccess::WRITE_ONLY)?;
        Ok(id)
    }

    async fn resolve(&mut self, session: &Session, device: &Device, name: &str) -> Option<AttrId> {
        if let Some(id) = self.lookup(name) {
            return Some(id);
        }
        self.populate(session, device).await;
        self.lookup(name)
    }
}

impl Default for AttrResolver {
    fn default() -> Self {
        Self::new()
    }
}
