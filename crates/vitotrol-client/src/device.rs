//! Device operations: reading and writing data points, error history,
//! timesheets and type discovery.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use tracing::instrument;

use crate::attributes::AttrId;
use crate::error::{Result, VitotrolError};
use crate::poll::{self, PendingOperation, PollParams, StatusKind};
use crate::session::Session;
use crate::timesheet::{self, Timesheet, Timeslot};
use crate::types::{Time, Value};
use crate::wire::{self, SoapBody};

/// A Vitotrol device, a priori a boiler, attached to a location.
///
/// Built by [`Session::get_devices`]. The `attributes`, `timesheets` and
/// `errors` caches hold the last server reads.
#[derive(Debug, Clone)]
pub struct Device {
    pub location_id: u32,
    pub location_name: String,
    pub device_id: u32,
    pub device_name: String,
    /// Set when either the location or the device reports an error.
    pub has_error: bool,
    /// Set only when both the location and the device are connected.
    pub is_connected: bool,

    /// Last values read by [`Device::get_data`].
    pub attributes: HashMap<AttrId, Value>,
    /// Last timesheets read by [`Device::get_timesheet_data`].
    pub timesheets: HashMap<AttrId, Timesheet>,
    /// Last errors read by [`Device::get_error_history`].
    pub errors: Vec<ErrorHistoryEvent>,
}

/// One entry of a device's error history.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorHistoryEvent {
    pub error: String,
    pub message: String,
    pub time: Time,
    pub is_active: bool,
}

impl fmt::Display for ErrorHistoryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} = {}", self.error, self.time, self.message)?;
        if self.is_active {
            f.write_str(" *ACTIVE*")?;
        }
        Ok(())
    }
}

/// One attribute descriptor reported by `GetTypeInfo`, with enum rows
/// already folded into their parent.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeInfo {
    pub id: AttrId,
    pub name: String,
    pub attr_type: String,
    pub type_value: u32,
    pub min_value: String,
    pub max_value: String,
    pub group: String,
    pub circuit_id: u32,
    pub default_value: String,
    pub readable: bool,
    pub writable: bool,
    /// Labels by index, only for `attr_type == "ENUM"`.
    pub enum_values: Option<BTreeMap<u32, String>>,
}

fn datenpunkt_ids(ids: &[AttrId]) -> String {
    let mut body = String::from("<DatenpunktIds>");
    for id in ids {
        body.push_str(&format!("<int>{id}</int>"));
    }
    body.push_str("</DatenpunktIds>");
    body
}

impl Device {
    pub(crate) fn new(
        location_id: u32,
        location_name: String,
        device_id: u32,
        device_name: String,
        has_error: bool,
        is_connected: bool,
    ) -> Self {
        Self {
            location_id,
            location_name,
            device_id,
            device_name,
            has_error,
            is_connected,
            attributes: HashMap::new(),
            timesheets: HashMap::new(),
            errors: Vec::new(),
        }
    }

    fn body(&self, action: &str, inner: &str) -> String {
        format!(
            "<{action}>\n\
             <GeraetId>{}</GeraetId>\n\
             <AnlageId>{}</AnlageId>\n\
             {inner}\n\
             </{action}>",
            self.device_id, self.location_id
        )
    }

    async fn send_request<B: SoapBody>(
        &self,
        session: &Session,
        action: &str,
        inner: &str,
    ) -> Result<B::Output> {
        session
            .transport
            .send_request::<B>(action, &self.body(action, inner))
            .await
    }

    /// Read the given data points and merge them into the `attributes`
    /// cache.
    #[instrument(skip(self, session))]
    pub async fn get_data(&mut self, session: &Session, ids: &[AttrId]) -> Result<()> {
        let result = self
            .send_request::<wire::GetDataBody>(session, "GetData", &datenpunkt_ids(ids))
            .await?;

        for item in result.values.values {
            self.attributes.insert(
                AttrId(item.id),
                Value {
                    value: item.value,
                    time: Time::parse(&item.time)?,
                },
            );
        }
        Ok(())
    }

    /// Queue a write of one data point. `value` is the wire form; convert
    /// human input first with
    /// [`VitodataType::human_to_vitodata`](crate::VitodataType::human_to_vitodata).
    /// Returns the refresh ID identifying the queued operation; prefer
    /// [`Device::write_data_wait`].
    #[instrument(skip(self, session))]
    pub async fn write_data(
        &self,
        session: &Session,
        id: AttrId,
        value: &str,
    ) -> Result<String> {
        let result = self
            .send_request::<wire::WriteDataBody>(
                session,
                "WriteData",
                &format!(
                    "<DatapointId>{id}</DatapointId><Wert>{}</Wert>",
                    wire::xml_escape(value)
                ),
            )
            .await?;
        Ok(result.refresh_id)
    }

    /// Write one data point and hand back the completion of the queued
    /// operation.
    pub async fn write_data_wait(
        &self,
        session: &Session,
        id: AttrId,
        value: &str,
    ) -> Result<PendingOperation> {
        self.write_data_wait_with(session, id, value, PollParams::WRITE)
            .await
    }

    /// Like [`Device::write_data_wait`] with a custom polling schedule.
    pub async fn write_data_wait_with(
        &self,
        session: &Session,
        id: AttrId,
        value: &str,
        params: PollParams,
    ) -> Result<PendingOperation> {
        let refresh_id = self.write_data(session, id, value).await?;
        Ok(poll::spawn_poll(
            session.transport.clone(),
            refresh_id,
            StatusKind::Write,
            params,
        ))
    }

    /// Ask the server to re-read the given data points from the device.
    /// Returns the refresh ID; prefer [`Device::refresh_data_wait`].
    #[instrument(skip(self, session))]
    pub async fn refresh_data(&self, session: &Session, ids: &[AttrId]) -> Result<String> {
        let result = self
            .send_request::<wire::RefreshDataBody>(session, "RefreshData", &datenpunkt_ids(ids))
            .await?;
        Ok(result.refresh_id)
    }

    /// Refresh data points and hand back the completion of the queued
    /// operation. Once complete, call [`Device::get_data`] to read the
    /// fresh values.
    pub async fn refresh_data_wait(
        &self,
        session: &Session,
        ids: &[AttrId],
    ) -> Result<PendingOperation> {
        self.refresh_data_wait_with(session, ids, PollParams::REFRESH)
            .await
    }

    /// Like [`Device::refresh_data_wait`] with a custom polling schedule.
    pub async fn refresh_data_wait_with(
        &self,
        session: &Session,
        ids: &[AttrId],
        params: PollParams,
    ) -> Result<PendingOperation> {
        let refresh_id = self.refresh_data(session, ids).await?;
        Ok(poll::spawn_poll(
            session.transport.clone(),
            refresh_id,
            StatusKind::Refresh,
            params,
        ))
    }

    /// Read the error history, replacing the `errors` cache.
    #[instrument(skip(self, session))]
    pub async fn get_error_history(&mut self, session: &Session) -> Result<()> {
        let result = self
            .send_request::<wire::GetErrorHistoryBody>(
                session,
                "GetErrorHistory",
                "<Culture>fr-fr</Culture>",
            )
            .await?;

        let mut errors = Vec::with_capacity(result.errors.errors.len());
        for item in result.errors.errors {
            errors.push(ErrorHistoryEvent {
                error: item.error,
                message: item.message,
                time: Time::parse(&item.time)?,
                is_active: item.is_active,
            });
        }
        self.errors = errors;
        Ok(())
    }

    /// Read one timesheet and store it in the `timesheets` cache, slots
    /// grouped by day and sorted by start time.
    #[instrument(skip(self, session))]
    pub async fn get_timesheet_data(&mut self, session: &Session, id: AttrId) -> Result<()> {
        let result = self
            .send_request::<wire::GetTimesheetDataBody>(
                session,
                "GetTimesheetData",
                &format!("<DatenpunktId>{id}</DatenpunktId>"),
            )
            .await?;

        let timesheet = timesheet::group_day_slots(
            result.timesheet.slots.slots.into_iter().map(|slot| {
                (
                    slot.day,
                    Timeslot {
                        from: slot.from,
                        to: slot.to,
                    },
                )
            }),
        );
        self.timesheets.insert(id, timesheet);
        Ok(())
    }

    /// Queue a full rewrite of one timesheet. Returns the refresh ID;
    /// prefer [`Device::write_timesheet_data_wait`].
    #[instrument(skip(self, session, timesheet))]
    pub async fn write_timesheet_data(
        &self,
        session: &Session,
        id: AttrId,
        timesheet: &Timesheet,
    ) -> Result<String> {
        let slots = timesheet::encode_timesheet_slots(timesheet)?;
        let inner = format!(
            "<SchaltzeitTyp>1</SchaltzeitTyp>\
             <DatenpunktId>{id}</DatenpunktId>\
             <Schaltzeiten>{slots}</Schaltzeiten>"
        );

        // Oddly, WriteTimesheetData nests an extra SchaltsatzData layer
        // around the device fields, so the body cannot go through
        // Device::send_request.
        let body = format!(
            "<WriteTimesheetData>{}</WriteTimesheetData>",
            self.body("SchaltsatzData", &inner)
        );

        let result = session
            .transport
            .send_request::<wire::WriteTimesheetDataBody>("WriteTimesheetData", &body)
            .await?;
        Ok(result.refresh_id)
    }

    /// Rewrite one timesheet and hand back the completion of the queued
    /// operation.
    pub async fn write_timesheet_data_wait(
        &self,
        session: &Session,
        id: AttrId,
        timesheet: &Timesheet,
    ) -> Result<PendingOperation> {
        self.write_timesheet_data_wait_with(session, id, timesheet, PollParams::REFRESH)
            .await
    }

    /// Like [`Device::write_timesheet_data_wait`] with a custom polling
    /// schedule.
    pub async fn write_timesheet_data_wait_with(
        &self,
        session: &Session,
        id: AttrId,
        timesheet: &Timesheet,
        params: PollParams,
    ) -> Result<PendingOperation> {
        let refresh_id = self.write_timesheet_data(session, id, timesheet).await?;
        // Timesheet writes are tracked through the write status request.
        Ok(poll::spawn_poll(
            session.transport.clone(),
            refresh_id,
            StatusKind::Write,
            params,
        ))
    }

    /// Discover the data points the device exposes.
    ///
    /// Enum labels arrive as extra rows keyed `<parentId>-<index>`, parent
    /// first, with the label stashed in `MinimalWert`; they are folded into
    /// their parent's `enum_values`.
    #[instrument(skip(self, session))]
    pub async fn get_type_info(&self, session: &Session) -> Result<Vec<AttributeInfo>> {
        let result = self
            .send_request::<wire::GetTypeInfoBody>(session, "GetTypeInfo", "")
            .await?;

        let mut list: Vec<AttributeInfo> = Vec::with_capacity(result.infos.infos.len() / 2);
        let mut enum_rows: HashMap<String, usize> = HashMap::new();

        for item in result.infos.infos {
            if item.attr_type == "ENUM" {
                if let Some((parent, idx)) = item.id.split_once('-') {
                    let idx: u32 = idx.parse().map_err(|_| {
                        VitotrolError::Parse(format!(
                            "cannot extract enum index from `{}'",
                            item.id
                        ))
                    })?;
                    let parent_pos = *enum_rows.get(parent).ok_or_else(|| {
                        VitotrolError::Parse(format!(
                            "enum value row `{}' without a parent row",
                            item.id
                        ))
                    })?;
                    if let Some(values) = &mut list[parent_pos].enum_values {
                        // The label hides in MinimalWert.
                        values.insert(idx, item.min_value);
                    }
                    continue;
                }
                enum_rows.insert(item.id.clone(), list.len());
            }

            let id: u16 = item.id.parse().map_err(|_| {
                VitotrolError::Parse(format!("cannot parse attribute ID from `{}'", item.id))
            })?;

            list.push(AttributeInfo {
                id: AttrId(id),
                name: item.name,
                attr_type: item.attr_type.clone(),
                type_value: item.type_value,
                min_value: item.min_value,
                max_value: item.max_value,
                group: item.group,
                circuit_id: item.circuit_id,
                default_value: item.default_value,
                readable: item.readable,
                writable: item.writable,
                enum_values: (item.attr_type == "ENUM").then(BTreeMap::new),
            });
        }
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn error_event_display() {
        let mut event = ErrorHistoryEvent {
            error: "F5".to_string(),
            message: "Brûleur en panne".to_string(),
            time: Time::parse("2020-09-26 13:46:00").unwrap(),
            is_active: false,
        };
        assert_eq!(
            event.to_string(),
            "F5@2020-09-26 13:46:00 = Brûleur en panne"
        );

        event.is_active = true;
        assert_eq!(
            event.to_string(),
            "F5@2020-09-26 13:46:00 = Brûleur en panne *ACTIVE*"
        );
    }

    #[test]
    fn datenpunkt_ids_body() {
        assert_eq!(datenpunkt_ids(&[]), "<DatenpunktIds></DatenpunktIds>");
        assert_eq!(
            datenpunkt_ids(&[AttrId(5367), AttrId(104)]),
            "<DatenpunktIds><int>5367</int><int>104</int></DatenpunktIds>"
        );
    }

    #[test]
    fn device_body_nests_ids() {
        let device = Device::new(31456, "Maison".to_string(), 40213, "VT 200".to_string(), false, true);
        assert_eq!(
            device.body("GetData", "<X/>"),
            "<GetData>\n<GeraetId>40213</GeraetId>\n<AnlageId>31456</AnlageId>\n<X/>\n</GetData>"
        );
    }
}
