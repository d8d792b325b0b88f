//! Attribute catalog: IDs, access rights and the registry.
//!
//! The registry maps numeric attribute IDs to their reference (codec, access
//! rights, name, description). It ships with the catalog of well-known
//! Vitodata data points and can be extended at runtime with attributes
//! discovered through `GetTypeInfo` (see
//! [`AttributeRegistry::extend_from_type_info`]).

use std::collections::HashMap;
use std::fmt;
use std::ops::BitOr;

use tracing::warn;

use crate::device::AttributeInfo;
use crate::error::{Result, VitotrolError};
use crate::types::{EnumType, VitodataType};

/// Numeric identifier of a data point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttrId(pub u16);

impl AttrId {
    /// Sentinel for "unknown/unset".
    pub const NONE: AttrId = AttrId(0xffff);
}

impl fmt::Display for AttrId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// Well-known attribute IDs. For each, the Vitodata name.
pub const INDOOR_TEMP: AttrId = AttrId(5367); // temp_rts_r
pub const OUTDOOR_TEMP: AttrId = AttrId(5373); // temp_ats_r
pub const SMOKE_TEMP: AttrId = AttrId(5372); // temp_agt_r
pub const BOILER_TEMP: AttrId = AttrId(5374); // temp_kts_r
pub const HOT_WATER_TEMP: AttrId = AttrId(5381); // temp_ww_r
pub const HOT_WATER_OUT_TEMP: AttrId = AttrId(5382); // temp_auslauf_r
pub const HEAT_WATER_OUT_TEMP: AttrId = AttrId(6052); // temp_vts_r
pub const HEAT_NORMAL_TEMP: AttrId = AttrId(82); // konf_raumsolltemp_rw
pub const PARTY_MODE_TEMP: AttrId = AttrId(79); // konf_partysolltemp_rw
pub const HEAT_REDUCED_TEMP: AttrId = AttrId(85); // konf_raumsolltemp_reduziert_rw
pub const HOT_WATER_SETPOINT_TEMP: AttrId = AttrId(51); // konf_ww_solltemp_rw
pub const BURNER_HOURS_RUN: AttrId = AttrId(104); // anzahl_brennerstunden_r
pub const BURNER_HOURS_RUN_RESET: AttrId = AttrId(106); // anzahl_brennerstunden_w
pub const BURNER_STATE: AttrId = AttrId(600); // zustand_brenner_r
pub const BURNER_STARTS: AttrId = AttrId(111); // anzahl_brennerstart_r
pub const INTERNAL_PUMP_STATUS: AttrId = AttrId(245); // zustand_interne_pumpe_r
pub const HEATING_PUMP_STATUS: AttrId = AttrId(729); // zustand_heizkreispumpe_r
pub const CIRCULATION_PUMP_STATE: AttrId = AttrId(7181); // zustand_zirkulationspumpe_r
pub const PARTY_MODE: AttrId = AttrId(7855); // konf_partybetrieb_rw
pub const ENERGY_SAVING_MODE: AttrId = AttrId(7852); // konf_sparbetrieb_rw
pub const DATE_TIME: AttrId = AttrId(5385); // konf_uhrzeit_rw
pub const CURRENT_ERROR: AttrId = AttrId(7184); // aktuelle_fehler_r
pub const HOLIDAYS_START: AttrId = AttrId(306); // konf_ferien_start_rw
pub const HOLIDAYS_END: AttrId = AttrId(309); // konf_ferien_ende_rw
pub const HOLIDAYS_STATUS: AttrId = AttrId(714); // zustand_ferienprogramm_r
pub const WAY3_VALVE_STATUS: AttrId = AttrId(5389); // info_status_umschaltventil_r
pub const OPERATING_MODE_REQUESTED: AttrId = AttrId(92); // konf_betriebsart_rw
pub const OPERATING_MODE_CURRENT: AttrId = AttrId(708); // aktuelle_betriebsart_r
pub const FROST_PROTECTION_STATUS: AttrId = AttrId(717); // zustand_frostgefahr_r

/// Attribute access rights, combined bitwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttrAccess(u8);

impl AttrAccess {
    pub const NONE: AttrAccess = AttrAccess(0);
    pub const READ_ONLY: AttrAccess = AttrAccess(0b01);
    pub const WRITE_ONLY: AttrAccess = AttrAccess(0b10);
    pub const READ_WRITE: AttrAccess = AttrAccess(0b11);

    /// True when every right in `required` is granted.
    pub fn contains(self, required: AttrAccess) -> bool {
        self.0 & required.0 == required.0
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AttrAccess::READ_ONLY => "read-only",
            AttrAccess::WRITE_ONLY => "write-only",
            AttrAccess::READ_WRITE => "read/write",
            _ => "no-access",
        }
    }
}

impl BitOr for AttrAccess {
    type Output = AttrAccess;

    fn bitor(self, rhs: AttrAccess) -> AttrAccess {
        AttrAccess(self.0 | rhs.0)
    }
}

impl fmt::Display for AttrAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference of one attribute: codec, access rights, name and description.
#[derive(Debug, Clone, PartialEq)]
pub struct AttrRef {
    pub vtype: VitodataType,
    pub access: AttrAccess,
    pub name: String,
    pub doc: String,
    /// Set on entries registered at runtime rather than shipped built in.
    pub custom: bool,
}

impl AttrRef {
    fn builtin(vtype: VitodataType, access: AttrAccess, name: &str, doc: &str) -> Self {
        Self {
            vtype,
            access,
            name: name.to_string(),
            doc: doc.to_string(),
            custom: false,
        }
    }
}

impl fmt::Display for AttrRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} ({} - {})",
            self.name,
            self.doc,
            self.vtype.type_name(),
            self.access
        )
    }
}

/// Catalog of attribute references, indexed both by ID and by name.
///
/// Name↔ID is a bijection: both indices are refreshed together on every
/// mutation. The registry is a plain owned value; share it explicitly
/// (e.g. behind an `Arc`) when several sessions need one catalog.
#[derive(Debug, Clone)]
pub struct AttributeRegistry {
    refs: HashMap<AttrId, AttrRef>,
    by_name: HashMap<String, AttrId>,
    ids: Vec<AttrId>,
}

impl Default for AttributeRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for (id, aref) in builtin_catalog() {
            registry.insert(id, aref);
        }
        registry
    }
}

impl AttributeRegistry {
    /// A registry without even the built-in catalog.
    pub fn empty() -> Self {
        Self {
            refs: HashMap::new(),
            by_name: HashMap::new(),
            ids: Vec::new(),
        }
    }

    pub fn get(&self, id: AttrId) -> Option<&AttrRef> {
        self.refs.get(&id)
    }

    pub fn id_by_name(&self, name: &str) -> Option<AttrId> {
        self.by_name.get(name).copied()
    }

    /// All registered attribute IDs, in registration order.
    pub fn ids(&self) -> &[AttrId] {
        &self.ids
    }

    pub fn iter(&self) -> impl Iterator<Item = (AttrId, &AttrRef)> {
        self.ids.iter().map(move |id| (*id, &self.refs[id]))
    }

    /// Register a runtime-discovered attribute. An existing entry with the
    /// same ID is silently replaced; both indices stay consistent.
    pub fn register(&mut self, id: AttrId, mut aref: AttrRef) {
        aref.custom = true;
        self.insert(id, aref);
    }

    fn insert(&mut self, id: AttrId, aref: AttrRef) {
        let name = aref.name.clone();
        if let Some(old) = self.refs.insert(id, aref) {
            self.by_name.remove(&old.name);
        } else {
            self.ids.push(id);
        }
        self.by_name.insert(name, id);
    }

    /// Check that the attribute grants `required` access. Requiring
    /// read-only on a write-only attribute fails, and the other way around.
    pub fn check_access(&self, id: AttrId, required: AttrAccess) -> Result<()> {
        let aref = self
            .get(id)
            .ok_or_else(|| VitotrolError::UnknownAttribute(id.to_string()))?;
        if !aref.access.contains(required) {
            return Err(VitotrolError::AttributeAccess {
                name: aref.name.clone(),
                required: required.as_str().to_string(),
            });
        }
        Ok(())
    }

    /// Fold server-discovered attribute descriptors into the registry.
    ///
    /// Already-registered IDs are left untouched. Primitive type names map
    /// to their codec, "ENUM" descriptors build an enum codec sized to the
    /// highest reported index (gaps become empty labels). "CircuitTime" is
    /// the internal type backing timesheets and is skipped without noise;
    /// any other unknown type name is skipped with a diagnostic.
    pub fn extend_from_type_info(&mut self, infos: &[AttributeInfo]) {
        for info in infos {
            if self.refs.contains_key(&info.id) {
                continue;
            }

            let vtype = match VitodataType::from_type_name(&info.attr_type) {
                Some(t) => t,
                None if info.attr_type == "ENUM" => {
                    let values = info.enum_values.as_ref();
                    let max_idx = values
                        .and_then(|v| v.keys().max().copied())
                        .map(|m| m as usize);
                    let mut labels = vec![String::new(); max_idx.map_or(0, |m| m + 1)];
                    if let Some(values) = values {
                        for (idx, label) in values {
                            labels[*idx as usize] = label.clone();
                        }
                    }
                    VitodataType::Enum(EnumType::new(labels))
                }
                None => {
                    // Timesheet data points use this marker; nothing to do.
                    if info.attr_type != "CircuitTime" {
                        warn!(
                            "unrecognized type {} for attribute {}-0x{:04x}, discarding it",
                            info.attr_type, info.name, info.id.0
                        );
                    }
                    continue;
                }
            };

            let mut access = AttrAccess::NONE;
            if info.readable {
                access = access | AttrAccess::READ_ONLY;
            }
            if info.writable {
                access = access | AttrAccess::WRITE_ONLY;
            }

            self.register(
                info.id,
                AttrRef {
                    vtype,
                    access,
                    name: format!("{}-0x{:04x}", info.name, info.id.0),
                    doc: info.name.clone(),
                    custom: true,
                },
            );
        }
    }
}

fn builtin_catalog() -> Vec<(AttrId, AttrRef)> {
    use AttrAccess as A;
    use VitodataType as T;

    vec![
        (
            INDOOR_TEMP,
            AttrRef::builtin(T::Double, A::READ_ONLY, "IndoorTemp", "Indoor temperature"),
        ),
        (
            OUTDOOR_TEMP,
            AttrRef::builtin(
                T::Double,
                A::READ_ONLY,
                "OutdoorTemp",
                "Outdoor temperature",
            ),
        ),
        (
            SMOKE_TEMP,
            AttrRef::builtin(T::Double, A::READ_ONLY, "SmokeTemp", "Smoke temperature"),
        ),
        (
            BOILER_TEMP,
            AttrRef::builtin(T::Double, A::READ_ONLY, "BoilerTemp", "Boiler temperature"),
        ),
        (
            HOT_WATER_TEMP,
            AttrRef::builtin(
                T::Double,
                A::READ_ONLY,
                "HotWaterTemp",
                "Hot water temperature",
            ),
        ),
        (
            HOT_WATER_OUT_TEMP,
            AttrRef::builtin(
                T::Double,
                A::READ_ONLY,
                "HotWaterOutTemp",
                "Hot water outlet temperature",
            ),
        ),
        (
            HEAT_WATER_OUT_TEMP,
            AttrRef::builtin(
                T::Double,
                A::READ_ONLY,
                "HeatWaterOutTemp",
                "Heating water outlet temperature",
            ),
        ),
        (
            HEAT_NORMAL_TEMP,
            AttrRef::builtin(
                T::Double,
                A::READ_WRITE,
                "HeatNormalTemp",
                "Setpoint of the normal room temperature",
            ),
        ),
        (
            PARTY_MODE_TEMP,
            AttrRef::builtin(
                T::Double,
                A::READ_WRITE,
                "PartyModeTemp",
                "Party mode temperature",
            ),
        ),
        (
            HEAT_REDUCED_TEMP,
            AttrRef::builtin(
                T::Double,
                A::READ_WRITE,
                "HeatReducedTemp",
                "Setpoint of the reduced room temperature",
            ),
        ),
        (
            HOT_WATER_SETPOINT_TEMP,
            AttrRef::builtin(
                T::Double,
                A::READ_WRITE,
                "HotWaterSetpointTemp",
                "Setpoint of the domestic hot water temperature",
            ),
        ),
        (
            BURNER_HOURS_RUN,
            AttrRef::builtin(T::Double, A::READ_ONLY, "BurnerHoursRun", "Burner hours run"),
        ),
        (
            BURNER_HOURS_RUN_RESET,
            AttrRef::builtin(
                T::Double,
                A::WRITE_ONLY,
                "BurnerHoursRunReset",
                "Reset the burner hours run",
            ),
        ),
        (
            BURNER_STATE,
            AttrRef::builtin(T::on_off_enum(), A::READ_ONLY, "BurnerState", "Burner status"),
        ),
        (
            BURNER_STARTS,
            AttrRef::builtin(T::Double, A::READ_WRITE, "BurnerStarts", "Burner starts"),
        ),
        (
            INTERNAL_PUMP_STATUS,
            AttrRef::builtin(
                T::Enum(EnumType::new(["off", "on", "off2", "on2"])),
                A::READ_ONLY,
                "InternalPumpStatus",
                "Internal pump status",
            ),
        ),
        (
            HEATING_PUMP_STATUS,
            AttrRef::builtin(
                T::on_off_enum(),
                A::READ_ONLY,
                "HeatingPumpStatus",
                "Heating pump status",
            ),
        ),
        (
            CIRCULATION_PUMP_STATE,
            AttrRef::builtin(
                T::on_off_enum(),
                A::READ_ONLY,
                "CirculationPumpState",
                "Circulation pump status",
            ),
        ),
        (
            PARTY_MODE,
            AttrRef::builtin(
                T::enabled_enum(),
                A::READ_WRITE,
                "PartyMode",
                "Party mode status",
            ),
        ),
        (
            ENERGY_SAVING_MODE,
            AttrRef::builtin(
                T::enabled_enum(),
                A::READ_WRITE,
                "EnergySavingMode",
                "Energy saving mode status",
            ),
        ),
        (
            DATE_TIME,
            AttrRef::builtin(T::Date, A::READ_WRITE, "DateTime", "Current date and time"),
        ),
        (
            CURRENT_ERROR,
            AttrRef::builtin(T::String, A::READ_ONLY, "CurrentError", "Current error"),
        ),
        (
            HOLIDAYS_START,
            AttrRef::builtin(
                T::Date,
                A::READ_WRITE,
                "HolidaysStart",
                "Holidays begin date",
            ),
        ),
        (
            HOLIDAYS_END,
            AttrRef::builtin(T::Date, A::READ_WRITE, "HolidaysEnd", "Holidays end date"),
        ),
        (
            HOLIDAYS_STATUS,
            AttrRef::builtin(
                T::enabled_enum(),
                A::READ_ONLY,
                "HolidaysStatus",
                "Holidays program status",
            ),
        ),
        (
            WAY3_VALVE_STATUS,
            AttrRef::builtin(
                T::Enum(EnumType::new([
                    "undefined",
                    "heating",
                    "middle position",
                    "hot water",
                ])),
                A::READ_ONLY,
                "3WayValveStatus",
                "3-way valve status",
            ),
        ),
        (
            OPERATING_MODE_REQUESTED,
            AttrRef::builtin(
                T::Enum(EnumType::new([
                    "off",
                    "DHW only",
                    "heating+DHW",
                    "continuous reduced",
                    "continuous normal",
                ])),
                A::READ_WRITE,
                "OperatingModeRequested",
                "Operating mode requested",
            ),
        ),
        (
            OPERATING_MODE_CURRENT,
            AttrRef::builtin(
                T::Enum(EnumType::new([
                    "stand-by",
                    "reduced",
                    "normal",
                    "continuous normal",
                ])),
                A::READ_ONLY,
                "OperatingModeCurrent",
                "Operating mode",
            ),
        ),
        (
            FROST_PROTECTION_STATUS,
            AttrRef::builtin(
                T::enabled_enum(),
                A::READ_ONLY,
                "FrostProtectionStatus",
                "Frost protection status",
            ),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn name_id_bijection() {
        let registry = AttributeRegistry::default();

        for &id in registry.ids() {
            let aref = registry.get(id).expect("id listed but not registered");
            assert_eq!(
                registry.id_by_name(&aref.name),
                Some(id),
                "name index disagrees for {}",
                aref.name
            );
        }
        assert_eq!(registry.ids().len(), registry.iter().count());
    }

    #[test]
    fn bijection_survives_register() {
        let mut registry = AttributeRegistry::default();

        registry.register(
            AttrId(0x1234),
            AttrRef {
                vtype: VitodataType::String,
                access: AttrAccess::READ_ONLY,
                name: "FreshAttr".to_string(),
                doc: "runtime discovered".to_string(),
                custom: false,
            },
        );

        let aref = registry.get(AttrId(0x1234)).unwrap();
        assert!(aref.custom);
        assert_eq!(registry.id_by_name("FreshAttr"), Some(AttrId(0x1234)));

        for &id in registry.ids() {
            let aref = registry.get(id).unwrap();
            assert_eq!(registry.id_by_name(&aref.name), Some(id));
        }
    }

    #[test]
    fn register_overwrites_silently() {
        let mut registry = AttributeRegistry::default();
        let count = registry.ids().len();

        registry.register(
            INDOOR_TEMP,
            AttrRef {
                vtype: VitodataType::Integer,
                access: AttrAccess::READ_WRITE,
                name: "Replaced".to_string(),
                doc: String::new(),
                custom: false,
            },
        );

        assert_eq!(registry.ids().len(), count);
        assert_eq!(registry.id_by_name("IndoorTemp"), None);
        assert_eq!(registry.id_by_name("Replaced"), Some(INDOOR_TEMP));
    }

    #[test]
    fn access_checks() {
        let registry = AttributeRegistry::default();

        // IndoorTemp is read-only.
        assert!(registry
            .check_access(INDOOR_TEMP, AttrAccess::READ_ONLY)
            .is_ok());
        assert!(matches!(
            registry.check_access(INDOOR_TEMP, AttrAccess::WRITE_ONLY),
            Err(VitotrolError::AttributeAccess { .. })
        ));

        // HeatNormalTemp is read/write.
        assert!(registry
            .check_access(HEAT_NORMAL_TEMP, AttrAccess::READ_ONLY)
            .is_ok());
        assert!(registry
            .check_access(HEAT_NORMAL_TEMP, AttrAccess::WRITE_ONLY)
            .is_ok());

        assert!(matches!(
            registry.check_access(AttrId(1), AttrAccess::READ_ONLY),
            Err(VitotrolError::UnknownAttribute(_))
        ));
    }

    fn info(id: u16, name: &str, attr_type: &str) -> AttributeInfo {
        AttributeInfo {
            id: AttrId(id),
            name: name.to_string(),
            attr_type: attr_type.to_string(),
            type_value: 0,
            min_value: String::new(),
            max_value: String::new(),
            group: String::new(),
            circuit_id: 0,
            default_value: String::new(),
            readable: true,
            writable: false,
            enum_values: None,
        }
    }

    #[test]
    fn extend_from_type_info_registers_primitives_and_enums() {
        let mut registry = AttributeRegistry::empty();

        let mut enum_info = info(0x10, "betriebsart", "ENUM");
        enum_info.writable = true;
        enum_info.enum_values = Some(BTreeMap::from([
            (0, "aus".to_string()),
            (3, "ein".to_string()), // gap: 1 and 2 unreported
        ]));

        registry.extend_from_type_info(&[
            info(0x20, "temp_kessel", "Double"),
            enum_info,
            info(0x30, "schaltzeiten", "CircuitTime"), // timesheet marker, skipped
            info(0x40, "geheimnis", "Blob"),           // unknown, skipped
        ]);

        let double_ref = registry.get(AttrId(0x20)).unwrap();
        assert_eq!(double_ref.name, "temp_kessel-0x0020");
        assert_eq!(double_ref.doc, "temp_kessel");
        assert_eq!(double_ref.vtype, VitodataType::Double);
        assert_eq!(double_ref.access, AttrAccess::READ_ONLY);
        assert!(double_ref.custom);

        let enum_ref = registry.get(AttrId(0x10)).unwrap();
        assert_eq!(enum_ref.access, AttrAccess::READ_WRITE);
        match &enum_ref.vtype {
            VitodataType::Enum(e) => {
                assert_eq!(e.labels(), ["aus", "", "", "ein"]);
            }
            other => panic!("expected enum codec, got {other:?}"),
        }

        assert!(registry.get(AttrId(0x30)).is_none());
        assert!(registry.get(AttrId(0x40)).is_none());
    }

    #[test]
    fn extend_from_type_info_keeps_existing_entries() {
        let mut registry = AttributeRegistry::default();
        let before = registry.get(INDOOR_TEMP).cloned().unwrap();

        registry.extend_from_type_info(&[info(INDOOR_TEMP.0, "temp_rts_r", "String")]);

        assert_eq!(registry.get(INDOOR_TEMP), Some(&before));
    }

    #[test]
    fn no_flags_means_no_access() {
        let mut registry = AttributeRegistry::empty();
        let mut i = info(0x50, "nur_intern", "String");
        i.readable = false;
        registry.extend_from_type_info(&[i]);

        let aref = registry.get(AttrId(0x50)).unwrap();
        assert_eq!(aref.access, AttrAccess::NONE);
        assert!(matches!(
            registry.check_access(AttrId(0x50), AttrAccess::READ_ONLY),
            Err(VitotrolError::AttributeAccess { .. })
        ));
    }
}
