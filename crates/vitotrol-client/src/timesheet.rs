//! Weekly time programs (timesheets).
//!
//! A timesheet holds, per week day, the slots during which a function
//! (heating, domestic hot water, ...) is active. Days are keyed by their
//! lowercase wire name (`"mon"` .. `"sun"`); when writing, a key may also
//! be a day range such as `"sat-mon"` which wraps past Sunday.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::attributes::AttrId;
use crate::error::{Result, VitotrolError};

/// Time program for central heating.
pub const HEATING_TIMESHEET: AttrId = AttrId(7191);
/// Time program for domestic hot water heating.
pub const HOT_WATER_TIMESHEET: AttrId = AttrId(7192);
/// Time program for the domestic hot water recirculation pump.
pub const HOT_WATER_LOOP_TIMESHEET: AttrId = AttrId(7193);

/// Reference of one timesheet: name and description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimesheetRef {
    pub name: &'static str,
    pub doc: &'static str,
}

impl fmt::Display for TimesheetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.doc)
    }
}

/// All known timesheets.
pub const TIMESHEETS: &[(AttrId, TimesheetRef)] = &[
    (
        HEATING_TIMESHEET,
        TimesheetRef {
            name: "HeatingTimesheet",
            doc: "Time program for central heating",
        },
    ),
    (
        HOT_WATER_TIMESHEET,
        TimesheetRef {
            name: "HotWaterTimesheet",
            doc: "Time program for domestic hot water heating",
        },
    ),
    (
        HOT_WATER_LOOP_TIMESHEET,
        TimesheetRef {
            name: "HotWaterLoopTimesheet",
            doc: "Time program for domestic hot water recirculation pump",
        },
    ),
];

pub fn timesheet_ref(id: AttrId) -> Option<&'static TimesheetRef> {
    TIMESHEETS
        .iter()
        .find(|(tid, _)| *tid == id)
        .map(|(_, r)| r)
}

pub fn timesheet_by_name(name: &str) -> Option<AttrId> {
    TIMESHEETS
        .iter()
        .find(|(_, r)| r.name == name)
        .map(|(id, _)| *id)
}

/// A time slot. Hours and minutes are packed on 16 bits by multiplying
/// hours by 100 before adding the minutes, as on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timeslot {
    pub from: u16,
    pub to: u16,
}

impl fmt::Display for Timeslot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{:02} - {}:{:02}",
            self.from / 100,
            self.from % 100,
            self.to / 100,
            self.to % 100
        )
    }
}

/// One timesheet, keyed by lowercase wire day name.
pub type Timesheet = HashMap<String, Vec<Timeslot>>;

/// Week days in wire order and spelling.
pub const WIRE_DAYS: [&str; 7] = ["MON", "TUE", "WED", "THU", "FRI", "SAT", "SUN"];

fn day_index(day: &str) -> Option<usize> {
    WIRE_DAYS.iter().position(|d| *d == day)
}

/// Expand a day spec into wire day names.
///
/// Accepts a single day (`"mon"`) or a range (`"sat-mon"`), case
/// insensitive. A range whose start falls after its end wraps past Sunday,
/// so `"sat-mon"` expands to SAT, SUN, MON.
pub fn expand_day_spec(spec: &str) -> Result<Vec<&'static str>> {
    let upper = spec.to_uppercase();

    let (from, to) = match day_index(&upper) {
        Some(idx) => (idx, idx),
        None => {
            let (start, end) = upper
                .split_once('-')
                .ok_or_else(|| VitotrolError::BadDay(spec.to_string()))?;
            let from = day_index(start);
            let to = day_index(end);
            match (from, to) {
                (Some(from), Some(to)) => (from, to),
                _ => return Err(VitotrolError::BadDayRange(spec.to_string())),
            }
        }
    };

    let to = if from > to { to + 7 } else { to };
    Ok((from..=to).map(|idx| WIRE_DAYS[idx % 7]).collect())
}

/// Group raw wire slots into a timesheet, sorting each day's slots.
pub(crate) fn group_day_slots(slots: impl IntoIterator<Item = (String, Timeslot)>) -> Timesheet {
    let mut timesheet = Timesheet::new();
    for (day, slot) in slots {
        timesheet.entry(day.to_lowercase()).or_default().push(slot);
    }
    for day_slots in timesheet.values_mut() {
        day_slots.sort();
    }
    timesheet
}

/// Encode a timesheet as the `<Schaltzeit>` elements of a
/// `WriteTimesheetData` request body.
///
/// Input keys are day specs; they are validated and expanded in sorted key
/// order, so a day covered twice always reports the same duplicate. The
/// output lists days in week order, each day's slots sorted by start time
/// with 0-based positions.
pub(crate) fn encode_timesheet_slots(timesheet: &Timesheet) -> Result<String> {
    let mut keys: Vec<&String> = timesheet.keys().collect();
    keys.sort();

    let mut per_day: [Option<&Vec<Timeslot>>; 7] = [None; 7];
    for key in keys {
        for day in expand_day_spec(key)? {
            let idx = day_index(day).unwrap_or_default();
            if per_day[idx].is_some() {
                return Err(VitotrolError::DuplicateDay(day.to_string()));
            }
            per_day[idx] = Some(&timesheet[key]);
        }
    }

    let mut out = String::new();
    for (idx, day_slots) in per_day.iter().enumerate() {
        let Some(day_slots) = day_slots else {
            continue;
        };
        let mut day_slots = (*day_slots).clone();
        day_slots.sort();

        for (position, slot) in day_slots.iter().enumerate() {
            out.push_str(&format!(
                "<Schaltzeit>\
                 <Wochentag>{}</Wochentag>\
                 <ZeitVon>{:04}</ZeitVon>\
                 <ZeitBis>{:04}</ZeitBis>\
                 <Wert>1</Wert>\
                 <Position>{}</Position>\
                 </Schaltzeit>",
                WIRE_DAYS[idx], slot.from, slot.to, position
            ));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn slot(from: u16, to: u16) -> Timeslot {
        Timeslot { from, to }
    }

    #[test]
    fn timeslot_display() {
        assert_eq!(slot(911, 2233).to_string(), "9:11 - 22:33");
        assert_eq!(slot(0, 5).to_string(), "0:00 - 0:05");
    }

    #[test]
    fn refs_and_names() {
        assert_eq!(timesheet_by_name("HeatingTimesheet"), Some(HEATING_TIMESHEET));
        assert_eq!(timesheet_by_name("Nope"), None);

        let r = timesheet_ref(HOT_WATER_TIMESHEET).unwrap();
        assert_eq!(r.name, "HotWaterTimesheet");
        assert_eq!(
            r.to_string(),
            "HotWaterTimesheet: Time program for domestic hot water heating"
        );
        assert_eq!(timesheet_ref(AttrId(1)), None);
    }

    #[test]
    fn expand_single_day() {
        assert_eq!(expand_day_spec("mon").unwrap(), ["MON"]);
        assert_eq!(expand_day_spec("SUN").unwrap(), ["SUN"]);
    }

    #[test]
    fn expand_range() {
        assert_eq!(expand_day_spec("mon-fri").unwrap(), ["MON", "TUE", "WED", "THU", "FRI"]);
        // Wraps past Sunday.
        assert_eq!(expand_day_spec("sat-mon").unwrap(), ["SAT", "SUN", "MON"]);
        assert_eq!(expand_day_spec("sun-sun").unwrap(), ["SUN"]);
    }

    #[test]
    fn expand_bad_specs() {
        assert!(matches!(expand_day_spec("funday"), Err(VitotrolError::BadDay(_))));
        assert!(matches!(
            expand_day_spec("mon-funday"),
            Err(VitotrolError::BadDayRange(_))
        ));
        assert!(matches!(
            expand_day_spec("funday-mon"),
            Err(VitotrolError::BadDayRange(_))
        ));
    }

    #[test]
    fn group_slots_lowercases_and_sorts() {
        let timesheet = group_day_slots([
            ("MON".to_string(), slot(1610, 1820)),
            ("MON".to_string(), slot(610, 820)),
            ("Sat".to_string(), slot(700, 2300)),
        ]);

        assert_eq!(timesheet.len(), 2);
        assert_eq!(timesheet["mon"], [slot(610, 820), slot(1610, 1820)]);
        assert_eq!(timesheet["sat"], [slot(700, 2300)]);
    }

    #[test]
    fn encode_orders_days_and_positions() {
        let mut timesheet = Timesheet::new();
        timesheet.insert("wed".to_string(), vec![slot(610, 820)]);
        timesheet.insert("mon".to_string(), vec![slot(1610, 1820), slot(610, 820)]);

        let body = encode_timesheet_slots(&timesheet).unwrap();
        assert_eq!(
            body,
            "<Schaltzeit><Wochentag>MON</Wochentag>\
             <ZeitVon>0610</ZeitVon><ZeitBis>0820</ZeitBis>\
             <Wert>1</Wert><Position>0</Position></Schaltzeit>\
             <Schaltzeit><Wochentag>MON</Wochentag>\
             <ZeitVon>1610</ZeitVon><ZeitBis>1820</ZeitBis>\
             <Wert>1</Wert><Position>1</Position></Schaltzeit>\
             <Schaltzeit><Wochentag>WED</Wochentag>\
             <ZeitVon>0610</ZeitVon><ZeitBis>0820</ZeitBis>\
             <Wert>1</Wert><Position>0</Position></Schaltzeit>"
        );
    }

    #[test]
    fn encode_expands_ranges() {
        let mut timesheet = Timesheet::new();
        timesheet.insert("sat-mon".to_string(), vec![slot(700, 2300)]);

        let body = encode_timesheet_slots(&timesheet).unwrap();
        // Week order: MON first even though the range starts on SAT.
        let days: Vec<&str> = body
            .match_indices("<Wochentag>")
            .map(|(pos, _)| &body[pos + 11..pos + 14])
            .collect();
        assert_eq!(days, ["MON", "SAT", "SUN"]);
    }

    #[test]
    fn encode_rejects_duplicate_days() {
        let mut timesheet = Timesheet::new();
        timesheet.insert("sat-mon".to_string(), vec![slot(700, 2300)]);
        timesheet.insert("mon".to_string(), vec![slot(610, 820)]);

        // Keys are handled in sorted order: "mon" claims MON first, then
        // "sat-mon" wraps onto it.
        match encode_timesheet_slots(&timesheet) {
            Err(VitotrolError::DuplicateDay(day)) => assert_eq!(day, "MON"),
            other => panic!("expected duplicate day error, got {other:?}"),
        }
    }

    #[test]
    fn encode_rejects_bad_keys() {
        let mut timesheet = Timesheet::new();
        timesheet.insert("lundi".to_string(), vec![slot(610, 820)]);
        assert!(matches!(
            encode_timesheet_slots(&timesheet),
            Err(VitotrolError::BadDay(_))
        ));
    }
}
