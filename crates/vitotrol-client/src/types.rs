//! Vitodata™ value type system.
//!
//! Every attribute exposed by the Vitodata service is self-describing: the
//! server reports a type name and the wire carries plain strings. This module
//! models those types as a closed sum ([`VitodataType`]) providing the three
//! conversions the rest of the crate relies on:
//!
//! - human-readable text → wire ("Vitodata") text,
//! - wire text → human-readable text,
//! - wire text → a native typed value ([`NativeValue`]).

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer};

use crate::error::{Result, VitotrolError};

/// Wire format of Vitodata timestamps: local wall-clock, no offset.
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A Vitodata timestamp.
///
/// The wire format carries no timezone indicator; values are local
/// wall-clock times, hence the `NaiveDateTime` representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Time(pub NaiveDateTime);

impl Time {
    /// Parse a `YYYY-MM-DD HH:MM:SS` timestamp.
    pub fn parse(value: &str) -> Result<Self> {
        NaiveDateTime::parse_from_str(value, TIME_FORMAT)
            .map(Time)
            .map_err(|_| VitotrolError::FormatInvalid(value.to_string()))
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIME_FORMAT))
    }
}

impl From<NaiveDateTime> for Time {
    fn from(dt: NaiveDateTime) -> Self {
        Time(dt)
    }
}

impl<'de> Deserialize<'de> for Time {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Time::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Timestamped wire-format value of an attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub value: String,
    pub time: Time,
}

impl Value {
    /// Numerical reading of this value. Non-numeric contents yield 0.
    pub fn num(&self) -> f64 {
        self.value.parse().unwrap_or(0.0)
    }
}

/// Native, typed form of a wire value.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    Double(f64),
    Integer(i64),
    Date(Time),
    String(String),
    EnumIndex(u64),
}

/// An enum type parameterized by its ordered label list.
///
/// The wire representation of an enum value is its zero-based index as a
/// decimal string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    labels: Vec<String>,
}

impl EnumType {
    pub fn new<S: Into<String>>(labels: impl IntoIterator<Item = S>) -> Self {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Decode a wire index, failing with [`VitotrolError::EnumInvalidValue`]
    /// when the text is not a number or the index falls outside `[0, N)`.
    fn index(&self, value: &str) -> Result<u64> {
        let idx = value
            .parse::<u64>()
            .map_err(|_| VitotrolError::EnumInvalidValue(value.to_string()))?;
        if idx >= self.labels.len() as u64 {
            return Err(VitotrolError::EnumInvalidValue(value.to_string()));
        }
        Ok(idx)
    }
}

/// The closed set of Vitodata value types.
#[derive(Debug, Clone, PartialEq)]
pub enum VitodataType {
    Double,
    Integer,
    Date,
    String,
    Enum(EnumType),
}

impl VitodataType {
    /// Enum used by on/off status attributes.
    pub fn on_off_enum() -> Self {
        VitodataType::Enum(EnumType::new(["off", "on"]))
    }

    /// Enum used by enabled/disabled status attributes.
    pub fn enabled_enum() -> Self {
        VitodataType::Enum(EnumType::new(["disabled", "enabled"]))
    }

    /// Resolve a primitive type as reported by the server (GetTypeInfo).
    /// Enums are not resolvable by name: they are built from the reported
    /// value table instead.
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "Double" => Some(VitodataType::Double),
            "Integer" => Some(VitodataType::Integer),
            "Date" => Some(VitodataType::Date),
            "String" => Some(VitodataType::String),
            _ => None,
        }
    }

    /// Human name of the type ("Double", "Integer", "Date", "String",
    /// "EnumN").
    pub fn type_name(&self) -> String {
        match self {
            VitodataType::Double => "Double".to_string(),
            VitodataType::Integer => "Integer".to_string(),
            VitodataType::Date => "Date".to_string(),
            VitodataType::String => "String".to_string(),
            VitodataType::Enum(e) => format!("Enum{}", e.len()),
        }
    }

    /// Convert a human-readable value to its wire form.
    pub fn human_to_vitodata(&self, value: &str) -> Result<String> {
        match self {
            VitodataType::Double => {
                let num: f64 = value
                    .parse()
                    .map_err(|_| VitotrolError::FormatInvalid(value.to_string()))?;
                Ok(format_double(num))
            }
            VitodataType::Integer => {
                let num: i64 = value
                    .parse()
                    .map_err(|_| VitotrolError::FormatInvalid(value.to_string()))?;
                Ok(num.to_string())
            }
            VitodataType::Date => Ok(Time::parse(value)?.to_string()),
            VitodataType::String => Ok(value.to_string()),
            VitodataType::Enum(e) => {
                // Accept the label text first, then the numeric index.
                if let Some(idx) = e.labels.iter().position(|l| l == value) {
                    return Ok(idx.to_string());
                }
                Ok(e.index(value)?.to_string())
            }
        }
    }

    /// Convert a wire value to its human-readable form.
    pub fn vitodata_to_human(&self, value: &str) -> Result<String> {
        match self {
            VitodataType::Double => {
                let num = parse_wire_double(value)?;
                Ok(format_double(num))
            }
            VitodataType::Integer => self.human_to_vitodata(value),
            VitodataType::Date => Ok(Time::parse(value)?.to_string()),
            VitodataType::String => Ok(value.to_string()),
            VitodataType::Enum(e) => Ok(e.labels[e.index(value)? as usize].clone()),
        }
    }

    /// Convert a wire value to its native typed form.
    pub fn vitodata_to_native(&self, value: &str) -> Result<NativeValue> {
        match self {
            VitodataType::Double => Ok(NativeValue::Double(parse_wire_double(value)?)),
            VitodataType::Integer => {
                let num: i64 = value
                    .parse()
                    .map_err(|_| VitotrolError::FormatInvalid(value.to_string()))?;
                Ok(NativeValue::Integer(num))
            }
            VitodataType::Date => Ok(NativeValue::Date(Time::parse(value)?)),
            VitodataType::String => Ok(NativeValue::String(value.to_string())),
            VitodataType::Enum(e) => Ok(NativeValue::EnumIndex(e.index(value)?)),
        }
    }
}

/// Wire doubles use a comma as decimal separator.
fn parse_wire_double(value: &str) -> Result<f64> {
    value
        .replacen(',', ".", 1)
        .parse()
        .map_err(|_| VitotrolError::FormatInvalid(value.to_string()))
}

/// Shortest decimal representation, never exponent notation.
fn format_double(num: f64) -> String {
    format!("{}", num)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn double_conversions() {
        let t = VitodataType::Double;
        assert_eq!(t.type_name(), "Double");

        assert_eq!(t.human_to_vitodata("1.200").unwrap(), "1.2");
        assert!(matches!(
            t.human_to_vitodata("foo"),
            Err(VitotrolError::FormatInvalid(_))
        ));

        assert_eq!(t.vitodata_to_human("1,200").unwrap(), "1.2");
        assert_eq!(t.vitodata_to_human("1.200").unwrap(), "1.2");
        assert!(matches!(
            t.vitodata_to_human("foo"),
            Err(VitotrolError::FormatInvalid(_))
        ));

        assert_eq!(
            t.vitodata_to_native("1,200").unwrap(),
            NativeValue::Double(1.2)
        );
        assert!(t.vitodata_to_native("foo").is_err());
    }

    #[test]
    fn integer_conversions() {
        let t = VitodataType::Integer;
        assert_eq!(t.type_name(), "Integer");

        assert_eq!(t.human_to_vitodata("12").unwrap(), "12");
        assert!(t.human_to_vitodata("foo").is_err());

        // Zero-padding is removed by reformatting.
        assert_eq!(t.vitodata_to_human("00012").unwrap(), "12");
        assert!(t.vitodata_to_human("foo").is_err());

        assert_eq!(
            t.vitodata_to_native("00012").unwrap(),
            NativeValue::Integer(12)
        );
    }

    #[test]
    fn date_conversions() {
        let t = VitodataType::Date;
        assert_eq!(t.type_name(), "Date");

        const REF: &str = "2016-09-26 11:22:33";

        assert_eq!(t.human_to_vitodata(REF).unwrap(), REF);
        assert!(t.human_to_vitodata("foo").is_err());

        assert_eq!(t.vitodata_to_human(REF).unwrap(), REF);

        let native = t.vitodata_to_native(REF).unwrap();
        assert_eq!(native, NativeValue::Date(Time::parse(REF).unwrap()));
    }

    #[test]
    fn string_conversions() {
        let t = VitodataType::String;
        assert_eq!(t.type_name(), "String");

        assert_eq!(t.human_to_vitodata("foobar").unwrap(), "foobar");
        assert_eq!(t.vitodata_to_human("foobar").unwrap(), "foobar");
        assert_eq!(
            t.vitodata_to_native("foobar").unwrap(),
            NativeValue::String("foobar".to_string())
        );
    }

    #[test]
    fn enum_conversions() {
        let t = VitodataType::Enum(EnumType::new(["zero", "one", "two"]));
        assert_eq!(t.type_name(), "Enum3");

        // Label or index are both accepted on the human side.
        assert_eq!(t.human_to_vitodata("one").unwrap(), "1");
        assert_eq!(t.human_to_vitodata("1").unwrap(), "1");
        assert!(matches!(
            t.human_to_vitodata("foo"),
            Err(VitotrolError::EnumInvalidValue(_))
        ));

        assert_eq!(t.vitodata_to_human("2").unwrap(), "two");
        assert_eq!(
            t.vitodata_to_native("1").unwrap(),
            NativeValue::EnumIndex(1)
        );
    }

    #[test]
    fn enum_out_of_domain_is_a_distinct_error() {
        let t = VitodataType::Enum(EnumType::new(["zero", "one", "two"]));

        // Out-of-range index and non-numeric text both fail with the
        // enum-specific kind, never the generic one.
        assert!(matches!(
            t.vitodata_to_human("42"),
            Err(VitotrolError::EnumInvalidValue(_))
        ));
        assert!(matches!(
            t.vitodata_to_human("foo"),
            Err(VitotrolError::EnumInvalidValue(_))
        ));
        assert!(matches!(
            t.vitodata_to_native("3"),
            Err(VitotrolError::EnumInvalidValue(_))
        ));
    }

    #[test]
    fn named_enums() {
        assert_eq!(
            VitodataType::on_off_enum().vitodata_to_human("1").unwrap(),
            "on"
        );
        assert_eq!(
            VitodataType::enabled_enum()
                .vitodata_to_human("0")
                .unwrap(),
            "disabled"
        );
    }

    #[test]
    fn lenient_value_num() {
        let time = Time::parse("2016-09-26 11:22:33").unwrap();
        let v = Value {
            value: "21.5".to_string(),
            time,
        };
        assert_eq!(v.num(), 21.5);

        let v = Value {
            value: "not a number".to_string(),
            time,
        };
        assert_eq!(v.num(), 0.0);
    }

    #[test]
    fn time_round_trip() {
        let t = Time::parse("2016-09-26 11:22:33").unwrap();
        assert_eq!(t.to_string(), "2016-09-26 11:22:33");
        assert!(Time::parse("foo").is_err());
    }
}
