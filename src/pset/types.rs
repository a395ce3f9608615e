//! Parameter type definitions.
//!
//! Every parameter carries a type tag, a trackedness flag and a value. The
//! serialized form of an entry is `{ type, tracked, value }`; the type tag
//! decides how `value` is read back.
//!
//! Non-finite doubles are written as `.inf`, `-.inf` and `.nan` so they
//! survive both YAML and JSON.

use crate::error::ConfigError;
use crate::pset::ParameterSet;
use serde::de::{self, Deserializer, Unexpected, Visitor};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Type tag of a parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamType {
    #[serde(rename = "int32")]
    Int32,
    #[serde(rename = "uint32")]
    UInt32,
    #[serde(rename = "int64")]
    Int64,
    #[serde(rename = "double")]
    Double,
    #[serde(rename = "string")]
    String,
    #[serde(rename = "bool")]
    Bool,
    #[serde(rename = "vint32")]
    VInt32,
    #[serde(rename = "vdouble")]
    VDouble,
    #[serde(rename = "vstring")]
    VString,
    /// Reference to another module by label
    #[serde(rename = "InputTag")]
    InputTag,
    #[serde(rename = "PSet")]
    PSet,
    #[serde(rename = "VPSet")]
    VPSet,
}

impl ParamType {
    /// Get the tag as written in configuration documents
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::Int32 => "int32",
            ParamType::UInt32 => "uint32",
            ParamType::Int64 => "int64",
            ParamType::Double => "double",
            ParamType::String => "string",
            ParamType::Bool => "bool",
            ParamType::VInt32 => "vint32",
            ParamType::VDouble => "vdouble",
            ParamType::VString => "vstring",
            ParamType::InputTag => "InputTag",
            ParamType::PSet => "PSet",
            ParamType::VPSet => "VPSet",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed parameter value.
///
/// Serializes as the bare inner value; the type tag is written next to it
/// by [`Entry`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    #[serde(serialize_with = "serialize_double")]
    Double(f64),
    String(String),
    Bool(bool),
    VInt32(Vec<i32>),
    #[serde(serialize_with = "serialize_doubles")]
    VDouble(Vec<f64>),
    VString(Vec<String>),
    InputTag(String),
    PSet(ParameterSet),
    VPSet(Vec<ParameterSet>),
}

impl ParamValue {
    pub fn param_type(&self) -> ParamType {
        match self {
            ParamValue::Int32(_) => ParamType::Int32,
            ParamValue::UInt32(_) => ParamType::UInt32,
            ParamValue::Int64(_) => ParamType::Int64,
            ParamValue::Double(_) => ParamType::Double,
            ParamValue::String(_) => ParamType::String,
            ParamValue::Bool(_) => ParamType::Bool,
            ParamValue::VInt32(_) => ParamType::VInt32,
            ParamValue::VDouble(_) => ParamType::VDouble,
            ParamValue::VString(_) => ParamType::VString,
            ParamValue::InputTag(_) => ParamType::InputTag,
            ParamValue::PSet(_) => ParamType::PSet,
            ParamValue::VPSet(_) => ParamType::VPSet,
        }
    }
}

/// A double as written in documents
#[derive(Debug, Clone, Copy)]
struct WireDouble(f64);

fn non_finite_name(v: f64) -> &'static str {
    if v.is_nan() {
        ".nan"
    } else if v > 0.0 {
        ".inf"
    } else {
        "-.inf"
    }
}

impl Serialize for WireDouble {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.is_finite() {
            serializer.serialize_f64(self.0)
        } else {
            serializer.serialize_str(non_finite_name(self.0))
        }
    }
}

impl<'de> Deserialize<'de> for WireDouble {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct WireDoubleVisitor;

        impl<'de> Visitor<'de> for WireDoubleVisitor {
            type Value = WireDouble;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a number, .inf, -.inf or .nan")
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<WireDouble, E> {
                Ok(WireDouble(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<WireDouble, E> {
                Ok(WireDouble(v as f64))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<WireDouble, E> {
                Ok(WireDouble(v as f64))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<WireDouble, E> {
                match v {
                    ".inf" | "+.inf" => Ok(WireDouble(f64::INFINITY)),
                    "-.inf" => Ok(WireDouble(f64::NEG_INFINITY)),
                    ".nan" => Ok(WireDouble(f64::NAN)),
                    _ => Err(E::invalid_value(Unexpected::Str(v), &self)),
                }
            }
        }

        deserializer.deserialize_any(WireDoubleVisitor)
    }
}

fn serialize_double<S: Serializer>(v: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    WireDouble(*v).serialize(serializer)
}

fn serialize_doubles<S: Serializer>(v: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(v.iter().copied().map(WireDouble))
}

/// One parameter: value plus trackedness.
///
/// Untracked entries are excluded from provenance comparison but otherwise
/// behave like tracked ones.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawEntry")]
pub struct Entry {
    value: ParamValue,
    tracked: bool,
}

impl Entry {
    /// Create a tracked entry
    pub fn new(value: ParamValue) -> Self {
        Self { value, tracked: true }
    }

    /// Clear the tracked flag
    pub fn untracked(mut self) -> Self {
        self.tracked = false;
        self
    }

    pub fn is_tracked(&self) -> bool {
        self.tracked
    }

    pub fn value(&self) -> &ParamValue {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut ParamValue {
        &mut self.value
    }

    pub fn param_type(&self) -> ParamType {
        self.value.param_type()
    }
}

impl Serialize for Entry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Entry", 3)?;
        state.serialize_field("type", &self.param_type())?;
        state.serialize_field("tracked", &self.tracked)?;
        state.serialize_field("value", &self.value)?;
        state.end()
    }
}

fn default_tracked() -> bool {
    true
}

/// Wire form of an entry before the value is checked against its tag
#[derive(Deserialize)]
struct RawEntry {
    #[serde(rename = "type")]
    kind: ParamType,
    #[serde(default = "default_tracked")]
    tracked: bool,
    value: serde_yaml::Value,
}

impl TryFrom<RawEntry> for Entry {
    type Error = ConfigError;

    fn try_from(raw: RawEntry) -> Result<Self, Self::Error> {
        let kind = raw.kind;
        let bad = |e: serde_yaml::Error| {
            ConfigError::Malformed(format!("value does not match type {}: {}", kind, e))
        };
        let value = match kind {
            ParamType::Int32 => ParamValue::Int32(serde_yaml::from_value(raw.value).map_err(bad)?),
            ParamType::UInt32 => ParamValue::UInt32(serde_yaml::from_value(raw.value).map_err(bad)?),
            ParamType::Int64 => ParamValue::Int64(serde_yaml::from_value(raw.value).map_err(bad)?),
            ParamType::Double => {
                let WireDouble(v) = serde_yaml::from_value(raw.value).map_err(bad)?;
                ParamValue::Double(v)
            }
            ParamType::String => ParamValue::String(serde_yaml::from_value(raw.value).map_err(bad)?),
            ParamType::Bool => ParamValue::Bool(serde_yaml::from_value(raw.value).map_err(bad)?),
            ParamType::VInt32 => ParamValue::VInt32(serde_yaml::from_value(raw.value).map_err(bad)?),
            ParamType::VDouble => {
                let list: Vec<WireDouble> = serde_yaml::from_value(raw.value).map_err(bad)?;
                ParamValue::VDouble(list.into_iter().map(|WireDouble(v)| v).collect())
            }
            ParamType::VString => ParamValue::VString(serde_yaml::from_value(raw.value).map_err(bad)?),
            ParamType::InputTag => ParamValue::InputTag(serde_yaml::from_value(raw.value).map_err(bad)?),
            ParamType::PSet => ParamValue::PSet(serde_yaml::from_value(raw.value).map_err(bad)?),
            ParamType::VPSet => ParamValue::VPSet(serde_yaml::from_value(raw.value).map_err(bad)?),
        };
        Ok(Entry { value, tracked: raw.tracked })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_yaml_form() {
        let entry = Entry::new(ParamValue::Int32(100)).untracked();
        let yaml = serde_yaml::to_string(&entry).unwrap();
        assert!(yaml.contains("type: int32"));
        assert!(yaml.contains("tracked: false"));
        assert!(yaml.contains("value: 100"));
    }

    #[test]
    fn test_tracked_defaults_to_true() {
        let yaml = "type: string\nvalue: generate\n";
        let entry: Entry = serde_yaml::from_str(yaml).unwrap();
        assert!(entry.is_tracked());
        assert_eq!(entry.value(), &ParamValue::String("generate".to_string()));
    }

    #[test]
    fn test_value_must_match_tag() {
        let yaml = "type: int32\nvalue: \"not a number\"\n";
        assert!(serde_yaml::from_str::<Entry>(yaml).is_err());

        let yaml = "type: vstring\nvalue: 7\n";
        assert!(serde_yaml::from_str::<Entry>(yaml).is_err());
    }

    #[test]
    fn test_integer_literal_reads_as_double() {
        let json = r#"{"type": "double", "tracked": true, "value": 100}"#;
        let entry: Entry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.value(), &ParamValue::Double(100.0));
    }

    #[test]
    fn test_non_finite_doubles_survive_both_formats() {
        let entries = [
            Entry::new(ParamValue::Double(f64::INFINITY)),
            Entry::new(ParamValue::VDouble(vec![1.5, f64::NEG_INFINITY])),
        ];
        for entry in entries {
            let yaml = serde_yaml::to_string(&entry).unwrap();
            assert_eq!(serde_yaml::from_str::<Entry>(&yaml).unwrap(), entry);

            let json = serde_json::to_string(&entry).unwrap();
            assert!(!json.contains("null"));
            assert_eq!(serde_json::from_str::<Entry>(&json).unwrap(), entry);
        }

        let nan = Entry::new(ParamValue::Double(f64::NAN));
        let json = serde_json::to_string(&nan).unwrap();
        assert!(json.contains(r#""value":".nan""#));
        let back: Entry = serde_json::from_str(&json).unwrap();
        assert!(matches!(back.value(), ParamValue::Double(v) if v.is_nan()));
    }

    #[test]
    fn test_plain_yaml_infinity_reads_as_double() {
        let entry: Entry = serde_yaml::from_str("type: double\nvalue: -.inf\n").unwrap();
        assert_eq!(entry.value(), &ParamValue::Double(f64::NEG_INFINITY));

        let yaml = "type: double\nvalue: \"infinite\"\n";
        assert!(serde_yaml::from_str::<Entry>(yaml).is_err());
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let yaml = "type: float\nvalue: 1.0\n";
        assert!(serde_yaml::from_str::<Entry>(yaml).is_err());
    }
}
