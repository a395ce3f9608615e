//! # Parameter Set Module
//!
//! Typed, trackedness-tagged key/value bundles that configure modules and
//! services.
//!
//! ## Constructors
//!
//! Values are built with small typed constructors and marked untracked with
//! [`Entry::untracked`]:
//!
//! ```rust
//! use detsim::pset::{int32, string, vint32, ParameterSet};
//!
//! let pset = ParameterSet::new()
//!     .with("inputfile", string("Mu2eG4/test/genconfig_tonly.txt").untracked())
//!     .with("seed", vint32([7789]).untracked())
//!     .with("diagLevel", int32(0));
//!
//! assert_eq!(pset.get_str("inputfile").unwrap(), "Mu2eG4/test/genconfig_tonly.txt");
//! ```
//!
//! ## Trackedness
//!
//! Tracked entries take part in provenance: [`ParameterSet::provenance_key`]
//! only covers them, so two sets that differ in untracked entries (print
//! levels, file names, seeds) compare equal for provenance purposes.
//!
//! ## Dotted Paths
//!
//! Nested sets are addressed with dotted paths such as `cerr.threshold`.
//! The override machinery in [`patch`] is built on these.

pub mod patch;
pub mod types;

pub use patch::{apply_overrides, Override};
pub use types::{Entry, ParamType, ParamValue};

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A typed parameter set. Keys are unique and kept sorted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet {
    entries: BTreeMap<String, Entry>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`ParameterSet::insert`]
    pub fn with(mut self, name: impl Into<String>, entry: Entry) -> Self {
        self.insert(name, entry);
        self
    }

    /// Insert an entry, returning the one it replaced
    pub fn insert(&mut self, name: impl Into<String>, entry: Entry) -> Option<Entry> {
        self.entries.insert(name.into(), entry)
    }

    pub fn remove(&mut self, name: &str) -> Option<Entry> {
        self.entries.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Entry> {
        self.entries.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Entry)> {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    fn require(&self, name: &str) -> Result<&Entry> {
        self.get(name)
            .ok_or_else(|| ConfigError::NoSuchParameter(name.to_string()))
    }

    pub fn get_i32(&self, name: &str) -> Result<i32> {
        match self.require(name)?.value() {
            ParamValue::Int32(v) => Ok(*v),
            other => Err(mismatch(name, ParamType::Int32, other)),
        }
    }

    pub fn get_f64(&self, name: &str) -> Result<f64> {
        match self.require(name)?.value() {
            ParamValue::Double(v) => Ok(*v),
            other => Err(mismatch(name, ParamType::Double, other)),
        }
    }

    pub fn get_bool(&self, name: &str) -> Result<bool> {
        match self.require(name)?.value() {
            ParamValue::Bool(v) => Ok(*v),
            other => Err(mismatch(name, ParamType::Bool, other)),
        }
    }

    pub fn get_str(&self, name: &str) -> Result<&str> {
        match self.require(name)?.value() {
            ParamValue::String(v) => Ok(v),
            other => Err(mismatch(name, ParamType::String, other)),
        }
    }

    pub fn get_input_tag(&self, name: &str) -> Result<&str> {
        match self.require(name)?.value() {
            ParamValue::InputTag(v) => Ok(v),
            other => Err(mismatch(name, ParamType::InputTag, other)),
        }
    }

    pub fn get_vint32(&self, name: &str) -> Result<&[i32]> {
        match self.require(name)?.value() {
            ParamValue::VInt32(v) => Ok(v),
            other => Err(mismatch(name, ParamType::VInt32, other)),
        }
    }

    pub fn get_vstring(&self, name: &str) -> Result<&[String]> {
        match self.require(name)?.value() {
            ParamValue::VString(v) => Ok(v),
            other => Err(mismatch(name, ParamType::VString, other)),
        }
    }

    pub fn get_pset(&self, name: &str) -> Result<&ParameterSet> {
        match self.require(name)?.value() {
            ParamValue::PSet(v) => Ok(v),
            other => Err(mismatch(name, ParamType::PSet, other)),
        }
    }

    /// Look up an entry by dotted path, descending through nested sets
    pub fn get_path(&self, path: &str) -> Option<&Entry> {
        let (parents, leaf) = split_path(path);
        let mut current = self;
        for segment in parents {
            match current.get(segment)?.value() {
                ParamValue::PSet(inner) => current = inner,
                _ => return None,
            }
        }
        current.get(leaf)
    }

    /// Find the set that owns the last segment of `path`.
    ///
    /// Every intermediate segment must name an existing `PSet`.
    pub fn parent_of_mut(&mut self, path: &str) -> Result<(&mut ParameterSet, String)> {
        let (parents, leaf) = split_path(path);
        let mut current = self;
        let mut walked = String::new();
        for segment in parents {
            if !walked.is_empty() {
                walked.push('.');
            }
            walked.push_str(segment);
            let entry = current
                .get_mut(segment)
                .ok_or_else(|| ConfigError::NoSuchParameter(walked.clone()))?;
            match entry.value_mut() {
                ParamValue::PSet(inner) => current = inner,
                other => return Err(mismatch(&walked, ParamType::PSet, other)),
            }
        }
        Ok((current, leaf.to_string()))
    }

    pub fn get_path_mut(&mut self, path: &str) -> Option<&mut Entry> {
        let (parent, leaf) = self.parent_of_mut(path).ok()?;
        parent.get_mut(&leaf)
    }

    /// Copy of this set with untracked entries removed, recursively
    pub fn tracked_view(&self) -> ParameterSet {
        let mut view = ParameterSet::new();
        for (name, entry) in &self.entries {
            if !entry.is_tracked() {
                continue;
            }
            let value = match entry.value() {
                ParamValue::PSet(inner) => ParamValue::PSet(inner.tracked_view()),
                ParamValue::VPSet(list) => {
                    ParamValue::VPSet(list.iter().map(ParameterSet::tracked_view).collect())
                }
                other => other.clone(),
            };
            view.insert(name.clone(), Entry::new(value));
        }
        view
    }

    /// Canonical form of the tracked content.
    ///
    /// Sets with equal keys are interchangeable for provenance.
    pub fn provenance_key(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.tracked_view())?)
    }

    pub fn same_provenance(&self, other: &ParameterSet) -> Result<bool> {
        Ok(self.provenance_key()? == other.provenance_key()?)
    }

    /// All `InputTag` values in this set as `(dotted path, label)` pairs
    pub fn input_tags(&self) -> Vec<(String, String)> {
        let mut found = Vec::new();
        self.collect_input_tags("", &mut found);
        found
    }

    fn collect_input_tags(&self, prefix: &str, found: &mut Vec<(String, String)>) {
        for (name, entry) in &self.entries {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{}.{}", prefix, name)
            };
            match entry.value() {
                ParamValue::InputTag(label) => found.push((path, label.clone())),
                ParamValue::PSet(inner) => inner.collect_input_tags(&path, found),
                ParamValue::VPSet(list) => {
                    for (i, inner) in list.iter().enumerate() {
                        inner.collect_input_tags(&format!("{}[{}]", path, i), found);
                    }
                }
                _ => {}
            }
        }
    }
}

fn split_path(path: &str) -> (Vec<&str>, &str) {
    let mut segments: Vec<&str> = path.split('.').collect();
    let leaf = segments.pop().unwrap_or(path);
    (segments, leaf)
}

pub(crate) fn mismatch(path: &str, expected: ParamType, actual: &ParamValue) -> ConfigError {
    ConfigError::TypeMismatch {
        path: path.to_string(),
        expected: expected.to_string(),
        actual: actual.param_type().to_string(),
    }
}

pub fn int32(v: i32) -> Entry {
    Entry::new(ParamValue::Int32(v))
}

pub fn uint32(v: u32) -> Entry {
    Entry::new(ParamValue::UInt32(v))
}

pub fn int64(v: i64) -> Entry {
    Entry::new(ParamValue::Int64(v))
}

pub fn double(v: f64) -> Entry {
    Entry::new(ParamValue::Double(v))
}

pub fn string(v: impl Into<String>) -> Entry {
    Entry::new(ParamValue::String(v.into()))
}

pub fn boolean(v: bool) -> Entry {
    Entry::new(ParamValue::Bool(v))
}

pub fn vint32(v: impl IntoIterator<Item = i32>) -> Entry {
    Entry::new(ParamValue::VInt32(v.into_iter().collect()))
}

pub fn vdouble(v: impl IntoIterator<Item = f64>) -> Entry {
    Entry::new(ParamValue::VDouble(v.into_iter().collect()))
}

pub fn vstring<S: Into<String>>(v: impl IntoIterator<Item = S>) -> Entry {
    Entry::new(ParamValue::VString(v.into_iter().map(Into::into).collect()))
}

/// Reference to another module's products by label
pub fn input_tag(label: impl Into<String>) -> Entry {
    Entry::new(ParamValue::InputTag(label.into()))
}

pub fn pset(v: ParameterSet) -> Entry {
    Entry::new(ParamValue::PSet(v))
}

pub fn vpset(v: impl IntoIterator<Item = ParameterSet>) -> Entry {
    Entry::new(ParamValue::VPSet(v.into_iter().collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logger() -> ParameterSet {
        ParameterSet::new()
            .with("categories", vstring(["FwkJob"]).untracked())
            .with(
                "cerr",
                pset(ParameterSet::new().with("threshold", string("INFO").untracked())).untracked(),
            )
    }

    #[test]
    fn test_insert_replaces() {
        let mut ps = ParameterSet::new();
        assert!(ps.insert("maxFullPrint", int32(5)).is_none());
        let old = ps.insert("maxFullPrint", int32(201)).unwrap();
        assert_eq!(old.value(), &ParamValue::Int32(5));
        assert_eq!(ps.len(), 1);
        assert_eq!(ps.get_i32("maxFullPrint").unwrap(), 201);
    }

    #[test]
    fn test_typed_getters() {
        let ps = ParameterSet::new()
            .with("minimumEnergy", double(0.0))
            .with("closeFileFast", boolean(false).untracked())
            .with("g4ModuleLabel", input_tag("g4run"))
            .with("seed", vint32([9877]).untracked());

        assert_eq!(ps.get_f64("minimumEnergy").unwrap(), 0.0);
        assert!(!ps.get_bool("closeFileFast").unwrap());
        assert_eq!(ps.get_input_tag("g4ModuleLabel").unwrap(), "g4run");
        assert_eq!(ps.get_vint32("seed").unwrap(), &[9877]);

        assert!(matches!(ps.get_i32("minimumEnergy"), Err(ConfigError::TypeMismatch { .. })));
        assert!(matches!(ps.get_i32("missing"), Err(ConfigError::NoSuchParameter(_))));
    }

    #[test]
    fn test_dotted_path_lookup() {
        let ps = logger();
        let threshold = ps.get_path("cerr.threshold").unwrap();
        assert_eq!(threshold.value(), &ParamValue::String("INFO".to_string()));
        assert!(ps.get_path("cerr.missing").is_none());
        assert!(ps.get_path("categories.threshold").is_none());
    }

    #[test]
    fn test_parent_of_mut_rejects_scalar_parent() {
        let mut ps = logger();
        let err = ps.parent_of_mut("categories.x").unwrap_err();
        assert!(matches!(err, ConfigError::TypeMismatch { .. }));
        let err = ps.parent_of_mut("nope.x").unwrap_err();
        assert!(matches!(err, ConfigError::NoSuchParameter(_)));
    }

    #[test]
    fn test_untracked_entries_ignored_for_provenance() {
        let a = ParameterSet::new()
            .with("g4ModuleLabel", input_tag("g4run"))
            .with("maxFullPrint", int32(5).untracked());
        let b = ParameterSet::new()
            .with("g4ModuleLabel", input_tag("g4run"))
            .with("maxFullPrint", int32(201).untracked());
        let c = ParameterSet::new()
            .with("g4ModuleLabel", input_tag("other"))
            .with("maxFullPrint", int32(5).untracked());

        assert_ne!(a, b);
        assert!(a.same_provenance(&b).unwrap());
        assert!(!a.same_provenance(&c).unwrap());
    }

    #[test]
    fn test_provenance_tells_non_finite_doubles_apart() {
        let key = |v: f64| ParameterSet::new().with("minimumTimeGap", double(v)).provenance_key().unwrap();
        assert_ne!(key(f64::INFINITY), key(f64::NEG_INFINITY));
        assert_ne!(key(f64::INFINITY), key(f64::NAN));
        assert_eq!(key(f64::NAN), key(f64::NAN));
        assert!(!key(f64::INFINITY).contains("null"));
    }

    #[test]
    fn test_tracked_view_recurses() {
        let inner = ParameterSet::new()
            .with("limit", int32(5).untracked())
            .with("threshold", string("INFO"));
        let ps = ParameterSet::new().with("cerr", pset(inner));
        let view = ps.tracked_view();
        let cerr = view.get_pset("cerr").unwrap();
        assert!(cerr.contains("threshold"));
        assert!(!cerr.contains("limit"));
    }

    #[test]
    fn test_input_tags_found_in_nested_sets() {
        let ps = ParameterSet::new()
            .with("g4ModuleLabel", input_tag("g4run"))
            .with("inner", pset(ParameterSet::new().with("src", input_tag("generate"))))
            .with("list", vpset([ParameterSet::new().with("src", input_tag("checkhits"))]));

        let tags = ps.input_tags();
        assert_eq!(
            tags,
            vec![
                ("g4ModuleLabel".to_string(), "g4run".to_string()),
                ("inner.src".to_string(), "generate".to_string()),
                ("list[0].src".to_string(), "checkhits".to_string()),
            ]
        );
    }

    #[test]
    fn test_nested_set_round_trip() {
        let ps = logger().with("list", vpset([ParameterSet::new().with("a", double(1.5))]));
        let yaml = serde_yaml::to_string(&ps).unwrap();
        let back: ParameterSet = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(ps, back);
    }
}
