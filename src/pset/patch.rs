//! Typed overrides applied to a loaded parameter set.
//!
//! Loaded templates are adjusted with an explicit list of [`Override`]s
//! instead of reaching into their attribute tree.

use crate::error::Result;
use crate::pset::{mismatch, Entry, ParamValue, ParameterSet};
use log::debug;

/// A single change to a parameter set, addressed by dotted path
#[derive(Debug, Clone, PartialEq)]
pub enum Override {
    /// Replace or create the entry at `path`
    Set { path: String, entry: Entry },
    /// Extend the vector at `path` with `values` (same vector type)
    Append { path: String, values: ParamValue },
}

impl Override {
    pub fn set(path: impl Into<String>, entry: Entry) -> Self {
        Override::Set { path: path.into(), entry }
    }

    pub fn append(path: impl Into<String>, values: ParamValue) -> Self {
        Override::Append { path: path.into(), values }
    }

    pub fn path(&self) -> &str {
        match self {
            Override::Set { path, .. } | Override::Append { path, .. } => path,
        }
    }
}

/// Apply overrides in order and return the patched set
pub fn apply_overrides(mut pset: ParameterSet, overrides: &[Override]) -> Result<ParameterSet> {
    for ov in overrides {
        apply_one(&mut pset, ov)?;
    }
    Ok(pset)
}

fn apply_one(pset: &mut ParameterSet, ov: &Override) -> Result<()> {
    match ov {
        Override::Set { path, entry } => {
            let (parent, leaf) = pset.parent_of_mut(path)?;
            debug!("Override {} = {:?}", path, entry.value());
            parent.insert(leaf, entry.clone());
        }
        Override::Append { path, values } => {
            let target = pset
                .get_path_mut(path)
                .ok_or_else(|| crate::error::ConfigError::NoSuchParameter(path.clone()))?;
            debug!("Override {} += {:?}", path, values);
            match (target.value_mut(), values) {
                (ParamValue::VString(list), ParamValue::VString(more)) => list.extend(more.iter().cloned()),
                (ParamValue::VInt32(list), ParamValue::VInt32(more)) => list.extend(more.iter().copied()),
                (ParamValue::VDouble(list), ParamValue::VDouble(more)) => list.extend(more.iter().copied()),
                (ParamValue::VPSet(list), ParamValue::VPSet(more)) => list.extend(more.iter().cloned()),
                (current, more) => {
                    return Err(mismatch(path, more.param_type(), current));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::pset::{int32, pset, string, vstring};

    fn template() -> ParameterSet {
        ParameterSet::new()
            .with("categories", vstring(["FwkJob"]).untracked())
            .with("debugModules", vstring(Vec::<String>::new()).untracked())
            .with(
                "cerr",
                pset(ParameterSet::new().with("threshold", string("INFO").untracked())).untracked(),
            )
    }

    #[test]
    fn test_set_nested_value() {
        let patched = apply_overrides(
            template(),
            &[Override::set("cerr.threshold", string("DEBUG").untracked())],
        )
        .unwrap();
        let cerr = patched.get_pset("cerr").unwrap();
        assert_eq!(cerr.get_str("threshold").unwrap(), "DEBUG");
    }

    #[test]
    fn test_set_creates_leaf() {
        let patched = apply_overrides(
            template(),
            &[Override::set("cerr.lineLength", int32(132).untracked())],
        )
        .unwrap();
        assert_eq!(patched.get_pset("cerr").unwrap().get_i32("lineLength").unwrap(), 132);
    }

    #[test]
    fn test_append_keeps_order_and_duplicates() {
        let patched = apply_overrides(
            template(),
            &[
                Override::append("categories", ParamValue::VString(vec!["ToyHitInfo".into()])),
                Override::append("categories", ParamValue::VString(vec!["GEOM".into(), "GEOM".into()])),
            ],
        )
        .unwrap();
        assert_eq!(
            patched.get_vstring("categories").unwrap(),
            &["FwkJob", "ToyHitInfo", "GEOM", "GEOM"]
        );
    }

    #[test]
    fn test_append_to_scalar_fails() {
        let err = apply_overrides(
            template(),
            &[Override::append("cerr.threshold", ParamValue::VString(vec!["x".into()]))],
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::TypeMismatch { .. }));
    }

    #[test]
    fn test_append_wrong_element_type_fails() {
        let err = apply_overrides(
            template(),
            &[Override::append("categories", ParamValue::VInt32(vec![1]))],
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::TypeMismatch { .. }));
    }

    #[test]
    fn test_missing_path_fails() {
        let err = apply_overrides(
            template(),
            &[Override::append("destinations", ParamValue::VString(vec!["cout".into()]))],
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::NoSuchParameter(_)));

        let err = apply_overrides(
            template(),
            &[Override::set("cout.threshold", string("DEBUG"))],
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::NoSuchParameter(_)));
    }
}
