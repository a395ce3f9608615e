//! Path composition.
//!
//! A path is an ordered sequence of module labels. Sequences are built from
//! module handles with `*`, left to right:
//!
//! ```rust
//! use detsim::process::{ModuleKind, Process};
//! use detsim::pset::{input_tag, ParameterSet};
//!
//! let mut process = Process::new("demo")?;
//! let generate = process.register_module("generate", ModuleKind::Producer, "EventGenerator", ParameterSet::new())?;
//! let g4run = process.register_module(
//!     "g4run",
//!     ModuleKind::Producer,
//!     "G4",
//!     ParameterSet::new().with("generatorModuleLabel", input_tag("generate")),
//! )?;
//! process.add_end_path("output", &generate * &g4run)?;
//! assert_eq!(process.end_path().unwrap().sequence, vec!["generate", "g4run"]);
//! # Ok::<(), detsim::error::ConfigError>(())
//! ```

use crate::process::types::ModuleHandle;
use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// Whether a path is a regular path or the terminal end path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathKind {
    Path,
    EndPath,
}

impl PathKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PathKind::Path => "Path",
            PathKind::EndPath => "EndPath",
        }
    }
}

/// A registered path: name, kind and the labels in execution order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathDecl {
    pub name: String,
    pub kind: PathKind,
    pub sequence: Vec<String>,
}

/// An ordered, not yet registered, composition of module handles
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sequence {
    handles: Vec<ModuleHandle>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a module to the end of the sequence
    pub fn then(mut self, handle: &ModuleHandle) -> Self {
        self.handles.push(handle.clone());
        self
    }

    pub fn handles(&self) -> &[ModuleHandle] {
        &self.handles
    }

    pub fn labels(&self) -> Vec<String> {
        self.handles.iter().map(|h| h.label().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl From<&ModuleHandle> for Sequence {
    fn from(handle: &ModuleHandle) -> Self {
        Sequence::new().then(handle)
    }
}

impl From<ModuleHandle> for Sequence {
    fn from(handle: ModuleHandle) -> Self {
        Sequence { handles: vec![handle] }
    }
}

impl Mul<&ModuleHandle> for &ModuleHandle {
    type Output = Sequence;

    fn mul(self, rhs: &ModuleHandle) -> Sequence {
        Sequence::from(self).then(rhs)
    }
}

impl Mul<ModuleHandle> for ModuleHandle {
    type Output = Sequence;

    fn mul(self, rhs: ModuleHandle) -> Sequence {
        Sequence { handles: vec![self, rhs] }
    }
}

impl Mul<&ModuleHandle> for Sequence {
    type Output = Sequence;

    fn mul(self, rhs: &ModuleHandle) -> Sequence {
        self.then(rhs)
    }
}

impl Mul<ModuleHandle> for Sequence {
    type Output = Sequence;

    fn mul(mut self, rhs: ModuleHandle) -> Sequence {
        self.handles.push(rhs);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::types::ModuleKind;

    fn handle(label: &str) -> ModuleHandle {
        ModuleHandle::new(label, ModuleKind::Producer)
    }

    #[test]
    fn test_operator_builds_left_to_right() {
        let a = handle("generate");
        let b = handle("g4run");
        let c = handle("checkhits");
        let seq = &a * &b * &c;
        assert_eq!(seq.labels(), vec!["generate", "g4run", "checkhits"]);
    }

    #[test]
    fn test_owned_and_borrowed_forms_agree() {
        let borrowed = &handle("a") * &handle("b");
        let owned = handle("a") * handle("b");
        assert_eq!(borrowed, owned);
        assert_eq!(Sequence::from(handle("a")).then(&handle("b")), owned);
    }

    #[test]
    fn test_path_kind_serialization() {
        assert_eq!(serde_yaml::to_string(&PathKind::EndPath).unwrap().trim(), "end_path");
        let kind: PathKind = serde_yaml::from_str("path").unwrap();
        assert_eq!(kind, PathKind::Path);
    }
}
