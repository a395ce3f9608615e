//! Process type definitions.
//!
//! This file contains the module kinds, module declarations and the typed
//! handles returned when a module is registered on a process.

use crate::pset::ParameterSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of module kinds a process can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    /// Produces the events themselves (one per process)
    Source,
    /// Adds products to each event
    Producer,
    /// Reads events without modifying them
    Analyzer,
    /// Writes events to persistent storage
    Output,
}

impl ModuleKind {
    /// Get the framework name of the module kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleKind::Source => "Source",
            ModuleKind::Producer => "EDProducer",
            ModuleKind::Analyzer => "EDAnalyzer",
            ModuleKind::Output => "OutputModule",
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A module instantiation: kind, implementation name and configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDecl {
    pub kind: ModuleKind,
    /// Name of the plugin that implements the module (e.g. "G4")
    #[serde(rename = "type")]
    pub implementation: String,
    #[serde(default, skip_serializing_if = "ParameterSet::is_empty")]
    pub params: ParameterSet,
}

/// Handle to a module registered on a process.
///
/// Handles are the only way to build paths and are the preferred way to
/// build `InputTag` parameters, so labels are never typed twice.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleHandle {
    label: String,
    kind: ModuleKind,
}

impl ModuleHandle {
    pub(crate) fn new(label: impl Into<String>, kind: ModuleKind) -> Self {
        Self { label: label.into(), kind }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> ModuleKind {
        self.kind
    }

    /// An `InputTag` parameter referring to this module
    pub fn input_tag(&self) -> crate::pset::Entry {
        crate::pset::input_tag(self.label.clone())
    }
}

impl fmt::Display for ModuleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}
