//! # Plugin Registry Module
//!
//! This module holds the catalog of module and service implementations a
//! process may reference. Implementation names are resolved here when a
//! module is registered, so a misspelled plugin fails while the
//! configuration is being built instead of when the framework loads it.
//!
//! ## Catalog Contents
//!
//! Each module entry records:
//!
//! - The module kind the implementation provides (source, producer, ...)
//! - The parameters it reads, with their types
//! - Which of those parameters have no default and must be set
//!
//! Services are recorded by name with the same parameter descriptions.
//!
//! ## Built-in Catalog
//!
//! [`PluginRegistry::builtin`] knows the detector-simulation plugins:
//!
//! ```text
//! Sources:   EmptySource, PoolSource
//! Producers: EventGenerator, G4, MakeCaloCrystalHits
//! Analyzers: RandomNumberSaver, ReadBack, BkgRates, GrokGeometry, HelloWorld
//! Outputs:   PoolOutputModule
//! Services:  MessageLogger, TFileService, RandomNumberGeneratorService,
//!            GeometryService, ConditionsService, G4Helper
//! ```
//!
//! Additional plugins can be added with [`PluginRegistry::with_module`] and
//! [`PluginRegistry::with_service`].
//!
//! ## Parameter Checks
//!
//! [`PluginRegistry::check_params`] reports missing required parameters and
//! type mismatches. Parameters the catalog does not describe are accepted
//! and logged at debug level.

use crate::error::{ConfigError, Result};
use crate::process::ModuleKind;
use crate::pset::{ParamType, ParameterSet};
use log::debug;
use std::collections::BTreeMap;

/// Description of one parameter a plugin reads
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub param_type: ParamType,
    pub required: bool,
}

impl ParamSpec {
    pub fn required(name: &str, param_type: ParamType) -> Self {
        Self { name: name.to_string(), param_type, required: true }
    }

    pub fn optional(name: &str, param_type: ParamType) -> Self {
        Self { name: name.to_string(), param_type, required: false }
    }
}

/// Catalog entry for a module implementation
#[derive(Debug, Clone, PartialEq)]
pub struct PluginSpec {
    pub kind: ModuleKind,
    pub params: Vec<ParamSpec>,
}

/// Known module and service implementations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginRegistry {
    modules: BTreeMap<String, PluginSpec>,
    services: BTreeMap<String, Vec<ParamSpec>>,
}

impl PluginRegistry {
    /// A registry that knows nothing
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in detector-simulation catalog
    pub fn builtin() -> Self {
        use ParamType::*;
        use ParamSpec as P;

        Self::empty()
            // Sources
            .with_module("EmptySource", ModuleKind::Source, vec![])
            .with_module("PoolSource", ModuleKind::Source, vec![P::required("fileNames", VString)])
            // Producers
            .with_module(
                "EventGenerator",
                ModuleKind::Producer,
                vec![P::optional("inputfile", String), P::optional("seed", VInt32)],
            )
            .with_module(
                "G4",
                ModuleKind::Producer,
                vec![
                    P::required("generatorModuleLabel", InputTag),
                    P::optional("rmvlevel", Int32),
                    P::optional("visMacro", String),
                    P::optional("seed", VInt32),
                ],
            )
            .with_module(
                "MakeCaloCrystalHits",
                ModuleKind::Producer,
                vec![
                    P::required("g4ModuleLabel", InputTag),
                    P::optional("diagLevel", Int32),
                    P::optional("maxFullPrint", Int32),
                    P::optional("minimumEnergy", Double),
                    P::optional("minimumTimeGap", Double),
                ],
            )
            // Analyzers
            .with_module("RandomNumberSaver", ModuleKind::Analyzer, vec![])
            .with_module(
                "ReadBack",
                ModuleKind::Analyzer,
                vec![
                    P::required("g4ModuleLabel", InputTag),
                    P::required("minimumEnergy", Double),
                    P::optional("generatorModuleLabel", InputTag),
                    P::optional("diagLevel", Int32),
                    P::optional("maxFullPrint", Int32),
                    P::optional("xyHitsMax", Int32),
                    P::optional("trackerStepPoints", String),
                ],
            )
            .with_module(
                "BkgRates",
                ModuleKind::Analyzer,
                vec![
                    P::optional("g4ModuleLabel", InputTag),
                    P::optional("generatorModuleLabel", InputTag),
                    P::optional("diagLevel", Int32),
                    P::optional("minimumEnergyTracker", Double),
                    P::optional("minimumEnergyCalo", Double),
                    P::optional("doStoppingTarget", Bool),
                    P::optional("pdgIdToSkipInST", VInt32),
                ],
            )
            .with_module("GrokGeometry", ModuleKind::Analyzer, vec![])
            .with_module("HelloWorld", ModuleKind::Analyzer, vec![])
            // Outputs
            .with_module(
                "PoolOutputModule",
                ModuleKind::Output,
                vec![
                    P::required("fileName", String),
                    P::optional("outputCommands", VString),
                ],
            )
            // Services
            .with_service(
                "MessageLogger",
                vec![
                    P::optional("destinations", VString),
                    P::optional("categories", VString),
                    P::optional("debugModules", VString),
                    P::optional("cerr", PSet),
                ],
            )
            .with_service(
                "TFileService",
                vec![P::required("fileName", String), P::optional("closeFileFast", Bool)],
            )
            .with_service("RandomNumberGeneratorService", vec![])
            .with_service("GeometryService", vec![P::optional("inputfile", String)])
            .with_service(
                "ConditionsService",
                vec![
                    P::optional("conditionsfile", String),
                    P::optional("allowReplacement", Bool),
                    P::optional("messageOnReplacement", Bool),
                    P::optional("messageOnDefault", Bool),
                    P::optional("configStatsVerbosity", Int32),
                    P::optional("printConfig", Bool),
                ],
            )
            .with_service("G4Helper", vec![])
    }

    pub fn with_module(mut self, name: &str, kind: ModuleKind, params: Vec<ParamSpec>) -> Self {
        self.modules.insert(name.to_string(), PluginSpec { kind, params });
        self
    }

    pub fn with_service(mut self, name: &str, params: Vec<ParamSpec>) -> Self {
        self.services.insert(name.to_string(), params);
        self
    }

    /// Look up an implementation and check it provides `expected`
    pub fn resolve_module(&self, implementation: &str, expected: ModuleKind) -> Result<&PluginSpec> {
        let spec = self
            .modules
            .get(implementation)
            .ok_or_else(|| {
                debug!("Known module implementations: {}", self.module_names().collect::<Vec<_>>().join(", "));
                ConfigError::UnknownModuleKind(implementation.to_string())
            })?;
        if spec.kind != expected {
            return Err(ConfigError::KindMismatch {
                implementation: implementation.to_string(),
                expected: expected.to_string(),
                actual: spec.kind.to_string(),
            });
        }
        Ok(spec)
    }

    pub fn resolve_service(&self, name: &str) -> Result<&[ParamSpec]> {
        self.services
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| {
                debug!("Known services: {}", self.service_names().collect::<Vec<_>>().join(", "));
                ConfigError::UnknownService(name.to_string())
            })
    }

    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }

    /// Check `pset` against the parameter descriptions of `implementation`
    pub fn check_params(
        owner: &str,
        implementation: &str,
        specs: &[ParamSpec],
        pset: &ParameterSet,
    ) -> Result<()> {
        for spec in specs {
            match pset.get(&spec.name) {
                Some(entry) if entry.param_type() != spec.param_type => {
                    return Err(ConfigError::TypeMismatch {
                        path: format!("{}.{}", owner, spec.name),
                        expected: spec.param_type.to_string(),
                        actual: entry.param_type().to_string(),
                    });
                }
                Some(_) => {}
                None if spec.required => {
                    return Err(ConfigError::MissingParameter {
                        label: owner.to_string(),
                        implementation: implementation.to_string(),
                        parameter: spec.name.clone(),
                    });
                }
                None => {}
            }
        }

        for name in pset.names() {
            if !specs.iter().any(|s| s.name == name) {
                debug!("{} ({}): parameter '{}' is not described by the catalog", owner, implementation, name);
            }
        }

        Ok(())
    }
}
