//! # Process Assembly Module
//!
//! A [`Process`] is the top-level configuration of one simulation job. It
//! owns the source, the module and service declarations, the event limit
//! and the ordered execution paths.
//!
//! ## Registration
//!
//! Modules are registered under a unique label and resolved against the
//! process's [`PluginRegistry`] as they are added:
//!
//! - [`Process::register_module`] fails with `DuplicateLabel` if the label
//!   is taken
//! - [`Process::replace_module`] overwrites an existing declaration (last
//!   write wins)
//! - An implementation missing from the registry fails with
//!   `UnknownModuleKind`
//!
//! Registration returns a [`ModuleHandle`]. Handles build paths and
//! `InputTag` parameters.
//!
//! ## Templates
//!
//! [`Process::load`] merges a named fragment (e.g. `MessageLogger_cfi`) into
//! the process; [`Process::patch_service`] then adjusts the loaded values
//! through typed overrides.
//!
//! ## Documents
//!
//! [`Process::to_document`] and [`Process::from_document`] convert to and
//! from the serializable [`ProcessDocument`]. Loading a document replays
//! every declaration through the registration API, so a document gets the
//! same checks as code.

pub mod path;
pub mod types;

pub use path::{PathDecl, PathKind, Sequence};
pub use types::{ModuleDecl, ModuleHandle, ModuleKind};

use crate::error::{ConfigError, Result};
use crate::pset::{apply_overrides, int32, Override, ParameterSet};
use crate::registry::PluginRegistry;
use crate::templates::{Fragment, TemplateLoader};
use crate::utils::validation::check_label;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Serializable form of a process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessDocument {
    pub process: String,
    #[serde(default, skip_serializing_if = "ParameterSet::is_empty")]
    pub max_events: ParameterSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ModuleDecl>,
    #[serde(default)]
    pub modules: BTreeMap<String, ModuleDecl>,
    #[serde(default)]
    pub services: BTreeMap<String, ParameterSet>,
    #[serde(default)]
    pub paths: Vec<PathDecl>,
}

/// Top-level configuration container for one simulation job
#[derive(Debug, Clone, PartialEq)]
pub struct Process {
    name: String,
    max_events: ParameterSet,
    source: Option<ModuleDecl>,
    modules: BTreeMap<String, ModuleDecl>,
    services: BTreeMap<String, ParameterSet>,
    paths: Vec<PathDecl>,
    registry: PluginRegistry,
}

impl Process {
    /// Create an empty process that resolves plugins against the built-in catalog
    pub fn new(name: &str) -> Result<Self> {
        Self::with_registry(name, PluginRegistry::builtin())
    }

    pub fn with_registry(name: &str, registry: PluginRegistry) -> Result<Self> {
        check_label(name)?;
        Ok(Self {
            name: name.to_string(),
            max_events: ParameterSet::new(),
            source: None,
            modules: BTreeMap::new(),
            services: BTreeMap::new(),
            paths: Vec::new(),
            registry,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Set `maxEvents.input`, stored as an untracked int32
    pub fn set_max_events(&mut self, input: i32) {
        self.max_events = ParameterSet::new().with("input", int32(input).untracked());
    }

    pub fn max_events(&self) -> Option<i32> {
        self.max_events.get_i32("input").ok()
    }

    pub fn max_events_pset(&self) -> &ParameterSet {
        &self.max_events
    }

    /// Set the event source; there is exactly one per process
    pub fn set_source(&mut self, implementation: &str, params: ParameterSet) -> Result<()> {
        self.registry.resolve_module(implementation, ModuleKind::Source)?;
        if let Some(old) = &self.source {
            warn!("Replacing source {} with {}", old.implementation, implementation);
        }
        self.source = Some(ModuleDecl {
            kind: ModuleKind::Source,
            implementation: implementation.to_string(),
            params,
        });
        Ok(())
    }

    pub fn source(&self) -> Option<&ModuleDecl> {
        self.source.as_ref()
    }

    fn label_in_use(&self, label: &str) -> bool {
        self.modules.contains_key(label)
            || self.services.contains_key(label)
            || self.paths.iter().any(|p| p.name == label)
    }

    fn build_decl(&self, label: &str, kind: ModuleKind, implementation: &str, params: ParameterSet) -> Result<ModuleDecl> {
        check_label(label)?;
        if kind == ModuleKind::Source {
            return Err(ConfigError::KindMismatch {
                implementation: implementation.to_string(),
                expected: "labelled module".to_string(),
                actual: kind.to_string(),
            });
        }
        self.registry.resolve_module(implementation, kind)?;
        Ok(ModuleDecl {
            kind,
            implementation: implementation.to_string(),
            params,
        })
    }

    /// Register a module under a new label
    pub fn register_module(
        &mut self,
        label: &str,
        kind: ModuleKind,
        implementation: &str,
        params: ParameterSet,
    ) -> Result<ModuleHandle> {
        if self.label_in_use(label) {
            return Err(ConfigError::DuplicateLabel(label.to_string()));
        }
        let decl = self.build_decl(label, kind, implementation, params)?;
        debug!("Registered {} '{}' ({})", kind, label, implementation);
        self.modules.insert(label.to_string(), decl);
        Ok(ModuleHandle::new(label, kind))
    }

    /// Register a module, overwriting any module already under `label`.
    ///
    /// Labels used by services or paths are still rejected.
    pub fn replace_module(
        &mut self,
        label: &str,
        kind: ModuleKind,
        implementation: &str,
        params: ParameterSet,
    ) -> Result<ModuleHandle> {
        if self.services.contains_key(label) || self.paths.iter().any(|p| p.name == label) {
            return Err(ConfigError::DuplicateLabel(label.to_string()));
        }
        let decl = self.build_decl(label, kind, implementation, params)?;
        if let Some(old) = self.modules.insert(label.to_string(), decl) {
            warn!("Module '{}' ({}) overwritten by {}", label, old.implementation, implementation);
        }
        Ok(ModuleHandle::new(label, kind))
    }

    pub fn producer(&mut self, label: &str, implementation: &str, params: ParameterSet) -> Result<ModuleHandle> {
        self.register_module(label, ModuleKind::Producer, implementation, params)
    }

    pub fn analyzer(&mut self, label: &str, implementation: &str, params: ParameterSet) -> Result<ModuleHandle> {
        self.register_module(label, ModuleKind::Analyzer, implementation, params)
    }

    pub fn output(&mut self, label: &str, implementation: &str, params: ParameterSet) -> Result<ModuleHandle> {
        self.register_module(label, ModuleKind::Output, implementation, params)
    }

    /// Handle for a module that is already declared
    pub fn handle(&self, label: &str) -> Result<ModuleHandle> {
        self.modules
            .get(label)
            .map(|decl| ModuleHandle::new(label, decl.kind))
            .ok_or_else(|| ConfigError::UnknownLabel(label.to_string()))
    }

    pub fn module(&self, label: &str) -> Option<&ModuleDecl> {
        self.modules.get(label)
    }

    pub fn modules(&self) -> impl Iterator<Item = (&String, &ModuleDecl)> {
        self.modules.iter()
    }

    /// Declare a service; at most one per name
    pub fn add_service(&mut self, name: &str, params: ParameterSet) -> Result<()> {
        if self.label_in_use(name) {
            return Err(ConfigError::DuplicateService(name.to_string()));
        }
        check_label(name)?;
        self.registry.resolve_service(name)?;
        debug!("Declared service {}", name);
        self.services.insert(name.to_string(), params);
        Ok(())
    }

    /// Declare a service, overwriting any service already under `name`.
    ///
    /// Names used by modules or paths are still rejected.
    pub fn replace_service(&mut self, name: &str, params: ParameterSet) -> Result<()> {
        if self.modules.contains_key(name) || self.paths.iter().any(|p| p.name == name) {
            return Err(ConfigError::DuplicateLabel(name.to_string()));
        }
        check_label(name)?;
        self.registry.resolve_service(name)?;
        if self.services.insert(name.to_string(), params).is_some() {
            warn!("Service '{}' overwritten", name);
        }
        Ok(())
    }

    pub fn service(&self, name: &str) -> Option<&ParameterSet> {
        self.services.get(name)
    }

    pub fn services(&self) -> impl Iterator<Item = (&String, &ParameterSet)> {
        self.services.iter()
    }

    /// Apply typed overrides to a declared service
    pub fn patch_service(&mut self, name: &str, overrides: &[Override]) -> Result<()> {
        let slot = self
            .services
            .get_mut(name)
            .ok_or_else(|| ConfigError::UnknownService(name.to_string()))?;
        *slot = apply_overrides(slot.clone(), overrides)?;
        Ok(())
    }

    /// Load a named template fragment and merge it into the process
    pub fn load(&mut self, loader: &TemplateLoader, resource: &str) -> Result<()> {
        let fragment = loader.load(resource)?;
        info!("Loaded configuration fragment {}", resource);
        self.merge(fragment)
    }

    /// Merge a fragment's declarations; collisions are errors.
    ///
    /// Nothing from the fragment is kept unless every declaration succeeds.
    pub fn merge(&mut self, fragment: Fragment) -> Result<()> {
        let mut staged = self.clone();
        for (name, params) in fragment.services {
            staged.add_service(&name, params)?;
        }
        for (label, decl) in fragment.modules {
            staged.register_module(&label, decl.kind, &decl.implementation, decl.params)?;
        }
        *self = staged;
        Ok(())
    }

    fn add_path_of_kind(&mut self, name: &str, kind: PathKind, sequence: Sequence) -> Result<()> {
        check_label(name)?;
        if self.label_in_use(name) {
            return Err(ConfigError::DuplicateLabel(name.to_string()));
        }
        if sequence.is_empty() {
            return Err(ConfigError::EmptyPath(name.to_string()));
        }

        let mut seen = HashSet::new();
        for handle in sequence.handles() {
            let decl = self
                .modules
                .get(handle.label())
                .ok_or_else(|| ConfigError::UnknownLabel(handle.label().to_string()))?;
            if decl.kind != handle.kind() {
                return Err(ConfigError::KindMismatch {
                    implementation: decl.implementation.clone(),
                    expected: handle.kind().to_string(),
                    actual: decl.kind.to_string(),
                });
            }
            if !seen.insert(handle.label()) {
                return Err(ConfigError::DuplicateInPath {
                    path: name.to_string(),
                    label: handle.label().to_string(),
                });
            }
        }

        info!("{} {}: {}", kind.as_str(), name, sequence.labels().join(" * "));
        self.paths.push(PathDecl {
            name: name.to_string(),
            kind,
            sequence: sequence.labels(),
        });
        Ok(())
    }

    pub fn add_path(&mut self, name: &str, sequence: impl Into<Sequence>) -> Result<()> {
        self.add_path_of_kind(name, PathKind::Path, sequence.into())
    }

    pub fn add_end_path(&mut self, name: &str, sequence: impl Into<Sequence>) -> Result<()> {
        self.add_path_of_kind(name, PathKind::EndPath, sequence.into())
    }

    pub fn paths(&self) -> &[PathDecl] {
        &self.paths
    }

    /// The last registered end path
    pub fn end_path(&self) -> Option<&PathDecl> {
        self.paths.iter().rev().find(|p| p.kind == PathKind::EndPath)
    }

    /// Labels that appear on at least one path
    pub fn scheduled_labels(&self) -> HashSet<&str> {
        self.paths
            .iter()
            .flat_map(|p| p.sequence.iter().map(String::as_str))
            .collect()
    }

    pub fn to_document(&self) -> ProcessDocument {
        ProcessDocument {
            process: self.name.clone(),
            max_events: self.max_events.clone(),
            source: self.source.clone(),
            modules: self.modules.clone(),
            services: self.services.clone(),
            paths: self.paths.clone(),
        }
    }

    /// Rebuild a process from a document, replaying every declaration
    pub fn from_document(doc: ProcessDocument, registry: PluginRegistry) -> Result<Self> {
        let mut process = Self::with_registry(&doc.process, registry)?;

        if !doc.max_events.is_empty() {
            doc.max_events.get_i32("input").map_err(|e| {
                ConfigError::Malformed(format!("max_events: {}", e))
            })?;
            process.max_events = doc.max_events;
        }

        if let Some(source) = doc.source {
            if source.kind != ModuleKind::Source {
                return Err(ConfigError::Malformed(format!(
                    "source must have kind 'source', found '{}'",
                    source.kind
                )));
            }
            process.set_source(&source.implementation, source.params)?;
        }

        for (label, decl) in doc.modules {
            process.register_module(&label, decl.kind, &decl.implementation, decl.params)?;
        }

        for (name, params) in doc.services {
            process.add_service(&name, params)?;
        }

        for path in doc.paths {
            let mut sequence = Sequence::new();
            for label in &path.sequence {
                sequence = sequence.then(&process.handle(label)?);
            }
            process.add_path_of_kind(&path.name, path.kind, sequence)?;
        }

        Ok(process)
    }
}
