//! Configuration validation utilities.
//!
//! This module provides label syntax checks and the whole-process
//! consistency checks run before a configuration is handed over.

use crate::error::{ConfigError, Result};
use crate::process::Process;
use crate::registry::PluginRegistry;
use log::{info, warn};
use regex::Regex;
use std::sync::LazyLock;

/// Labels: a letter followed by ASCII letters and digits
static LABEL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9]*$").expect("Invalid label regex"));

/// Check that a module, service, path or process label is well formed
///
/// # Examples
/// ```
/// use detsim::utils::validation::check_label;
///
/// assert!(check_label("makeCaloCrystalHits").is_ok());
/// assert!(check_label("g4run").is_ok());
/// assert!(check_label("make_hits").is_err()); // underscores are reserved
/// assert!(check_label("4run").is_err());
/// ```
pub fn check_label(label: &str) -> Result<()> {
    if LABEL_PATTERN.is_match(label) {
        Ok(())
    } else {
        Err(ConfigError::InvalidLabel(label.to_string()))
    }
}

/// Validate a complete process
///
/// Checks, in order:
/// - every module and service implementation against the process registry
/// - required parameters and declared parameter types
/// - every `InputTag` resolves to a declared module
/// - every path element is declared
///
/// Modules that are declared but never scheduled, and a process with no
/// end path, are reported as warnings.
pub fn validate_process(process: &Process) -> Result<()> {
    let registry = process.registry();

    if let Some(source) = process.source() {
        let spec = registry.resolve_module(&source.implementation, source.kind)?;
        PluginRegistry::check_params("source", &source.implementation, &spec.params, &source.params)?;
    }

    for (label, decl) in process.modules() {
        let spec = registry.resolve_module(&decl.implementation, decl.kind)?;
        PluginRegistry::check_params(label, &decl.implementation, &spec.params, &decl.params)?;
    }

    for (name, params) in process.services() {
        let specs = registry.resolve_service(name)?;
        PluginRegistry::check_params(name, name, specs, params)?;
    }

    validate_references(process)?;
    validate_paths(process)?;

    let scheduled = process.scheduled_labels();
    for (label, _) in process.modules() {
        if !scheduled.contains(label.as_str()) {
            warn!("Module '{}' is declared but not on any path", label);
        }
    }
    if process.end_path().is_none() {
        warn!("Process '{}' has no end path", process.name());
    }

    info!(
        "Process '{}' is valid: {} modules, {} services, {} paths",
        process.name(),
        process.modules().count(),
        process.services().count(),
        process.paths().len()
    );
    Ok(())
}

/// Check that every `InputTag` in modules and services names a declared module
pub fn validate_references(process: &Process) -> Result<()> {
    let owners = process
        .modules()
        .map(|(label, decl)| (label, &decl.params))
        .chain(process.services());

    for (owner, params) in owners {
        for (parameter, target) in params.input_tags() {
            if process.module(&target).is_none() {
                return Err(ConfigError::DanglingReference {
                    owner: owner.clone(),
                    parameter,
                    target,
                });
            }
        }
    }
    Ok(())
}

/// Check that every path element is declared
pub fn validate_paths(process: &Process) -> Result<()> {
    for path in process.paths() {
        if path.sequence.is_empty() {
            return Err(ConfigError::EmptyPath(path.name.clone()));
        }
        for label in &path.sequence {
            if process.module(label).is_none() {
                return Err(ConfigError::UnknownLabel(label.clone()));
            }
        }
    }
    Ok(())
}
