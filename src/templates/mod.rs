//! Configuration templates.
//!
//! A template is a named fragment of services and modules shared between
//! jobs (the standard message logger setup, for instance). Templates are
//! looked up in the configured search directories first and then in the
//! built-in set compiled into the crate.

pub mod message_logger;

pub use message_logger::{MessageLoggerOverrides, Severity, MESSAGE_LOGGER};

use crate::error::{ConfigError, Result};
use crate::process::ModuleDecl;
use crate::pset::ParameterSet;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Built-in templates: (resource name, YAML source)
const BUILTIN_TEMPLATES: &[(&str, &str)] = &[(
    "MessageLogger_cfi",
    include_str!("../../cfi/MessageLogger_cfi.yaml"),
)];

/// File extensions tried for each resource, in order
const EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Declarations contributed by a template
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    #[serde(default)]
    pub modules: BTreeMap<String, ModuleDecl>,
    #[serde(default)]
    pub services: BTreeMap<String, ParameterSet>,
}

/// Resolves template names to fragments
#[derive(Debug, Clone, Default)]
pub struct TemplateLoader {
    search_paths: Vec<PathBuf>,
}

impl TemplateLoader {
    /// A loader that only knows the built-in templates
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory searched before the built-in templates
    pub fn with_search_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_paths.push(dir.into());
        self
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Names of the templates compiled into the crate
    pub fn builtin_names() -> impl Iterator<Item = &'static str> {
        BUILTIN_TEMPLATES.iter().map(|(name, _)| *name)
    }

    /// Load a template by resource name
    pub fn load(&self, name: &str) -> Result<Fragment> {
        for dir in &self.search_paths {
            for ext in EXTENSIONS {
                let candidate = dir.join(format!("{}.{}", name, ext));
                if candidate.is_file() {
                    info!("Loading template {} from {:?}", name, candidate);
                    return read_fragment(&candidate);
                }
            }
        }

        let (_, source) = BUILTIN_TEMPLATES
            .iter()
            .find(|(builtin, _)| *builtin == name)
            .ok_or_else(|| ConfigError::UnknownTemplate(name.to_string()))?;
        debug!("Using built-in template {}", name);
        Ok(serde_yaml::from_str(source)?)
    }
}

fn read_fragment(path: &Path) -> Result<Fragment> {
    let content = std::fs::read_to_string(path)?;
    if path.extension().map_or(false, |ext| ext == "json") {
        Ok(serde_json::from_str(&content)?)
    } else {
        Ok(serde_yaml::from_str(&content)?)
    }
}

/// Load a built-in template by name
pub fn load_template(name: &str) -> Result<Fragment> {
    TemplateLoader::new().load(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_message_logger() {
        let fragment = load_template("MessageLogger_cfi").unwrap();
        let logger = fragment.services.get(MESSAGE_LOGGER).unwrap();
        assert_eq!(logger.get_vstring("destinations").unwrap(), &["cerr"]);
        let cerr = logger.get_pset("cerr").unwrap();
        assert_eq!(cerr.get_str("threshold").unwrap(), "INFO");
        assert_eq!(cerr.get_pset("default").unwrap().get_i32("limit").unwrap(), 5);
        assert!(fragment.modules.is_empty());
    }

    #[test]
    fn test_unknown_template() {
        let err = load_template("NoSuchThing_cfi").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownTemplate(name) if name == "NoSuchThing_cfi"));
    }

    #[test]
    fn test_search_path_shadows_builtin() {
        let dir = TempDir::new().unwrap();
        let mut file = std::fs::File::create(dir.path().join("MessageLogger_cfi.yaml")).unwrap();
        write!(
            file,
            r#"
services:
  MessageLogger:
    categories:
      type: vstring
      tracked: false
      value: [Custom]
"#
        )
        .unwrap();

        let loader = TemplateLoader::new().with_search_path(dir.path());
        let fragment = loader.load("MessageLogger_cfi").unwrap();
        let logger = fragment.services.get(MESSAGE_LOGGER).unwrap();
        assert_eq!(logger.get_vstring("categories").unwrap(), &["Custom"]);
        assert!(!logger.contains("cerr"));
    }

    #[test]
    fn test_json_template() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("Hello_cfi.json"),
            r#"{"modules": {"hello": {"kind": "analyzer", "type": "HelloWorld"}}}"#,
        )
        .unwrap();

        let loader = TemplateLoader::new().with_search_path(dir.path());
        let fragment = loader.load("Hello_cfi").unwrap();
        assert_eq!(fragment.modules.get("hello").unwrap().implementation, "HelloWorld");
    }

    #[test]
    fn test_builtin_names() {
        assert!(TemplateLoader::builtin_names().any(|n| n == "MessageLogger_cfi"));
    }
}
