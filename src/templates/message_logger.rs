//! Typed overrides for the message logger service.

use crate::error::ConfigError;
use crate::pset::{string, Override, ParamValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Service name of the message logger
pub const MESSAGE_LOGGER: &str = "MessageLogger";

/// Message severity threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DEBUG" => Ok(Severity::Debug),
            "INFO" => Ok(Severity::Info),
            "WARNING" | "WARN" => Ok(Severity::Warning),
            "ERROR" => Ok(Severity::Error),
            _ => Err(ConfigError::InvalidSeverity(s.to_string())),
        }
    }
}

/// Changes to a loaded message logger configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageLoggerOverrides {
    /// New threshold for the `cerr` destination
    pub cerr_threshold: Option<Severity>,
    /// Module labels appended to `debugModules`
    pub debug_modules: Vec<String>,
    /// Categories appended to `categories`
    pub categories: Vec<String>,
}

impl MessageLoggerOverrides {
    pub fn to_overrides(&self) -> Vec<Override> {
        let mut overrides = Vec::new();
        if let Some(threshold) = self.cerr_threshold {
            overrides.push(Override::set("cerr.threshold", string(threshold.as_str()).untracked()));
        }
        if !self.debug_modules.is_empty() {
            overrides.push(Override::append("debugModules", ParamValue::VString(self.debug_modules.clone())));
        }
        if !self.categories.is_empty() {
            overrides.push(Override::append("categories", ParamValue::VString(self.categories.clone())));
        }
        overrides
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pset::apply_overrides;
    use crate::templates::load_template;

    #[test]
    fn test_severity_parsing() {
        assert_eq!("debug".parse::<Severity>().unwrap(), Severity::Debug);
        assert_eq!("WARN".parse::<Severity>().unwrap(), Severity::Warning);
        assert!(matches!("LOUD".parse::<Severity>(), Err(ConfigError::InvalidSeverity(_))));
        assert!(Severity::Debug < Severity::Error);
    }

    #[test]
    fn test_empty_overrides_do_nothing() {
        assert!(MessageLoggerOverrides::default().to_overrides().is_empty());
    }

    #[test]
    fn test_patch_loaded_template() {
        let fragment = load_template("MessageLogger_cfi").unwrap();
        let logger = fragment.services.get(MESSAGE_LOGGER).unwrap().clone();

        let overrides = MessageLoggerOverrides {
            cerr_threshold: Some(Severity::Debug),
            debug_modules: vec!["hitinspect".to_string()],
            categories: vec!["ToyHitInfo".to_string(), "GEOM".to_string()],
        };
        let patched = apply_overrides(logger, &overrides.to_overrides()).unwrap();

        let cerr = patched.get_pset("cerr").unwrap();
        assert_eq!(cerr.get_str("threshold").unwrap(), "DEBUG");
        assert!(!cerr.get("threshold").unwrap().is_tracked());
        assert_eq!(patched.get_vstring("debugModules").unwrap(), &["hitinspect"]);
        assert_eq!(
            patched.get_vstring("categories").unwrap(),
            &["FwkJob", "FwkReport", "ToyHitInfo", "GEOM"]
        );
    }
}
