//! Shared utilities: label and whole-process validation.

pub mod validation;

pub use validation::{check_label, validate_paths, validate_process, validate_references};
