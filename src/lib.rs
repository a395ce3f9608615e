//! # Detsim - Configuration composer for detector simulation pipelines
//!
//! This library builds the configuration of a detector-simulation processing
//! job: event generation, Geant4 transport, hit digitization, analysis and
//! output, expressed as typed modules and services wired into an execution
//! path. The configuration is handed to an external framework runtime; no
//! physics runs here.
//!
//! ## Overview
//!
//! A [`process::Process`] is assembled through an explicit, typed API:
//!
//! - **Parameter sets**: typed, trackedness-tagged values (`int32`, `double`,
//!   `string`, `vstring`, `InputTag`, nested `PSet`, ...)
//! - **Modules**: sources, producers, analyzers and output modules, resolved
//!   against a plugin registry as they are registered
//! - **Services**: singleton blocks such as `MessageLogger` or `TFileService`
//! - **Paths**: ordered module sequences built from registration handles
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - `pset`: Parameter sets, typed constructors and dotted-path overrides
//! - `process`: Process assembly, module handles and path composition
//! - `registry`: Catalog of known module and service implementations
//! - `templates`: Shared configuration fragments and their typed overrides
//! - `presets`: Built-in job configurations (`transportOnly`)
//! - `config_loader`: YAML/JSON document loading and saving
//! - `render`: Legacy configuration-script output
//! - `utils`: Label and whole-process validation
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use detsim::config_loader::{save_process, OutputFormat};
//! use detsim::presets::{transport_only, TransportOnlyOptions};
//! use detsim::utils::validation::validate_process;
//! use std::path::Path;
//!
//! // Build the transport-only job
//! let process = transport_only(&TransportOnlyOptions::default())?;
//! validate_process(&process)?;
//!
//! // Write it as a YAML document
//! save_process(&process, Path::new("transportOnly.yaml"), OutputFormat::Yaml)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Document Format
//!
//! Processes serialize to YAML (or JSON) and load back unchanged:
//!
//! ```yaml
//! process: transportOnly
//! max_events:
//!   input: {type: int32, tracked: false, value: 100}
//! source:
//!   kind: source
//!   type: EmptySource
//! modules:
//!   g4run:
//!     kind: producer
//!     type: G4
//!     params:
//!       generatorModuleLabel: {type: InputTag, tracked: true, value: generate}
//! paths:
//!   - name: output
//!     kind: end_path
//!     sequence: [generate, g4run, randomsaver, checkhits, outfile]
//! ```
//!
//! ## Error Handling
//!
//! Library operations return [`error::ConfigError`]. File loading and the
//! command-line tool use `color_eyre` for reports with context.

pub mod config_loader;
pub mod error;
pub mod presets;
pub mod process;
pub mod pset;
pub mod registry;
pub mod render;
pub mod templates;
pub mod utils;
