//! Built-in job configurations.

pub mod transport_only;

pub use transport_only::{transport_only, transport_only_with, TransportOnlyOptions};

use clap::ValueEnum;

/// Presets selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// Generation and Geant4 transport, with hit readback and full output
    TransportOnly,
}
