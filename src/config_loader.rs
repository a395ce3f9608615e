use crate::process::{Process, ProcessDocument};
use crate::registry::PluginRegistry;
use crate::render::render_script;
use crate::utils::validation::validate_process;
use clap::ValueEnum;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::fs::File;
use std::path::Path;

/// Serialized forms of a process
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Yaml,
    Json,
    /// Legacy framework configuration script (write-only)
    Script,
}

impl OutputFormat {
    /// Pick a format from a file extension, falling back to YAML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => OutputFormat::Json,
            Some("py") => OutputFormat::Script,
            _ => OutputFormat::Yaml,
        }
    }
}

/// Load and validate a process document from a YAML or JSON file
pub fn load_process(config_path: &Path) -> Result<Process> {
    load_process_with(config_path, PluginRegistry::builtin())
}

pub fn load_process_with(config_path: &Path, registry: PluginRegistry) -> Result<Process> {
    info!("Loading process configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open configuration '{}'", config_path.display()))?;

    let doc: ProcessDocument = match OutputFormat::from_path(config_path) {
        OutputFormat::Json => serde_json::from_reader(file)
            .wrap_err_with(|| format!("Failed to parse JSON in '{}'", config_path.display()))?,
        OutputFormat::Script => {
            return Err(color_eyre::eyre::eyre!(
                "Script output is write-only; cannot load '{}'",
                config_path.display()
            ));
        }
        OutputFormat::Yaml => serde_yaml::from_reader(file)
            .wrap_err_with(|| format!("Failed to parse YAML in '{}'", config_path.display()))?,
    };

    let process = Process::from_document(doc, registry)
        .wrap_err_with(|| format!("Invalid process in '{}'", config_path.display()))?;

    validate_process(&process)?;

    Ok(process)
}

/// Serialize a process in the requested format
pub fn process_to_string(process: &Process, format: OutputFormat) -> Result<String> {
    let text = match format {
        OutputFormat::Yaml => serde_yaml::to_string(&process.to_document())?,
        OutputFormat::Json => serde_json::to_string_pretty(&process.to_document())?,
        OutputFormat::Script => render_script(process),
    };
    Ok(text)
}

/// Write a process to a file
pub fn save_process(process: &Process, output_path: &Path, format: OutputFormat) -> Result<()> {
    let text = process_to_string(process, format)?;
    std::fs::write(output_path, text)
        .wrap_err_with(|| format!("Failed to write '{}'", output_path.display()))?;
    info!("Wrote {:?} configuration to {:?}", format, output_path);
    Ok(())
}
