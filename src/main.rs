use clap::Parser;
use color_eyre::eyre::{bail, WrapErr};
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::io::Write;
use std::path::PathBuf;

use detsim::config_loader::{self, OutputFormat};
use detsim::presets::{transport_only_with, Preset, TransportOnlyOptions};
use detsim::templates::TemplateLoader;
use detsim::utils::validation::validate_process;

/// Configuration composer for detector simulation processing pipelines
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Built-in job configuration to emit
    #[arg(short, long, value_enum, conflicts_with = "config", required_unless_present = "config")]
    preset: Option<Preset>,

    /// Path to a process configuration document (YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format; inferred from the output extension when omitted
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Override maxEvents.input
    #[arg(long)]
    max_events: Option<i32>,

    /// Additional directory searched for configuration templates
    #[arg(long = "template-dir")]
    template_dirs: Vec<PathBuf>,

    /// Validate the configuration and exit without writing it
    #[arg(long)]
    validate_only: bool,

    /// Geant4 visualization macro for the transport-only preset
    #[arg(long, requires = "preset", conflicts_with = "config")]
    vis_macro: Option<String>,

    /// Drop simulated particles from the transport-only output file
    #[arg(long, requires = "preset", conflicts_with = "config")]
    drop_sim_particles: bool,
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    // Initialize logging with default filter level of "info"
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("Starting detsim configuration composer");

    let loader = args
        .template_dirs
        .iter()
        .fold(TemplateLoader::new(), |loader, dir| loader.with_search_path(dir));

    let mut process = match (&args.preset, &args.config) {
        (Some(Preset::TransportOnly), _) => {
            let options = TransportOnlyOptions {
                vis_macro: args.vis_macro.clone(),
                drop_sim_particles: args.drop_sim_particles,
                ..TransportOnlyOptions::default()
            };
            transport_only_with(&options, &loader).wrap_err("Failed to build transport-only preset")?
        }
        (None, Some(path)) => config_loader::load_process(path)?,
        (None, None) => bail!("Either --preset or --config is required"),
    };

    if let Some(n) = args.max_events {
        process.set_max_events(n);
    }

    validate_process(&process).wrap_err("Configuration failed validation")?;

    if args.validate_only {
        info!("Configuration '{}' is valid", process.name());
        return Ok(());
    }

    let format = args.format.unwrap_or_else(|| {
        args.output
            .as_deref()
            .map(OutputFormat::from_path)
            .unwrap_or(OutputFormat::Yaml)
    });

    match &args.output {
        Some(path) => config_loader::save_process(&process, path, format)?,
        None => {
            let text = config_loader::process_to_string(&process, format)?;
            std::io::stdout()
                .write_all(text.as_bytes())
                .wrap_err("Failed to write to stdout")?;
        }
    }

    info!("Configuration generation completed successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_preset() {
        let args = Args::parse_from(["detsim", "--preset", "transport-only"]);
        assert_eq!(args.preset, Some(Preset::TransportOnly));
        assert!(args.config.is_none());
        assert!(!args.validate_only);
    }

    #[test]
    fn test_cli_config_with_format() {
        let args = Args::parse_from([
            "detsim",
            "--config", "job.yaml",
            "--format", "script",
            "--max-events", "10",
            "--template-dir", "cfi",
            "--template-dir", "more",
        ]);
        assert_eq!(args.config, Some(PathBuf::from("job.yaml")));
        assert_eq!(args.format, Some(OutputFormat::Script));
        assert_eq!(args.max_events, Some(10));
        assert_eq!(args.template_dirs.len(), 2);
    }

    #[test]
    fn test_cli_requires_a_source() {
        assert!(Args::try_parse_from(["detsim"]).is_err());
        assert!(Args::try_parse_from(["detsim", "--preset", "transport-only", "--config", "a.yaml"]).is_err());
        assert!(Args::try_parse_from(["detsim", "--config", "a.yaml", "--drop-sim-particles"]).is_err());
    }

    #[test]
    fn test_cli_preset_toggles() {
        let args = Args::parse_from([
            "detsim",
            "--preset", "transport-only",
            "--vis-macro", "v.mac",
            "--drop-sim-particles",
        ]);
        assert_eq!(args.vis_macro.as_deref(), Some("v.mac"));
        assert!(args.drop_sim_particles);

        assert!(Args::try_parse_from(["detsim", "--config", "a.yaml", "--vis-macro", "v.mac"]).is_err());
    }
}
