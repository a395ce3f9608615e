//! The `transportOnly` job: event generation and Geant4 transport only,
//! followed by a readback of the hits and a full event dump.

use crate::error::Result;
use crate::process::Process;
use crate::pset::{boolean, double, int32, string, vint32, vstring, ParameterSet};
use crate::templates::{MessageLoggerOverrides, Severity, TemplateLoader, MESSAGE_LOGGER};
use log::info;

pub const PROCESS_NAME: &str = "transportOnly";

/// Output filter that drops the simulated particles to reduce file size
pub const DROP_SIM_PARTICLES: &str = "drop mu2eSimParticles_*_*_*";

/// Operator toggles for the transportOnly job
#[derive(Debug, Clone, PartialEq)]
pub struct TransportOnlyOptions {
    pub max_events: i32,
    /// Geant4 visualization macro, e.g. "Mu2eG4/test/vis45.mac"
    pub vis_macro: Option<String>,
    pub drop_sim_particles: bool,
}

impl Default for TransportOnlyOptions {
    fn default() -> Self {
        Self {
            max_events: 100,
            vis_macro: None,
            drop_sim_particles: false,
        }
    }
}

/// Build the transportOnly process with the built-in templates
pub fn transport_only(options: &TransportOnlyOptions) -> Result<Process> {
    transport_only_with(options, &TemplateLoader::new())
}

pub fn transport_only_with(options: &TransportOnlyOptions, loader: &TemplateLoader) -> Result<Process> {
    let mut process = Process::new(PROCESS_NAME)?;
    process.set_max_events(options.max_events);

    // Standard logger: threshold INFO, 5 per category, then backoff
    process.load(loader, "MessageLogger_cfi")?;

    process.add_service(
        "TFileService",
        ParameterSet::new()
            .with("fileName", string("transportOnly.root"))
            .with("closeFileFast", boolean(false).untracked()),
    )?;
    process.add_service("RandomNumberGeneratorService", ParameterSet::new())?;
    process.add_service(
        "GeometryService",
        ParameterSet::new().with("inputfile", string("Mu2eG4/test/transportOnlyGeom.txt").untracked()),
    )?;
    process.add_service(
        "ConditionsService",
        ParameterSet::new().with("conditionsfile", string("Mu2eG4/test/conditions_01.txt").untracked()),
    )?;

    process.set_source("EmptySource", ParameterSet::new())?;

    let generate = process.producer(
        "generate",
        "EventGenerator",
        ParameterSet::new()
            .with("inputfile", string("Mu2eG4/test/genconfig_tonly.txt").untracked())
            .with("seed", vint32([7789]).untracked()),
    )?;

    let mut g4_params = ParameterSet::new()
        .with("generatorModuleLabel", generate.input_tag())
        .with("rmvlevel", int32(2).untracked())
        .with("seed", vint32([9877]).untracked());
    if let Some(mac) = &options.vis_macro {
        g4_params.insert("visMacro", string(mac.as_str()).untracked());
    }
    let g4run = process.producer("g4run", "G4", g4_params)?;

    let randomsaver = process.analyzer("randomsaver", "RandomNumberSaver", ParameterSet::new())?;

    let mut output_commands = vec!["keep *_*_*_*"];
    if options.drop_sim_particles {
        output_commands.push(DROP_SIM_PARTICLES);
    }
    let outfile = process.output(
        "outfile",
        "PoolOutputModule",
        ParameterSet::new()
            .with("fileName", string("file:data_06.root").untracked())
            .with("outputCommands", vstring(output_commands).untracked()),
    )?;

    // Declared for interactive use; not scheduled
    process.producer(
        "makeCaloCrystalHits",
        "MakeCaloCrystalHits",
        ParameterSet::new()
            .with("diagLevel", int32(0).untracked())
            .with("maxFullPrint", int32(201).untracked())
            .with("g4ModuleLabel", g4run.input_tag())
            .with("minimumEnergy", double(0.0).untracked())
            .with("minimumTimeGap", double(100.0).untracked()),
    )?;

    let checkhits = process.analyzer(
        "checkhits",
        "ReadBack",
        ParameterSet::new()
            .with("g4ModuleLabel", g4run.input_tag())
            .with("minimumEnergy", double(0.0))
            .with("maxFullPrint", int32(201).untracked()),
    )?;

    // Debug printout from "hitinspect"; unlimited ToyHitInfo and GEOM messages
    let logger = MessageLoggerOverrides {
        cerr_threshold: Some(Severity::Debug),
        debug_modules: vec!["hitinspect".to_string()],
        categories: vec!["ToyHitInfo".to_string(), "GEOM".to_string()],
    };
    process.patch_service(MESSAGE_LOGGER, &logger.to_overrides())?;

    process.add_end_path("output", &generate * &g4run * &randomsaver * &checkhits * &outfile)?;

    info!("Built {} process ({} events)", PROCESS_NAME, options.max_events);
    Ok(process)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::validation::validate_process;

    #[test]
    fn test_default_preset_validates() {
        let process = transport_only(&TransportOnlyOptions::default()).unwrap();
        validate_process(&process).unwrap();
        assert_eq!(process.name(), "transportOnly");
        assert_eq!(process.source().unwrap().implementation, "EmptySource");
        assert_eq!(process.modules().count(), 6);
        assert_eq!(process.services().count(), 5);
    }

    #[test]
    fn test_toggles_off_by_default() {
        let process = transport_only(&TransportOnlyOptions::default()).unwrap();
        assert!(!process.module("g4run").unwrap().params.contains("visMacro"));
        let outfile = &process.module("outfile").unwrap().params;
        assert_eq!(outfile.get_vstring("outputCommands").unwrap(), &["keep *_*_*_*"]);
    }

    #[test]
    fn test_toggles_on() {
        let options = TransportOnlyOptions {
            max_events: 5,
            vis_macro: Some("Mu2eG4/test/vis45.mac".to_string()),
            drop_sim_particles: true,
        };
        let process = transport_only(&options).unwrap();
        assert_eq!(process.max_events(), Some(5));

        let g4 = &process.module("g4run").unwrap().params;
        assert_eq!(g4.get_str("visMacro").unwrap(), "Mu2eG4/test/vis45.mac");
        assert!(!g4.get("visMacro").unwrap().is_tracked());

        let outfile = &process.module("outfile").unwrap().params;
        assert_eq!(
            outfile.get_vstring("outputCommands").unwrap(),
            &["keep *_*_*_*", DROP_SIM_PARTICLES]
        );
    }

    #[test]
    fn test_crystal_hits_declared_but_unscheduled() {
        let process = transport_only(&TransportOnlyOptions::default()).unwrap();
        assert!(process.module("makeCaloCrystalHits").is_some());
        assert!(!process.scheduled_labels().contains("makeCaloCrystalHits"));
    }
}
