//! Rendering to the framework's legacy configuration script.
//!
//! The script form is what older framework releases read directly. It is
//! write-only: documents are the round-trippable representation.

use crate::process::{PathKind, Process};
use crate::pset::{Entry, ParamValue, ParameterSet};
use chrono::{DateTime, Utc};

const INDENT: &str = "    ";

/// Render a process as a configuration script stamped with the current time
pub fn render_script(process: &Process) -> String {
    render_script_at(process, Utc::now())
}

pub fn render_script_at(process: &Process, generated: DateTime<Utc>) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "# Generated by detsim on {}\n",
        generated.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str("import FWCore.ParameterSet.python.Config as mu2e\n\n");
    out.push_str(&format!("process = mu2e.Process({})\n\n", quote(process.name())));

    if !process.max_events_pset().is_empty() {
        out.push_str(&format!(
            "process.maxEvents = mu2e.untracked.PSet({})\n\n",
            render_params(process.max_events_pset(), 0)
        ));
    }

    for (name, params) in process.services() {
        out.push_str(&format!(
            "process.{} = mu2e.Service({})\n",
            name,
            render_args(name, params)
        ));
    }
    if process.services().next().is_some() {
        out.push('\n');
    }

    if let Some(source) = process.source() {
        out.push_str(&format!(
            "process.source = mu2e.Source({})\n\n",
            render_args(&source.implementation, &source.params)
        ));
    }

    for (label, decl) in process.modules() {
        out.push_str(&format!(
            "process.{} = mu2e.{}({})\n\n",
            label,
            decl.kind.as_str(),
            render_args(&decl.implementation, &decl.params)
        ));
    }

    for path in process.paths() {
        let ctor = match path.kind {
            PathKind::Path => "Path",
            PathKind::EndPath => "EndPath",
        };
        let sequence: Vec<String> = path.sequence.iter().map(|l| format!("process.{}", l)).collect();
        out.push_str(&format!("process.{} = mu2e.{}({})\n", path.name, ctor, sequence.join("*")));
    }

    out
}

fn render_args(first: &str, params: &ParameterSet) -> String {
    if params.is_empty() {
        quote(first)
    } else {
        format!("{},{}", quote(first), render_params(params, 0))
    }
}

fn render_params(params: &ParameterSet, depth: usize) -> String {
    if params.is_empty() {
        return String::new();
    }
    let pad = INDENT.repeat(depth + 1);
    let lines: Vec<String> = params
        .iter()
        .map(|(name, entry)| format!("{}{} = {}", pad, name, render_entry(entry, depth + 1)))
        .collect();
    format!("\n{}\n{}", lines.join(",\n"), INDENT.repeat(depth))
}

fn render_entry(entry: &Entry, depth: usize) -> String {
    let prefix = if entry.is_tracked() { "mu2e." } else { "mu2e.untracked." };
    let body = match entry.value() {
        ParamValue::Int32(v) => format!("int32({})", v),
        ParamValue::UInt32(v) => format!("uint32({})", v),
        ParamValue::Int64(v) => format!("int64({})", v),
        ParamValue::Double(v) => format!("double({:?})", v),
        ParamValue::String(v) => format!("string({})", quote(v)),
        ParamValue::Bool(v) => format!("bool({})", if *v { "True" } else { "False" }),
        ParamValue::VInt32(v) => format!("vint32({})", join(v.iter().map(|x| x.to_string()))),
        ParamValue::VDouble(v) => format!("vdouble({})", join(v.iter().map(|x| format!("{:?}", x)))),
        ParamValue::VString(v) => format!("vstring({})", join(v.iter().map(|x| quote(x)))),
        ParamValue::InputTag(v) => format!("InputTag({})", quote(v)),
        ParamValue::PSet(inner) => format!("PSet({})", render_params(inner, depth)),
        ParamValue::VPSet(list) => format!(
            "VPSet({})",
            join(list.iter().map(|inner| format!("mu2e.PSet({})", render_params(inner, depth))))
        ),
    };
    format!("{}{}", prefix, body)
}

fn join(items: impl Iterator<Item = String>) -> String {
    items.collect::<Vec<_>>().join(", ")
}

fn quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::{transport_only, TransportOnlyOptions};
    use chrono::TimeZone;

    fn rendered() -> String {
        let process = transport_only(&TransportOnlyOptions::default()).unwrap();
        let stamp = Utc.with_ymd_and_hms(2010, 10, 28, 20, 43, 58).unwrap();
        render_script_at(&process, stamp)
    }

    #[test]
    fn test_header_and_process() {
        let script = rendered();
        assert!(script.starts_with("# Generated by detsim on 2010-10-28 20:43:58 UTC\n"));
        assert!(script.contains("process = mu2e.Process(\"transportOnly\")"));
        assert!(script.contains("input = mu2e.untracked.int32(100)"));
    }

    #[test]
    fn test_modules_rendered_with_kinds() {
        let script = rendered();
        assert!(script.contains("process.source = mu2e.Source(\"EmptySource\")"));
        assert!(script.contains("process.g4run = mu2e.EDProducer(\"G4\","));
        assert!(script.contains("generatorModuleLabel = mu2e.InputTag(\"generate\")"));
        assert!(script.contains("seed = mu2e.untracked.vint32(9877)"));
        assert!(script.contains("process.randomsaver = mu2e.EDAnalyzer(\"RandomNumberSaver\")"));
        assert!(script.contains("minimumTimeGap = mu2e.untracked.double(100.0)"));
        assert!(script.contains("outputCommands = mu2e.untracked.vstring(\"keep *_*_*_*\")"));
        assert!(script.contains("closeFileFast = mu2e.untracked.bool(False)"));
    }

    #[test]
    fn test_end_path_rendered_in_order() {
        let script = rendered();
        assert!(script.contains(
            "process.output = mu2e.EndPath(process.generate*process.g4run*process.randomsaver*process.checkhits*process.outfile)"
        ));
    }

    #[test]
    fn test_nested_sets_indent() {
        let script = rendered();
        assert!(script.contains("    cerr = mu2e.untracked.PSet(\n        FwkJob = mu2e.untracked.PSet("));
    }
}
