//! `refgraph check`: validate a registry and fail on reportable cycles.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use refgraph_graph::validate::validate_graph;
use refgraph_graph::{CycleClass, ValidationReport};
use serde::Serialize;

use super::CommandContext;
use crate::output::{pretty_kv, pretty_section, render_mode};

/// Arguments for `refgraph check`.
#[derive(Args, Debug, Default)]
pub struct CheckArgs {
    /// Registry manifest (.toml, .json, .yaml). Defaults to `[registry] manifest`.
    pub manifest: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct CheckOutput<'a> {
    ok: bool,
    #[serde(flatten)]
    report: &'a ValidationReport,
}

/// Execute `refgraph check`.
pub fn run_check(args: &CheckArgs, ctx: &CommandContext) -> anyhow::Result<()> {
    let graph = ctx.load_graph(args.manifest.as_deref())?;
    let report = validate_graph(&graph, &ctx.policy());

    let payload = CheckOutput {
        ok: report.is_ok(),
        report: &report,
    };
    render_mode(ctx.output, &payload, render_check_text, render_check_pretty)?;

    match report.into_result() {
        Ok(_) => Ok(()),
        Err(err) => Err(ctx.fail_with_code(err.to_string(), err.code())),
    }
}

fn render_check_text(payload: &CheckOutput<'_>, w: &mut dyn Write) -> std::io::Result<()> {
    let report = payload.report;
    for cycle in report.reportable() {
        writeln!(w, "reportable  {}", cycle.path)?;
    }
    writeln!(
        w,
        "{}  types={} references={} ignored={} excused={} reportable={}",
        if payload.ok { "ok" } else { "fail" },
        report.node_count,
        report.edge_count,
        report.count(CycleClass::Ignored),
        report.count(CycleClass::Excused),
        report.count(CycleClass::Reportable),
    )
}

fn render_check_pretty(payload: &CheckOutput<'_>, w: &mut dyn Write) -> std::io::Result<()> {
    let report = payload.report;
    pretty_section(w, "Reference cycle check")?;
    pretty_kv(w, "types", report.node_count.to_string())?;
    pretty_kv(w, "references", report.edge_count.to_string())?;
    pretty_kv(w, "fingerprint", &report.fingerprint)?;
    pretty_kv(w, "ignored", report.count(CycleClass::Ignored).to_string())?;
    pretty_kv(w, "excused", report.count(CycleClass::Excused).to_string())?;
    pretty_kv(w, "reportable", report.count(CycleClass::Reportable).to_string())?;

    if payload.ok {
        writeln!(w, "\nNo reportable reference cycles.")?;
        return Ok(());
    }

    writeln!(w)?;
    for cycle in report.reportable() {
        writeln!(w, "  {}", cycle.path)?;
        for hop in &cycle.hops {
            writeln!(w, "      {} -[{}]-> {}", hop.from, hop.attributes.join(", "), hop.to)?;
        }
    }
    Ok(())
}
