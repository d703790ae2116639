//! `refgraph cycles`: list classified reference cycles.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use refgraph_core::ResourceType;
use refgraph_graph::CycleClass;
use refgraph_graph::graph::cycle_groups;
use refgraph_graph::validate::{ClassifiedCycle, validate_graph};
use serde::Serialize;

use super::CommandContext;
use crate::output::{pretty_section, render_mode};

/// Arguments for `refgraph cycles`.
#[derive(Args, Debug, Default)]
pub struct CyclesArgs {
    /// Registry manifest (.toml, .json, .yaml). Defaults to `[registry] manifest`.
    pub manifest: Option<PathBuf>,

    /// Include ignored and excused cycles.
    #[arg(long)]
    pub all: bool,
}

#[derive(Debug, Serialize)]
struct CyclesOutput {
    cycles: Vec<ClassifiedCycle>,
    /// Strongly connected groups of types that contain cycles.
    groups: Vec<Vec<ResourceType>>,
}

/// Execute `refgraph cycles`. Lists only; never fails on cycles.
pub fn run_cycles(args: &CyclesArgs, ctx: &CommandContext) -> anyhow::Result<()> {
    let graph = ctx.load_graph(args.manifest.as_deref())?;
    let report = validate_graph(&graph, &ctx.policy());

    let payload = CyclesOutput {
        cycles: report
            .cycles
            .into_iter()
            .filter(|c| args.all || c.class == CycleClass::Reportable)
            .collect(),
        groups: cycle_groups(&graph),
    };

    render_mode(ctx.output, &payload, render_cycles_text, render_cycles_pretty)
}

fn render_cycles_text(payload: &CyclesOutput, w: &mut dyn Write) -> std::io::Result<()> {
    for cycle in &payload.cycles {
        writeln!(w, "{:<10}  {}", cycle.class.as_str(), cycle.path)?;
    }
    Ok(())
}

fn render_cycles_pretty(payload: &CyclesOutput, w: &mut dyn Write) -> std::io::Result<()> {
    if payload.cycles.is_empty() {
        writeln!(w, "No reference cycles found.")?;
        return Ok(());
    }

    pretty_section(w, &format!("Reference cycles ({})", payload.cycles.len()))?;
    for (idx, cycle) in payload.cycles.iter().enumerate() {
        writeln!(w, "\nCycle {} [{}]:", idx + 1, cycle.class)?;
        writeln!(w, "  {}", cycle.path)?;
        for hop in &cycle.hops {
            writeln!(w, "  - {} -> {} via {}", hop.from, hop.to, hop.attributes.join(", "))?;
        }
    }

    if !payload.groups.is_empty() {
        writeln!(w)?;
        pretty_section(w, "Tangled type groups")?;
        for group in &payload.groups {
            let names: Vec<&str> = group.iter().map(ResourceType::as_str).collect();
            writeln!(w, "  {{{}}}", names.join(", "))?;
        }
    }

    Ok(())
}
