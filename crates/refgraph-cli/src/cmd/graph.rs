//! `refgraph graph`: print the resource type dependency graph.
//!
//! An edge `A -> B` means type `A` holds at least one reference attribute
//! targeting `B`, so `B` must be created first.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use petgraph::dot::Dot;
use refgraph_graph::DependencyGraph;
use serde::Serialize;

use super::CommandContext;
use crate::output::{pretty_kv, pretty_section, render, render_mode};

/// Arguments for `refgraph graph`.
#[derive(Args, Debug, Default)]
pub struct GraphArgs {
    /// Registry manifest (.toml, .json, .yaml). Defaults to `[registry] manifest`.
    pub manifest: Option<PathBuf>,

    /// Emit Graphviz DOT instead of a summary.
    #[arg(long)]
    pub dot: bool,
}

#[derive(Debug, Serialize)]
struct EdgeOutput {
    from: String,
    to: String,
    attributes: Vec<String>,
}

#[derive(Debug, Serialize)]
struct GraphOutput {
    fingerprint: String,
    node_count: usize,
    edge_count: usize,
    nodes: Vec<String>,
    edges: Vec<EdgeOutput>,
}

#[derive(Debug, Serialize)]
struct DotOutput {
    dot: String,
}

impl GraphOutput {
    fn from_graph(graph: &DependencyGraph) -> Self {
        Self {
            fingerprint: graph.content_hash.clone(),
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            nodes: graph.graph.node_weights().map(ToString::to_string).collect(),
            edges: graph
                .edges()
                .into_iter()
                .map(|(from, to, edge)| EdgeOutput {
                    from: from.to_string(),
                    to: to.to_string(),
                    attributes: edge.attributes.clone(),
                })
                .collect(),
        }
    }
}

/// Execute `refgraph graph`.
pub fn run_graph(args: &GraphArgs, ctx: &CommandContext) -> anyhow::Result<()> {
    let graph = ctx.load_graph(args.manifest.as_deref())?;

    if args.dot {
        let payload = DotOutput {
            dot: format!("{}", Dot::new(&graph.graph)),
        };
        return render(ctx.output, &payload, |p, w| write!(w, "{}", p.dot));
    }

    let payload = GraphOutput::from_graph(&graph);
    render_mode(ctx.output, &payload, render_graph_text, render_graph_pretty)
}

fn render_graph_text(payload: &GraphOutput, w: &mut dyn Write) -> std::io::Result<()> {
    for edge in &payload.edges {
        writeln!(w, "{} -> {}  {}", edge.from, edge.to, edge.attributes.join(","))?;
    }
    Ok(())
}

fn render_graph_pretty(payload: &GraphOutput, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, "Resource type graph")?;
    pretty_kv(w, "types", payload.node_count.to_string())?;
    pretty_kv(w, "references", payload.edge_count.to_string())?;
    pretty_kv(w, "fingerprint", &payload.fingerprint)?;

    if payload.edges.is_empty() {
        writeln!(w, "\nNo cross-type references.")?;
        return Ok(());
    }

    writeln!(w)?;
    for edge in &payload.edges {
        writeln!(w, "  {} -> {}", edge.from, edge.to)?;
        for attribute in &edge.attributes {
            writeln!(w, "      {attribute}")?;
        }
    }
    Ok(())
}
