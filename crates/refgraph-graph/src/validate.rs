//! One validation run: build, enumerate, classify, report.

use std::fmt::Write as _;

use refgraph_core::ResourceRegistry;
use refgraph_core::error::ErrorCode;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::graph::{Cycle, DependencyGraph, GraphError, find_cycles};
use crate::policy::{CycleClass, CyclePolicy};

/// One step of a cycle with the attributes that create it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hop {
    pub from: String,
    pub to: String,
    pub attributes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedCycle {
    pub cycle: Cycle,
    pub class: CycleClass,
    /// `A -> B -> A`.
    pub path: String,
    pub hops: Vec<Hop>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub fingerprint: String,
    pub node_count: usize,
    pub edge_count: usize,
    /// Every elementary cycle, sorted.
    pub cycles: Vec<ClassifiedCycle>,
}

impl ValidationReport {
    pub fn reportable(&self) -> impl Iterator<Item = &ClassifiedCycle> {
        self.cycles
            .iter()
            .filter(|c| c.class == CycleClass::Reportable)
    }

    #[must_use]
    pub fn count(&self, class: CycleClass) -> usize {
        self.cycles.iter().filter(|c| c.class == class).count()
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.reportable().next().is_none()
    }

    /// Fail with every reportable cycle, or hand the report back.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError::ReportableCycles`] when any cycle is reportable.
    pub fn into_result(self) -> Result<Self, CycleError> {
        let reportable: Vec<Cycle> = self.reportable().map(|c| c.cycle.clone()).collect();
        if reportable.is_empty() {
            Ok(self)
        } else {
            Err(CycleError::ReportableCycles(reportable))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CycleError {
    #[error("found {} potential reference cycle(s):\n{}", .0.len(), format_cycle_list(.0))]
    ReportableCycles(Vec<Cycle>),
}

impl CycleError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::ReportableCycles(_) => ErrorCode::ReportableCycle,
        }
    }

    #[must_use]
    pub fn cycles(&self) -> &[Cycle] {
        match self {
            Self::ReportableCycles(cycles) => cycles,
        }
    }
}

/// Either half of [`check`] failing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Cycles(#[from] CycleError),
}

impl ValidationError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Graph(e) => e.code(),
            Self::Cycles(e) => e.code(),
        }
    }
}

/// Build the graph from `registry` and classify every cycle.
///
/// A report with reportable cycles is still `Ok`; see [`check`] or
/// [`ValidationReport::into_result`] for pass/fail.
///
/// # Errors
///
/// Returns a [`GraphError`] before any cycle detection when the registry
/// references an unregistered type.
#[instrument(skip_all)]
pub fn validate<R: ResourceRegistry + ?Sized>(
    registry: &R,
    policy: &CyclePolicy,
) -> Result<ValidationReport, GraphError> {
    let graph = DependencyGraph::from_registry(registry)?;
    Ok(validate_graph(&graph, policy))
}

/// Classify every cycle of an already built graph.
#[must_use]
pub fn validate_graph(graph: &DependencyGraph, policy: &CyclePolicy) -> ValidationReport {
    let cycles: Vec<ClassifiedCycle> = find_cycles(graph)
        .into_iter()
        .map(|cycle| {
            let class = policy.classify(&cycle);
            match class {
                CycleClass::Reportable => warn!(path = %cycle, "reportable reference cycle"),
                CycleClass::Ignored | CycleClass::Excused => {
                    debug!(path = %cycle, %class, "reference cycle tolerated by policy");
                }
            }
            let hops = hops_of(graph, &cycle);
            ClassifiedCycle {
                path: cycle.path_display(),
                cycle,
                class,
                hops,
            }
        })
        .collect();

    let report = ValidationReport {
        fingerprint: graph.content_hash.clone(),
        node_count: graph.node_count(),
        edge_count: graph.edge_count(),
        cycles,
    };

    info!(
        nodes = report.node_count,
        edges = report.edge_count,
        cycles = report.cycles.len(),
        reportable = report.count(CycleClass::Reportable),
        "reference cycle validation complete"
    );

    report
}

/// Validate and fail on any reportable cycle.
///
/// # Errors
///
/// Returns [`ValidationError::Graph`] for a malformed registry and
/// [`ValidationError::Cycles`] listing every reportable cycle.
pub fn check<R: ResourceRegistry + ?Sized>(
    registry: &R,
    policy: &CyclePolicy,
) -> Result<ValidationReport, ValidationError> {
    Ok(validate(registry, policy)?.into_result()?)
}

fn hops_of(graph: &DependencyGraph, cycle: &Cycle) -> Vec<Hop> {
    cycle
        .hops()
        .map(|(from, to)| Hop {
            from: from.to_string(),
            to: to.to_string(),
            attributes: graph
                .edge_attributes(from.as_str(), to.as_str())
                .map(<[String]>::to_vec)
                .unwrap_or_default(),
        })
        .collect()
}

fn format_cycle_list(cycles: &[Cycle]) -> String {
    let mut out = String::new();
    for cycle in cycles {
        let _ = writeln!(out, "  {cycle}");
    }
    out.truncate(out.trim_end().len());
    out
}
