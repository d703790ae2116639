//! Resource type dependency graph.
//!
//! # Pipeline
//!
//! ```text
//! ResourceRegistry (types + reference attributes)
//!        ↓  build::DependencyGraph::from_registry()
//! DependencyGraph (DiGraph, no self edges, excluded attributes dropped)
//!        ↓  cycles::find_cycles()
//! Vec<Cycle> (every elementary cycle, canonical rotation)
//!        ↓  crate::policy::CyclePolicy::classify()
//! ignored | excused | reportable
//! ```
//!
//! ## Edge Direction
//!
//! An edge `A → B` means "A has an attribute holding the ID of a B", so B
//! must exist before A can be created.

pub mod build;
pub mod cycles;

pub use build::{DependencyGraph, GraphError, RefEdge};
pub use cycles::{Cycle, cycle_groups, elementary_cycles, find_cycles};
