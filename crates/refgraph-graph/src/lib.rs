#![forbid(unsafe_code)]
//! refgraph-graph library.
//!
//! Builds the resource type dependency graph, enumerates its elementary
//! cycles, and classifies them against a [`policy::CyclePolicy`].
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums ([`graph::GraphError`], [`validate::CycleError`]).
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod graph;
pub mod policy;
pub mod validate;

pub use graph::{Cycle, DependencyGraph, GraphError};
pub use policy::{CycleClass, CyclePolicy};
pub use validate::{CycleError, ValidationError, ValidationReport, check, validate};
