#![forbid(unsafe_code)]
//! refgraph-core library.
//!
//! Data model and registry seam for the export reference grapher, plus the
//! configuration layer and the generic polling helper shared by callers.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums at module seams, `anyhow::Result`
//!   for config loading.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod error;
pub mod manifest;
pub mod model;
pub mod poll;
pub mod registry;

pub use model::{ReferenceAttribute, ResourceType};
pub use registry::{ResourceRegistry, StaticRegistry};
