//! Graph construction from a resource type registry.
//!
//! # Overview
//!
//! Every registered resource type becomes a node, including types that
//! reference nothing and are referenced by nothing. For each reference
//! attribute `A.attr → B`:
//!
//! - `B` must be registered, otherwise construction stops with
//!   [`GraphError::UnknownReferenceTarget`]. This holds for excluded
//!   attributes too.
//! - `B == A` is skipped. Self references describe instance-level links
//!   (a user's manager is another user) and never order type creation.
//! - Excluded attributes are skipped; the exporter drops them.
//!
//! Several attributes from `A` to `B` collapse into one edge whose
//! [`RefEdge`] weight lists every attribute name.
//!
//! ## Fingerprint
//!
//! [`DependencyGraph::content_hash`] is a BLAKE3 hash of the sorted node and
//! edge lists. Reports carry it so a result can be tied to the registry
//! snapshot that produced it.

#![allow(clippy::module_name_repetitions)]

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use refgraph_core::error::ErrorCode;
use refgraph_core::{ResourceRegistry, ResourceType};
use serde::Serialize;
use tracing::{debug, instrument, trace};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from graph construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// A reference attribute targets a type the registry does not list.
    #[error(
        "resource type `{resource_type}` attribute `{attribute}` references unknown resource type `{target}`"
    )]
    UnknownReferenceTarget {
        resource_type: ResourceType,
        attribute: String,
        target: ResourceType,
    },
}

impl GraphError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownReferenceTarget { .. } => ErrorCode::UnknownReferenceTarget,
        }
    }
}

// ---------------------------------------------------------------------------
// DependencyGraph
// ---------------------------------------------------------------------------

/// Attributes that produce one `A → B` edge, sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefEdge {
    pub attributes: Vec<String>,
}

impl fmt::Display for RefEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.attributes.join(", "))
    }
}

/// Directed graph of resource types. Node indices follow resource type
/// name order.
#[derive(Debug)]
pub struct DependencyGraph {
    pub graph: DiGraph<ResourceType, RefEdge>,
    pub node_map: HashMap<ResourceType, NodeIndex>,
    /// BLAKE3 fingerprint of the node and edge sets.
    pub content_hash: String,
}

impl DependencyGraph {
    /// Build the graph from a registry snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownReferenceTarget`] on the first attribute
    /// whose target is not registered. No partial graph is returned.
    #[instrument(skip(registry))]
    pub fn from_registry<R: ResourceRegistry + ?Sized>(registry: &R) -> Result<Self, GraphError> {
        let types = registry.resource_types();

        let mut graph = DiGraph::<ResourceType, RefEdge>::with_capacity(types.len(), 0);
        let mut node_map: HashMap<ResourceType, NodeIndex> = HashMap::with_capacity(types.len());
        for resource_type in &types {
            let idx = graph.add_node(resource_type.clone());
            node_map.insert(resource_type.clone(), idx);
        }

        // Collect first so the edge list is sorted by (from, to) before hashing.
        let mut edges: BTreeMap<(NodeIndex, NodeIndex), RefEdge> = BTreeMap::new();

        for resource_type in &types {
            let from = node_map[resource_type];
            let mut attributes = registry.reference_attributes(resource_type);
            attributes.sort_by(|a, b| a.attribute_name.cmp(&b.attribute_name));

            for attr in attributes {
                let Some(&to) = node_map.get(&attr.target_type) else {
                    return Err(GraphError::UnknownReferenceTarget {
                        resource_type: resource_type.clone(),
                        attribute: attr.attribute_name,
                        target: attr.target_type,
                    });
                };

                if to == from {
                    trace!(%resource_type, attribute = %attr.attribute_name, "skipping self reference");
                    continue;
                }

                if attr.excluded {
                    trace!(%resource_type, attribute = %attr.attribute_name, "skipping excluded attribute");
                    continue;
                }

                edges
                    .entry((from, to))
                    .or_default()
                    .attributes
                    .push(attr.attribute_name);
            }
        }

        let content_hash = compute_content_hash(&graph, &edges);

        for ((from, to), weight) in edges {
            graph.add_edge(from, to, weight);
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "built dependency graph"
        );

        Ok(Self {
            graph,
            node_map,
            content_hash,
        })
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Look up the `NodeIndex` for a resource type name.
    #[must_use]
    pub fn node_index(&self, resource_type: &str) -> Option<NodeIndex> {
        self.node_map.get(resource_type).copied()
    }

    /// Return the resource type for a node.
    #[must_use]
    pub fn resource_type(&self, idx: NodeIndex) -> Option<&ResourceType> {
        self.graph.node_weight(idx)
    }

    /// Attributes behind the edge `from → to`, if that edge exists.
    #[must_use]
    pub fn edge_attributes(&self, from: &str, to: &str) -> Option<&[String]> {
        let edge = self
            .graph
            .find_edge(self.node_index(from)?, self.node_index(to)?)?;
        self.graph
            .edge_weight(edge)
            .map(|weight| weight.attributes.as_slice())
    }

    /// Every edge as `(from, to, weight)`, sorted by endpoint names.
    #[must_use]
    pub fn edges(&self) -> Vec<(&ResourceType, &ResourceType, &RefEdge)> {
        let mut edges: Vec<_> = self
            .graph
            .edge_references()
            .map(|edge| {
                (
                    &self.graph[edge.source()],
                    &self.graph[edge.target()],
                    edge.weight(),
                )
            })
            .collect();
        edges.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        edges
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn compute_content_hash(
    graph: &DiGraph<ResourceType, RefEdge>,
    edges: &BTreeMap<(NodeIndex, NodeIndex), RefEdge>,
) -> String {
    let mut hasher = blake3::Hasher::new();
    for node in graph.node_weights() {
        hasher.update(node.as_str().as_bytes());
        hasher.update(b"\x00");
    }
    hasher.update(b"\x01");
    for (from, to) in edges.keys() {
        hasher.update(graph[*from].as_str().as_bytes());
        hasher.update(b"\x00");
        hasher.update(graph[*to].as_str().as_bytes());
        hasher.update(b"\x00");
    }
    format!("blake3:{}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
