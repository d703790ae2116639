//! Elementary cycle enumeration.
//!
//! [`elementary_cycles`] is Johnson's algorithm: for each start vertex `s`
//! in index order, restrict the search to the strongly connected component
//! of the subgraph induced by `{s, s+1, ..}` that contains the least vertex,
//! and walk every circuit through `s` with a blocked set so no vertex is
//! explored twice without first being released. Every simple cycle is
//! produced exactly once, beginning at its least vertex.
//!
//! [`cycle_groups`] is the coarser SCC summary: which types are tangled
//! together at all, without listing the individual circuits.

#![allow(clippy::module_name_repetitions)]

use std::collections::BTreeSet;
use std::fmt;

use fixedbitset::FixedBitSet;
use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use refgraph_core::ResourceType;
use serde::Serialize;

use crate::graph::build::DependencyGraph;

// ---------------------------------------------------------------------------
// Cycle
// ---------------------------------------------------------------------------

/// A closed path of resource types, stored open (`[A, B, C]` for
/// `A -> B -> C -> A`) and rotated to start at the smallest type name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Cycle {
    types: Vec<ResourceType>,
}

impl Cycle {
    /// Build from an open path. Direction is kept; only the rotation changes.
    #[must_use]
    pub fn new(mut types: Vec<ResourceType>) -> Self {
        if let Some(start) = types
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.cmp(b.1))
            .map(|(pos, _)| pos)
        {
            types.rotate_left(start);
        }
        Self { types }
    }

    #[must_use]
    pub fn types(&self) -> &[ResourceType] {
        &self.types
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    #[must_use]
    pub fn contains(&self, resource_type: &str) -> bool {
        self.types.iter().any(|t| t.as_str() == resource_type)
    }

    #[must_use]
    pub fn members(&self) -> BTreeSet<&ResourceType> {
        self.types.iter().collect()
    }

    /// Consecutive `(from, to)` pairs, including the closing hop back to the start.
    pub fn hops(&self) -> impl Iterator<Item = (&ResourceType, &ResourceType)> {
        self.types
            .iter()
            .zip(self.types.iter().cycle().skip(1))
    }

    /// Whether `pattern` (open form) is this cycle read from some other start.
    #[must_use]
    pub fn is_rotation_of(&self, pattern: &[ResourceType]) -> bool {
        if pattern.len() != self.types.len() {
            return false;
        }
        if pattern.is_empty() {
            return true;
        }
        (0..pattern.len()).any(|offset| {
            pattern
                .iter()
                .cycle()
                .skip(offset)
                .zip(&self.types)
                .all(|(p, t)| p == t)
        })
    }

    /// `A -> B -> C -> A`.
    #[must_use]
    pub fn path_display(&self) -> String {
        let mut names: Vec<&str> = self.types.iter().map(ResourceType::as_str).collect();
        if let Some(first) = names.first().copied() {
            names.push(first);
        }
        names.join(" -> ")
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path_display())
    }
}

// ---------------------------------------------------------------------------
// Enumeration
// ---------------------------------------------------------------------------

/// Every elementary cycle of `graph` in discovery order, each beginning at
/// its least node index. A self loop is a one-node cycle.
#[must_use]
pub fn elementary_cycles<N, E>(graph: &DiGraph<N, E>) -> Vec<Vec<NodeIndex>> {
    let node_count = graph.node_count();
    let adjacency: Vec<Vec<usize>> = graph
        .node_indices()
        .map(|node| {
            let mut out: Vec<usize> = graph
                .neighbors_directed(node, Direction::Outgoing)
                .map(NodeIndex::index)
                .collect();
            out.sort_unstable();
            out.dedup();
            out
        })
        .collect();

    let mut search = CircuitSearch::new(&adjacency);
    let mut start = 0;
    while start < node_count {
        let Some((least, component)) = least_cyclic_component(&adjacency, start) else {
            break;
        };
        search.run_from(least, &component);
        start = least + 1;
    }

    search
        .cycles
        .into_iter()
        .map(|cycle| cycle.into_iter().map(NodeIndex::new).collect())
        .collect()
}

/// Every elementary cycle of the dependency graph as named [`Cycle`]s, sorted.
#[must_use]
pub fn find_cycles(graph: &DependencyGraph) -> Vec<Cycle> {
    let mut cycles: Vec<Cycle> = elementary_cycles(&graph.graph)
        .into_iter()
        .map(|path| Cycle::new(path.into_iter().map(|idx| graph.graph[idx].clone()).collect()))
        .collect();
    cycles.sort_unstable();
    cycles
}

/// Strongly connected components that contain at least one cycle.
///
/// Each entry is a sorted list of member types; the list is sorted too.
#[must_use]
pub fn cycle_groups(graph: &DependencyGraph) -> Vec<Vec<ResourceType>> {
    let g = &graph.graph;
    let mut groups: Vec<Vec<ResourceType>> = tarjan_scc(g)
        .into_iter()
        .filter(|component| {
            component.len() > 1
                || component
                    .first()
                    .is_some_and(|node| g.find_edge(*node, *node).is_some())
        })
        .map(|component| {
            let mut members: Vec<ResourceType> =
                component.into_iter().map(|idx| g[idx].clone()).collect();
            members.sort_unstable();
            members
        })
        .collect();

    groups.sort_unstable();
    groups
}

/// SCC of the subgraph induced by nodes `>= start` that holds the least
/// node among all SCCs with a cycle, with that node.
fn least_cyclic_component(adjacency: &[Vec<usize>], start: usize) -> Option<(usize, FixedBitSet)> {
    let node_count = adjacency.len();
    let mut sub = DiGraph::<(), ()>::with_capacity(node_count - start, 0);
    for _ in start..node_count {
        sub.add_node(());
    }
    for (v, targets) in adjacency.iter().enumerate().skip(start) {
        for &w in targets.iter().filter(|&&w| w >= start) {
            sub.add_edge(NodeIndex::new(v - start), NodeIndex::new(w - start), ());
        }
    }

    tarjan_scc(&sub)
        .into_iter()
        .filter(|component| {
            component.len() > 1
                || component
                    .first()
                    .is_some_and(|node| sub.find_edge(*node, *node).is_some())
        })
        .filter_map(|component| {
            let least = component.iter().map(|idx| idx.index() + start).min()?;
            Some((least, component))
        })
        .min_by_key(|(least, _)| *least)
        .map(|(least, component)| {
            let mut members = FixedBitSet::with_capacity(node_count);
            for idx in component {
                members.insert(idx.index() + start);
            }
            (least, members)
        })
}

/// Johnson's circuit search state, reused across start vertices.
struct CircuitSearch<'a> {
    adjacency: &'a [Vec<usize>],
    blocked: FixedBitSet,
    /// `blocked_by[w]` lists vertices to release when `w` is released.
    blocked_by: Vec<Vec<usize>>,
    path: Vec<usize>,
    cycles: Vec<Vec<usize>>,
}

impl<'a> CircuitSearch<'a> {
    fn new(adjacency: &'a [Vec<usize>]) -> Self {
        Self {
            adjacency,
            blocked: FixedBitSet::with_capacity(adjacency.len()),
            blocked_by: vec![Vec::new(); adjacency.len()],
            path: Vec::new(),
            cycles: Vec::new(),
        }
    }

    fn run_from(&mut self, start: usize, component: &FixedBitSet) {
        for v in component.ones() {
            self.blocked.set(v, false);
            self.blocked_by[v].clear();
        }
        self.circuit(start, start, component);
    }

    /// Recursion depth is bounded by the component size.
    fn circuit(&mut self, v: usize, start: usize, component: &FixedBitSet) -> bool {
        let adjacency = self.adjacency;
        let mut closed = false;

        self.path.push(v);
        self.blocked.insert(v);

        for &w in adjacency[v].iter().filter(|&&w| component.contains(w)) {
            if w == start {
                self.cycles.push(self.path.clone());
                closed = true;
            } else if !self.blocked.contains(w) && self.circuit(w, start, component) {
                closed = true;
            }
        }

        if closed {
            self.unblock(v);
        } else {
            for &w in adjacency[v].iter().filter(|&&w| component.contains(w)) {
                if !self.blocked_by[w].contains(&v) {
                    self.blocked_by[w].push(v);
                }
            }
        }

        self.path.pop();
        closed
    }

    fn unblock(&mut self, v: usize) {
        self.blocked.set(v, false);
        let mut pending = vec![v];
        while let Some(u) = pending.pop() {
            for w in std::mem::take(&mut self.blocked_by[u]) {
                if self.blocked.contains(w) {
                    self.blocked.set(w, false);
                    pending.push(w);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn graph_with_nodes_and_edges(
        nodes: &[&str],
        edges: &[(&str, &str)],
    ) -> (DiGraph<String, ()>, HashMap<String, NodeIndex>) {
        let mut graph = DiGraph::<String, ()>::new();
        let mut map: HashMap<String, NodeIndex> = HashMap::new();

        for &node in nodes {
            let idx = graph.add_node(node.to_string());
            map.insert(node.to_string(), idx);
        }

        for &(from, to) in edges {
            let from_idx = *map
                .entry(from.to_string())
                .or_insert_with(|| graph.add_node(from.to_string()));
            let to_idx = *map
                .entry(to.to_string())
                .or_insert_with(|| graph.add_node(to.to_string()));
            graph.add_edge(from_idx, to_idx, ());
        }

        (graph, map)
    }

    fn named(graph: &DiGraph<String, ()>) -> Vec<Vec<String>> {
        let mut cycles: Vec<Vec<String>> = elementary_cycles(graph)
            .into_iter()
            .map(|c| c.into_iter().map(|idx| graph[idx].clone()).collect())
            .collect();
        cycles.sort();
        cycles
    }

    fn cycle(names: &[&str]) -> Cycle {
        Cycle::new(names.iter().map(|n| ResourceType::new(*n)).collect())
    }

    fn types(names: &[&str]) -> Vec<ResourceType> {
        names.iter().map(|n| ResourceType::new(*n)).collect()
    }

    #[test]
    fn empty_graph_has_no_cycles() {
        let (graph, _) = graph_with_nodes_and_edges(&[], &[]);
        assert!(elementary_cycles(&graph).is_empty());
    }

    #[test]
    fn acyclic_graph_has_no_cycles() {
        let (graph, _) =
            graph_with_nodes_and_edges(&["A", "B", "C"], &[("A", "B"), ("B", "C"), ("A", "C")]);
        assert!(elementary_cycles(&graph).is_empty());
    }

    #[test]
    fn two_node_cycle() {
        let (graph, _) = graph_with_nodes_and_edges(&["A", "B"], &[("A", "B"), ("B", "A")]);
        assert_eq!(named(&graph), vec![vec!["A", "B"]]);
    }

    #[test]
    fn three_node_cycle_keeps_direction() {
        let (graph, _) = graph_with_nodes_and_edges(
            &["X", "Y", "Z"],
            &[("X", "Y"), ("Y", "Z"), ("Z", "X")],
        );
        assert_eq!(named(&graph), vec![vec!["X", "Y", "Z"]]);
    }

    #[test]
    fn self_loop_is_a_one_node_cycle() {
        let (graph, _) = graph_with_nodes_and_edges(&["F"], &[("F", "F")]);
        assert_eq!(named(&graph), vec![vec!["F"]]);
    }

    #[test]
    fn overlapping_cycles_are_listed_individually() {
        // A <-> B, B <-> C, and A -> B -> C -> A: four circuits in one SCC.
        let (graph, _) = graph_with_nodes_and_edges(
            &["A", "B", "C"],
            &[("A", "B"), ("B", "A"), ("B", "C"), ("C", "B"), ("C", "A")],
        );
        assert_eq!(
            named(&graph),
            vec![vec!["A", "B"], vec!["A", "B", "C"], vec!["B", "C"]]
        );
    }

    #[test]
    fn complete_graph_on_four_nodes() {
        // K4 directed both ways has 6 two-cycles, 8 three-cycles, 6 four-cycles.
        let names = ["A", "B", "C", "D"];
        let edges: Vec<(&str, &str)> = names
            .iter()
            .flat_map(|a| names.iter().filter(move |b| *b != a).map(move |b| (*a, *b)))
            .collect();
        let (graph, _) = graph_with_nodes_and_edges(&names, &edges);

        let cycles = elementary_cycles(&graph);
        assert_eq!(cycles.len(), 20);
        assert_eq!(cycles.iter().filter(|c| c.len() == 2).count(), 6);
        assert_eq!(cycles.iter().filter(|c| c.len() == 3).count(), 8);
        assert_eq!(cycles.iter().filter(|c| c.len() == 4).count(), 6);
    }

    #[test]
    fn independent_components_are_all_found() {
        let (graph, _) = graph_with_nodes_and_edges(
            &["A", "B", "C", "D", "E", "G"],
            &[("A", "B"), ("B", "A"), ("C", "D"), ("D", "E"), ("E", "C"), ("G", "A")],
        );
        assert_eq!(named(&graph), vec![vec!["A", "B"], vec!["C", "D", "E"]]);
    }

    #[test]
    fn parallel_edges_do_not_duplicate_cycles() {
        let (graph, _) =
            graph_with_nodes_and_edges(&["A", "B"], &[("A", "B"), ("A", "B"), ("B", "A")]);
        assert_eq!(elementary_cycles(&graph).len(), 1);
    }

    #[test]
    fn each_cycle_starts_at_its_least_index() {
        let (graph, _) = graph_with_nodes_and_edges(
            &["A", "B", "C", "D"],
            &[("D", "B"), ("B", "C"), ("C", "D"), ("C", "A"), ("A", "B")],
        );
        for path in elementary_cycles(&graph) {
            let least = path.iter().min().copied();
            assert_eq!(path.first().copied(), least);
        }
    }

    #[test]
    fn cycle_new_rotates_to_smallest() {
        let c = cycle(&["queue", "email_route"]);
        assert_eq!(c.types(), types(&["email_route", "queue"]).as_slice());
        assert_eq!(c.path_display(), "email_route -> queue -> email_route");
    }

    #[test]
    fn cycle_hops_close_the_loop() {
        let c = cycle(&["a", "b", "c"]);
        let hops: Vec<(&str, &str)> = c.hops().map(|(f, t)| (f.as_str(), t.as_str())).collect();
        assert_eq!(hops, vec![("a", "b"), ("b", "c"), ("c", "a")]);
    }

    #[test]
    fn rotation_matching_keeps_direction() {
        let c = cycle(&["a", "b", "c"]);
        assert!(c.is_rotation_of(&types(&["b", "c", "a"])));
        assert!(c.is_rotation_of(&types(&["c", "a", "b"])));
        assert!(!c.is_rotation_of(&types(&["a", "c", "b"])));
        assert!(!c.is_rotation_of(&types(&["a", "b"])));
    }

    #[test]
    fn cycle_serializes_as_type_list() {
        let json = serde_json::to_string(&cycle(&["b", "a"])).expect("serialize");
        assert_eq!(json, r#"["a","b"]"#);
    }
}
