//! Property tests for graph construction and cycle enumeration over
//! randomly generated registries.

use std::collections::BTreeSet;

use proptest::prelude::*;
use refgraph_core::StaticRegistry;
use refgraph_graph::graph::{DependencyGraph, find_cycles};
use refgraph_graph::{CycleClass, CyclePolicy, validate};

/// A registry over `t0..tN` plus its raw `(from, to, excluded)` triples.
fn registry_strategy(max_types: usize) -> impl Strategy<Value = (usize, Vec<(usize, usize, bool)>)> {
    (1..=max_types).prop_flat_map(|n| {
        let edges = prop::collection::vec((0..n, 0..n, prop::bool::weighted(0.15)), 0..n * 3);
        (Just(n), edges)
    })
}

fn type_name(i: usize) -> String {
    format!("t{i}")
}

fn build(n: usize, edges: &[(usize, usize, bool)]) -> StaticRegistry {
    let mut registry = StaticRegistry::new();
    for i in 0..n {
        registry.insert_type(type_name(i));
    }
    for (k, &(from, to, excluded)) in edges.iter().enumerate() {
        let attr = format!("ref_{k}");
        registry = if excluded {
            registry.with_excluded_reference(type_name(from), &attr, type_name(to))
        } else {
            registry.with_reference(type_name(from), &attr, type_name(to))
        };
    }
    registry
}

/// Count elementary cycles by plain DFS: from each start `s`, walk simple
/// paths through vertices greater than `s` and count returns to `s`.
fn brute_force_cycle_count(n: usize, edges: &[(usize, usize, bool)]) -> usize {
    let mut adjacency = vec![BTreeSet::new(); n];
    for &(from, to, excluded) in edges {
        if !excluded && from != to {
            adjacency[from].insert(to);
        }
    }

    (0..n)
        .map(|s| {
            let mut on_path = vec![false; n];
            on_path[s] = true;
            walk(&adjacency, s, s, &mut on_path)
        })
        .sum()
}

fn walk(adjacency: &[BTreeSet<usize>], start: usize, v: usize, on_path: &mut [bool]) -> usize {
    let mut count = 0;
    for &w in &adjacency[v] {
        if w == start {
            count += 1;
        } else if w > start && !on_path[w] {
            on_path[w] = true;
            count += walk(adjacency, start, w, on_path);
            on_path[w] = false;
        }
    }
    count
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn graph_has_one_node_per_type_and_no_self_edges((n, edges) in registry_strategy(8)) {
        let graph = DependencyGraph::from_registry(&build(n, &edges)).expect("all targets registered");
        prop_assert_eq!(graph.node_count(), n);
        for idx in graph.graph.node_indices() {
            prop_assert!(graph.graph.find_edge(idx, idx).is_none());
        }
    }

    #[test]
    fn every_cycle_is_a_closed_simple_path((n, edges) in registry_strategy(7)) {
        let graph = DependencyGraph::from_registry(&build(n, &edges)).expect("all targets registered");
        let cycles = find_cycles(&graph);

        for cycle in &cycles {
            prop_assert!(cycle.len() >= 2);
            prop_assert_eq!(cycle.members().len(), cycle.len());
            prop_assert_eq!(cycle.types().iter().min(), cycle.types().first());
            for (from, to) in cycle.hops() {
                prop_assert!(graph.edge_attributes(from.as_str(), to.as_str()).is_some());
            }
        }

        let unique: BTreeSet<_> = cycles.iter().collect();
        prop_assert_eq!(unique.len(), cycles.len());
    }

    #[test]
    fn enumeration_matches_brute_force((n, edges) in registry_strategy(6)) {
        let graph = DependencyGraph::from_registry(&build(n, &edges)).expect("all targets registered");
        prop_assert_eq!(find_cycles(&graph).len(), brute_force_cycle_count(n, &edges));
    }

    #[test]
    fn ordered_registry_is_acyclic((n, edges) in registry_strategy(10)) {
        // Keep only references from higher to lower index.
        let downhill: Vec<_> = edges.into_iter().filter(|(from, to, _)| from > to).collect();
        let report = validate(&build(n, &downhill), &CyclePolicy::new()).expect("valid registry");
        prop_assert!(report.cycles.is_empty());
    }

    #[test]
    fn classification_partitions_cycles((n, edges) in registry_strategy(6)) {
        let policy = CyclePolicy::new()
            .with_ignored(["t0", "t1"])
            .with_excused(["t2", "t3"], refgraph_core::config::ExcusedMatch::Contains);
        let report = validate(&build(n, &edges), &policy).expect("valid registry");
        let total = report.count(CycleClass::Ignored)
            + report.count(CycleClass::Excused)
            + report.count(CycleClass::Reportable);
        prop_assert_eq!(total, report.cycles.len());
        prop_assert_eq!(report.is_ok(), report.count(CycleClass::Reportable) == 0);
    }

    #[test]
    fn fingerprint_ignores_insertion_order((n, edges) in registry_strategy(6)) {
        let forward = DependencyGraph::from_registry(&build(n, &edges)).expect("build");
        let mut reversed = edges;
        reversed.reverse();
        let backward = DependencyGraph::from_registry(&build(n, &reversed)).expect("build");
        prop_assert_eq!(forward.edge_count(), backward.edge_count());
        prop_assert_eq!(forward.content_hash, backward.content_hash);
    }
}
