//! Internal-vendor cycle detection (spec §4.2, invariant 3, P5).
//!
//! Internal vendors form a directed graph from source file to destination
//! file; this graph must be acyclic at file-level granularity (positions
//! stripped). The adjacency is small and manifest-bounded, so it is kept
//! as a plain string-keyed [`petgraph::graph::DiGraph`] rather than an
//! arena — the same scale petgraph is already used at for the dependency
//! graph this engine is grounded on.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};

use crate::core::GitVendorError;

use super::{normalize_separators, parse_position_path};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Builds the file-level `from -> to` graph and runs a three-color DFS,
/// reconstructing the cycle path via a parent map on the first back-edge
/// found.
pub fn detect_internal_cycles(edges: &[(String, String)]) -> Result<(), GitVendorError> {
    let mut graph: DiGraph<String, ()> = DiGraph::new();
    let mut index_of: HashMap<String, NodeIndex> = HashMap::new();

    let mut node_index = |graph: &mut DiGraph<String, ()>, index_of: &mut HashMap<String, NodeIndex>, node: &str| {
        *index_of.entry(node.to_string()).or_insert_with(|| graph.add_node(node.to_string()))
    };

    for (from, to) in edges {
        let from = normalize_separators(&parse_position_path(from).0);
        let to = normalize_separators(&parse_position_path(to).0);
        let from_idx = node_index(&mut graph, &mut index_of, &from);
        let to_idx = node_index(&mut graph, &mut index_of, &to);
        graph.add_edge(from_idx, to_idx, ());
    }

    let mut color = vec![Color::White; graph.node_count()];
    let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();

    for start in graph.node_indices() {
        if color[start.index()] == Color::White {
            if let Some(cycle) = dfs_visit(&graph, start, &mut color, &mut parent) {
                let rendered = cycle.into_iter().map(|idx| graph[idx].clone()).collect::<Vec<_>>().join(" -> ");
                return Err(GitVendorError::CycleDetected {
                    cycle: rendered,
                });
            }
        }
    }

    Ok(())
}

/// Iterative DFS with explicit three-coloring so a panic-free stack can
/// stand in for recursion on manifest-bounded graphs. On finding a back
/// edge (an edge into a `Gray` node), reconstructs the cycle by walking
/// the parent map from the current node back to the back-edge target.
fn dfs_visit(
    graph: &DiGraph<String, ()>,
    start: NodeIndex,
    color: &mut [Color],
    parent: &mut HashMap<NodeIndex, NodeIndex>,
) -> Option<Vec<NodeIndex>> {
    let mut stack: Vec<(NodeIndex, Vec<NodeIndex>)> = vec![(start, graph.neighbors(start).collect())];
    color[start.index()] = Color::Gray;

    while let Some((node, neighbors)) = stack.last_mut() {
        let node = *node;
        if let Some(next) = neighbors.pop() {
            match color[next.index()] {
                Color::White => {
                    color[next.index()] = Color::Gray;
                    parent.insert(next, node);
                    stack.push((next, graph.neighbors(next).collect()));
                }
                Color::Gray => {
                    let mut cycle = vec![next, node];
                    let mut cursor = node;
                    while cursor != next {
                        let Some(&p) = parent.get(&cursor) else {
                            break;
                        };
                        cursor = p;
                        cycle.push(cursor);
                    }
                    cycle.reverse();
                    return Some(cycle);
                }
                Color::Black => {}
            }
        } else {
            color[node.index()] = Color::Black;
            stack.pop();
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dag_has_no_cycle() {
        let edges = vec![
            ("a.md".to_string(), "b.md".to_string()),
            ("b.md".to_string(), "c.md".to_string()),
        ];
        assert!(detect_internal_cycles(&edges).is_ok());
    }

    #[test]
    fn direct_cycle_detected() {
        let edges = vec![
            ("a.md".to_string(), "b.md".to_string()),
            ("b.md".to_string(), "a.md".to_string()),
        ];
        let err = detect_internal_cycles(&edges).unwrap_err();
        assert!(matches!(err, GitVendorError::CycleDetected { .. }));
    }

    #[test]
    fn indirect_cycle_detected() {
        let edges = vec![
            ("a.md".to_string(), "b.md".to_string()),
            ("b.md".to_string(), "c.md".to_string()),
            ("c.md".to_string(), "a.md".to_string()),
        ];
        assert!(detect_internal_cycles(&edges).is_err());
    }

    #[test]
    fn positions_are_stripped_before_building_the_graph() {
        let edges = vec![
            ("a.md:L1-L5".to_string(), "b.md:L1-L2".to_string()),
            ("b.md:L10-L20".to_string(), "a.md:L1".to_string()),
        ];
        assert!(detect_internal_cycles(&edges).is_err());
    }

    #[test]
    fn disjoint_components_are_fine() {
        let edges = vec![
            ("a.md".to_string(), "b.md".to_string()),
            ("x.md".to_string(), "y.md".to_string()),
        ];
        assert!(detect_internal_cycles(&edges).is_ok());
    }
}
