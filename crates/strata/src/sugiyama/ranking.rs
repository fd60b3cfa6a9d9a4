//! Layer assignment
//!
//! Longest-path ranking over a deterministic topological order, followed by
//! a bounded backward tightening pass when any edge carries a finite maximum
//! span. Tightening pulls a source up toward its closest successor so
//! span-constrained edges (fetch nodes, data edges between non-exec nodes)
//! do not stretch across unrelated ranks.

use tracing::{debug, span, trace, Level};

use super::{WorkEdge, WorkGraph};

const TIGHTENING_SWEEPS: usize = 10;

/// An edge participates in backward tightening when its span has a finite
/// maximum: either an explicit span request, or a data edge touching a node
/// with no exec pins at all.
fn has_finite_max_span(graph: &WorkGraph, edge: &WorkEdge) -> bool {
    edge.min_len.is_some()
        || !graph.nodes[edge.src].has_exec_pins()
        || !graph.nodes[edge.dst].has_exec_pins()
}

pub(crate) fn assign_ranks(graph: &mut WorkGraph) {
    let rank_span = span!(Level::DEBUG, "assign_ranks", nodes = graph.nodes.len());
    let _enter = rank_span.enter();

    let topo = topological_order(graph);
    let out_edges = graph.out_edges();

    // Forward longest-path pass.
    for node in &mut graph.nodes {
        node.rank = 0;
    }
    for &node in &topo {
        for &edge_idx in &out_edges[node] {
            let (dst, weight) = {
                let edge = &graph.edges[edge_idx];
                (edge.dst, edge.weight())
            };
            let candidate = graph.nodes[node].rank + weight;
            if candidate > graph.nodes[dst].rank {
                graph.nodes[dst].rank = candidate;
            }
        }
    }

    let constrained = graph
        .edges
        .iter()
        .any(|e| has_finite_max_span(graph, e));
    if constrained {
        tighten_backward(graph, &topo, &out_edges);
    }

    normalize(graph);
    debug!(max_rank = graph.max_rank(), constrained, "Assigned ranks");
}

/// Bounded backward sweeps in reverse topological order. A node with at
/// least one span-constrained out-edge is pulled up to the tightest rank
/// its successors allow, never below its forward-computed floor.
fn tighten_backward(graph: &mut WorkGraph, topo: &[usize], out_edges: &[Vec<usize>]) {
    for sweep in 0..TIGHTENING_SWEEPS {
        let mut moved = 0usize;
        for &node in topo.iter().rev() {
            if out_edges[node].is_empty() {
                continue;
            }
            let eligible = out_edges[node]
                .iter()
                .any(|&e| has_finite_max_span(graph, &graph.edges[e]));
            if !eligible {
                continue;
            }
            let ceiling = out_edges[node]
                .iter()
                .map(|&e| {
                    let edge = &graph.edges[e];
                    graph.nodes[edge.dst].rank - edge.weight()
                })
                .min();
            if let Some(ceiling) = ceiling {
                if ceiling > graph.nodes[node].rank {
                    graph.nodes[node].rank = ceiling;
                    moved += 1;
                }
            }
        }
        trace!(sweep, moved, "Tightening sweep");
        if moved == 0 {
            break;
        }
    }
}

fn normalize(graph: &mut WorkGraph) {
    let min = graph.nodes.iter().map(|n| n.rank).min().unwrap_or(0);
    if min != 0 {
        for node in &mut graph.nodes {
            node.rank -= min;
        }
    }
}

/// Kahn's algorithm with a key-sorted ready list. Leftover nodes (possible
/// only if a cycle slipped through) are appended in key order.
pub(crate) fn topological_order(graph: &WorkGraph) -> Vec<usize> {
    let mut in_degree = vec![0usize; graph.nodes.len()];
    for edge in &graph.edges {
        in_degree[edge.dst] += 1;
    }

    let mut ready: Vec<usize> = (0..graph.nodes.len())
        .filter(|&n| in_degree[n] == 0)
        .collect();
    ready.sort_by_key(|&n| graph.nodes[n].key);

    let out_edges = graph.out_edges();
    let mut order = Vec::with_capacity(graph.nodes.len());
    let mut emitted = vec![false; graph.nodes.len()];

    while !ready.is_empty() {
        let node = ready.remove(0);
        order.push(node);
        emitted[node] = true;
        for &edge_idx in &out_edges[node] {
            let dst = graph.edges[edge_idx].dst;
            in_degree[dst] -= 1;
            if in_degree[dst] == 0 {
                let key = graph.nodes[dst].key;
                let pos = ready
                    .binary_search_by_key(&key, |&n| graph.nodes[n].key)
                    .unwrap_or_else(|p| p);
                ready.insert(pos, dst);
            }
        }
    }

    let mut leftovers: Vec<usize> = (0..graph.nodes.len()).filter(|&n| !emitted[n]).collect();
    leftovers.sort_by_key(|&n| graph.nodes[n].key);
    order.extend(leftovers);
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EdgeKind;
    use crate::sugiyama::testing;

    #[test]
    fn test_linear_chain_ranks() {
        let mut graph = testing::graph(
            3,
            true,
            &[(0, 1, EdgeKind::Exec), (1, 2, EdgeKind::Exec)],
        );
        assign_ranks(&mut graph);
        assert_eq!(graph.nodes[0].rank, 0);
        assert_eq!(graph.nodes[1].rank, 1);
        assert_eq!(graph.nodes[2].rank, 2);
    }

    #[test]
    fn test_diamond_ranks() {
        let mut graph = testing::graph(
            4,
            true,
            &[
                (0, 1, EdgeKind::Exec),
                (0, 2, EdgeKind::Exec),
                (1, 3, EdgeKind::Exec),
                (2, 3, EdgeKind::Exec),
            ],
        );
        assign_ranks(&mut graph);
        assert_eq!(graph.nodes[0].rank, 0);
        assert_eq!(graph.nodes[1].rank, 1);
        assert_eq!(graph.nodes[2].rank, 1);
        assert_eq!(graph.nodes[3].rank, 2);
    }

    #[test]
    fn test_rank_monotonicity_across_edges() {
        let mut graph = testing::graph(
            5,
            true,
            &[
                (0, 1, EdgeKind::Exec),
                (0, 2, EdgeKind::Exec),
                (2, 3, EdgeKind::Exec),
                (1, 4, EdgeKind::Exec),
                (3, 4, EdgeKind::Exec),
            ],
        );
        assign_ranks(&mut graph);
        for edge in &graph.edges {
            let span = graph.nodes[edge.dst].rank - graph.nodes[edge.src].rank;
            assert!(span >= edge.weight(), "edge span {span} below weight");
        }
    }

    #[test]
    fn test_topological_order_breaks_ties_by_key() {
        let graph = testing::graph(3, true, &[(2, 1, EdgeKind::Exec)]);
        // Nodes 0 and 2 are both sources; node 0 has the lesser key.
        let order = topological_order(&graph);
        assert_eq!(order[0], 0);
        assert_eq!(order[1], 2);
        assert_eq!(order[2], 1);
    }

    #[test]
    fn test_data_source_is_tightened_toward_consumer() {
        // A pure data node feeding the tail of a long exec chain should sit
        // one rank before its consumer, not at rank 0.
        let mut graph = testing::graph(
            4,
            true,
            &[
                (0, 1, EdgeKind::Exec),
                (1, 2, EdgeKind::Exec),
                (3, 2, EdgeKind::Data),
            ],
        );
        // Node 3 is a pure data source with no exec pins.
        graph.nodes[3].exec_input_pins = 0;
        graph.nodes[3].exec_output_pins = 0;
        assign_ranks(&mut graph);
        assert_eq!(graph.nodes[2].rank, 2);
        assert_eq!(graph.nodes[3].rank, 1);
    }

    #[test]
    fn test_zero_min_len_allows_same_rank() {
        let mut graph = testing::graph(2, false, &[(0, 1, EdgeKind::Data)]);
        graph.edges[0].min_len = Some(0);
        assign_ranks(&mut graph);
        assert_eq!(graph.nodes[0].rank, graph.nodes[1].rank);
    }

    #[test]
    fn test_exact_min_len_spans_extra_ranks() {
        let mut graph = testing::graph(2, false, &[(0, 1, EdgeKind::Data)]);
        graph.edges[0].min_len = Some(3);
        assign_ranks(&mut graph);
        assert_eq!(graph.nodes[1].rank - graph.nodes[0].rank, 3);
    }
}
