//! Barycenter crossing reduction
//!
//! Assigns an initial in-rank order, then refines it with a fixed schedule
//! of barycenter sweeps. The schedule, skip predicates, and tie-breaks are
//! all part of the output contract: the forward pass runs every sweep, the
//! data-skipping backward pass runs on all but the last sweep, and the
//! unrestricted backward pass on all but the last two. A final pass pulls
//! same-rank (zero-span) siblings directly behind their destination.

use std::collections::{HashMap, HashSet};

use tracing::{debug, span, trace, Level};

use crate::core::EdgeKind;

use super::WorkGraph;

const SWEEPS: usize = 8;

pub(crate) fn reduce_crossings(graph: &mut WorkGraph) {
    let order_span = span!(Level::DEBUG, "reduce_crossings", nodes = graph.nodes.len());
    let _enter = order_span.enter();

    assign_initial_order(graph);

    let in_edges = graph.in_edges();
    let out_edges = graph.out_edges();
    let mut layers = graph.layers();

    for sweep in 0..SWEEPS {
        forward_pass(graph, &mut layers, &in_edges);
        if sweep < SWEEPS - 1 {
            backward_pass(graph, &mut layers, &out_edges, true);
        }
        if sweep < SWEEPS - 2 {
            backward_pass(graph, &mut layers, &out_edges, false);
        }
        canonicalize(graph, &mut layers);
        trace!(sweep, "Completed ordering sweep");
    }

    apply_min_len_zero_ordering(graph);
    debug!(ranks = layers.len(), "Crossing reduction complete");
}

/// Exec-capable nodes first, wider exec fan-out first, then key order.
fn assign_initial_order(graph: &mut WorkGraph) {
    let mut layers = vec![Vec::new(); (graph.max_rank() + 1) as usize];
    for (idx, node) in graph.nodes.iter().enumerate() {
        layers[node.rank as usize].push(idx);
    }
    for layer in &mut layers {
        layer.sort_by_key(|&idx| {
            let node = &graph.nodes[idx];
            (
                !node.is_exec(),
                std::cmp::Reverse(node.exec_output_pins),
                node.key,
            )
        });
        for (order, &idx) in layer.iter().enumerate() {
            graph.nodes[idx].order = order;
        }
    }
}

/// Recompute each rank from its rank−1 neighbors. Data edges out of
/// exec-bearing sources are ignored so value fan-out cannot perturb the
/// control-flow lane.
fn forward_pass(graph: &mut WorkGraph, layers: &mut [Vec<usize>], in_edges: &[Vec<usize>]) {
    for rank in 1..layers.len() {
        let barycenters: Vec<(f64, usize)> = layers[rank]
            .iter()
            .map(|&idx| {
                let mut sum = 0.0;
                let mut count = 0usize;
                for &edge_idx in &in_edges[idx] {
                    let edge = &graph.edges[edge_idx];
                    let neighbor = &graph.nodes[edge.src];
                    if neighbor.rank != rank as i32 - 1 {
                        continue;
                    }
                    if neighbor.exec_output_pins != 0 && edge.kind != EdgeKind::Exec {
                        continue;
                    }
                    sum += neighbor.order as f64
                        + edge.src_pin_index as f64 / edge.src_pin_count.max(1) as f64;
                    count += 1;
                }
                let barycenter = if count == 0 {
                    graph.nodes[idx].order as f64
                } else {
                    sum / count as f64
                };
                (barycenter, idx)
            })
            .collect();
        reorder_layer(graph, &mut layers[rank], barycenters);
    }
}

/// Recompute each rank from its rank+1 neighbors. With `skip_data` set,
/// only pure data edges into data-only consumers participate.
fn backward_pass(
    graph: &mut WorkGraph,
    layers: &mut [Vec<usize>],
    out_edges: &[Vec<usize>],
    skip_data: bool,
) {
    for rank in (0..layers.len().saturating_sub(1)).rev() {
        let barycenters: Vec<(f64, usize)> = layers[rank]
            .iter()
            .map(|&idx| {
                let mut sum = 0.0;
                let mut count = 0usize;
                for &edge_idx in &out_edges[idx] {
                    let edge = &graph.edges[edge_idx];
                    let neighbor = &graph.nodes[edge.dst];
                    if neighbor.rank != rank as i32 + 1 {
                        continue;
                    }
                    if skip_data
                        && (edge.kind == EdgeKind::Exec || neighbor.exec_input_pins > 0)
                    {
                        continue;
                    }
                    sum += neighbor.order as f64
                        + edge.dst_pin_index as f64 / edge.dst_pin_count.max(1) as f64;
                    count += 1;
                }
                let barycenter = if count == 0 {
                    graph.nodes[idx].order as f64
                } else {
                    sum / count as f64
                };
                (barycenter, idx)
            })
            .collect();
        reorder_layer(graph, &mut layers[rank], barycenters);
    }
}

/// Sort one layer by (barycenter, key) and write back fresh orders.
fn reorder_layer(graph: &mut WorkGraph, layer: &mut Vec<usize>, mut items: Vec<(f64, usize)>) {
    items.sort_by(|a, b| {
        a.0.total_cmp(&b.0)
            .then_with(|| graph.nodes[a.1].key.cmp(&graph.nodes[b.1].key))
    });
    layer.clear();
    for (order, (_, idx)) in items.into_iter().enumerate() {
        graph.nodes[idx].order = order;
        layer.push(idx);
    }
}

/// Re-sort every rank by (order, key) and renumber. Keeps the layer lists
/// and node orders canonical between sweeps.
fn canonicalize(graph: &mut WorkGraph, layers: &mut [Vec<usize>]) {
    for layer in layers.iter_mut() {
        layer.sort_by_key(|&idx| (graph.nodes[idx].order, graph.nodes[idx].key));
        for (order, &idx) in layer.iter().enumerate() {
            graph.nodes[idx].order = order;
        }
    }
}

/// Pull zero-span siblings directly behind their destination.
///
/// Same-rank edges with an exact span of 0 between real nodes group their
/// sources under the destination, sorted by (destination pin index, source
/// key). Each rank is rebuilt depth-first from its non-grouped seeds; a
/// second pass catches sources whose destination sits elsewhere.
fn apply_min_len_zero_ordering(graph: &mut WorkGraph) {
    let mut groups: HashMap<usize, Vec<(u32, crate::core::NodeKey, usize)>> = HashMap::new();
    let mut grouped_sources: HashSet<usize> = HashSet::new();

    for edge in &graph.edges {
        if edge.min_len != Some(0) || edge.src == edge.dst {
            continue;
        }
        let src = &graph.nodes[edge.src];
        let dst = &graph.nodes[edge.dst];
        if src.is_dummy || dst.is_dummy || src.rank != dst.rank {
            continue;
        }
        groups
            .entry(edge.dst)
            .or_default()
            .push((edge.dst_pin_index, src.key, edge.src));
        grouped_sources.insert(edge.src);
    }
    if groups.is_empty() {
        return;
    }

    for members in groups.values_mut() {
        members.sort();
        members.dedup_by_key(|m| m.2);
    }

    let layers = graph.layers();
    let mut emitted = vec![false; graph.nodes.len()];
    for layer in &layers {
        let mut result = Vec::with_capacity(layer.len());

        let mut emit_chain = |seed: usize, result: &mut Vec<usize>, emitted: &mut Vec<bool>| {
            let mut stack = vec![seed];
            while let Some(node) = stack.pop() {
                if emitted[node] {
                    continue;
                }
                emitted[node] = true;
                result.push(node);
                if let Some(members) = groups.get(&node) {
                    for &(_, _, src) in members.iter().rev() {
                        stack.push(src);
                    }
                }
            }
        };

        for &idx in layer {
            if !grouped_sources.contains(&idx) {
                emit_chain(idx, &mut result, &mut emitted);
            }
        }
        for &idx in layer {
            if !emitted[idx] {
                emit_chain(idx, &mut result, &mut emitted);
            }
        }

        for (order, &idx) in result.iter().enumerate() {
            graph.nodes[idx].order = order;
        }
    }
    debug!(groups = groups.len(), "Applied zero-span grouping");
}
