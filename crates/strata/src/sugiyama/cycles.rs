//! Cycle breaking via deterministic depth-first search
//!
//! Repeatedly runs an iterative DFS over the effective (reversal-aware)
//! edge directions, collects the back edges found in that pass, flips the
//! lexicographically least one, and starts over until the graph is acyclic.
//! Only then are the reversal flags applied by physically swapping edge
//! endpoints.

use tracing::{debug, span, trace, Level};

use super::{WorkEdge, WorkGraph};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Unvisited,
    Visiting,
    Done,
}

pub(crate) fn break_cycles(graph: &mut WorkGraph) {
    let cycle_span = span!(Level::DEBUG, "break_cycles", edges = graph.edges.len());
    let _enter = cycle_span.enter();

    let mut flips = 0usize;
    loop {
        let back_edges = find_back_edges(graph);
        if back_edges.is_empty() {
            break;
        }

        let least = least_back_edge(graph, &back_edges);
        graph.edges[least].reversed = !graph.edges[least].reversed;
        flips += 1;
        trace!(
            edge = %graph.edges[least].stable_key,
            "Flipped back edge"
        );
    }

    if flips > 0 {
        debug!(flips, "Broke cycles");
    }
    apply_edge_directions(graph);
}

/// One full DFS pass over the effective directions, seeded in key order,
/// returning every edge whose effective destination was still being visited.
fn find_back_edges(graph: &WorkGraph) -> Vec<usize> {
    let adjacency = effective_adjacency(graph);

    let mut roots: Vec<usize> = (0..graph.nodes.len()).collect();
    roots.sort_by_key(|&idx| graph.nodes[idx].key);

    let mut state = vec![VisitState::Unvisited; graph.nodes.len()];
    let mut back_edges = Vec::new();

    for root in roots {
        if state[root] != VisitState::Unvisited {
            continue;
        }
        // Stack holds (node, cursor into its adjacency list).
        let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
        state[root] = VisitState::Visiting;

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            if frame.1 >= adjacency[node].len() {
                state[node] = VisitState::Done;
                stack.pop();
                continue;
            }
            let edge_idx = adjacency[node][frame.1];
            frame.1 += 1;

            let target = graph.edges[edge_idx].effective_dst();
            match state[target] {
                VisitState::Unvisited => {
                    state[target] = VisitState::Visiting;
                    stack.push((target, 0));
                }
                VisitState::Visiting => back_edges.push(edge_idx),
                VisitState::Done => {}
            }
        }
    }
    back_edges
}

/// Per-node out-edge lists under the current reversal flags, each sorted by
/// (effective source pin, effective destination key, stable key, index).
fn effective_adjacency(graph: &WorkGraph) -> Vec<Vec<usize>> {
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); graph.nodes.len()];
    for (idx, edge) in graph.edges.iter().enumerate() {
        adjacency[edge.effective_src()].push(idx);
    }
    for list in &mut adjacency {
        list.sort_by(|&a, &b| {
            let ea = &graph.edges[a];
            let eb = &graph.edges[b];
            ea.effective_src_pin()
                .cmp(eb.effective_src_pin())
                .then_with(|| {
                    graph.nodes[ea.effective_dst()]
                        .key
                        .cmp(&graph.nodes[eb.effective_dst()].key)
                })
                .then_with(|| ea.stable_key.cmp(&eb.stable_key))
                .then(a.cmp(&b))
        });
    }
    adjacency
}

/// Least back edge under (effective source key, effective source pin,
/// effective destination key, effective destination pin, stable key, index).
fn least_back_edge(graph: &WorkGraph, back_edges: &[usize]) -> usize {
    let mut best = back_edges[0];
    for &candidate in &back_edges[1..] {
        if back_edge_rank(graph, candidate) < back_edge_rank(graph, best) {
            best = candidate;
        }
    }
    best
}

type BackEdgeRank<'a> = (
    crate::core::NodeKey,
    &'a crate::core::PinKey,
    crate::core::NodeKey,
    &'a crate::core::PinKey,
    &'a str,
    usize,
);

fn back_edge_rank(graph: &WorkGraph, edge_idx: usize) -> BackEdgeRank<'_> {
    let edge = &graph.edges[edge_idx];
    (
        graph.nodes[edge.effective_src()].key,
        edge.effective_src_pin(),
        graph.nodes[edge.effective_dst()].key,
        edge.effective_dst_pin(),
        edge.stable_key.as_str(),
        edge_idx,
    )
}

/// Physically swap the endpoints of every reversed edge. The reversed flag
/// stays set so callers can restore arrow directions later.
fn apply_edge_directions(graph: &mut WorkGraph) {
    for edge in &mut graph.edges {
        if edge.reversed {
            swap_endpoints(edge);
        }
    }
}

fn swap_endpoints(edge: &mut WorkEdge) {
    std::mem::swap(&mut edge.src, &mut edge.dst);
    std::mem::swap(&mut edge.src_pin, &mut edge.dst_pin);
    std::mem::swap(&mut edge.src_pin_index, &mut edge.dst_pin_index);
    std::mem::swap(&mut edge.src_pin_count, &mut edge.dst_pin_count);
}
