//! Compact placement via iterative constraint relaxation
//!
//! Vertical positions are the solution of a system of `y[target] >=
//! y[source] + delta` inequalities, relaxed repeatedly until nothing moves
//! or the iteration cap (one per node, at least one) is reached. Ordering
//! constraints keep ranks overlap-free; zero-delta constraints pull an exec
//! successor level with its primary predecessor and a single-consumer fetch
//! node level with its consumer. The fetch constraints can form cycles with
//! the ordering constraints, so they are dropped for the last two
//! iterations to force convergence. Non-convergence is logged, never an
//! error.

use tracing::{debug, span, trace, Level};

use crate::core::{EdgeKind, LayoutSettings};

use super::placement::vertical_gap;
use super::WorkGraph;

#[derive(Debug)]
struct Constraint {
    target: usize,
    source: usize,
    delta: f32,
    /// Soft data-fetch alignment, skipped on the final two iterations.
    data_tie: bool,
}

pub(crate) fn place_compact(graph: &mut WorkGraph, settings: &LayoutSettings) {
    let place_span = span!(Level::DEBUG, "place_compact", nodes = graph.nodes.len());
    let _enter = place_span.enter();

    let constraints = build_constraints(graph, settings);
    trace!(constraints = constraints.len(), "Built placement constraints");

    let max_iterations = graph.nodes.len().max(1);
    let mut y = vec![0.0f32; graph.nodes.len()];
    let mut converged = false;

    for iteration in 0..max_iterations {
        let drop_ties = iteration + 2 >= max_iterations;
        let mut changed = false;
        for constraint in &constraints {
            if constraint.data_tie && drop_ties {
                continue;
            }
            let want = y[constraint.source] + constraint.delta;
            if y[constraint.target] < want {
                y[constraint.target] = want;
                changed = true;
            }
        }
        if !changed {
            converged = true;
            trace!(iteration, "Relaxation converged");
            break;
        }
    }
    if !converged {
        debug!(
            max_iterations,
            "Compact placement hit iteration cap without converging"
        );
    }

    for (idx, node) in graph.nodes.iter_mut().enumerate() {
        node.position.y = y[idx];
    }
}

fn build_constraints(graph: &WorkGraph, settings: &LayoutSettings) -> Vec<Constraint> {
    let mut constraints = Vec::new();

    // Intra-rank ordering: each node sits below its predecessor in final
    // order, separated by the gap its own exec/data character demands.
    for layer in graph.layers() {
        for pair in layer.windows(2) {
            let (prev, cur) = (pair[0], pair[1]);
            constraints.push(Constraint {
                target: cur,
                source: prev,
                delta: graph.nodes[prev].size.height + vertical_gap(&graph.nodes[cur], settings),
                data_tie: false,
            });
        }
    }

    // Exec chains: pull each destination level with its primary exec
    // predecessor, preferring an adjacent-rank predecessor, then the lowest
    // order, then the least key.
    if settings.align_exec_chains {
        let in_edges = graph.in_edges();
        for (idx, node) in graph.nodes.iter().enumerate() {
            if node.exec_input_pins == 0 {
                continue;
            }
            let primary = in_edges[idx]
                .iter()
                .filter(|&&e| graph.edges[e].kind == EdgeKind::Exec)
                .map(|&e| graph.edges[e].src)
                .min_by_key(|&src| {
                    let pred = &graph.nodes[src];
                    (node.rank - pred.rank != 1, pred.order, pred.key)
                });
            if let Some(primary) = primary {
                constraints.push(Constraint {
                    target: idx,
                    source: primary,
                    delta: 0.0,
                    data_tie: false,
                });
            }
        }
    }

    // Single-consumer fetch nodes ride level with their consumer.
    let out_edges = graph.out_edges();
    for (idx, node) in graph.nodes.iter().enumerate() {
        if node.is_dummy || !node.is_data_fetch || out_edges[idx].len() != 1 {
            continue;
        }
        constraints.push(Constraint {
            target: idx,
            source: graph.edges[out_edges[idx][0]].dst,
            delta: 0.0,
            data_tie: true,
        });
    }

    constraints
}
