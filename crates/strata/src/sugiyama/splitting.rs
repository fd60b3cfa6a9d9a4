//! Long-edge splitting and terminal padding
//!
//! After ranking, every edge must span exactly one rank step so the
//! crossing reducer can treat adjacent layers pairwise. Edges spanning
//! more get a chain of zero-size dummy nodes with content-derived keys.
//! Before splitting, dead-end exec branches are padded down to the deepest
//! rank so all control-flow chains terminate at the same visual depth.

use tracing::{debug, span, Level};

use crate::core::{EdgeKind, NodeKey, PinDirection, PinKey};

use super::{WorkEdge, WorkGraph, WorkNode};

/// Give every exec-capable real node with no outgoing exec edge a trailing
/// exec chain down to the maximum rank. The chain is created as one long
/// edge here and split into unit segments by [`split_long_edges`].
pub(crate) fn pad_terminal_exec(graph: &mut WorkGraph) {
    let max_rank = graph.max_rank();
    let mut has_exec_out = vec![false; graph.nodes.len()];
    for edge in &graph.edges {
        if edge.kind == EdgeKind::Exec {
            has_exec_out[edge.src] = true;
        }
    }

    let mut padded = 0usize;
    for idx in 0..graph.nodes.len() {
        let node = &graph.nodes[idx];
        if node.is_dummy
            || node.exec_output_pins == 0
            || node.rank >= max_rank
            || has_exec_out[idx]
        {
            continue;
        }

        let seed = format!("Pad|{}", node.key);
        let src_pin = PinKey::new(node.key, PinDirection::Output, "out", 0);
        let src_pin_count = node.output_pins.max(1);
        let dummy_key = NodeKey::from_seed(&seed);
        let dummy_idx = graph.nodes.len();
        graph
            .nodes
            .push(WorkNode::dummy(dummy_key, max_rank, EdgeKind::Exec));
        graph.edges.push(WorkEdge {
            src: idx,
            dst: dummy_idx,
            src_pin,
            dst_pin: PinKey::new(dummy_key, PinDirection::Input, "in", 0),
            src_pin_index: 0,
            src_pin_count,
            dst_pin_index: 0,
            dst_pin_count: 1,
            kind: EdgeKind::Exec,
            stable_key: seed,
            reversed: false,
            min_len: Some(1),
        });
        padded += 1;
    }

    if padded > 0 {
        debug!(padded, max_rank, "Padded terminal exec branches");
    }
}

/// Replace every edge spanning more than one rank with a chain of dummy
/// nodes and unit-span segment edges. Dummy keys derive from the edge's
/// stable key and step index; segment keys append `|seg{step}`.
pub(crate) fn split_long_edges(graph: &mut WorkGraph) {
    let split_span = span!(Level::DEBUG, "split_long_edges", edges = graph.edges.len());
    let _enter = split_span.enter();

    let old_edges = std::mem::take(&mut graph.edges);
    let mut dummies = 0usize;

    for edge in old_edges {
        let span = graph.nodes[edge.dst].rank - graph.nodes[edge.src].rank;
        if span <= 1 {
            graph.edges.push(edge);
            continue;
        }

        let src_rank = graph.nodes[edge.src].rank;
        let mut prev = edge.src;
        let mut prev_pin = edge.src_pin.clone();
        let mut prev_pin_index = edge.src_pin_index;
        let mut prev_pin_count = edge.src_pin_count;

        for step in 1..span {
            let key = NodeKey::from_seed(&format!("Dummy|{}|{}", edge.stable_key, step));
            let dummy_idx = graph.nodes.len();
            graph
                .nodes
                .push(WorkNode::dummy(key, src_rank + step, edge.kind));
            dummies += 1;

            graph.edges.push(WorkEdge {
                src: prev,
                dst: dummy_idx,
                src_pin: prev_pin,
                dst_pin: PinKey::new(key, PinDirection::Input, "in", 0),
                src_pin_index: prev_pin_index,
                src_pin_count: prev_pin_count,
                dst_pin_index: 0,
                dst_pin_count: 1,
                kind: edge.kind,
                stable_key: format!("{}|seg{}", edge.stable_key, step - 1),
                reversed: edge.reversed,
                min_len: Some(1),
            });

            prev = dummy_idx;
            prev_pin = PinKey::new(key, PinDirection::Output, "out", 0);
            prev_pin_index = 0;
            prev_pin_count = 1;
        }

        graph.edges.push(WorkEdge {
            src: prev,
            dst: edge.dst,
            src_pin: prev_pin,
            dst_pin: edge.dst_pin,
            src_pin_index: prev_pin_index,
            src_pin_count: prev_pin_count,
            dst_pin_index: edge.dst_pin_index,
            dst_pin_count: edge.dst_pin_count,
            kind: edge.kind,
            stable_key: format!("{}|seg{}", edge.stable_key, span - 1),
            reversed: edge.reversed,
            min_len: Some(1),
        });
    }

    if dummies > 0 {
        debug!(dummies, "Split long edges");
    }
}
