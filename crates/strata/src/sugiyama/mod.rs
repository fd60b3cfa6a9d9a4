//! Sugiyama-style layered layout pipeline
//!
//! One call runs, in order: work-graph construction, cycle breaking, rank
//! assignment, terminal padding and long-edge splitting, barycenter crossing
//! reduction, coordinate placement, and the anchor offset that keeps the
//! component visually in place. All passes mutate a private working graph
//! addressed by stable integer indices; the caller's snapshot is never
//! touched.

mod builder;
mod compact;
mod cycles;
mod ordering;
mod placement;
mod ranking;
mod splitting;

pub use builder::{layout_component, layout_graph};

use crate::core::{EdgeKind, NodeKey, PinKey, Point, Size};

/// A node in the working graph: either a copy of an external node or a
/// synthetic dummy minted by the edge splitter.
#[derive(Debug, Clone)]
pub(crate) struct WorkNode {
    pub key: NodeKey,
    pub size: Size,
    /// Index into the component's source node list; None for dummies.
    pub source: Option<usize>,
    pub rank: i32,
    pub order: usize,
    pub position: Point,
    pub is_dummy: bool,
    pub input_pins: u32,
    pub output_pins: u32,
    pub exec_input_pins: u32,
    pub exec_output_pins: u32,
    pub is_data_fetch: bool,
}

impl WorkNode {
    pub fn is_exec(&self) -> bool {
        self.exec_input_pins > 0 || self.exec_output_pins > 0
    }

    pub fn has_exec_pins(&self) -> bool {
        self.is_exec()
    }

    /// A synthetic unit node for a split edge. Exec edges produce
    /// exec-capable dummies so ordering and placement treat the chain as
    /// part of the control-flow lane.
    pub fn dummy(key: NodeKey, rank: i32, kind: EdgeKind) -> Self {
        let exec = u32::from(kind == EdgeKind::Exec);
        Self {
            key,
            size: Size::default(),
            source: None,
            rank,
            order: 0,
            position: Point::default(),
            is_dummy: true,
            input_pins: 1,
            output_pins: 1,
            exec_input_pins: exec,
            exec_output_pins: exec,
            is_data_fetch: false,
        }
    }
}

/// An edge between working-graph indices.
///
/// `stable_key` is derived from the ORIGINAL endpoint pins at build time and
/// survives reversal unchanged; split segments append `|seg{step}`.
#[derive(Debug, Clone)]
pub(crate) struct WorkEdge {
    pub src: usize,
    pub dst: usize,
    pub src_pin: PinKey,
    pub dst_pin: PinKey,
    /// Local index of the source pin among its node's output pins.
    pub src_pin_index: u32,
    /// Output pin count of the source node (for fractional pin offsets).
    pub src_pin_count: u32,
    pub dst_pin_index: u32,
    pub dst_pin_count: u32,
    pub kind: EdgeKind,
    pub stable_key: String,
    /// Set by the cycle breaker; after direction application the endpoints
    /// are physically swapped and this records that the arrow should render
    /// the other way.
    pub reversed: bool,
    /// None: ordinary edge, minimum span 1, no maximum. Some(n): exact span
    /// request; 0 forces same-rank co-location.
    pub min_len: Option<i32>,
}

impl WorkEdge {
    /// Rank weight used by the layering pass.
    pub fn weight(&self) -> i32 {
        self.min_len.unwrap_or(1).max(0)
    }

    /// Source index with the transient reversal flag applied (used only
    /// before direction application).
    pub fn effective_src(&self) -> usize {
        if self.reversed {
            self.dst
        } else {
            self.src
        }
    }

    pub fn effective_dst(&self) -> usize {
        if self.reversed {
            self.src
        } else {
            self.dst
        }
    }

    pub fn effective_src_pin(&self) -> &PinKey {
        if self.reversed {
            &self.dst_pin
        } else {
            &self.src_pin
        }
    }

    pub fn effective_dst_pin(&self) -> &PinKey {
        if self.reversed {
            &self.src_pin
        } else {
            &self.dst_pin
        }
    }
}

/// The private working graph one layout call operates on.
#[derive(Debug, Default)]
pub(crate) struct WorkGraph {
    pub nodes: Vec<WorkNode>,
    pub edges: Vec<WorkEdge>,
}

impl WorkGraph {
    pub fn max_rank(&self) -> i32 {
        self.nodes.iter().map(|n| n.rank).max().unwrap_or(0)
    }

    /// Node indices grouped by rank, each layer sorted by (order, key).
    pub fn layers(&self) -> Vec<Vec<usize>> {
        let mut layers = vec![Vec::new(); (self.max_rank() + 1) as usize];
        for (idx, node) in self.nodes.iter().enumerate() {
            layers[node.rank as usize].push(idx);
        }
        for layer in &mut layers {
            layer.sort_by_key(|&idx| (self.nodes[idx].order, self.nodes[idx].key));
        }
        layers
    }

    /// Out-edge indices per node, in edge order.
    pub fn out_edges(&self) -> Vec<Vec<usize>> {
        let mut out = vec![Vec::new(); self.nodes.len()];
        for (idx, edge) in self.edges.iter().enumerate() {
            out[edge.src].push(idx);
        }
        out
    }

    /// In-edge indices per node, in edge order.
    pub fn in_edges(&self) -> Vec<Vec<usize>> {
        let mut inc = vec![Vec::new(); self.nodes.len()];
        for (idx, edge) in self.edges.iter().enumerate() {
            inc[edge.dst].push(idx);
        }
        inc
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fixture helpers for pipeline unit tests.

    use super::*;
    use crate::core::{stable_edge_key, PinDirection};

    /// A real node with the given low key word. Exec pin counts of (1, 1)
    /// when `exec` is set.
    pub fn node(d: u32, exec: bool) -> WorkNode {
        let exec_pins = u32::from(exec);
        WorkNode {
            key: NodeKey::new(0, 0, 0, d),
            size: Size::new(100.0, 50.0),
            source: None,
            rank: 0,
            order: 0,
            position: Point::default(),
            is_dummy: false,
            input_pins: 2,
            output_pins: 2,
            exec_input_pins: exec_pins,
            exec_output_pins: exec_pins,
            is_data_fetch: false,
        }
    }

    /// An edge between node indices with synthetic pins named `out`/`in`.
    pub fn edge(graph: &WorkGraph, src: usize, dst: usize, kind: EdgeKind) -> WorkEdge {
        let src_pin = PinKey::new(graph.nodes[src].key, PinDirection::Output, "out", 0);
        let dst_pin = PinKey::new(graph.nodes[dst].key, PinDirection::Input, "in", 0);
        let stable_key = stable_edge_key(&src_pin, &dst_pin);
        WorkEdge {
            src,
            dst,
            src_pin,
            dst_pin,
            src_pin_index: 0,
            src_pin_count: graph.nodes[src].output_pins.max(1),
            dst_pin_index: 0,
            dst_pin_count: graph.nodes[dst].input_pins.max(1),
            kind,
            stable_key,
            reversed: false,
            min_len: None,
        }
    }

    /// Build a graph of `n` real nodes (exec-capable when `exec`), keys in
    /// index order, plus the given (src, dst, kind) edges.
    pub fn graph(n: u32, exec: bool, edges: &[(usize, usize, EdgeKind)]) -> WorkGraph {
        let mut work = WorkGraph {
            nodes: (1..=n).map(|d| node(d, exec)).collect(),
            edges: Vec::new(),
        };
        for &(src, dst, kind) in edges {
            let e = edge(&work, src, dst, kind);
            work.edges.push(e);
        }
        work
    }
}
