//! Strata - deterministic layered graph layout
//!
//! A Sugiyama-style layout engine for directed graphs with mixed
//! control-flow ("exec") and value ("data") edges: cycle breaking, rank
//! assignment with span constraints, dummy-node insertion, barycenter
//! crossing reduction, and coordinate placement. Identical inputs always
//! produce identical positions.
//!
//! # Quick Start
//!
//! ```rust
//! use strata::prelude::*;
//!
//! let graph = LayoutGraph {
//!     nodes: vec![
//!         LayoutNode {
//!             id: "start".into(),
//!             key: NodeKey::new(0, 0, 0, 1),
//!             title: "Start".into(),
//!             position: Point::new(100.0, 100.0),
//!             size: Size::new(120.0, 48.0),
//!             pins: vec![LayoutPin::new("then", PinDirection::Output, 0, true)],
//!             is_data_fetch: false,
//!         },
//!         LayoutNode {
//!             id: "end".into(),
//!             key: NodeKey::new(0, 0, 0, 2),
//!             title: "End".into(),
//!             position: Point::new(0.0, 0.0),
//!             size: Size::new(120.0, 48.0),
//!             pins: vec![LayoutPin::new("exec", PinDirection::Input, 0, true)],
//!             is_data_fetch: false,
//!         },
//!     ],
//!     edges: vec![LayoutEdge {
//!         src_node: "start".into(),
//!         src_pin: "then".into(),
//!         src_pin_index: 0,
//!         dst_node: "end".into(),
//!         dst_pin: "exec".into(),
//!         dst_pin_index: 0,
//!     }],
//! };
//!
//! let results = strata::layout(&graph).unwrap();
//! assert_eq!(results.len(), 1);
//! // The anchor keeps its original position; its successor moves right.
//! assert_eq!(results[0].positions["start"], Point::new(100.0, 100.0));
//! assert!(results[0].positions["end"].x > 100.0);
//! ```
//!
//! # Advanced Usage
//!
//! Lay out a single known component with custom settings:
//!
//! ```rust
//! use strata::prelude::*;
//!
//! # let graph = LayoutGraph {
//! #     nodes: vec![LayoutNode {
//! #         id: "only".into(),
//! #         key: NodeKey::new(0, 0, 0, 1),
//! #         title: String::new(),
//! #         position: Point::new(10.0, 20.0),
//! #         size: Size::new(100.0, 50.0),
//! #         pins: vec![],
//! #         is_data_fetch: false,
//! #     }],
//! #     edges: vec![],
//! # };
//! let mut settings = LayoutSettings::default();
//! settings.strategy = PlacementStrategy::Simple;
//! settings.node_spacing_x = 200.0;
//!
//! let ids = vec!["only".to_string()];
//! let result = layout_component(&graph, &ids, &settings).unwrap();
//! assert_eq!(result.positions["only"], Point::new(10.0, 20.0));
//! ```

pub mod core;
pub mod sugiyama;

pub use self::core::*;
pub use self::sugiyama::{layout_component, layout_graph};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{
        Bounds, ComponentResult, EdgeKind, LayoutEdge, LayoutError, LayoutGraph, LayoutNode,
        LayoutPin, LayoutSettings, NodeKey, PinDirection, PinKey, PlacementStrategy, Point,
        RankAlignment, Size,
    };
    pub use crate::sugiyama::{layout_component, layout_graph};
}

/// Lay out every connected component of a graph with default settings
///
/// This is the simplest entry point: components are discovered
/// automatically and each one is laid out independently.
///
/// # Arguments
/// * `graph` - The graph snapshot (nodes with keys, sizes, pins; edges)
///
/// # Returns
/// * `Ok(Vec<ComponentResult>)` - One position map + bounds per component
/// * `Err` - If the graph snapshot is structurally invalid
pub fn layout(graph: &LayoutGraph) -> anyhow::Result<Vec<ComponentResult>> {
    Ok(layout_graph(graph, &LayoutSettings::default())?)
}

/// Lay out every connected component with explicit settings
///
/// # Example
/// ```rust
/// use strata::prelude::*;
///
/// let graph = LayoutGraph::default();
/// let settings = LayoutSettings {
///     node_spacing_x: 250.0,
///     ..LayoutSettings::default()
/// };
/// let results = strata::layout_with_settings(&graph, &settings).unwrap();
/// assert!(results.is_empty());
/// ```
pub fn layout_with_settings(
    graph: &LayoutGraph,
    settings: &LayoutSettings,
) -> anyhow::Result<Vec<ComponentResult>> {
    Ok(layout_graph(graph, settings)?)
}
