//! External-facing data model: graph snapshot, settings, and results
//!
//! The caller hands the engine an immutable [`LayoutGraph`] snapshot plus
//! [`LayoutSettings`]; the engine hands back a [`ComponentResult`] per
//! connected component. Nothing here is mutated during layout.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::keys::{NodeKey, PinDirection};

/// Edge kinds: control-flow sequencing vs value dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeKind {
    Exec,
    Data,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::Exec => write!(f, "exec"),
            EdgeKind::Data => write!(f, "data"),
        }
    }
}

/// Horizontal alignment of a node inside its rank column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RankAlignment {
    Left,
    #[default]
    Center,
    Right,
}

/// Which coordinate-assignment strategy to run after ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlacementStrategy {
    /// Stack each rank top to bottom with fixed per-type spacing.
    Simple,
    /// Constraint-relaxation placement that tightens vertical space and
    /// keeps exec chains visually straight.
    #[default]
    Compact,
}

/// A 2D point in the caller's coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Node extent. Negative inputs are clamped to zero at graph build time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned bounding box over placed nodes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    /// Bounds of a single rectangle at `pos` with extent `size`.
    pub fn of(pos: Point, size: Size) -> Self {
        Self {
            min: pos,
            max: Point::new(pos.x + size.width, pos.y + size.height),
        }
    }

    /// Grow to include another rectangle.
    pub fn include(&mut self, pos: Point, size: Size) {
        self.min.x = self.min.x.min(pos.x);
        self.min.y = self.min.y.min(pos.y);
        self.max.x = self.max.x.max(pos.x + size.width);
        self.max.y = self.max.y.max(pos.y + size.height);
    }

    /// Union of two boxes.
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min: Point::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }
}

/// One pin on a node: name, side, local index within that side, and whether
/// it carries control flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutPin {
    pub name: String,
    pub direction: PinDirection,
    pub index: u32,
    pub is_exec: bool,
}

impl LayoutPin {
    pub fn new(name: impl Into<String>, direction: PinDirection, index: u32, is_exec: bool) -> Self {
        Self {
            name: name.into(),
            direction,
            index,
            is_exec,
        }
    }
}

/// Snapshot of one external node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutNode {
    /// Caller-scoped stable id, the key of the output position map.
    pub id: String,
    /// Globally unique key used for all deterministic ordering.
    pub key: NodeKey,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub position: Point,
    #[serde(default)]
    pub size: Size,
    #[serde(default)]
    pub pins: Vec<LayoutPin>,
    /// Pure single-output value source (e.g. a variable read). Drives the
    /// fetch-node rank constraint and the compact data-alignment tie.
    #[serde(default)]
    pub is_data_fetch: bool,
}

impl LayoutNode {
    pub fn pin_count(&self, direction: PinDirection) -> u32 {
        self.pins.iter().filter(|p| p.direction == direction).count() as u32
    }

    pub fn exec_pin_count(&self, direction: PinDirection) -> u32 {
        self.pins
            .iter()
            .filter(|p| p.direction == direction && p.is_exec)
            .count() as u32
    }

    pub fn has_exec_pins(&self) -> bool {
        self.pins.iter().any(|p| p.is_exec)
    }

    /// Look a pin up by side, name, and local index.
    pub fn find_pin(&self, direction: PinDirection, name: &str, index: u32) -> Option<&LayoutPin> {
        self.pins
            .iter()
            .find(|p| p.direction == direction && p.index == index && p.name == name)
    }
}

/// Snapshot of one external edge, endpoint pins named by (name, local index).
///
/// The edge kind is not stored: an edge is exec exactly when both endpoint
/// pins are exec pins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutEdge {
    pub src_node: String,
    pub src_pin: String,
    #[serde(default)]
    pub src_pin_index: u32,
    pub dst_node: String,
    pub dst_pin: String,
    #[serde(default)]
    pub dst_pin_index: u32,
}

/// The full graph snapshot handed to the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutGraph {
    pub nodes: Vec<LayoutNode>,
    #[serde(default)]
    pub edges: Vec<LayoutEdge>,
}

impl LayoutGraph {
    pub fn node(&self, id: &str) -> Option<&LayoutNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Spacing, alignment, and strategy knobs.
///
/// The per-kind horizontal overrides fall back to the legacy `node_spacing_x`
/// when unset, so callers that only ever configured the single value keep
/// their old layouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    /// Legacy horizontal gap between rank columns.
    pub node_spacing_x: f32,
    /// Horizontal gap after a column containing exec-capable nodes.
    pub exec_spacing_x: Option<f32>,
    /// Horizontal gap after a data-only column.
    pub data_spacing_x: Option<f32>,
    /// Vertical gap above an exec-capable node.
    pub exec_spacing_y: f32,
    /// Vertical gap above a data-only node.
    pub data_spacing_y: f32,
    /// Horizontal alignment inside a rank column.
    pub rank_alignment: RankAlignment,
    /// Rank span for a single-consumer data-fetch node; 0 forces same-rank
    /// co-location next to its consumer.
    pub fetch_min_length: i32,
    pub strategy: PlacementStrategy,
    /// Allow the compact strategy to pull exec successors level with their
    /// primary predecessor.
    pub align_exec_chains: bool,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            node_spacing_x: 300.0,
            exec_spacing_x: None,
            data_spacing_x: None,
            exec_spacing_y: 60.0,
            data_spacing_y: 60.0,
            rank_alignment: RankAlignment::Center,
            fetch_min_length: 1,
            strategy: PlacementStrategy::Compact,
            align_exec_chains: true,
        }
    }
}

impl LayoutSettings {
    pub fn exec_spacing_x(&self) -> f32 {
        self.exec_spacing_x.unwrap_or(self.node_spacing_x)
    }

    pub fn data_spacing_x(&self) -> f32 {
        self.data_spacing_x.unwrap_or(self.node_spacing_x)
    }
}

/// Result of laying out one connected component: final position per node id,
/// plus the bounding box over all placed nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentResult {
    pub positions: BTreeMap<String, Point>,
    pub bounds: Bounds,
}
