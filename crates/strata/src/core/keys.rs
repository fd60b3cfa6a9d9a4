//! Deterministic identity for nodes and pins
//!
//! Every tie-break in the layout pipeline goes through the total orders
//! defined here, so identical graphs produce identical layouts on every
//! run regardless of allocation or hash iteration order.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A 128-bit node identifier, compared lexicographically over its four words.
///
/// Keys are normally supplied by the caller (one per external node). The
/// pipeline also mints synthetic keys for dummy nodes via [`NodeKey::from_seed`],
/// which hashes a content-derived seed string so the same dummy always gets
/// the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeKey {
    pub a: u32,
    pub b: u32,
    pub c: u32,
    pub d: u32,
}

impl NodeKey {
    pub fn new(a: u32, b: u32, c: u32, d: u32) -> Self {
        Self { a, b, c, d }
    }

    /// Derive a key from a seed string via CRC-32 over the seed and three
    /// suffixed variants. Content-derived, never random.
    pub fn from_seed(seed: &str) -> Self {
        Self {
            a: crc32fast::hash(seed.as_bytes()),
            b: crc32fast::hash(format!("{seed}|A").as_bytes()),
            c: crc32fast::hash(format!("{seed}|B").as_bytes()),
            d: crc32fast::hash(format!("{seed}|C").as_bytes()),
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:08X}{:08X}{:08X}{:08X}",
            self.a, self.b, self.c, self.d
        )
    }
}

/// Which side of a node a pin sits on. Inputs order before outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PinDirection {
    Input,
    Output,
}

impl fmt::Display for PinDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinDirection::Input => write!(f, "I"),
            PinDirection::Output => write!(f, "O"),
        }
    }
}

/// Identity of a single pin: owning node, direction, name, and the pin's
/// local index within its direction.
///
/// The derived ordering (node, then direction, then name bytes, then index)
/// is the canonical pin order used for every edge tie-break.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PinKey {
    pub node: NodeKey,
    pub direction: PinDirection,
    pub name: String,
    pub index: u32,
}

impl PinKey {
    pub fn new(node: NodeKey, direction: PinDirection, name: impl Into<String>, index: u32) -> Self {
        Self {
            node,
            direction,
            name: name.into(),
            index,
        }
    }

    /// Canonical string form, used in stable edge keys and diagnostics.
    pub fn key_string(&self) -> String {
        format!("{}|{}|{}|{}", self.node, self.direction, self.name, self.index)
    }
}

impl fmt::Display for PinKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key_string())
    }
}

/// Stable string identity of an edge, derived from its ORIGINAL endpoints.
///
/// Computed once at graph build time and preserved verbatim through reversal;
/// split segments append a `|seg{step}` suffix to it.
pub fn stable_edge_key(src: &PinKey, dst: &PinKey) -> String {
    format!("{}->{}", src.key_string(), dst.key_string())
}
