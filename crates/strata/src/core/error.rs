//! Core error types for the layout engine
//!
//! Every failure is returned immediately with a short machine-oriented
//! message; the pipeline never produces a partial position map.

use thiserror::Error;

/// Errors produced while validating input or building the working graph.
#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Empty component: no node ids were supplied.")]
    EmptyComponent,

    #[error("Missing node id in layout graph: {id}.")]
    MissingNode { id: String },

    #[error("Invalid layout graph: {message}")]
    InvalidGraph { message: String },
}

impl LayoutError {
    /// A requested component id does not resolve to a graph node.
    pub fn missing_node(id: impl Into<String>) -> Self {
        Self::MissingNode { id: id.into() }
    }

    /// The graph snapshot is structurally inconsistent.
    pub fn invalid_graph(message: impl Into<String>) -> Self {
        Self::InvalidGraph {
            message: message.into(),
        }
    }
}
