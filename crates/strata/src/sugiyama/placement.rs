//! Coordinate assignment: shared column geometry and the simple strategy
//!
//! Both strategies share the rank→X mapping: each rank's column is as wide
//! as its widest node, columns run left to right separated by type-specific
//! spacing, and a node sits inside its column per the configured alignment.
//! The simple strategy then stacks each rank top to bottom.

use tracing::{debug, span, Level};

use crate::core::{LayoutSettings, RankAlignment};

use super::{WorkGraph, WorkNode};

/// Vertical gap to leave above `node`.
pub(crate) fn vertical_gap(node: &WorkNode, settings: &LayoutSettings) -> f32 {
    if node.is_exec() {
        settings.exec_spacing_y
    } else {
        settings.data_spacing_y
    }
}

/// Compute every node's X from its rank column. A rank counts as an exec
/// column when any real node in it is exec-capable.
pub(crate) fn assign_columns(graph: &mut WorkGraph, settings: &LayoutSettings) {
    let rank_count = (graph.max_rank() + 1) as usize;
    let mut widths = vec![0.0f32; rank_count];
    let mut exec_rank = vec![false; rank_count];
    for node in &graph.nodes {
        let rank = node.rank as usize;
        widths[rank] = widths[rank].max(node.size.width);
        if !node.is_dummy && node.is_exec() {
            exec_rank[rank] = true;
        }
    }

    let mut lefts = vec![0.0f32; rank_count];
    for rank in 1..rank_count {
        let spacing = if exec_rank[rank - 1] {
            settings.exec_spacing_x()
        } else {
            settings.data_spacing_x()
        };
        lefts[rank] = lefts[rank - 1] + widths[rank - 1] + spacing;
    }

    for node in &mut graph.nodes {
        let rank = node.rank as usize;
        node.position.x = match settings.rank_alignment {
            RankAlignment::Left => lefts[rank],
            RankAlignment::Center => lefts[rank] + (widths[rank] - node.size.width) / 2.0,
            RankAlignment::Right => lefts[rank] + widths[rank] - node.size.width,
        };
    }
    debug!(columns = rank_count, "Assigned rank columns");
}

/// Stack each rank top to bottom in final order, with the gap above a node
/// chosen by that node's exec/data character.
pub(crate) fn place_simple(graph: &mut WorkGraph, settings: &LayoutSettings) {
    let place_span = span!(Level::DEBUG, "place_simple", nodes = graph.nodes.len());
    let _enter = place_span.enter();

    let layers = graph.layers();
    for layer in layers {
        let mut y = 0.0f32;
        for (i, &idx) in layer.iter().enumerate() {
            if i > 0 {
                let prev = layer[i - 1];
                y += graph.nodes[prev].size.height + vertical_gap(&graph.nodes[idx], settings);
            }
            graph.nodes[idx].position.y = y;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EdgeKind, Size};
    use crate::sugiyama::testing;

    #[test]
    fn test_columns_advance_by_width_plus_spacing() {
        let mut graph = testing::graph(3, true, &[]);
        graph.nodes[1].rank = 1;
        graph.nodes[2].rank = 2;
        let settings = LayoutSettings::default();
        assign_columns(&mut graph, &settings);
        assert_eq!(graph.nodes[0].position.x, 0.0);
        assert_eq!(graph.nodes[1].position.x, 400.0);
        assert_eq!(graph.nodes[2].position.x, 800.0);
    }

    #[test]
    fn test_center_alignment_centers_narrow_nodes() {
        let mut graph = testing::graph(2, true, &[]);
        graph.nodes[1].size = Size::new(40.0, 50.0);
        let settings = LayoutSettings::default();
        assign_columns(&mut graph, &settings);
        // Column width 100; the 40-wide node is centered at +30.
        assert_eq!(graph.nodes[0].position.x, 0.0);
        assert_eq!(graph.nodes[1].position.x, 30.0);
    }

    #[test]
    fn test_exec_column_spacing_override() {
        let mut graph = testing::graph(2, true, &[]);
        graph.nodes[1].rank = 1;
        let mut settings = LayoutSettings::default();
        settings.exec_spacing_x = Some(500.0);
        assign_columns(&mut graph, &settings);
        assert_eq!(graph.nodes[1].position.x, 600.0);
    }

    #[test]
    fn test_data_column_spacing_override() {
        let mut graph = testing::graph(2, false, &[]);
        graph.nodes[1].rank = 1;
        let mut settings = LayoutSettings::default();
        settings.data_spacing_x = Some(50.0);
        assign_columns(&mut graph, &settings);
        assert_eq!(graph.nodes[1].position.x, 150.0);
    }

    #[test]
    fn test_simple_stacks_with_per_type_gaps() {
        let mut graph = testing::graph(3, true, &[(0, 1, EdgeKind::Exec)]);
        // All three share rank 0; node 2 is data-only.
        graph.nodes[2].exec_input_pins = 0;
        graph.nodes[2].exec_output_pins = 0;
        graph.nodes[0].order = 0;
        graph.nodes[1].order = 1;
        graph.nodes[2].order = 2;
        let mut settings = LayoutSettings::default();
        settings.data_spacing_y = 20.0;
        place_simple(&mut graph, &settings);
        assert_eq!(graph.nodes[0].position.y, 0.0);
        // 50 height + 60 exec gap above the exec node.
        assert_eq!(graph.nodes[1].position.y, 110.0);
        // 50 height + 20 data gap above the data node.
        assert_eq!(graph.nodes[2].position.y, 180.0);
    }
}
