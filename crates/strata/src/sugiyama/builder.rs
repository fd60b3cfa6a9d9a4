//! Work-graph construction and pipeline orchestration
//!
//! Converts the external snapshot plus a requested component into the
//! private working graph, runs the pipeline phases, and translates the
//! result back into caller coordinates via the anchor offset.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{debug, info, span, trace, Level};

use crate::core::{
    Bounds, ComponentResult, EdgeKind, LayoutError, LayoutGraph, LayoutNode, LayoutSettings,
    PinDirection, PinKey, PlacementStrategy, Point, Size, stable_edge_key,
};

use super::{compact, cycles, ordering, placement, ranking, splitting, WorkEdge, WorkGraph, WorkNode};

/// External nodes backing the working graph, aligned with work-node indices.
struct SourceSet<'a> {
    nodes: Vec<&'a LayoutNode>,
    index: HashMap<&'a str, usize>,
}

/// Lay out one connected component of `graph`.
///
/// `component_ids` lists the member node ids (duplicates are ignored). The
/// call either returns a position for every requested node or fails without
/// producing any positions.
pub fn layout_component(
    graph: &LayoutGraph,
    component_ids: &[String],
    settings: &LayoutSettings,
) -> Result<ComponentResult, LayoutError> {
    let layout_span = span!(Level::INFO, "layout_component", requested = component_ids.len());
    let _enter = layout_span.enter();

    let (sources, mut work) = build_work_nodes(graph, component_ids)?;

    if let Some(result) = try_single_node(&sources) {
        debug!("Single-node component, keeping original position");
        return Ok(result);
    }

    work.edges = build_work_edges(graph, &sources, settings)?;
    debug!(
        nodes = work.nodes.len(),
        edges = work.edges.len(),
        "Built working graph"
    );

    cycles::break_cycles(&mut work);
    ranking::assign_ranks(&mut work);
    splitting::pad_terminal_exec(&mut work);
    splitting::split_long_edges(&mut work);
    ordering::reduce_crossings(&mut work);

    placement::assign_columns(&mut work, settings);
    match settings.strategy {
        PlacementStrategy::Simple => placement::place_simple(&mut work, settings),
        PlacementStrategy::Compact => compact::place_compact(&mut work, settings),
    }

    let result = apply_anchor_offset(&work, &sources);
    info!(nodes = result.positions.len(), "Layout complete");
    Ok(result)
}

/// Lay out every connected component of `graph` independently.
///
/// Components are discovered over the undirected edge structure and
/// processed in deterministic key order; the first failing component aborts
/// the whole call.
pub fn layout_graph(
    graph: &LayoutGraph,
    settings: &LayoutSettings,
) -> Result<Vec<ComponentResult>, LayoutError> {
    let graph_span = span!(Level::INFO, "layout_graph", nodes = graph.nodes.len());
    let _enter = graph_span.enter();

    let components = discover_components(graph);
    debug!(components = components.len(), "Discovered components");

    let mut results = Vec::with_capacity(components.len());
    for ids in &components {
        results.push(layout_component(graph, ids, settings)?);
    }
    Ok(results)
}

/// Connected components over the undirected edge structure, seeds and
/// members both in NodeKey order.
fn discover_components(graph: &LayoutGraph) -> Vec<Vec<String>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    for (i, node) in graph.nodes.iter().enumerate() {
        index.entry(node.id.as_str()).or_insert(i);
    }

    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); graph.nodes.len()];
    for edge in &graph.edges {
        let (Some(&src), Some(&dst)) = (
            index.get(edge.src_node.as_str()),
            index.get(edge.dst_node.as_str()),
        ) else {
            continue;
        };
        if src == dst {
            continue;
        }
        adjacency[src].push(dst);
        adjacency[dst].push(src);
    }
    for neighbors in &mut adjacency {
        neighbors.sort_by_key(|&n| graph.nodes[n].key);
        neighbors.dedup();
    }

    let mut seeds: Vec<usize> = (0..graph.nodes.len()).collect();
    seeds.sort_by_key(|&i| graph.nodes[i].key);

    let mut visited = vec![false; graph.nodes.len()];
    let mut components = Vec::new();
    for seed in seeds {
        if visited[seed] {
            continue;
        }
        let mut members = Vec::new();
        let mut stack = vec![seed];
        visited[seed] = true;
        while let Some(node) = stack.pop() {
            members.push(node);
            for &next in &adjacency[node] {
                if !visited[next] {
                    visited[next] = true;
                    stack.push(next);
                }
            }
        }
        members.sort_by_key(|&i| graph.nodes[i].key);
        components.push(members.iter().map(|&i| graph.nodes[i].id.clone()).collect());
    }
    components
}

/// Resolve and sort the requested ids into key-ordered work nodes.
fn build_work_nodes<'a>(
    graph: &'a LayoutGraph,
    component_ids: &[String],
) -> Result<(SourceSet<'a>, WorkGraph), LayoutError> {
    if component_ids.is_empty() {
        return Err(LayoutError::EmptyComponent);
    }

    let mut graph_index: HashMap<&str, &LayoutNode> = HashMap::new();
    for node in &graph.nodes {
        graph_index.entry(node.id.as_str()).or_insert(node);
    }

    let mut seen = HashSet::new();
    let mut resolved: Vec<&LayoutNode> = Vec::with_capacity(component_ids.len());
    for id in component_ids {
        if !seen.insert(id.as_str()) {
            continue;
        }
        match graph_index.get(id.as_str()) {
            Some(node) => resolved.push(node),
            None => return Err(LayoutError::missing_node(id)),
        }
    }
    resolved.sort_by_key(|n| n.key);

    let mut index = HashMap::with_capacity(resolved.len());
    let mut work_nodes = Vec::with_capacity(resolved.len());
    for (i, node) in resolved.iter().enumerate() {
        index.insert(node.id.as_str(), i);
        work_nodes.push(WorkNode {
            key: node.key,
            size: Size::new(node.size.width.max(0.0), node.size.height.max(0.0)),
            source: Some(i),
            rank: 0,
            order: 0,
            position: Point::default(),
            is_dummy: false,
            input_pins: node.pin_count(PinDirection::Input),
            output_pins: node.pin_count(PinDirection::Output),
            exec_input_pins: node.exec_pin_count(PinDirection::Input),
            exec_output_pins: node.exec_pin_count(PinDirection::Output),
            is_data_fetch: node.is_data_fetch,
        });
    }

    Ok((
        SourceSet {
            nodes: resolved,
            index,
        },
        WorkGraph {
            nodes: work_nodes,
            edges: Vec::new(),
        },
    ))
}

/// A one-node component keeps its position; the pipeline is skipped.
fn try_single_node(sources: &SourceSet<'_>) -> Option<ComponentResult> {
    if sources.nodes.len() != 1 {
        return None;
    }
    let node = sources.nodes[0];
    let size = Size::new(node.size.width.max(0.0), node.size.height.max(0.0));
    let mut positions = BTreeMap::new();
    positions.insert(node.id.clone(), node.position);
    Some(ComponentResult {
        positions,
        bounds: Bounds::of(node.position, size),
    })
}

/// Resolve pin-level edges into work edges, in stable-key order.
///
/// Edges touching nodes outside the component and self-loops are discarded.
/// An edge naming a pin its endpoint does not declare is a structural error.
fn build_work_edges(
    graph: &LayoutGraph,
    sources: &SourceSet<'_>,
    settings: &LayoutSettings,
) -> Result<Vec<WorkEdge>, LayoutError> {
    let mut edges = Vec::new();
    let mut out_degree = vec![0u32; sources.nodes.len()];

    for edge in &graph.edges {
        let (Some(&src), Some(&dst)) = (
            sources.index.get(edge.src_node.as_str()),
            sources.index.get(edge.dst_node.as_str()),
        ) else {
            continue;
        };
        if src == dst {
            trace!(node = %edge.src_node, "Discarding self-loop");
            continue;
        }

        let src_node = sources.nodes[src];
        let dst_node = sources.nodes[dst];
        let src_pin = src_node
            .find_pin(PinDirection::Output, &edge.src_pin, edge.src_pin_index)
            .ok_or_else(|| {
                LayoutError::invalid_graph(format!(
                    "edge references unknown output pin '{}' on node {}",
                    edge.src_pin, src_node.id
                ))
            })?;
        let dst_pin = dst_node
            .find_pin(PinDirection::Input, &edge.dst_pin, edge.dst_pin_index)
            .ok_or_else(|| {
                LayoutError::invalid_graph(format!(
                    "edge references unknown input pin '{}' on node {}",
                    edge.dst_pin, dst_node.id
                ))
            })?;

        let kind = if src_pin.is_exec && dst_pin.is_exec {
            EdgeKind::Exec
        } else {
            EdgeKind::Data
        };
        let src_key = PinKey::new(src_node.key, PinDirection::Output, &src_pin.name, src_pin.index);
        let dst_key = PinKey::new(dst_node.key, PinDirection::Input, &dst_pin.name, dst_pin.index);
        let stable_key = stable_edge_key(&src_key, &dst_key);

        out_degree[src] += 1;
        edges.push(WorkEdge {
            src,
            dst,
            src_pin_index: src_pin.index,
            src_pin_count: src_node.pin_count(PinDirection::Output).max(1),
            dst_pin_index: dst_pin.index,
            dst_pin_count: dst_node.pin_count(PinDirection::Input).max(1),
            src_pin: src_key,
            dst_pin: dst_key,
            kind,
            stable_key,
            reversed: false,
            min_len: None,
        });
    }

    // Single-consumer fetch nodes get an exact rank span so the value source
    // sits right next to (or on the same rank as) its consumer.
    for edge in &mut edges {
        if sources.nodes[edge.src].is_data_fetch && out_degree[edge.src] == 1 {
            edge.min_len = Some(settings.fetch_min_length);
        }
    }

    edges.sort_by(|a, b| a.stable_key.cmp(&b.stable_key));
    Ok(edges)
}

/// Translate computed positions so the anchor node keeps its original
/// position, and collect the final map + bounds.
fn apply_anchor_offset(work: &WorkGraph, sources: &SourceSet<'_>) -> ComponentResult {
    let anchor = work
        .nodes
        .iter()
        .enumerate()
        .filter(|(_, n)| n.source.is_some())
        .min_by_key(|(idx, n)| {
            (
                !(n.rank == 0 && n.order == 0),
                !n.is_exec(),
                n.key,
                *idx,
            )
        })
        .map(|(idx, _)| idx);

    let offset = match anchor {
        Some(idx) => {
            let node = &work.nodes[idx];
            let original = sources.nodes[node.source.unwrap_or(idx)].position;
            trace!(anchor = %node.key, "Selected anchor node");
            Point::new(
                original.x - node.position.x,
                original.y - node.position.y,
            )
        }
        None => Point::default(),
    };

    let mut positions = BTreeMap::new();
    let mut bounds: Option<Bounds> = None;
    for node in &work.nodes {
        let Some(source) = node.source else {
            continue;
        };
        let pos = Point::new(node.position.x + offset.x, node.position.y + offset.y);
        positions.insert(sources.nodes[source].id.clone(), pos);
        match &mut bounds {
            Some(b) => b.include(pos, node.size),
            None => bounds = Some(Bounds::of(pos, node.size)),
        }
    }

    ComponentResult {
        positions,
        bounds: bounds.unwrap_or_else(|| Bounds::of(Point::default(), Size::default())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LayoutEdge, LayoutPin, NodeKey};

    fn pin(name: &str, direction: PinDirection, index: u32, is_exec: bool) -> LayoutPin {
        LayoutPin::new(name, direction, index, is_exec)
    }

    fn exec_node(id: &str, d: u32) -> LayoutNode {
        LayoutNode {
            id: id.to_string(),
            key: NodeKey::new(0, 0, 0, d),
            title: id.to_string(),
            position: Point::new(0.0, 0.0),
            size: Size::new(100.0, 50.0),
            pins: vec![
                pin("exec", PinDirection::Input, 0, true),
                pin("then", PinDirection::Output, 0, true),
                pin("value", PinDirection::Output, 1, false),
            ],
            is_data_fetch: false,
        }
    }

    fn fetch_node(id: &str, d: u32) -> LayoutNode {
        LayoutNode {
            id: id.to_string(),
            key: NodeKey::new(0, 0, 0, d),
            title: id.to_string(),
            position: Point::new(0.0, 0.0),
            size: Size::new(80.0, 30.0),
            pins: vec![pin("value", PinDirection::Output, 0, false)],
            is_data_fetch: true,
        }
    }

    fn exec_edge(src: &str, dst: &str) -> LayoutEdge {
        LayoutEdge {
            src_node: src.to_string(),
            src_pin: "then".to_string(),
            src_pin_index: 0,
            dst_node: dst.to_string(),
            dst_pin: "exec".to_string(),
            dst_pin_index: 0,
        }
    }

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_component_is_rejected() {
        let graph = LayoutGraph::default();
        let err = layout_component(&graph, &[], &LayoutSettings::default()).unwrap_err();
        assert!(matches!(err, LayoutError::EmptyComponent));
    }

    #[test]
    fn test_missing_node_id_is_reported() {
        let graph = LayoutGraph {
            nodes: vec![exec_node("A", 1)],
            edges: vec![],
        };
        let err =
            layout_component(&graph, &ids(&["A", "Ghost"]), &LayoutSettings::default()).unwrap_err();
        match err {
            LayoutError::MissingNode { id } => assert_eq!(id, "Ghost"),
            other => panic!("expected MissingNode, got {other:?}"),
        }
    }

    #[test]
    fn test_work_nodes_are_key_sorted_and_deduplicated() {
        let graph = LayoutGraph {
            nodes: vec![exec_node("B", 2), exec_node("A", 1)],
            edges: vec![],
        };
        let (sources, work) =
            build_work_nodes(&graph, &ids(&["B", "A", "B"])).unwrap();
        assert_eq!(work.nodes.len(), 2);
        assert_eq!(sources.nodes[0].id, "A");
        assert_eq!(sources.nodes[1].id, "B");
        assert!(work.nodes[0].key < work.nodes[1].key);
    }

    #[test]
    fn test_single_node_keeps_original_position() {
        let mut node = exec_node("A", 1);
        node.position = Point::new(37.0, -12.0);
        let graph = LayoutGraph {
            nodes: vec![node],
            edges: vec![],
        };
        let result = layout_component(&graph, &ids(&["A"]), &LayoutSettings::default()).unwrap();
        assert_eq!(result.positions["A"], Point::new(37.0, -12.0));
        assert_eq!(result.bounds.min, Point::new(37.0, -12.0));
        assert_eq!(result.bounds.max, Point::new(137.0, 38.0));
    }

    #[test]
    fn test_self_loops_and_external_edges_are_discarded() {
        let graph = LayoutGraph {
            nodes: vec![exec_node("A", 1), exec_node("B", 2), exec_node("C", 3)],
            edges: vec![
                exec_edge("A", "A"),
                exec_edge("A", "B"),
                exec_edge("B", "C"),
            ],
        };
        let (sources, _) = build_work_nodes(&graph, &ids(&["A", "B"])).unwrap();
        let edges = build_work_edges(&graph, &sources, &LayoutSettings::default()).unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].kind, EdgeKind::Exec);
    }

    #[test]
    fn test_unknown_pin_is_a_structural_error() {
        let graph = LayoutGraph {
            nodes: vec![exec_node("A", 1), exec_node("B", 2)],
            edges: vec![LayoutEdge {
                src_node: "A".to_string(),
                src_pin: "nope".to_string(),
                src_pin_index: 0,
                dst_node: "B".to_string(),
                dst_pin: "exec".to_string(),
                dst_pin_index: 0,
            }],
        };
        let (sources, _) = build_work_nodes(&graph, &ids(&["A", "B"])).unwrap();
        let err = build_work_edges(&graph, &sources, &LayoutSettings::default()).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidGraph { .. }));
    }

    #[test]
    fn test_single_consumer_fetch_edge_gets_min_len() {
        let graph = LayoutGraph {
            nodes: vec![exec_node("A", 2), fetch_node("V", 1)],
            edges: vec![LayoutEdge {
                src_node: "V".to_string(),
                src_pin: "value".to_string(),
                src_pin_index: 0,
                dst_node: "A".to_string(),
                dst_pin: "exec".to_string(),
                dst_pin_index: 0,
            }],
        };
        // "exec" is the only input pin on A; reuse it as a data sink.
        let (sources, _) = build_work_nodes(&graph, &ids(&["A", "V"])).unwrap();
        let mut settings = LayoutSettings::default();
        settings.fetch_min_length = 2;
        let edges = build_work_edges(&graph, &sources, &settings).unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].min_len, Some(2));
    }

    #[test]
    fn test_edges_sorted_by_stable_key() {
        let graph = LayoutGraph {
            nodes: vec![exec_node("A", 1), exec_node("B", 2), exec_node("C", 3)],
            edges: vec![exec_edge("B", "C"), exec_edge("A", "B")],
        };
        let (sources, _) = build_work_nodes(&graph, &ids(&["A", "B", "C"])).unwrap();
        let edges = build_work_edges(&graph, &sources, &LayoutSettings::default()).unwrap();
        assert_eq!(edges.len(), 2);
        assert!(edges[0].stable_key < edges[1].stable_key);
        // A sorts before B, so A->B comes first.
        assert_eq!(edges[0].src, 0);
    }

    #[test]
    fn test_component_discovery_splits_disconnected_graphs() {
        let graph = LayoutGraph {
            nodes: vec![
                exec_node("A", 1),
                exec_node("B", 2),
                exec_node("X", 3),
                exec_node("Y", 4),
            ],
            edges: vec![exec_edge("A", "B"), exec_edge("X", "Y")],
        };
        let components = discover_components(&graph);
        assert_eq!(components.len(), 2);
        assert_eq!(components[0], ids(&["A", "B"]));
        assert_eq!(components[1], ids(&["X", "Y"]));
    }

    #[test]
    fn test_layout_graph_returns_one_result_per_component() {
        let graph = LayoutGraph {
            nodes: vec![exec_node("A", 1), exec_node("B", 2), exec_node("Z", 9)],
            edges: vec![exec_edge("A", "B")],
        };
        let results = layout_graph(&graph, &LayoutSettings::default()).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].positions.len(), 2);
        assert_eq!(results[1].positions.len(), 1);
    }
}
