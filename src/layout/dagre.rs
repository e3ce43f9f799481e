use dagre_rust::{
    GraphConfig as DagreConfig, GraphEdge as DagreEdge, GraphNode as DagreNode,
    layout as dagre_layout,
};
use graphlib_rust::{Graph as DagreGraph, GraphOption};
use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};

use super::error::LayoutError;
use super::{LayoutEngine, LayoutOutcome, fail_open};
use crate::config::{Direction, LayoutConfig};
use crate::ir::{Edge, Node};

const EDGE_SEPARATION: f32 = 10.0;
const MARGIN: f32 = 8.0;

/// Dependency-graph engine backed by the `dagre_rust` rank solver. Dagre
/// reports node centers.
#[derive(Debug, Clone, Copy, Default)]
pub struct DagreEngine;

impl LayoutEngine for DagreEngine {
    fn name(&self) -> &'static str {
        "dagre"
    }

    fn layout(&self, nodes: &[Node], edges: &[Edge], config: &LayoutConfig) -> LayoutOutcome {
        if nodes.is_empty() {
            return LayoutOutcome::Applied(Vec::new());
        }
        let solved = panic::catch_unwind(AssertUnwindSafe(|| run_dagre(nodes, edges, config)));
        let centers = match solved {
            Ok(centers) => centers,
            Err(payload) => {
                return fail_open(self.name(), nodes, LayoutError::from_panic(self.name(), payload));
            }
        };

        let mut placed = nodes.to_vec();
        for node in &mut placed {
            // A node dagre did not report keeps its current position.
            let Some(&(cx, cy)) = centers.get(&node.id) else {
                continue;
            };
            let x = cx - node.width / 2.0;
            let y = cy - node.height / 2.0;
            if !x.is_finite() || !y.is_finite() {
                let error = LayoutError::NonFinite {
                    engine: self.name(),
                    node: node.id.clone(),
                };
                return fail_open(self.name(), nodes, error);
            }
            node.x = x;
            node.y = y;
        }
        LayoutOutcome::Applied(placed)
    }
}

fn run_dagre(nodes: &[Node], edges: &[Edge], config: &LayoutConfig) -> HashMap<String, (f32, f32)> {
    let mut dagre_graph: DagreGraph<DagreConfig, DagreNode, DagreEdge> =
        DagreGraph::new(Some(GraphOption {
            directed: Some(true),
            multigraph: Some(false),
            compound: Some(false),
        }));

    let mut graph_config = DagreConfig::default();
    graph_config.rankdir = Some(dagre_rankdir(config.direction).to_string());
    graph_config.nodesep = Some(config.spacing.node);
    graph_config.ranksep = Some(config.spacing.rank_gap(config.direction));
    graph_config.edgesep = Some(EDGE_SEPARATION);
    graph_config.marginx = Some(MARGIN);
    graph_config.marginy = Some(MARGIN);
    dagre_graph.set_graph(graph_config);

    let mut node_set: HashSet<&str> = HashSet::new();
    for node in nodes {
        let mut dagre_node = DagreNode::default();
        dagre_node.width = node.width;
        dagre_node.height = node.height;
        dagre_graph.set_node(node.id.clone(), Some(dagre_node));
        node_set.insert(node.id.as_str());
    }

    let mut edge_set: HashSet<(String, String)> = HashSet::new();
    for edge in edges {
        if !node_set.contains(edge.source.as_str()) || !node_set.contains(edge.target.as_str()) {
            continue;
        }
        let from = edge.source.clone();
        let to = edge.target.clone();
        if !edge_set.insert((from.clone(), to.clone())) {
            continue;
        }
        let edge_label = DagreEdge::default();
        let _ = dagre_graph.set_edge(&from, &to, Some(edge_label), None);
    }

    dagre_layout::run_layout(&mut dagre_graph);

    let mut centers = HashMap::with_capacity(nodes.len());
    for node in nodes {
        if let Some(dagre_node) = dagre_graph.node(&node.id) {
            centers.insert(node.id.clone(), (dagre_node.x, dagre_node.y));
        }
    }
    centers
}

fn dagre_rankdir(direction: Direction) -> &'static str {
    match direction {
        Direction::Down => "tb",
        Direction::Up => "bt",
        Direction::Right => "lr",
        Direction::Left => "rl",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> (Vec<Node>, Vec<Edge>) {
        let nodes = vec![
            Node::new("A", 0.0, 0.0, 80.0, 40.0),
            Node::new("B", 0.0, 0.0, 80.0, 40.0),
            Node::new("C", 0.0, 0.0, 80.0, 40.0),
        ];
        let edges = vec![
            Edge::new("ab", "A", "B"),
            Edge::new("bc", "B", "C"),
            Edge::new("cx", "C", "ghost"),
        ];
        (nodes, edges)
    }

    fn find<'a>(nodes: &'a [Node], id: &str) -> &'a Node {
        nodes.iter().find(|n| n.id == id).unwrap()
    }

    #[test]
    fn top_down_chain_stacks_vertically() {
        let (nodes, edges) = chain();
        let outcome = DagreEngine.layout(&nodes, &edges, &LayoutConfig::default());
        assert!(!outcome.is_failed_open());
        let placed = outcome.nodes();
        assert!(find(placed, "B").y > find(placed, "A").y);
        assert!(find(placed, "C").y > find(placed, "B").y);
    }

    #[test]
    fn left_right_chain_flows_horizontally() {
        let (nodes, edges) = chain();
        let config = LayoutConfig {
            direction: Direction::parse("horizontal"),
            ..Default::default()
        };
        let placed = DagreEngine.layout(&nodes, &edges, &config).into_nodes();
        assert!(find(&placed, "B").x > find(&placed, "A").x);
        assert!(find(&placed, "C").x > find(&placed, "B").x);
    }

    #[test]
    fn sizes_and_ids_are_untouched() {
        let (nodes, edges) = chain();
        let placed = DagreEngine.layout(&nodes, &edges, &LayoutConfig::default()).into_nodes();
        assert_eq!(placed.len(), nodes.len());
        for (before, after) in nodes.iter().zip(&placed) {
            assert_eq!(before.id, after.id);
            assert_eq!(before.width, after.width);
            assert_eq!(before.height, after.height);
        }
    }

    #[test]
    fn non_finite_size_fails_open() {
        let nodes = vec![
            Node::new("A", 3.0, 4.0, f32::NAN, 40.0),
            Node::new("B", 5.0, 6.0, 40.0, 40.0),
        ];
        let edges = vec![Edge::new("ab", "A", "B")];
        let outcome = DagreEngine.layout(&nodes, &edges, &LayoutConfig::default());
        assert!(outcome.is_failed_open());
        assert_eq!(
            outcome.error(),
            Some(&LayoutError::NonFinite {
                engine: "dagre",
                node: "A".to_string(),
            })
        );
        let kept = outcome.nodes();
        assert_eq!((find(kept, "A").x, find(kept, "A").y), (3.0, 4.0));
        assert_eq!((find(kept, "B").x, find(kept, "B").y), (5.0, 6.0));
    }

    #[test]
    fn rankdir_table() {
        assert_eq!(dagre_rankdir(Direction::Down), "tb");
        assert_eq!(dagre_rankdir(Direction::Up), "bt");
        assert_eq!(dagre_rankdir(Direction::Right), "lr");
        assert_eq!(dagre_rankdir(Direction::Left), "rl");
    }
}
