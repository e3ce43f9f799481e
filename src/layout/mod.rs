mod dagre;
mod error;
mod layered;
pub mod physics;
mod ranking;

use serde::Serialize;
use serde_json::Value;
use std::str::FromStr;

use crate::config::{Algorithm, ConfigError, LayoutConfig, validate_layout_config};
use crate::geometry::{BoundingBox, Point};
use crate::ir::{DiagramData, Edge, Node};

pub use dagre::DagreEngine;
pub use error::LayoutError;
pub use layered::LayeredEngine;
pub use physics::{PhysicsEngine, PhysicsLayout};

pub const DEFAULT_CANVAS_WIDTH: f32 = 800.0;
pub const DEFAULT_CANVAS_HEIGHT: f32 = 600.0;

/// Result of one engine run. A failed solve still carries a full node set
/// (the untouched input) so callers can never observe a half-applied layout.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutOutcome {
    Applied(Vec<Node>),
    FailedOpen { nodes: Vec<Node>, error: LayoutError },
}

impl LayoutOutcome {
    pub fn nodes(&self) -> &[Node] {
        match self {
            Self::Applied(nodes) | Self::FailedOpen { nodes, .. } => nodes,
        }
    }

    pub fn into_nodes(self) -> Vec<Node> {
        match self {
            Self::Applied(nodes) | Self::FailedOpen { nodes, .. } => nodes,
        }
    }

    pub fn error(&self) -> Option<&LayoutError> {
        match self {
            Self::Applied(_) => None,
            Self::FailedOpen { error, .. } => Some(error),
        }
    }

    pub fn is_failed_open(&self) -> bool {
        matches!(self, Self::FailedOpen { .. })
    }
}

pub(crate) fn fail_open(engine: &'static str, nodes: &[Node], error: LayoutError) -> LayoutOutcome {
    tracing::warn!(engine, %error, "layout failed, keeping original positions");
    LayoutOutcome::FailedOpen {
        nodes: nodes.to_vec(),
        error,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutBounds {
    /// Extents of the nodes before translation.
    pub extent: BoundingBox,
    pub width: f32,
    pub height: f32,
    pub offset: Point,
}

impl Default for LayoutBounds {
    fn default() -> Self {
        Self {
            extent: BoundingBox::default(),
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
            offset: Point::ORIGIN,
        }
    }
}

/// Extents over node rectangles plus the translation that moves the minimum
/// corner to `(padding, padding)`.
pub fn compute_bounds(nodes: &[Node], padding: f32) -> LayoutBounds {
    let Some(first) = nodes.first() else {
        return LayoutBounds::default();
    };
    let mut extent = BoundingBox {
        min_x: first.x,
        min_y: first.y,
        max_x: first.x + first.width,
        max_y: first.y + first.height,
    };
    for node in &nodes[1..] {
        extent.min_x = extent.min_x.min(node.x);
        extent.min_y = extent.min_y.min(node.y);
        extent.max_x = extent.max_x.max(node.x + node.width);
        extent.max_y = extent.max_y.max(node.y + node.height);
    }
    LayoutBounds {
        extent,
        width: extent.width() + padding * 2.0,
        height: extent.height() + padding * 2.0,
        offset: Point::new(-extent.min_x + padding, -extent.min_y + padding),
    }
}

pub fn translate(nodes: &mut [Node], offset: Point) {
    for node in nodes {
        node.x += offset.x;
        node.y += offset.y;
    }
}

pub trait LayoutEngine {
    fn name(&self) -> &'static str;

    /// Positions for every input node. Must not fail: solver problems are
    /// reported through [`LayoutOutcome::FailedOpen`].
    fn layout(&self, nodes: &[Node], edges: &[Edge], config: &LayoutConfig) -> LayoutOutcome;

    fn bounds(&self, nodes: &[Node], config: &LayoutConfig) -> LayoutBounds {
        compute_bounds(nodes, config.padding)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    Dagre,
    Layered,
    None,
}

impl EngineKind {
    pub const ALL: [EngineKind; 3] = [EngineKind::Dagre, EngineKind::Layered, EngineKind::None];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dagre => "dagre",
            Self::Layered => "layered",
            Self::None => "none",
        }
    }

    fn engine(self) -> Option<&'static dyn LayoutEngine> {
        match self {
            Self::Dagre => Some(&DagreEngine),
            Self::Layered => Some(&LayeredEngine),
            Self::None => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown layout engine `{0}` (expected one of: dagre, layered, none)")]
pub struct UnknownEngine(pub String);

impl FromStr for EngineKind {
    type Err = UnknownEngine;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dagre" | "dependency" => Ok(Self::Dagre),
            "layered" | "constraint" | "elk" => Ok(Self::Layered),
            "none" | "" => Ok(Self::None),
            _ => Err(UnknownEngine(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutReport {
    pub engine: String,
    pub algorithm: Option<Algorithm>,
    pub failed_open: bool,
    pub bounds: LayoutBounds,
}

#[derive(Debug, Clone, Default)]
pub struct LayoutManager {
    config: LayoutConfig,
}

impl LayoutManager {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn available_engines() -> Vec<&'static str> {
        EngineKind::ALL.iter().map(|kind| kind.as_str()).collect()
    }

    pub fn validate_config(value: &Value) -> Result<LayoutConfig, ConfigError> {
        validate_layout_config(value)
    }

    pub fn bounds(&self, nodes: &[Node]) -> LayoutBounds {
        compute_bounds(nodes, self.config.padding)
    }

    pub fn apply_layout(&self, data: &DiagramData, engine: EngineKind) -> DiagramData {
        self.apply_layout_with_report(data, engine).0
    }

    pub fn apply_layout_with_report(
        &self,
        data: &DiagramData,
        engine: EngineKind,
    ) -> (DiagramData, LayoutReport) {
        let selected = match engine.engine() {
            Some(selected) if !data.nodes.is_empty() => selected,
            _ => return (data.clone(), self.identity_report(data, engine.as_str())),
        };
        tracing::debug!(engine = selected.name(), nodes = data.nodes.len(), "applying layout");
        let outcome = selected.layout(&data.nodes, &data.edges, &self.config);
        let bounds = selected.bounds(outcome.nodes(), &self.config);
        self.finish(data, outcome, bounds, selected.name(), None)
    }

    /// Runs the in-process engine picked by the diagram type (or the
    /// configured override), then normalizes like [`Self::apply_layout`].
    pub fn auto_layout(&self, data: &DiagramData) -> DiagramData {
        self.auto_layout_with_report(data).0
    }

    pub fn auto_layout_with_report(&self, data: &DiagramData) -> (DiagramData, LayoutReport) {
        let algorithm = self.config.algorithm_for(&data.diagram_type);
        let engine = PhysicsEngine::new(algorithm);
        if data.nodes.is_empty() {
            let mut report = self.identity_report(data, engine.name());
            report.algorithm = Some(algorithm);
            return (data.clone(), report);
        }
        tracing::debug!(
            algorithm = algorithm.as_str(),
            diagram_type = data.diagram_type.as_str(),
            nodes = data.nodes.len(),
            "running auto layout"
        );
        let outcome = engine.layout(&data.nodes, &data.edges, &self.config);
        let bounds = engine.bounds(outcome.nodes(), &self.config);
        self.finish(data, outcome, bounds, engine.name(), Some(engine.algorithm()))
    }

    fn finish(
        &self,
        data: &DiagramData,
        outcome: LayoutOutcome,
        bounds: LayoutBounds,
        engine: &str,
        algorithm: Option<Algorithm>,
    ) -> (DiagramData, LayoutReport) {
        let failed_open = outcome.is_failed_open();
        let mut nodes = outcome.into_nodes();
        translate(&mut nodes, bounds.offset);
        let report = LayoutReport {
            engine: engine.to_string(),
            algorithm,
            failed_open,
            bounds,
        };
        (data.with_positions(&nodes), report)
    }

    fn identity_report(&self, data: &DiagramData, engine: &str) -> LayoutReport {
        LayoutReport {
            engine: engine.to_string(),
            algorithm: None,
            failed_open: false,
            bounds: self.bounds(&data.nodes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::DiagramType;

    fn sample(kind: DiagramType) -> DiagramData {
        let mut data = DiagramData::new(kind);
        data.nodes.push(Node::new("A", 0.0, 0.0, 120.0, 60.0));
        data.nodes.push(Node::new("B", 300.0, -40.0, 80.0, 40.0));
        data.nodes.push(Node::new("C", -75.0, 220.0, 100.0, 50.0));
        data.nodes.push(Node::new("D", 10.0, 10.0, 60.0, 60.0));
        data.edges.push(Edge::new("e1", "A", "B"));
        data.edges.push(Edge::new("e2", "A", "C"));
        data.edges.push(Edge::new("e3", "C", "D"));
        data.edges.push(Edge::new("e4", "D", "missing"));
        data
    }

    fn min_corner(data: &DiagramData) -> (f32, f32) {
        let min_x = data.nodes.iter().map(|n| n.x).fold(f32::INFINITY, f32::min);
        let min_y = data.nodes.iter().map(|n| n.y).fold(f32::INFINITY, f32::min);
        (min_x, min_y)
    }

    fn assert_preserved(before: &DiagramData, after: &DiagramData) {
        assert_eq!(before.nodes.len(), after.nodes.len());
        for (a, b) in before.nodes.iter().zip(&after.nodes) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.width, b.width);
            assert_eq!(a.height, b.height);
        }
        assert_eq!(before.edges, after.edges);
    }

    #[test]
    fn bounds_of_empty_input_use_default_canvas() {
        let bounds = compute_bounds(&[], 50.0);
        assert_eq!(bounds.width, 800.0);
        assert_eq!(bounds.height, 600.0);
        assert_eq!(bounds.offset, Point::ORIGIN);
    }

    #[test]
    fn bounds_offset_moves_min_corner_to_padding() {
        let nodes = vec![
            Node::new("a", -20.0, 30.0, 10.0, 10.0),
            Node::new("b", 40.0, -5.0, 20.0, 15.0),
        ];
        let bounds = compute_bounds(&nodes, 50.0);
        assert_eq!(bounds.offset, Point::new(70.0, 55.0));
        assert_eq!(bounds.extent.max_x, 60.0);
        assert_eq!(bounds.extent.max_y, 40.0);
        assert_eq!(bounds.width, 80.0 + 100.0);
        assert_eq!(bounds.height, 45.0 + 100.0);
    }

    #[test]
    fn every_engine_normalizes_to_padding() {
        let manager = LayoutManager::default();
        let data = sample(DiagramType::Flowchart);
        for engine in [EngineKind::Dagre, EngineKind::Layered] {
            let (laid_out, report) = manager.apply_layout_with_report(&data, engine);
            let (min_x, min_y) = min_corner(&laid_out);
            assert!((min_x - 50.0).abs() < 1e-3, "{engine:?} min_x = {min_x}");
            assert!((min_y - 50.0).abs() < 1e-3, "{engine:?} min_y = {min_y}");
            assert_eq!(report.engine, engine.as_str());
            assert_preserved(&data, &laid_out);
        }
    }

    #[test]
    fn auto_layout_normalizes_every_diagram_type() {
        let manager = LayoutManager::new(LayoutConfig {
            seed: Some(7),
            ..Default::default()
        });
        for kind in [
            DiagramType::Flowchart,
            DiagramType::OrgChart,
            DiagramType::MindMap,
            DiagramType::Other("network".into()),
        ] {
            let data = sample(kind);
            let (laid_out, report) = manager.auto_layout_with_report(&data);
            let (min_x, min_y) = min_corner(&laid_out);
            assert!((min_x - 50.0).abs() < 1e-3);
            assert!((min_y - 50.0).abs() < 1e-3);
            assert_eq!(report.algorithm, Some(Algorithm::for_diagram(&data.diagram_type)));
            assert_preserved(&data, &laid_out);
        }
    }

    #[test]
    fn none_engine_and_empty_input_are_identity() {
        let manager = LayoutManager::default();
        let data = sample(DiagramType::Flowchart);
        assert_eq!(manager.apply_layout(&data, EngineKind::None), data);

        let empty = DiagramData::new(DiagramType::OrgChart);
        assert_eq!(manager.apply_layout(&empty, EngineKind::Dagre), empty);
        assert_eq!(manager.apply_layout(&empty, EngineKind::Layered), empty);
        assert_eq!(manager.auto_layout(&empty), empty);
    }

    #[test]
    fn apply_layout_does_not_mutate_input() {
        let manager = LayoutManager::default();
        let data = sample(DiagramType::Flowchart);
        let snapshot = data.clone();
        let _ = manager.apply_layout(&data, EngineKind::Layered);
        assert_eq!(data, snapshot);
    }

    #[test]
    fn custom_padding_is_honored() {
        let manager = LayoutManager::new(LayoutConfig {
            padding: 12.0,
            ..Default::default()
        });
        let laid_out = manager.apply_layout(&sample(DiagramType::Flowchart), EngineKind::Layered);
        let (min_x, min_y) = min_corner(&laid_out);
        assert!((min_x - 12.0).abs() < 1e-3);
        assert!((min_y - 12.0).abs() < 1e-3);
    }

    #[test]
    fn engine_names_parse() {
        assert_eq!("dagre".parse::<EngineKind>().unwrap(), EngineKind::Dagre);
        assert_eq!("Layered".parse::<EngineKind>().unwrap(), EngineKind::Layered);
        assert_eq!("none".parse::<EngineKind>().unwrap(), EngineKind::None);
        assert!("cola".parse::<EngineKind>().is_err());
        assert_eq!(LayoutManager::available_engines(), vec!["dagre", "layered", "none"]);
    }

    #[test]
    fn failed_outcome_keeps_original_nodes() {
        let nodes = vec![Node::new("a", 3.0, 4.0, 10.0, 10.0)];
        let outcome = fail_open(
            "test",
            &nodes,
            LayoutError::NonFinite {
                engine: "test",
                node: "a".into(),
            },
        );
        assert!(outcome.is_failed_open());
        assert_eq!(outcome.nodes(), nodes.as_slice());
        assert!(outcome.error().is_some());
    }
}
