use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::geometry::{Point, Rect};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Shape tag used by renderers; layout ignores it.
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl Node {
    pub fn new(id: impl Into<String>, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            width,
            height,
            kind: String::new(),
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn set_position(&mut self, point: Point) {
        self.x = point.x;
        self.y = point.y;
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
}

impl Edge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DiagramType {
    #[default]
    Flowchart,
    OrgChart,
    MindMap,
    Other(String),
}

impl DiagramType {
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "flowchart" => Self::Flowchart,
            "org-chart" | "orgchart" => Self::OrgChart,
            "mind-map" | "mindmap" => Self::MindMap,
            _ => Self::Other(token.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Flowchart => "flowchart",
            Self::OrgChart => "org-chart",
            Self::MindMap => "mind-map",
            Self::Other(name) => name.as_str(),
        }
    }
}

impl Serialize for DiagramType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DiagramType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Ok(Self::from_token(&token))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramData {
    #[serde(default)]
    pub diagram_type: DiagramType,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl DiagramData {
    pub fn new(diagram_type: DiagramType) -> Self {
        Self {
            diagram_type,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Replace node positions by id, leaving every other field untouched.
    pub fn with_positions(&self, positioned: &[Node]) -> Self {
        let mut by_id: HashMap<&str, &Node> = HashMap::with_capacity(positioned.len());
        for placed in positioned {
            by_id.entry(placed.id.as_str()).or_insert(placed);
        }
        let mut next = self.clone();
        for node in &mut next.nodes {
            if let Some(placed) = by_id.get(node.id.as_str()) {
                node.x = placed.x;
                node.y = placed.y;
            }
        }
        next
    }
}
