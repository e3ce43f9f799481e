use crate::geometry::{Point, Rect, rect_boundary_intersection};
use crate::ir::DiagramData;
use crate::layout::{LayoutBounds, LayoutReport};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDump {
    pub diagram_type: String,
    pub engine: String,
    pub algorithm: Option<String>,
    pub failed_open: bool,
    pub width: f32,
    pub height: f32,
    pub offset: Point,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub id: String,
    pub source: String,
    pub target: String,
    /// Segment between the two node borders; empty when an endpoint is missing.
    pub points: Vec<[f32; 2]>,
}

impl LayoutDump {
    pub fn from_layout(data: &DiagramData, report: &LayoutReport) -> Self {
        let nodes = data
            .nodes
            .iter()
            .map(|node| NodeDump {
                id: node.id.clone(),
                kind: node.kind.clone(),
                x: node.x,
                y: node.y,
                width: node.width,
                height: node.height,
            })
            .collect();

        let edges = data
            .edges
            .iter()
            .map(|edge| {
                let points = match (data.node(&edge.source), data.node(&edge.target)) {
                    (Some(from), Some(to)) => border_segment(&from.rect(), &to.rect()),
                    _ => Vec::new(),
                };
                EdgeDump {
                    id: edge.id.clone(),
                    source: edge.source.clone(),
                    target: edge.target.clone(),
                    points,
                }
            })
            .collect();

        let LayoutBounds {
            width,
            height,
            offset,
            ..
        } = report.bounds;

        Self {
            diagram_type: data.diagram_type.as_str().to_string(),
            engine: report.engine.clone(),
            algorithm: report.algorithm.map(|a| a.as_str().to_string()),
            failed_open: report.failed_open,
            width,
            height,
            offset,
            nodes,
            edges,
        }
    }
}

/// Center line between two boxes trimmed to their borders. Overlapping boxes
/// (and self loops) keep the raw centers.
fn border_segment(from: &Rect, to: &Rect) -> Vec<[f32; 2]> {
    let (a, b) = (from.center(), to.center());
    if from.contains(b) || to.contains(a) {
        return vec![[a.x, a.y], [b.x, b.y]];
    }
    let start = rect_boundary_intersection(a, b, from).unwrap_or(a);
    let end = rect_boundary_intersection(b, a, to).unwrap_or(b);
    vec![[start.x, start.y], [end.x, end.y]]
}

pub fn write_layout_dump(
    path: Option<&Path>,
    data: &DiagramData,
    report: &LayoutReport,
) -> anyhow::Result<()> {
    let dump = LayoutDump::from_layout(data, report);
    match path {
        Some(path) => {
            let file = File::create(path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &dump)?;
            writer.flush()?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, &dump)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}
