use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

use crate::geometry::Point;
use crate::ir::DiagramType;

pub const DEFAULT_PADDING: f32 = 50.0;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("layout config must be an object")]
    NotAnObject,
    #[error("missing required field `{0}`")]
    Missing(&'static str),
    #[error("field `{field}` must be a number, got {found}")]
    NotNumeric { field: &'static str, found: String },
    #[error("field `{field}` must be finite and non-negative, got {value}")]
    OutOfRange { field: &'static str, value: f64 },
    #[error("invalid layout config: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Flow direction for the layered engines. Every alias the editor emits
/// resolves through [`Direction::parse`]; anything unknown flows downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Direction {
    #[default]
    Down,
    Up,
    Right,
    Left,
}

impl Direction {
    pub fn parse(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "top-bottom" | "tb" | "td" | "vertical" | "down" => Self::Down,
            "bottom-top" | "bt" | "up" => Self::Up,
            "left-right" | "lr" | "horizontal" | "right" => Self::Right,
            "right-left" | "rl" | "left" => Self::Left,
            _ => Self::Down,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Down => "top-bottom",
            Self::Up => "bottom-top",
            Self::Right => "left-right",
            Self::Left => "right-left",
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::Right | Self::Left)
    }

    /// Ranks grow toward negative coordinates.
    pub fn is_reversed(self) -> bool {
        matches!(self, Self::Up | Self::Left)
    }
}

impl From<String> for Direction {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<Direction> for String {
    fn from(value: Direction) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spacing {
    pub horizontal: f32,
    pub vertical: f32,
    pub node: f32,
}

impl Default for Spacing {
    fn default() -> Self {
        Self {
            horizontal: 50.0,
            vertical: 50.0,
            node: 50.0,
        }
    }
}

impl Spacing {
    /// Gap between consecutive ranks for the given flow direction.
    pub fn rank_gap(&self, direction: Direction) -> f32 {
        if direction.is_horizontal() {
            self.horizontal
        } else {
            self.vertical
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Start,
    Center,
    End,
}

impl Alignment {
    pub fn factor(self) -> f32 {
        match self {
            Self::Start => 0.0,
            Self::Center => 0.5,
            Self::End => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Force,
    Circular,
    Tree,
    Grid,
    Organic,
}

impl Algorithm {
    pub fn for_diagram(kind: &DiagramType) -> Self {
        match kind {
            DiagramType::OrgChart => Self::Tree,
            DiagramType::MindMap => Self::Organic,
            DiagramType::Flowchart | DiagramType::Other(_) => Self::Force,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Force => "force",
            Self::Circular => "circular",
            Self::Tree => "tree",
            Self::Grid => "grid",
            Self::Organic => "organic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ForceOptions {
    pub iterations: usize,
    pub repulsion: f32,
    pub attraction: f32,
    pub damping: f32,
}

impl Default for ForceOptions {
    fn default() -> Self {
        Self {
            iterations: 100,
            repulsion: 1000.0,
            attraction: 0.1,
            damping: 0.9,
        }
    }
}

impl ForceOptions {
    /// Softened parameters for the relaxation pass after organic jitter.
    pub fn organic() -> Self {
        Self {
            iterations: 20,
            repulsion: 500.0,
            attraction: 0.05,
            damping: 0.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    /// Overrides the algorithm implied by the diagram type.
    pub algorithm: Option<Algorithm>,
    pub direction: Direction,
    pub spacing: Spacing,
    pub alignment: Option<Alignment>,
    pub padding: f32,
    pub center: Point,
    pub force: ForceOptions,
    pub seed: Option<u64>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            algorithm: None,
            direction: Direction::Down,
            spacing: Spacing::default(),
            alignment: None,
            padding: DEFAULT_PADDING,
            center: Point::new(400.0, 300.0),
            force: ForceOptions::default(),
            seed: None,
        }
    }
}

impl LayoutConfig {
    pub fn algorithm_for(&self, kind: &DiagramType) -> Algorithm {
        self.algorithm.unwrap_or_else(|| Algorithm::for_diagram(kind))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("spacing.horizontal", self.spacing.horizontal as f64)?;
        check_range("spacing.vertical", self.spacing.vertical as f64)?;
        check_range("spacing.node", self.spacing.node as f64)?;
        check_range("padding", self.padding as f64)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AutoLayoutConfig {
    pub enabled: bool,
    pub on_node_add: bool,
    pub on_node_remove: bool,
    pub on_node_resize: bool,
    pub on_edge_add: bool,
    pub on_edge_remove: bool,
    pub debounce_ms: u64,
}

impl Default for AutoLayoutConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            on_node_add: true,
            on_node_remove: true,
            on_node_resize: false,
            on_edge_add: true,
            on_edge_remove: true,
            debounce_ms: 300,
        }
    }
}

impl AutoLayoutConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

const SPACING_FIELDS: [(&str, &str); 3] = [
    ("horizontal", "spacing.horizontal"),
    ("vertical", "spacing.vertical"),
    ("node", "spacing.node"),
];

/// Pre-flight check run before a layout call. The spacing triple has to be
/// spelled out explicitly; every other field falls back to its default.
pub fn validate_layout_config(value: &Value) -> Result<LayoutConfig, ConfigError> {
    let object = value.as_object().ok_or(ConfigError::NotAnObject)?;
    let spacing = object
        .get("spacing")
        .ok_or(ConfigError::Missing("spacing"))?;
    let spacing = spacing.as_object().ok_or_else(|| ConfigError::NotNumeric {
        field: "spacing",
        found: describe(spacing),
    })?;
    for (key, field) in SPACING_FIELDS {
        let raw = spacing.get(key).ok_or(ConfigError::Missing(field))?;
        let number = raw.as_f64().ok_or_else(|| ConfigError::NotNumeric {
            field,
            found: describe(raw),
        })?;
        check_range(field, number)?;
    }
    let config: LayoutConfig = serde_json::from_value(value.clone())?;
    config.validate()?;
    Ok(config)
}

pub fn load_config(path: &Path) -> anyhow::Result<LayoutConfig> {
    let contents = std::fs::read_to_string(path)?;
    let value: Value = json5::from_str(&contents)?;
    Ok(validate_layout_config(&value)?)
}

fn check_range(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, value })
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "a boolean".to_string(),
        Value::Number(_) => "a number".to_string(),
        Value::String(s) => format!("string {s:?}"),
        Value::Array(_) => "an array".to_string(),
        Value::Object(_) => "an object".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn direction_aliases_share_one_table() {
        assert_eq!(Direction::parse("vertical"), Direction::Down);
        assert_eq!(Direction::parse("top-bottom"), Direction::Down);
        assert_eq!(Direction::parse("horizontal"), Direction::Right);
        assert_eq!(Direction::parse("left-right"), Direction::Right);
        assert_eq!(Direction::parse("bottom-top"), Direction::Up);
        assert_eq!(Direction::parse("right-left"), Direction::Left);
        assert_eq!(Direction::parse("diagonal"), Direction::Down);
    }

    #[test]
    fn diagram_type_picks_algorithm() {
        assert_eq!(Algorithm::for_diagram(&DiagramType::Flowchart), Algorithm::Force);
        assert_eq!(Algorithm::for_diagram(&DiagramType::OrgChart), Algorithm::Tree);
        assert_eq!(Algorithm::for_diagram(&DiagramType::MindMap), Algorithm::Organic);
        assert_eq!(
            Algorithm::for_diagram(&DiagramType::Other("kanban".into())),
            Algorithm::Force
        );
        let config = LayoutConfig {
            algorithm: Some(Algorithm::Grid),
            ..Default::default()
        };
        assert_eq!(config.algorithm_for(&DiagramType::OrgChart), Algorithm::Grid);
    }

    #[test]
    fn validator_accepts_complete_spacing() {
        let config = validate_layout_config(&json!({
            "direction": "horizontal",
            "spacing": { "horizontal": 80, "vertical": 60.5, "node": 20 },
            "alignment": "center"
        }))
        .unwrap();
        assert_eq!(config.direction, Direction::Right);
        assert_eq!(config.spacing.vertical, 60.5);
        assert_eq!(config.alignment, Some(Alignment::Center));
        assert_eq!(config.padding, DEFAULT_PADDING);
        assert_eq!(config.force, ForceOptions::default());
    }

    #[test]
    fn validator_rejects_missing_or_mistyped_spacing() {
        let missing = validate_layout_config(&json!({ "direction": "lr" }));
        assert!(matches!(missing, Err(ConfigError::Missing("spacing"))));

        let partial = validate_layout_config(&json!({
            "spacing": { "horizontal": 10, "vertical": 10 }
        }));
        assert!(matches!(partial, Err(ConfigError::Missing("spacing.node"))));

        let mistyped = validate_layout_config(&json!({
            "spacing": { "horizontal": "wide", "vertical": 10, "node": 10 }
        }));
        assert!(matches!(
            mistyped,
            Err(ConfigError::NotNumeric { field: "spacing.horizontal", .. })
        ));

        let negative = validate_layout_config(&json!({
            "spacing": { "horizontal": 10, "vertical": -1, "node": 10 }
        }));
        assert!(matches!(
            negative,
            Err(ConfigError::OutOfRange { field: "spacing.vertical", .. })
        ));

        assert!(matches!(
            validate_layout_config(&json!([1, 2])),
            Err(ConfigError::NotAnObject)
        ));
    }

    #[test]
    fn auto_layout_defaults() {
        let config = AutoLayoutConfig::default();
        assert!(config.enabled);
        assert!(!config.on_node_resize);
        assert_eq!(config.debounce(), Duration::from_millis(300));
    }

    #[test]
    fn load_config_reads_json5() {
        let dir = std::env::temp_dir().join(format!("diagram-layout-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("layout.json5");
        std::fs::write(
            &path,
            "{\n  // editor defaults\n  direction: 'bottom-top',\n  spacing: { horizontal: 30, vertical: 40, node: 10, },\n}\n",
        )
        .unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.direction, Direction::Up);
        assert_eq!(config.spacing.node, 10.0);
        std::fs::remove_dir_all(&dir).ok();
    }
}
