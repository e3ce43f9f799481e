pub mod auto_layout;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod geometry;
pub mod ir;
pub mod layout;
pub mod layout_dump;

pub use auto_layout::{AutoLayoutManager, ChangeKind, SubscriptionId};
#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{
    Algorithm, Alignment, AutoLayoutConfig, ConfigError, Direction, ForceOptions, LayoutConfig,
    Spacing, load_config, validate_layout_config,
};
pub use ir::{DiagramData, DiagramType, Edge, Node};
pub use layout::{
    EngineKind, LayoutBounds, LayoutEngine, LayoutError, LayoutManager, LayoutOutcome,
    compute_bounds,
};
