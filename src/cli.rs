use crate::config::{Algorithm, Direction, LayoutConfig, load_config};
use crate::ir::DiagramData;
use crate::layout::{EngineKind, LayoutManager};
use crate::layout_dump::write_layout_dump;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dlay", version, about = "Lay out a diagram (nodes + edges) and print positions")]
pub struct Args {
    /// Input diagram JSON or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file for the layout dump. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Layout engine
    #[arg(short = 'e', long = "engine", value_enum, default_value = "auto")]
    pub engine: EngineArg,

    /// Layout config file (JSON or JSON5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Algorithm for the auto engine, overriding the diagram type
    #[arg(short = 'a', long = "algorithm", value_enum)]
    pub algorithm: Option<AlgorithmArg>,

    /// Flow direction for dagre/layered (top-bottom, left-right, ...)
    #[arg(short = 'd', long = "direction")]
    pub direction: Option<String>,

    /// Seed for the organic layout jitter
    #[arg(long = "seed")]
    pub seed: Option<u64>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum EngineArg {
    Dagre,
    Layered,
    None,
    Auto,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum AlgorithmArg {
    Force,
    Circular,
    Tree,
    Grid,
    Organic,
}

impl From<AlgorithmArg> for Algorithm {
    fn from(value: AlgorithmArg) -> Self {
        match value {
            AlgorithmArg::Force => Algorithm::Force,
            AlgorithmArg::Circular => Algorithm::Circular,
            AlgorithmArg::Tree => Algorithm::Tree,
            AlgorithmArg::Grid => Algorithm::Grid,
            AlgorithmArg::Organic => Algorithm::Organic,
        }
    }
}

pub fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = resolve_config(&args)?;
    let input = read_input(args.input.as_deref())?;
    let data: DiagramData = serde_json::from_str(&input)?;

    let manager = LayoutManager::new(config);
    let (laid_out, report) = match args.engine {
        EngineArg::Auto => manager.auto_layout_with_report(&data),
        EngineArg::Dagre => manager.apply_layout_with_report(&data, EngineKind::Dagre),
        EngineArg::Layered => manager.apply_layout_with_report(&data, EngineKind::Layered),
        EngineArg::None => manager.apply_layout_with_report(&data, EngineKind::None),
    };
    if report.failed_open {
        tracing::warn!(engine = %report.engine, "layout failed; positions left unchanged");
    }
    write_layout_dump(args.output.as_deref(), &laid_out, &report)
}

fn resolve_config(args: &Args) -> Result<LayoutConfig> {
    let mut config = match args.config.as_deref() {
        Some(path) => load_config(path)?,
        None => LayoutConfig::default(),
    };
    if let Some(algorithm) = args.algorithm {
        config.algorithm = Some(algorithm.into());
    }
    if let Some(direction) = args.direction.as_deref() {
        config.direction = Direction::parse(direction);
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    Ok(config)
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return Ok(std::fs::read_to_string(path)?);
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}
