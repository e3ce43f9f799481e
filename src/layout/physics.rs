use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, VecDeque};
use std::f32::consts::PI;

use super::{LayoutEngine, LayoutOutcome};
use crate::config::{Algorithm, ForceOptions, LayoutConfig};
use crate::geometry::{Point, angle, clamp, distance, regular_polygon_points};
use crate::ir::{Edge, Node};

/// Safety box applied after every force step so a diverging simulation
/// cannot run off to infinity.
pub const POSITION_MIN: f32 = -1000.0;
pub const POSITION_MAX: f32 = 2000.0;

const CIRCLE_MAX_RADIUS: f32 = 300.0;
const CIRCLE_ARC_PER_NODE: f32 = 50.0;
const TREE_ROOT_SPACING: f32 = 200.0;
const TREE_ROOT_OFFSET: f32 = 200.0;
const TREE_SIBLING_SPACING: f32 = 150.0;
const TREE_LEVEL_SPACING: f32 = 100.0;
const GRID_CELL_WIDTH: f32 = 150.0;
const GRID_CELL_HEIGHT: f32 = 100.0;
const ORGANIC_JITTER: f32 = 15.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsOptions {
    pub algorithm: Algorithm,
    pub center: Point,
    pub force: ForceOptions,
    /// Seed for the organic jitter; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for PhysicsOptions {
    fn default() -> Self {
        Self::from_config(Algorithm::Force, &LayoutConfig::default())
    }
}

impl PhysicsOptions {
    pub fn from_config(algorithm: Algorithm, config: &LayoutConfig) -> Self {
        Self {
            algorithm,
            center: config.center,
            force: config.force,
            seed: config.seed,
        }
    }
}

/// One configured run of an in-process algorithm. Owns a copy of the nodes;
/// the caller's slice is never touched.
#[derive(Debug, Clone)]
pub struct PhysicsLayout {
    nodes: Vec<Node>,
    /// Edges resolved to node indices; dangling edges are dropped here.
    links: Vec<(usize, usize)>,
    options: PhysicsOptions,
}

impl PhysicsLayout {
    pub fn new(nodes: &[Node], edges: &[Edge], options: PhysicsOptions) -> Self {
        let index: HashMap<&str, usize> = nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (node.id.as_str(), idx))
            .collect();
        let links = edges
            .iter()
            .filter_map(|edge| {
                let source = *index.get(edge.source.as_str())?;
                let target = *index.get(edge.target.as_str())?;
                Some((source, target))
            })
            .collect();
        Self {
            nodes: nodes.to_vec(),
            links,
            options,
        }
    }

    pub fn layout(mut self) -> Vec<Node> {
        match self.options.algorithm {
            Algorithm::Force => {
                let params = self.options.force;
                self.force_directed(params);
            }
            Algorithm::Circular => self.circular(),
            Algorithm::Tree => self.tree(),
            Algorithm::Grid => self.grid(),
            Algorithm::Organic => {
                let mut rng = match self.options.seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                };
                self.organic(&mut rng);
            }
        }
        self.nodes
    }

    fn force_directed(&mut self, params: ForceOptions) {
        let count = self.nodes.len();
        let mut forces = vec![Point::ORIGIN; count];
        for _ in 0..params.iterations {
            forces.fill(Point::ORIGIN);

            for i in 0..count {
                for j in (i + 1)..count {
                    let from = self.nodes[i].position();
                    let to = self.nodes[j].position();
                    let d = distance(from, to);
                    let magnitude = params.repulsion / (d * d + 1.0);
                    let theta = angle(from, to);
                    let (fx, fy) = (magnitude * theta.cos(), magnitude * theta.sin());
                    forces[i].x -= fx;
                    forces[i].y -= fy;
                    forces[j].x += fx;
                    forces[j].y += fy;
                }
            }

            for &(source, target) in &self.links {
                let from = self.nodes[source].position();
                let to = self.nodes[target].position();
                let magnitude = params.attraction * distance(from, to);
                let theta = angle(from, to);
                let (fx, fy) = (magnitude * theta.cos(), magnitude * theta.sin());
                forces[source].x += fx;
                forces[source].y += fy;
                forces[target].x -= fx;
                forces[target].y -= fy;
            }

            for (node, force) in self.nodes.iter_mut().zip(&forces) {
                node.x = clamp(node.x + force.x * params.damping, POSITION_MIN, POSITION_MAX);
                node.y = clamp(node.y + force.y * params.damping, POSITION_MIN, POSITION_MAX);
            }
        }
    }

    fn circular(&mut self) {
        let count = self.nodes.len();
        let points = regular_polygon_points(self.options.center, circle_radius(count), count);
        for (node, point) in self.nodes.iter_mut().zip(points) {
            node.set_position(point);
        }
    }

    /// Breadth-first placement from every root. Roots are nodes nobody
    /// points at; a graph without one (every node on a cycle) falls back to
    /// the first node. Nodes reached twice keep their first slot, so cross
    /// and back edges collapse into a spanning tree. Nodes no root reaches
    /// keep their input position.
    fn tree(&mut self) {
        let count = self.nodes.len();
        if count == 0 {
            return;
        }
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); count];
        let mut has_parent = vec![false; count];
        for &(source, target) in &self.links {
            children[source].push(target);
            has_parent[target] = true;
        }
        let mut roots: Vec<usize> = (0..count).filter(|idx| !has_parent[*idx]).collect();
        if roots.is_empty() {
            roots.push(0);
        }

        let center = self.options.center;
        let span = (roots.len() - 1) as f32 * TREE_ROOT_SPACING;
        let mut placed = vec![false; count];
        for (slot, &root) in roots.iter().enumerate() {
            let x = center.x - span / 2.0 + slot as f32 * TREE_ROOT_SPACING;
            self.nodes[root].set_position(Point::new(x, center.y - TREE_ROOT_OFFSET));
            placed[root] = true;
        }

        let mut visited = vec![false; count];
        for &root in &roots {
            let mut queue = VecDeque::from([root]);
            while let Some(current) = queue.pop_front() {
                if visited[current] {
                    continue;
                }
                visited[current] = true;

                let mut fresh = Vec::new();
                for &child in &children[current] {
                    if !placed[child] {
                        placed[child] = true;
                        fresh.push(child);
                    }
                }
                if fresh.is_empty() {
                    continue;
                }
                let parent = self.nodes[current].position();
                let width = (fresh.len() - 1) as f32 * TREE_SIBLING_SPACING;
                for (slot, child) in fresh.into_iter().enumerate() {
                    let x = parent.x - width / 2.0 + slot as f32 * TREE_SIBLING_SPACING;
                    self.nodes[child].set_position(Point::new(x, parent.y + TREE_LEVEL_SPACING));
                    queue.push_back(child);
                }
            }
        }
    }

    fn grid(&mut self) {
        let count = self.nodes.len();
        if count == 0 {
            return;
        }
        let columns = grid_columns(count);
        let rows = count.div_ceil(columns);
        let center = self.options.center;
        let start_x = center.x - (columns - 1) as f32 * GRID_CELL_WIDTH / 2.0;
        let start_y = center.y - (rows - 1) as f32 * GRID_CELL_HEIGHT / 2.0;
        for (idx, node) in self.nodes.iter_mut().enumerate() {
            let (row, column) = (idx / columns, idx % columns);
            node.set_position(Point::new(
                start_x + column as f32 * GRID_CELL_WIDTH,
                start_y + row as f32 * GRID_CELL_HEIGHT,
            ));
        }
    }

    fn organic<R: Rng>(&mut self, rng: &mut R) {
        self.circular();
        for node in &mut self.nodes {
            node.x += rng.gen_range(-ORGANIC_JITTER..=ORGANIC_JITTER);
            node.y += rng.gen_range(-ORGANIC_JITTER..=ORGANIC_JITTER);
        }
        self.force_directed(ForceOptions::organic());
    }
}

/// Grows with the node count so neighbors stay roughly 50 units apart along
/// the arc, capped at 300.
pub fn circle_radius(count: usize) -> f32 {
    (count as f32 * CIRCLE_ARC_PER_NODE / (2.0 * PI)).min(CIRCLE_MAX_RADIUS)
}

/// `ceil(sqrt(count))`, computed in integers.
pub fn grid_columns(count: usize) -> usize {
    let mut columns = (count as f64).sqrt() as usize;
    while columns * columns < count {
        columns += 1;
    }
    columns.max(1)
}

/// Adapter exposing one in-process algorithm through [`LayoutEngine`].
#[derive(Debug, Clone, Copy)]
pub struct PhysicsEngine {
    algorithm: Algorithm,
}

impl PhysicsEngine {
    pub fn new(algorithm: Algorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }
}

impl LayoutEngine for PhysicsEngine {
    fn name(&self) -> &'static str {
        "physics"
    }

    fn layout(&self, nodes: &[Node], edges: &[Edge], config: &LayoutConfig) -> LayoutOutcome {
        let options = PhysicsOptions::from_config(self.algorithm, config);
        LayoutOutcome::Applied(PhysicsLayout::new(nodes, edges, options).layout())
    }
}
