use std::collections::{HashMap, HashSet};

use super::error::LayoutError;
use super::ranking::{Link, collect_links, compute_ranks, sweep_order};
use super::{LayoutEngine, LayoutOutcome, fail_open};
use crate::config::{Alignment, LayoutConfig};
use crate::geometry::Point;
use crate::ir::{Edge, Node};

const ORDER_PASSES: usize = 4;
const PLACEMENT_SWEEPS: usize = 2;

/// Constraint-graph engine: an in-process layered solver. Ranks come from a
/// longest-path pass, orders from median sweeps, and cross-axis positions
/// from barycenters with a minimum gap. The solver reports top-left corners.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayeredEngine;

impl LayoutEngine for LayeredEngine {
    fn name(&self) -> &'static str {
        "layered"
    }

    fn layout(&self, nodes: &[Node], edges: &[Edge], config: &LayoutConfig) -> LayoutOutcome {
        let positions = match solve(nodes, edges, config) {
            Ok(positions) => positions,
            Err(error) => return fail_open(self.name(), nodes, error),
        };
        let mut placed = nodes.to_vec();
        for node in &mut placed {
            if let Some(point) = positions.get(&node.id) {
                node.set_position(*point);
            }
        }
        LayoutOutcome::Applied(placed)
    }
}

#[derive(Debug, Clone, Copy)]
struct Size {
    main: f32,
    cross: f32,
}

fn solve(
    nodes: &[Node],
    edges: &[Edge],
    config: &LayoutConfig,
) -> Result<HashMap<String, Point>, LayoutError> {
    if nodes.is_empty() {
        return Ok(HashMap::new());
    }
    let horizontal = config.direction.is_horizontal();
    let node_ids: Vec<String> = nodes.iter().map(|n| n.id.clone()).collect();
    let node_set: HashSet<&str> = node_ids.iter().map(String::as_str).collect();
    let links = collect_links(&node_set, edges);
    let ranks = compute_ranks(&node_ids, &links);
    let max_rank = ranks.values().copied().max().unwrap_or(0);

    let mut sizes: HashMap<String, Size> = HashMap::new();
    for node in nodes {
        let size = if horizontal {
            Size {
                main: node.width,
                cross: node.height,
            }
        } else {
            Size {
                main: node.height,
                cross: node.width,
            }
        };
        sizes.insert(node.id.clone(), size);
    }

    let mut order_map: HashMap<String, usize> = node_ids
        .iter()
        .enumerate()
        .map(|(idx, id)| (id.clone(), idx))
        .collect();
    let mut rank_nodes: Vec<Vec<String>> = vec![Vec::new(); max_rank + 1];
    for id in &node_ids {
        let rank = ranks.get(id).copied().unwrap_or(0);
        rank_nodes[rank].push(id.clone());
    }

    // Links spanning several ranks are routed through zero-size dummies so
    // ordering sees every rank they cross.
    let mut expanded: Vec<Link> = Vec::new();
    let mut dummy_counter = 0usize;
    for (from, to) in &links {
        let (Some(&from_rank), Some(&to_rank)) = (ranks.get(from), ranks.get(to)) else {
            continue;
        };
        if to_rank <= from_rank {
            continue;
        }
        let mut prev = from.clone();
        for step in 1..(to_rank - from_rank) {
            let dummy_id = format!("__dummy_{dummy_counter}__");
            dummy_counter += 1;
            order_map.insert(dummy_id.clone(), order_map.len());
            sizes.insert(
                dummy_id.clone(),
                Size {
                    main: 0.0,
                    cross: 0.0,
                },
            );
            rank_nodes[from_rank + step].push(dummy_id.clone());
            expanded.push((prev, dummy_id.clone()));
            prev = dummy_id;
        }
        expanded.push((prev, to.clone()));
    }

    sweep_order(&mut rank_nodes, &expanded, &order_map, ORDER_PASSES);

    let main_pos = assign_main_axis(&rank_nodes, &sizes, config);
    let cross_center = assign_cross_axis(&rank_nodes, &sizes, &expanded, config.spacing.node);

    let mut positions = HashMap::with_capacity(nodes.len());
    for node in nodes {
        let size = sizes[&node.id];
        let main = main_pos.get(&node.id).copied().unwrap_or(0.0);
        let cross = cross_center.get(&node.id).copied().unwrap_or(0.0) - size.cross / 2.0;
        if !main.is_finite() || !cross.is_finite() {
            return Err(LayoutError::NonFinite {
                engine: "layered",
                node: node.id.clone(),
            });
        }
        let point = if horizontal {
            Point::new(main, cross)
        } else {
            Point::new(cross, main)
        };
        positions.insert(node.id.clone(), point);
    }
    Ok(positions)
}

/// Rank bands along the flow axis. Within a band, nodes smaller than the
/// band are shifted by the alignment factor.
fn assign_main_axis(
    rank_nodes: &[Vec<String>],
    sizes: &HashMap<String, Size>,
    config: &LayoutConfig,
) -> HashMap<String, f32> {
    let align = config.alignment.unwrap_or(Alignment::Start).factor();
    let gap = config.spacing.rank_gap(config.direction);
    let mut positions = HashMap::new();
    let mut cursor = 0.0f32;
    for bucket in rank_nodes {
        let band = bucket
            .iter()
            .filter_map(|id| sizes.get(id))
            .map(|size| size.main)
            .fold(0.0f32, f32::max);
        for id in bucket {
            let main = sizes.get(id).map(|size| size.main).unwrap_or(0.0);
            positions.insert(id.clone(), cursor + (band - main) * align);
        }
        cursor += band + gap;
    }

    if config.direction.is_reversed() {
        let total = (cursor - gap).max(0.0);
        for (id, pos) in positions.iter_mut() {
            let main = sizes.get(id).map(|size| size.main).unwrap_or(0.0);
            *pos = total - *pos - main;
        }
    }
    positions
}

/// Barycentric placement: each node wants the mean center of its placed
/// neighbors, then the rank is packed left to right with `node_gap` between
/// neighbors and shifted back so its mean matches the desired mean.
fn assign_cross_axis(
    rank_nodes: &[Vec<String>],
    sizes: &HashMap<String, Size>,
    links: &[Link],
    node_gap: f32,
) -> HashMap<String, f32> {
    let mut incoming: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut outgoing: HashMap<&str, Vec<&str>> = HashMap::new();
    for (from, to) in links {
        incoming.entry(to.as_str()).or_default().push(from.as_str());
        outgoing.entry(from.as_str()).or_default().push(to.as_str());
    }

    let mut cross_pos: HashMap<String, f32> = HashMap::new();
    let place_rank = |bucket: &[String], use_incoming: bool, cross_pos: &mut HashMap<String, f32>| {
        if bucket.is_empty() {
            return;
        }
        let neighbors = if use_incoming { &incoming } else { &outgoing };
        let mut entries: Vec<(&str, f32, f32)> = Vec::with_capacity(bucket.len());
        for id in bucket {
            let mut sum = 0.0;
            let mut count = 0.0;
            for neighbor in neighbors.get(id.as_str()).map(Vec::as_slice).unwrap_or(&[]) {
                if let Some(center) = cross_pos.get(*neighbor) {
                    sum += *center;
                    count += 1.0;
                }
            }
            let desired = if count > 0.0 {
                sum / count
            } else {
                cross_pos.get(id.as_str()).copied().unwrap_or(0.0)
            };
            let half = sizes.get(id).map(|size| size.cross / 2.0).unwrap_or(0.0);
            entries.push((id.as_str(), desired, half));
        }

        // Keep the median order; only the coordinates move.
        let desired_mean = entries.iter().map(|(_, d, _)| *d).sum::<f32>() / entries.len() as f32;
        let mut assigned: Vec<(&str, f32)> = Vec::with_capacity(entries.len());
        let mut prev: Option<(f32, f32)> = None;
        for (id, desired, half) in entries {
            let center = match prev {
                Some((prev_center, prev_half)) => desired.max(prev_center + prev_half + half + node_gap),
                None => desired,
            };
            assigned.push((id, center));
            prev = Some((center, half));
        }
        let actual_mean = assigned.iter().map(|(_, c)| *c).sum::<f32>() / assigned.len() as f32;
        let delta = desired_mean - actual_mean;
        for (id, center) in assigned {
            cross_pos.insert(id.to_string(), center + delta);
        }
    };

    for _ in 0..PLACEMENT_SWEEPS {
        for bucket in rank_nodes {
            place_rank(bucket.as_slice(), true, &mut cross_pos);
        }
        for bucket in rank_nodes.iter().rev() {
            place_rank(bucket.as_slice(), false, &mut cross_pos);
        }
    }
    cross_pos
}
