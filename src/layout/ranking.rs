use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Directed link between two node ids that both exist in the graph.
pub(super) type Link = (String, String);

/// Collect the links a layered solver should see: both endpoints present,
/// no self loops, duplicates collapsed.
pub(super) fn collect_links(node_set: &HashSet<&str>, edges: &[crate::ir::Edge]) -> Vec<Link> {
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut links = Vec::new();
    for edge in edges {
        let (from, to) = (edge.source.as_str(), edge.target.as_str());
        if from == to || !node_set.contains(from) || !node_set.contains(to) {
            continue;
        }
        if seen.insert((from, to)) {
            links.push((from.to_string(), to.to_string()));
        }
    }
    links
}

/// Median-heuristic crossing reduction. Every pass sweeps down, keying each
/// layer on its neighbors in the layer above, then back up against the layer
/// below. Ties keep the current slot, then declaration order.
pub(super) fn sweep_order(
    layers: &mut [Vec<String>],
    links: &[Link],
    declared: &HashMap<String, usize>,
    passes: usize,
) {
    if layers.len() < 2 {
        return;
    }
    let mut above: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut below: HashMap<&str, Vec<&str>> = HashMap::new();
    for (from, to) in links {
        below.entry(from.as_str()).or_default().push(to.as_str());
        above.entry(to.as_str()).or_default().push(from.as_str());
    }

    for _ in 0..passes.max(1) {
        for idx in 1..layers.len() {
            let (fixed, rest) = layers.split_at_mut(idx);
            reorder_layer(&mut rest[0], &fixed[idx - 1], &above, declared);
        }
        for idx in (0..layers.len() - 1).rev() {
            let (head, tail) = layers.split_at_mut(idx + 1);
            reorder_layer(&mut head[idx], &tail[0], &below, declared);
        }
    }
}

fn reorder_layer(
    layer: &mut Vec<String>,
    fixed: &[String],
    neighbors: &HashMap<&str, Vec<&str>>,
    declared: &HashMap<String, usize>,
) {
    if layer.len() < 2 {
        return;
    }
    let fixed_slot: HashMap<&str, usize> = fixed
        .iter()
        .enumerate()
        .map(|(slot, id)| (id.as_str(), slot))
        .collect();
    let mut keyed: Vec<(f32, usize, usize, String)> = layer
        .drain(..)
        .enumerate()
        .map(|(slot, id)| {
            let key = neighbors
                .get(id.as_str())
                .and_then(|list| median_slot(list.iter().filter_map(|n| fixed_slot.get(n).copied())))
                .unwrap_or(slot as f32);
            let order = declared.get(&id).copied().unwrap_or(usize::MAX);
            (key, slot, order, id)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));
    layer.extend(keyed.into_iter().map(|(.., id)| id));
}

/// Median of the neighbor slots; the mean of the middle pair for even counts.
fn median_slot(slots: impl Iterator<Item = usize>) -> Option<f32> {
    let mut slots: Vec<usize> = slots.collect();
    if slots.is_empty() {
        return None;
    }
    slots.sort_unstable();
    let mid = slots.len() / 2;
    if slots.len() % 2 == 1 {
        Some(slots[mid] as f32)
    } else {
        Some((slots[mid - 1] + slots[mid]) as f32 / 2.0)
    }
}

/// Longest-path ranks over a topological order. Cycles are broken by
/// promoting the earliest declared unprocessed node to a source and treating
/// its incoming links as back-edges.
pub(super) fn compute_ranks(node_ids: &[String], links: &[Link]) -> HashMap<String, usize> {
    let mut adj: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut indeg: HashMap<&str, usize> = node_ids.iter().map(|id| (id.as_str(), 0)).collect();
    for (from, to) in links {
        adj.entry(from.as_str()).or_default().push(to.as_str());
        if let Some(deg) = indeg.get_mut(to.as_str()) {
            *deg += 1;
        }
    }

    let order_key: HashMap<&str, usize> = node_ids
        .iter()
        .enumerate()
        .map(|(idx, id)| (id.as_str(), idx))
        .collect();

    let mut ready: BinaryHeap<Reverse<(usize, &str)>> = BinaryHeap::new();
    for id in node_ids {
        if indeg.get(id.as_str()).copied().unwrap_or(0) == 0 {
            ready.push(Reverse((order_key[id.as_str()], id.as_str())));
        }
    }

    let mut order: Vec<&str> = Vec::with_capacity(node_ids.len());
    let mut processed: HashSet<&str> = HashSet::new();
    loop {
        while let Some(Reverse((_key, id))) = ready.pop() {
            if !processed.insert(id) {
                continue;
            }
            order.push(id);
            for next in adj.get(id).map(Vec::as_slice).unwrap_or(&[]) {
                if processed.contains(next) {
                    continue;
                }
                if let Some(deg) = indeg.get_mut(next) {
                    *deg = deg.saturating_sub(1);
                    if *deg == 0 {
                        ready.push(Reverse((order_key[next], *next)));
                    }
                }
            }
        }

        if processed.len() >= node_ids.len() {
            break;
        }

        let Some(next) = node_ids.iter().find(|id| !processed.contains(id.as_str())) else {
            break;
        };
        ready.push(Reverse((order_key[next.as_str()], next.as_str())));
    }

    let order_index: HashMap<&str, usize> =
        order.iter().enumerate().map(|(idx, id)| (*id, idx)).collect();

    let mut ranks: HashMap<String, usize> = HashMap::new();
    for node in &order {
        let rank = *ranks.entry(node.to_string()).or_insert(0);
        let from_idx = order_index[node];
        for next in adj.get(node).map(Vec::as_slice).unwrap_or(&[]) {
            let to_idx = order_index.get(next).copied().unwrap_or(from_idx);
            if to_idx <= from_idx {
                continue;
            }
            let entry = ranks.entry(next.to_string()).or_insert(0);
            *entry = (*entry).max(rank + 1);
        }
    }

    ranks
}
