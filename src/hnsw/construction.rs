//! HNSW graph construction algorithm.

use crate::distance::{l2_distance_squared, row};
use crate::hnsw::graph::{HnswIndex, Layer, Neighbors};
use crate::hnsw::search::greedy_search_layer;
use crate::{PyramidError, Result};
use tracing::debug;

/// Select neighbors using RND (Relative Neighborhood Diversification).
///
/// Criterion: include candidate \(X_j\) if it is closer to the query than it is to
/// every already-selected neighbor \(X_i\). Remaining slots are then filled with the
/// closest rejected candidates so sparse regions still get `m` edges.
pub(crate) fn select_neighbors(
    candidates: &[(u32, f32)],
    m: usize,
    vectors: &[f32],
    dimension: usize,
) -> Vec<u32> {
    if candidates.is_empty() || m == 0 {
        return Vec::new();
    }

    let mut sorted: Vec<(u32, f32)> = candidates.to_vec();
    sorted.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

    let mut selected: Vec<u32> = Vec::with_capacity(m.min(sorted.len()));
    let mut rejected: Vec<u32> = Vec::new();

    for &(candidate_id, query_to_candidate) in &sorted {
        if selected.len() >= m {
            break;
        }
        let candidate_vec = row(vectors, dimension, candidate_id as usize);
        let diverse = selected.iter().all(|&selected_id| {
            let selected_vec = row(vectors, dimension, selected_id as usize);
            query_to_candidate < l2_distance_squared(selected_vec, candidate_vec)
        });
        if diverse {
            selected.push(candidate_id);
        } else {
            rejected.push(candidate_id);
        }
    }

    // `rejected` is already in ascending distance order.
    for id in rejected {
        if selected.len() >= m {
            break;
        }
        selected.push(id);
    }

    selected
}

/// Trim a node's adjacency list to `max_degree` entries with the same RND rule
/// used at insertion, so long edges bridging separated groups survive.
fn shrink_neighbors(
    node: u32,
    neighbors: &mut Neighbors,
    max_degree: usize,
    vectors: &[f32],
    dimension: usize,
) {
    if neighbors.len() <= max_degree {
        return;
    }
    let node_vec = row(vectors, dimension, node as usize);
    let scored: Vec<(u32, f32)> = neighbors
        .iter()
        .map(|&id| {
            let v = row(vectors, dimension, id as usize);
            (id, l2_distance_squared(node_vec, v))
        })
        .collect();
    *neighbors = select_neighbors(&scored, max_degree, vectors, dimension)
        .into_iter()
        .collect();
}

/// Make every node reachable from `entry_point` on the base layer.
///
/// Pruning can still strand a group of nodes. Each stranded node found in id
/// order is linked both ways to its nearest already-reachable node, then its
/// own component is absorbed. Returns the number of links added.
pub(crate) fn connect_unreachable(index: &mut HnswIndex) -> usize {
    let n = index.num_vectors;
    if n == 0 || index.layers.is_empty() {
        return 0;
    }
    let entry = index.entry_point;
    let dimension = index.dimension;
    let vectors = &index.vectors;
    let neighbors = index.layers[0].get_neighbors_mut();

    let mut reached = vec![false; n];
    let mut reached_ids: Vec<u32> = Vec::with_capacity(n);
    let mut stack = vec![entry];
    reached[entry as usize] = true;
    reached_ids.push(entry);

    let mut links = 0;
    let mut cursor = 0;
    loop {
        while let Some(node) = stack.pop() {
            for &next in &neighbors[node as usize] {
                if !reached[next as usize] {
                    reached[next as usize] = true;
                    reached_ids.push(next);
                    stack.push(next);
                }
            }
        }

        while cursor < n && reached[cursor] {
            cursor += 1;
        }
        if cursor == n {
            break;
        }

        let orphan = cursor as u32;
        let orphan_vec = row(vectors, dimension, cursor);
        let anchor = reached_ids
            .iter()
            .map(|&id| {
                let v = row(vectors, dimension, id as usize);
                (id, l2_distance_squared(orphan_vec, v))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
            .map_or(entry, |(id, _)| id);

        neighbors[anchor as usize].push(orphan);
        if !neighbors[cursor].contains(&anchor) {
            neighbors[cursor].push(anchor);
        }
        links += 1;

        reached[cursor] = true;
        reached_ids.push(orphan);
        stack.push(orphan);
    }
    links
}

/// Construct HNSW graph layers.
///
/// Implements the insertion algorithm from the HNSW paper (Malkov & Yashunin, 2018),
/// offline: vectors are already stored and levels already assigned, nodes are
/// inserted in id order.
///
/// When descending through layers, the closest node found in the layer above is the
/// entry point for the next layer.
pub(crate) fn construct_graph(index: &mut HnswIndex) -> Result<()> {
    if index.num_vectors == 0 {
        return Err(PyramidError::EmptyIndex);
    }

    let max_layer = index.layer_assignments.iter().max().copied().unwrap_or(0) as usize;
    index.layers = (0..=max_layer)
        .map(|_| Layer::new(index.num_vectors))
        .collect();

    // The entry point must always be an already-inserted node.
    let mut global_entry_point = 0u32;
    let mut global_entry_layer = index.layer_assignments[0] as usize;

    for current_id in 1..index.num_vectors {
        let current_layer = index.layer_assignments[current_id] as usize;
        let current_vector = index.get_vector(current_id).to_vec();
        let mut layer_entry_point = global_entry_point;

        // 1) Greedy descent (ef=1) through layers above the node's own level.
        if global_entry_layer > current_layer {
            for layer_idx in ((current_layer + 1)..=global_entry_layer).rev() {
                let closest = greedy_search_layer(
                    &current_vector,
                    &[layer_entry_point],
                    &index.layers[layer_idx],
                    &index.vectors,
                    index.dimension,
                    1,
                );
                if let Some(&(best_id, _)) = closest.first() {
                    layer_entry_point = best_id;
                }
            }
        }

        // 2) Connect on every layer the node shares with the current graph.
        for layer_idx in (0..=current_layer.min(global_entry_layer)).rev() {
            let candidates = greedy_search_layer(
                &current_vector,
                &[layer_entry_point],
                &index.layers[layer_idx],
                &index.vectors,
                index.dimension,
                index.params.ef_construction,
            );
            if let Some(&(best_id, _)) = candidates.first() {
                layer_entry_point = best_id;
            }

            let selected = select_neighbors(
                &candidates,
                index.params.m,
                &index.vectors,
                index.dimension,
            );
            let max_degree = index.params.max_neighbors(layer_idx);

            let vectors = &index.vectors;
            let dimension = index.dimension;
            let neighbors = index.layers[layer_idx].get_neighbors_mut();
            neighbors[current_id] = selected.iter().copied().collect();
            for &neighbor_id in &selected {
                let reverse = &mut neighbors[neighbor_id as usize];
                if !reverse.contains(&(current_id as u32)) {
                    reverse.push(current_id as u32);
                }
                shrink_neighbors(neighbor_id, reverse, max_degree, vectors, dimension);
            }
        }

        // 3) A node with a new top level becomes the entry point.
        if current_layer > global_entry_layer {
            global_entry_point = current_id as u32;
            global_entry_layer = current_layer;
        }
    }

    index.entry_point = global_entry_point;

    let links = connect_unreachable(index);
    if links > 0 {
        debug!(links, "linked unreachable base-layer nodes");
    }
    Ok(())
}
