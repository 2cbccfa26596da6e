//! HNSW layer search.

use crate::distance::{l2_distance_squared, row};
use crate::hnsw::graph::Layer;
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet};

/// Node paired with its distance to the query.
///
/// Ordered by distance, then id, so heap operations are deterministic on ties.
#[derive(Clone, Copy, PartialEq)]
pub(crate) struct Candidate {
    pub(crate) id: u32,
    pub(crate) distance: f32,
}

impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // total_cmp gives IEEE 754 total ordering (NaN-safe)
        self.distance
            .total_cmp(&other.distance)
            .then(self.id.cmp(&other.id))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Beam search in a single layer.
///
/// Standard HNSW search from Malkov & Yashunin:
/// - min-heap of candidates (explore closest first)
/// - max-heap of results (track worst result for pruning)
/// - stop once the best unexplored candidate is worse than the worst result
///
/// Returns up to `ef` nodes reachable from any of `entry_points`, ascending by
/// distance. The beam only stops early once `ef` results are held, so fewer than
/// `ef` results means every reachable node was returned.
pub(crate) fn greedy_search_layer(
    query: &[f32],
    entry_points: &[u32],
    layer: &Layer,
    vectors: &[f32],
    dimension: usize,
    ef: usize,
) -> Vec<(u32, f32)> {
    let ef = ef.max(1);
    let mut candidates: BinaryHeap<Reverse<Candidate>> = BinaryHeap::with_capacity(ef * 2);
    let mut results: BinaryHeap<Candidate> = BinaryHeap::with_capacity(ef + 1);
    let mut visited: HashSet<u32> = HashSet::with_capacity(ef * 2);

    for &entry_point in entry_points {
        if !visited.insert(entry_point) {
            continue;
        }
        let entry = Candidate {
            id: entry_point,
            distance: l2_distance_squared(query, row(vectors, dimension, entry_point as usize)),
        };
        candidates.push(Reverse(entry));
        results.push(entry);
        if results.len() > ef {
            results.pop();
        }
    }

    while let Some(Reverse(candidate)) = candidates.pop() {
        let worst = results.peek().map(|r| r.distance).unwrap_or(f32::INFINITY);
        if candidate.distance > worst && results.len() >= ef {
            break;
        }

        for &neighbor_id in layer.get_neighbors(candidate.id) {
            if !visited.insert(neighbor_id) {
                continue;
            }
            let distance =
                l2_distance_squared(query, row(vectors, dimension, neighbor_id as usize));
            let worst = results.peek().map(|r| r.distance).unwrap_or(f32::INFINITY);
            if results.len() < ef || distance < worst {
                let next = Candidate {
                    id: neighbor_id,
                    distance,
                };
                candidates.push(Reverse(next));
                results.push(next);
                if results.len() > ef {
                    results.pop();
                }
            }
        }
    }

    results
        .into_sorted_vec()
        .into_iter()
        .map(|c| (c.id, c.distance))
        .collect()
}
