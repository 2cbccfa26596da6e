//! Ranked search results and merging of per-partition candidate lists.

use crate::ann::AnnIndex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{trace, warn};

/// Id carried by an unused result slot.
pub const SENTINEL_ID: i64 = -1;

/// One ranked neighbor: a global id and its squared L2 distance to the query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub id: i64,
    pub distance: f32,
}

impl Hit {
    /// Filler for slots with no candidate.
    pub const SENTINEL: Hit = Hit {
        id: SENTINEL_ID,
        distance: f32::INFINITY,
    };

    pub fn new(id: u32, distance: f32) -> Self {
        Self {
            id: id as i64,
            distance,
        }
    }

    #[inline]
    pub fn is_sentinel(&self) -> bool {
        self.id < 0
    }
}

/// Ascending distance, ties by ascending id.
#[inline]
pub fn rank_order(a: &Hit, b: &Hit) -> Ordering {
    a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id))
}

/// Exactly `k` slots, ranked, with sentinels filling any unused tail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    hits: Vec<Hit>,
}

impl SearchResult {
    /// `k` sentinel slots.
    pub fn sentinel(k: usize) -> Self {
        Self {
            hits: vec![Hit::SENTINEL; k],
        }
    }

    /// Take up to `k` entries of an already ranked list and pad to `k`.
    pub fn from_ranked(mut ranked: Vec<Hit>, k: usize) -> Self {
        ranked.truncate(k);
        ranked.resize(k, Hit::SENTINEL);
        Self { hits: ranked }
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn hits(&self) -> &[Hit] {
        &self.hits
    }

    pub fn into_hits(self) -> Vec<Hit> {
        self.hits
    }

    /// Ids of every slot, sentinels included.
    pub fn ids(&self) -> Vec<i64> {
        self.hits.iter().map(|h| h.id).collect()
    }

    /// Non-sentinel entries, in rank order.
    pub fn valid(&self) -> impl Iterator<Item = &Hit> {
        self.hits.iter().filter(|h| !h.is_sentinel())
    }

    pub fn num_valid(&self) -> usize {
        self.valid().count()
    }
}

impl<'a> IntoIterator for &'a SearchResult {
    type Item = &'a Hit;
    type IntoIter = std::slice::Iter<'a, Hit>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.iter()
    }
}

/// Sort a candidate pool and keep the best `k`.
pub(crate) fn rank_candidates(mut pool: Vec<Hit>, k: usize) -> Vec<Hit> {
    pool.sort_unstable_by(rank_order);
    pool.truncate(k);
    pool
}

/// Merge ranked candidate lists into one globally ranked list.
///
/// Sentinel entries are dropped first. The output has `min(k, valid)` entries,
/// ascending by distance with ascending-id tie-break. `k == 0` yields nothing.
pub fn merge_results(lists: &[Vec<Hit>], k: usize) -> Vec<Hit> {
    if k == 0 {
        return Vec::new();
    }
    let pool: Vec<Hit> = lists
        .iter()
        .flatten()
        .filter(|h| !h.is_sentinel())
        .copied()
        .collect();
    trace!(lists = lists.len(), pool = pool.len(), k, "merging candidates");
    rank_candidates(pool, k)
}

/// Run a k-NN search against an optional index and wrap the ids as hits.
///
/// A missing index or `k == 0` gives an empty list, as does a failing search.
pub fn search_index(index: Option<&dyn AnnIndex>, query: &[f32], k: usize) -> Vec<Hit> {
    let Some(index) = index else {
        return Vec::new();
    };
    if k == 0 {
        return Vec::new();
    }
    match index.search(query, k) {
        Ok(results) => results
            .into_iter()
            .map(|(id, distance)| Hit::new(id, distance))
            .collect(),
        Err(err) => {
            warn!(error = %err, algorithm = index.algorithm(), "index search failed");
            Vec::new()
        }
    }
}

/// Find the `num_partitions` partitions whose centroids are nearest to `query`.
///
/// `routing` holds one point per partition, so hit ids are partition ids.
pub fn find_partitions(
    routing: Option<&dyn AnnIndex>,
    query: &[f32],
    num_partitions: usize,
) -> Vec<Hit> {
    search_index(routing, query, num_partitions)
}
