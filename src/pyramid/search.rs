use super::PyramidIndex;
use crate::merge::{find_partitions, rank_candidates, Hit, SearchResult};
use crate::{PyramidError, Result};
use rayon::prelude::*;
use tracing::{debug, warn};

impl PyramidIndex {
    /// Find the `k` nearest neighbors of `query` among the configured `fan_out`
    /// nearest partitions.
    ///
    /// Always returns exactly `k` slots. Slots without a candidate hold
    /// [`Hit::SENTINEL`]; this includes every slot when the index is unbuilt or the
    /// query has the wrong dimension.
    pub fn search(&self, query: &[f32], k: usize) -> SearchResult {
        self.search_with_fan_out(query, k, self.params.effective_fan_out())
    }

    /// [`search`](Self::search) with a per-query probe count, capped at the
    /// number of partitions.
    pub fn search_with_fan_out(&self, query: &[f32], k: usize, fan_out: usize) -> SearchResult {
        if k == 0 {
            return SearchResult::sentinel(0);
        }
        let Some(built) = self.built() else {
            warn!("search on an unbuilt pyramid index");
            return SearchResult::sentinel(k);
        };
        if query.len() != self.params.dim {
            warn!(
                expected = self.params.dim,
                actual = query.len(),
                "query dimension mismatch"
            );
            return SearchResult::sentinel(k);
        }

        let probes = fan_out.min(self.params.num_partitions);
        let partitions = find_partitions(Some(built.routing.as_ref()), query, probes);

        let mut pool: Vec<Hit> = Vec::new();
        for partition in &partitions {
            let Ok(pid) = usize::try_from(partition.id) else {
                continue;
            };
            let (Some(Some(local)), Some(members)) =
                (built.local_indexes.get(pid), built.membership.get(pid))
            else {
                continue;
            };
            if members.is_empty() {
                continue;
            }

            let local_k = k.min(members.len());
            debug!(
                partition = pid,
                centroid_distance = partition.distance,
                local_k,
                "probing partition"
            );
            match local.search(query, local_k) {
                Ok(results) => {
                    pool.extend(results.into_iter().filter_map(|(local_id, distance)| {
                        members
                            .get(local_id as usize)
                            .map(|&global_id| Hit::new(global_id, distance))
                    }));
                }
                Err(err) => {
                    warn!(partition = pid, error = %err, "local index search failed");
                }
            }
        }

        if pool.is_empty() {
            return SearchResult::sentinel(k);
        }
        SearchResult::from_ranked(rank_candidates(pool, k), k)
    }

    /// Search every row of a row-major `[num_queries * dim]` query matrix.
    ///
    /// Queries run in parallel; results come back in query order.
    pub fn search_batch(&self, queries: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        let dim = self.params.dim;
        if queries.len() % dim != 0 {
            return Err(PyramidError::DimensionMismatch {
                expected: (queries.len() / dim + 1) * dim,
                actual: queries.len(),
            });
        }
        Ok(queries
            .par_chunks_exact(dim)
            .map(|query| self.search(query, k))
            .collect())
    }
}
