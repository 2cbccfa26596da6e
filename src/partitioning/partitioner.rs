//! Dataset partitioning with a deterministic fallback.

use crate::distance::{l2_distance_squared, row};
use crate::Result;
use tracing::warn;

/// Output of a clustering run.
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    /// Row-major `[k * dim]` centers.
    pub centroids: Vec<f32>,
    /// Cluster id per input point.
    pub assignment: Vec<usize>,
}

/// A clustering routine the [`Partitioner`] delegates to.
///
/// Must fail with [`PyramidError::InsufficientPoints`](crate::PyramidError::InsufficientPoints)
/// when `n < k`. May fail for any other reason; the partitioner never propagates it.
pub trait Clusterer: Send + Sync {
    fn compute_clusters(
        &self,
        data: &[f32],
        n: usize,
        dim: usize,
        k: usize,
        iterations: usize,
        verbose: bool,
    ) -> Result<Clustering>;
}

/// Assign each of the `n` points to its nearest center by exact squared L2.
///
/// Ties go to the lowest center id. With `k == 0` every point maps to 0.
pub fn nearest_center_assign(
    data: &[f32],
    n: usize,
    dim: usize,
    centers: &[f32],
    k: usize,
) -> Vec<usize> {
    (0..n)
        .map(|i| {
            let point = row(data, dim, i);
            let mut best = 0usize;
            let mut best_dist = f32::INFINITY;
            for c in 0..k {
                let d = l2_distance_squared(point, row(centers, dim, c));
                if d < best_dist {
                    best_dist = d;
                    best = c;
                }
            }
            best
        })
        .collect()
}

/// Group global ids by partition, in forward-scan order.
///
/// Assignment values outside `[0, k)` are skipped.
pub fn extract_cluster_members(assignment: &[usize], k: usize) -> Vec<Vec<u32>> {
    let mut members = vec![Vec::new(); k];
    for (i, &p) in assignment.iter().enumerate() {
        if let Some(list) = members.get_mut(p) {
            list.push(i as u32);
        }
    }
    members
}

/// Mean of each partition's assigned points; `None` for empty partitions.
///
/// Assignment values outside `[0, k)` are skipped.
pub fn compute_centroids(
    data: &[f32],
    dim: usize,
    assignment: &[usize],
    k: usize,
) -> Vec<Option<Vec<f32>>> {
    let mut sums = vec![vec![0.0f64; dim]; k];
    let mut counts = vec![0usize; k];

    for (i, &p) in assignment.iter().enumerate() {
        if p >= k {
            continue;
        }
        for (acc, &x) in sums[p].iter_mut().zip(row(data, dim, i)) {
            *acc += x as f64;
        }
        counts[p] += 1;
    }

    sums.into_iter()
        .zip(counts)
        .map(|(sum, count)| {
            (count > 0).then(|| {
                sum.into_iter()
                    .map(|s| (s / count as f64) as f32)
                    .collect::<Vec<f32>>()
            })
        })
        .collect()
}

/// Round-robin assignment `i -> i mod k`.
pub fn round_robin_assignment(n: usize, k: usize) -> Vec<usize> {
    if k == 0 {
        return vec![0; n];
    }
    (0..n).map(|i| i % k).collect()
}

/// Result of [`Partitioner::partition`].
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionOutcome {
    /// Partition id per global id.
    pub assignment: Vec<usize>,
    /// Whether clustering failed and round-robin was used instead.
    pub fallback: bool,
}

/// Turns a dataset into a partition assignment.
///
/// Clustering failures are never surfaced: the partitioner substitutes the
/// round-robin assignment and reports it through [`PartitionOutcome::fallback`].
pub struct Partitioner {
    clusterer: Box<dyn Clusterer>,
    iterations: usize,
    verbose: bool,
}

impl Partitioner {
    pub fn new(clusterer: Box<dyn Clusterer>, iterations: usize, verbose: bool) -> Self {
        Self {
            clusterer,
            iterations,
            verbose,
        }
    }

    pub fn partition(&self, data: &[f32], n: usize, dim: usize, k: usize) -> PartitionOutcome {
        let clustered = self
            .clusterer
            .compute_clusters(data, n, dim, k, self.iterations, self.verbose);

        match clustered {
            Ok(clustering) if clustering.assignment.len() == n => PartitionOutcome {
                assignment: clustering.assignment,
                fallback: false,
            },
            Ok(clustering) => {
                warn!(
                    expected = n,
                    actual = clustering.assignment.len(),
                    "clusterer returned a malformed assignment, using round-robin partitions"
                );
                self.fallback(n, k)
            }
            Err(err) => {
                warn!(error = %err, n, k, "clustering failed, using round-robin partitions");
                self.fallback(n, k)
            }
        }
    }

    fn fallback(&self, n: usize, k: usize) -> PartitionOutcome {
        PartitionOutcome {
            assignment: round_robin_assignment(n, k),
            fallback: true,
        }
    }
}

impl std::fmt::Debug for Partitioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Partitioner")
            .field("iterations", &self.iterations)
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PyramidError;

    struct Failing;

    impl Clusterer for Failing {
        fn compute_clusters(
            &self,
            _data: &[f32],
            _n: usize,
            _dim: usize,
            _k: usize,
            _iterations: usize,
            _verbose: bool,
        ) -> Result<Clustering> {
            Err(PyramidError::Clustering("diverged".into()))
        }
    }

    struct Truncating;

    impl Clusterer for Truncating {
        fn compute_clusters(
            &self,
            _data: &[f32],
            n: usize,
            _dim: usize,
            _k: usize,
            _iterations: usize,
            _verbose: bool,
        ) -> Result<Clustering> {
            Ok(Clustering {
                centroids: Vec::new(),
                assignment: vec![0; n.saturating_sub(1)],
            })
        }
    }

    #[test]
    fn nearest_center_prefers_lowest_id_on_tie() {
        let data = [0.0, 0.0, 4.0, 0.0, 1.0, 0.0];
        let centers = [-1.0, 0.0, 1.0, 0.0];
        assert_eq!(nearest_center_assign(&data, 3, 2, &centers, 2), vec![0, 1, 1]);
    }

    #[test]
    fn members_skip_out_of_range() {
        let members = extract_cluster_members(&[1, 0, 7, 1], 2);
        assert_eq!(members, vec![vec![1], vec![0, 3]]);
    }

    #[test]
    fn centroids_are_means_and_empty_is_none() {
        let data = [0.0, 0.0, 2.0, 4.0, 10.0, 10.0, 99.0, 99.0];
        let centroids = compute_centroids(&data, 2, &[0, 0, 2, 5], 3);
        assert_eq!(centroids[0], Some(vec![1.0, 2.0]));
        assert_eq!(centroids[1], None);
        assert_eq!(centroids[2], Some(vec![10.0, 10.0]));
    }

    #[test]
    fn round_robin() {
        assert_eq!(round_robin_assignment(5, 2), vec![0, 1, 0, 1, 0]);
        assert!(round_robin_assignment(0, 3).is_empty());
    }

    #[test]
    fn failing_clusterer_falls_back() {
        let partitioner = Partitioner::new(Box::new(Failing), 10, false);
        let data = vec![0.0; 8];
        let outcome = partitioner.partition(&data, 4, 2, 3);
        assert!(outcome.fallback);
        assert_eq!(outcome.assignment, vec![0, 1, 2, 0]);
    }

    #[test]
    fn malformed_assignment_falls_back() {
        let partitioner = Partitioner::new(Box::new(Truncating), 10, false);
        let outcome = partitioner.partition(&[0.0; 6], 3, 2, 2);
        assert!(outcome.fallback);
        assert_eq!(outcome.assignment, vec![0, 1, 0]);
    }
}
