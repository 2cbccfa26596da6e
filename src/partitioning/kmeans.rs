//! k-means clustering implementation.
//!
//! The default [`Clusterer`] behind a pyramid's partitioner: k-means++
//! initialization followed by Lloyd refinement over squared L2.

use crate::distance::{l2_distance_squared, matrix_len, row};
use crate::partitioning::partitioner::{nearest_center_assign, Clusterer, Clustering};
use crate::{PyramidError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Largest squared centroid shift still counted as converged.
const DEFAULT_TOLERANCE: f32 = 1e-6;

/// k-means clustering for partitioning vectors.
#[derive(Debug, Clone)]
pub struct KMeans {
    seed: Option<u64>,
    tolerance: f32,
}

impl Default for KMeans {
    fn default() -> Self {
        Self::new()
    }
}

impl KMeans {
    pub fn new() -> Self {
        Self {
            seed: None,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// Configure a deterministic seed for k-means++ initialization.
    ///
    /// When set, repeated runs on the same inputs produce identical results.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Stop early once no centroid moves more than `tolerance` (squared L2).
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// k-means++ initialization.
    fn kmeans_plus_plus(&self, data: &[f32], n: usize, dim: usize, k: usize) -> Vec<f32> {
        // Use an explicit seed when configured; otherwise derive one from entropy.
        let seed = self.seed.unwrap_or_else(|| rand::rng().random());
        let mut rng = StdRng::seed_from_u64(seed);

        let mut centroids = Vec::with_capacity(k * dim);
        let first = rng.random_range(0..n);
        centroids.extend_from_slice(row(data, dim, first));

        // Distance from each point to its nearest chosen center so far.
        let mut nearest: Vec<f32> = (0..n)
            .map(|i| l2_distance_squared(row(data, dim, i), row(&centroids, dim, 0)))
            .collect();

        for c in 1..k {
            let total: f64 = nearest.iter().map(|&d| d as f64).sum();
            let chosen = if total > 0.0 {
                // Sample proportional to squared distance.
                let threshold = rng.random::<f64>() * total;
                let mut cumulative = 0.0f64;
                nearest
                    .iter()
                    .position(|&d| {
                        cumulative += d as f64;
                        cumulative >= threshold && d > 0.0
                    })
                    .unwrap_or(n - 1)
            } else {
                // Every point coincides with a center already; any choice is as good.
                rng.random_range(0..n)
            };
            centroids.extend_from_slice(row(data, dim, chosen));

            let new_center = row(&centroids, dim, c).to_vec();
            for (i, best) in nearest.iter_mut().enumerate() {
                let d = l2_distance_squared(row(data, dim, i), &new_center);
                if d < *best {
                    *best = d;
                }
            }
        }

        centroids
    }

    /// Recompute centers as the mean of their assigned points.
    ///
    /// A center that lost all its points keeps its previous position.
    fn update_centroids(
        data: &[f32],
        dim: usize,
        assignment: &[usize],
        previous: &[f32],
        k: usize,
    ) -> Vec<f32> {
        let mut sums = vec![0.0f64; k * dim];
        let mut counts = vec![0usize; k];
        for (i, &c) in assignment.iter().enumerate() {
            counts[c] += 1;
            for (acc, &x) in sums[c * dim..(c + 1) * dim]
                .iter_mut()
                .zip(row(data, dim, i))
            {
                *acc += x as f64;
            }
        }

        let mut next = previous.to_vec();
        for c in 0..k {
            if counts[c] == 0 {
                continue;
            }
            for j in 0..dim {
                next[c * dim + j] = (sums[c * dim + j] / counts[c] as f64) as f32;
            }
        }
        next
    }

    fn inertia(data: &[f32], dim: usize, assignment: &[usize], centroids: &[f32]) -> f64 {
        assignment
            .iter()
            .enumerate()
            .map(|(i, &c)| l2_distance_squared(row(data, dim, i), row(centroids, dim, c)) as f64)
            .sum()
    }
}

impl Clusterer for KMeans {
    fn compute_clusters(
        &self,
        data: &[f32],
        n: usize,
        dim: usize,
        k: usize,
        iterations: usize,
        verbose: bool,
    ) -> Result<Clustering> {
        if dim == 0 || k == 0 {
            return Err(PyramidError::InvalidParameter(
                "dimension and k must be greater than 0".into(),
            ));
        }
        if n < k {
            return Err(PyramidError::InsufficientPoints {
                points: n,
                clusters: k,
            });
        }
        let expected = matrix_len(n, dim)?;
        if data.len() < expected {
            return Err(PyramidError::DimensionMismatch {
                expected,
                actual: data.len(),
            });
        }

        let mut centroids = self.kmeans_plus_plus(data, n, dim, k);

        for iteration in 0..iterations {
            let assignment = nearest_center_assign(data, n, dim, &centroids, k);
            let next = Self::update_centroids(data, dim, &assignment, &centroids, k);

            let shift = (0..k)
                .map(|c| l2_distance_squared(row(&centroids, dim, c), row(&next, dim, c)))
                .fold(0.0f32, f32::max);
            centroids = next;

            if verbose {
                debug!(
                    iteration,
                    shift,
                    inertia = Self::inertia(data, dim, &assignment, &centroids),
                    "k-means iteration"
                );
            }
            if shift <= self.tolerance {
                break;
            }
        }

        if centroids.iter().any(|x| !x.is_finite()) {
            return Err(PyramidError::Clustering(
                "k-means produced a non-finite centroid".into(),
            ));
        }

        let assignment = nearest_center_assign(data, n, dim, &centroids, k);
        Ok(Clustering {
            centroids,
            assignment,
        })
    }
}
