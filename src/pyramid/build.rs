use super::{Built, PyramidIndex, State};
use crate::ann::{AnnIndex, IndexFactory};
use crate::distance::{matrix_len, row};
use crate::partitioning::{compute_centroids, extract_cluster_members, PartitionOutcome};
use crate::{PyramidError, Result};
use rayon::prelude::*;
use tracing::{info, info_span, warn};

impl PyramidIndex {
    /// Build the index from `n` row-major vectors.
    ///
    /// Partitions the data (falling back to round-robin partitions if clustering
    /// fails), builds the routing index over partition centroids and one local
    /// index per non-empty partition.
    ///
    /// Fails only on malformed input, on a second call, or when a graph
    /// implementation refuses to build.
    pub fn build(&mut self, data: &[f32], n: usize) -> Result<()> {
        if self.is_built() {
            return Err(PyramidError::AlreadyBuilt);
        }
        let dim = self.params.dim;
        let k = self.params.num_partitions;
        let expected = matrix_len(n, dim)?;
        if data.len() != expected {
            return Err(PyramidError::DimensionMismatch {
                expected,
                actual: data.len(),
            });
        }
        if n > u32::MAX as usize {
            return Err(PyramidError::InvalidParameter(format!(
                "at most {} vectors can be indexed, got {n}",
                u32::MAX
            )));
        }

        let span = info_span!("pyramid_build", n, dim, num_partitions = k);
        let _enter = span.enter();
        info!("building pyramid index");

        let outcome = if n == 0 {
            PartitionOutcome {
                assignment: Vec::new(),
                fallback: false,
            }
        } else {
            self.partitioner.partition(data, n, dim, k)
        };
        let stray = outcome.assignment.iter().filter(|&&p| p >= k).count();
        if stray > 0 {
            warn!(stray, "assignment values out of range, points skipped");
        }

        let centroids = compute_centroids(data, dim, &outcome.assignment, k);

        // Empty partitions get a zero placeholder so routing position == partition id.
        let mut routing_rows = Vec::with_capacity(k * dim);
        for centroid in &centroids {
            match centroid {
                Some(c) => routing_rows.extend_from_slice(c),
                None => routing_rows.extend(std::iter::repeat(0.0).take(dim)),
            }
        }
        let mut routing = self.factory.create(dim)?;
        routing.build(&routing_rows, k)?;

        let membership = extract_cluster_members(&outcome.assignment, k);
        let factory = self.factory.as_ref();
        let local_indexes: Vec<Option<Box<dyn AnnIndex>>> = if self.params.parallel_build {
            membership
                .par_iter()
                .map(|members| build_local_index(factory, data, dim, members))
                .collect::<Result<_>>()?
        } else {
            membership
                .iter()
                .map(|members| build_local_index(factory, data, dim, members))
                .collect::<Result<_>>()?
        };

        let empty_partitions = membership.iter().filter(|m| m.is_empty()).count();
        info!(
            empty_partitions,
            largest_partition = membership.iter().map(Vec::len).max().unwrap_or(0),
            fallback = outcome.fallback,
            routing = routing.algorithm(),
            "pyramid index built"
        );

        self.state = State::Built(Box::new(Built {
            num_vectors: n,
            routing,
            local_indexes,
            membership,
            centroids,
            fallback: outcome.fallback,
        }));
        Ok(())
    }
}

/// Gather a partition's vectors in membership order and index them.
fn build_local_index(
    factory: &dyn IndexFactory,
    data: &[f32],
    dim: usize,
    members: &[u32],
) -> Result<Option<Box<dyn AnnIndex>>> {
    if members.is_empty() {
        return Ok(None);
    }
    let mut vectors = Vec::with_capacity(members.len() * dim);
    for &global_id in members {
        vectors.extend_from_slice(row(data, dim, global_id as usize));
    }
    let mut index = factory.create(dim)?;
    index.build(&vectors, members.len())?;
    Ok(Some(index))
}
