//! Two-level partitioned ANN index.
//!
//! A [`PyramidIndex`] splits the dataset into `num_partitions` clusters, indexes
//! each non-empty cluster with its own local graph, and indexes the cluster
//! centroids with a small routing graph:
//!
//! ```text
//!                 routing index (one point per partition)
//!                /            |             \
//!     local index 0     local index 1  ...  local index P-1
//!     (members of 0)    (members of 1)      (members of P-1)
//! ```
//!
//! A query visits the `fan_out` partitions whose centroids are nearest, searches
//! each locally, and merges the candidates. Recall drops when a query's true
//! neighbors live in partitions that were not probed; raising `fan_out` trades
//! latency for recall.
//!
//! # Ids
//!
//! A vector's *global id* is its row in the dataset passed to
//! [`PyramidIndex::build`]. Inside partition `p` it is known by its *local id*,
//! its position in `membership()[p]`. Local indexes only ever see local ids.
//!
//! # Lifecycle
//!
//! `Empty -> Built`. `build` runs exactly once; a second call is rejected with
//! [`PyramidError::AlreadyBuilt`](crate::PyramidError::AlreadyBuilt). Searching an
//! unbuilt index returns sentinel-only results.
//!
//! # Example
//!
//! ```rust
//! use pyramid::{PyramidIndex, PyramidParams};
//!
//! # fn main() -> Result<(), pyramid::PyramidError> {
//! let data = [
//!     0.0, 0.0, 0.1, 0.2, 0.2, 0.1, //
//!     10.0, 10.0, 10.1, 9.9, 9.9, 10.2,
//! ];
//! let mut index = PyramidIndex::new(PyramidParams::new(2, 2))?;
//! index.build(&data, 6)?;
//!
//! let result = index.search(&[0.0, 1.0], 3);
//! assert_eq!(result.len(), 3);
//! assert!(result.valid().all(|hit| hit.id < 3));
//! # Ok(())
//! # }
//! ```

mod build;
pub mod params;
mod search;

pub use params::PyramidParams;

use crate::ann::{AnnIndex, IndexFactory};
use crate::hnsw::HnswFactory;
use crate::partitioning::{Clusterer, KMeans, Partitioner};
use crate::Result;
use serde::Serialize;

/// Index state: nothing until `build`, read-only afterwards.
enum State {
    Empty,
    Built(Box<Built>),
}

struct Built {
    num_vectors: usize,
    /// Position `i` is partition `i`.
    routing: Box<dyn AnnIndex>,
    /// `None` for empty partitions.
    local_indexes: Vec<Option<Box<dyn AnnIndex>>>,
    /// Global ids per partition; position is the local id.
    membership: Vec<Vec<u32>>,
    centroids: Vec<Option<Vec<f32>>>,
    fallback: bool,
}

/// Summary of a built index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PyramidStats {
    pub num_vectors: usize,
    pub dimension: usize,
    pub num_partitions: usize,
    pub empty_partitions: usize,
    pub largest_partition: usize,
    /// Whether partitioning used the round-robin fallback.
    pub fallback: bool,
}

/// Routing graph over partition centroids plus one local graph per partition.
pub struct PyramidIndex {
    params: PyramidParams,
    partitioner: Partitioner,
    factory: Box<dyn IndexFactory>,
    state: State,
}

impl PyramidIndex {
    /// Create an index using HNSW graphs and seeded k-means.
    pub fn new(params: PyramidParams) -> Result<Self> {
        let factory = HnswFactory::new(params.hnsw);
        let clusterer = KMeans::new().with_seed(params.seed);
        Self::with_components(params, factory, clusterer)
    }

    /// Create an index with caller-supplied graph and clustering implementations.
    pub fn with_components(
        params: PyramidParams,
        factory: impl IndexFactory + 'static,
        clusterer: impl Clusterer + 'static,
    ) -> Result<Self> {
        params.validate()?;
        let partitioner = Partitioner::new(
            Box::new(clusterer),
            params.kmeans_iterations,
            params.verbose,
        );
        Ok(Self {
            params,
            partitioner,
            factory: Box::new(factory),
            state: State::Empty,
        })
    }

    pub fn params(&self) -> &PyramidParams {
        &self.params
    }

    pub fn dimension(&self) -> usize {
        self.params.dim
    }

    pub fn num_partitions(&self) -> usize {
        self.params.num_partitions
    }

    pub fn is_built(&self) -> bool {
        matches!(self.state, State::Built(_))
    }

    fn built(&self) -> Option<&Built> {
        match &self.state {
            State::Built(built) => Some(built),
            State::Empty => None,
        }
    }

    /// Number of indexed vectors (0 before `build`).
    pub fn num_vectors(&self) -> usize {
        self.built().map_or(0, |b| b.num_vectors)
    }

    /// Global ids per partition, in dataset order. Empty before `build`.
    pub fn membership(&self) -> &[Vec<u32>] {
        match self.built() {
            Some(built) => &built.membership,
            None => &[],
        }
    }

    pub fn partition_sizes(&self) -> Vec<usize> {
        self.membership().iter().map(Vec::len).collect()
    }

    /// Mean of the partition's members; `None` for empty or unknown partitions.
    pub fn centroid(&self, partition: usize) -> Option<&[f32]> {
        self.built()?.centroids.get(partition)?.as_deref()
    }

    pub fn has_local_index(&self, partition: usize) -> bool {
        self.built()
            .and_then(|b| b.local_indexes.get(partition))
            .is_some_and(Option::is_some)
    }

    /// Whether clustering failed during `build` and round-robin partitions were used.
    pub fn used_fallback(&self) -> bool {
        self.built().is_some_and(|b| b.fallback)
    }

    pub fn stats(&self) -> PyramidStats {
        let sizes = self.partition_sizes();
        PyramidStats {
            num_vectors: self.num_vectors(),
            dimension: self.params.dim,
            num_partitions: self.params.num_partitions,
            empty_partitions: if self.is_built() {
                sizes.iter().filter(|&&s| s == 0).count()
            } else {
                self.params.num_partitions
            },
            largest_partition: sizes.iter().copied().max().unwrap_or(0),
            fallback: self.used_fallback(),
        }
    }
}

impl std::fmt::Debug for PyramidIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PyramidIndex")
            .field("params", &self.params)
            .field("partitioner", &self.partitioner)
            .field("built", &self.is_built())
            .field("num_vectors", &self.num_vectors())
            .finish_non_exhaustive()
    }
}
