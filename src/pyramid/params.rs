//! Pyramid configuration.

use crate::hnsw::HnswParams;
use crate::{PyramidError, Result};
use serde::{Deserialize, Serialize};

fn default_num_partitions() -> usize {
    10
}

fn default_fan_out() -> usize {
    2
}

fn default_kmeans_iterations() -> usize {
    25
}

fn default_seed() -> u64 {
    42
}

/// Pyramid parameters.
///
/// Only `dim` is required when deserializing; everything else has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PyramidParams {
    /// Vector dimension, fixed for the lifetime of the index.
    pub dim: usize,

    /// Number of partitions (k-means clusters).
    #[serde(default = "default_num_partitions")]
    pub num_partitions: usize,

    /// Partitions probed per query. Higher is slower with better recall.
    #[serde(default = "default_fan_out")]
    pub fan_out: usize,

    /// k-means iteration budget.
    #[serde(default = "default_kmeans_iterations")]
    pub kmeans_iterations: usize,

    /// Seed for k-means++ initialization.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Log per-iteration clustering progress at debug level.
    #[serde(default)]
    pub verbose: bool,

    /// Build local indexes on the rayon thread pool.
    #[serde(default)]
    pub parallel_build: bool,

    /// Hyperparameters shared by the routing and local HNSW graphs.
    #[serde(default)]
    pub hnsw: HnswParams,
}

impl PyramidParams {
    pub fn new(dim: usize, num_partitions: usize) -> Self {
        Self {
            dim,
            num_partitions,
            fan_out: default_fan_out(),
            kmeans_iterations: default_kmeans_iterations(),
            seed: default_seed(),
            verbose: false,
            parallel_build: false,
            hnsw: HnswParams::default(),
        }
    }

    #[must_use]
    pub fn with_fan_out(mut self, fan_out: usize) -> Self {
        self.fan_out = fan_out;
        self
    }

    #[must_use]
    pub fn with_kmeans_iterations(mut self, iterations: usize) -> Self {
        self.kmeans_iterations = iterations;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    #[must_use]
    pub fn with_parallel_build(mut self, parallel: bool) -> Self {
        self.parallel_build = parallel;
        self
    }

    #[must_use]
    pub fn with_hnsw(mut self, hnsw: HnswParams) -> Self {
        self.hnsw = hnsw;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.dim == 0 {
            return Err(PyramidError::InvalidParameter(
                "dim must be greater than 0".into(),
            ));
        }
        if self.num_partitions == 0 {
            return Err(PyramidError::InvalidParameter(
                "num_partitions must be greater than 0".into(),
            ));
        }
        if self.fan_out == 0 {
            return Err(PyramidError::InvalidParameter(
                "fan_out must be greater than 0".into(),
            ));
        }
        self.hnsw.validate()
    }

    /// Partitions actually probed per query.
    pub fn effective_fan_out(&self) -> usize {
        self.fan_out.min(self.num_partitions)
    }
}
