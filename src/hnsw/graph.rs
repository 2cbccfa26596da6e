//! HNSW index storage and public API.

use crate::ann::traits::{AnnIndex, IndexFactory};
use crate::distance::{matrix_len, row};
use crate::hnsw::{construction, search};
use crate::{PyramidError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Hard cap on the number of layers; with `m >= 2` reaching it is astronomically rare.
const MAX_LEVEL: u8 = 16;

pub(crate) type Neighbors = SmallVec<[u32; 16]>;

/// HNSW hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HnswParams {
    /// Graph connectivity: neighbors kept per node on upper layers (`2m` on layer 0).
    pub m: usize,
    /// Candidate list size while inserting.
    pub ef_construction: usize,
    /// Candidate list size while searching (raised to `k` when smaller).
    pub ef_search: usize,
    /// Seed for level assignment, so builds are reproducible.
    pub seed: u64,
}

impl Default for HnswParams {
    fn default() -> Self {
        Self {
            m: 32,
            ef_construction: 40,
            ef_search: 16,
            seed: 42,
        }
    }
}

impl HnswParams {
    pub fn validate(&self) -> Result<()> {
        if self.m < 2 {
            return Err(PyramidError::InvalidParameter(format!(
                "hnsw m must be at least 2, got {}",
                self.m
            )));
        }
        if self.ef_construction == 0 || self.ef_search == 0 {
            return Err(PyramidError::InvalidParameter(
                "hnsw ef_construction and ef_search must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Maximum degree on `layer`.
    pub(crate) fn max_neighbors(&self, layer: usize) -> usize {
        if layer == 0 {
            self.m * 2
        } else {
            self.m
        }
    }

    fn level_multiplier(&self) -> f64 {
        1.0 / (self.m as f64).ln()
    }
}

/// Adjacency lists of a single layer, indexed by node id.
///
/// Every layer has a slot for every node; nodes above their assigned level just
/// keep an empty list.
#[derive(Debug, Clone)]
pub(crate) struct Layer {
    neighbors: Vec<Neighbors>,
}

impl Layer {
    pub(crate) fn new(num_nodes: usize) -> Self {
        Self {
            neighbors: vec![SmallVec::new(); num_nodes],
        }
    }

    pub(crate) fn get_neighbors(&self, id: u32) -> &[u32] {
        self.neighbors
            .get(id as usize)
            .map(|n| n.as_slice())
            .unwrap_or(&[])
    }

    pub(crate) fn get_neighbors_mut(&mut self) -> &mut Vec<Neighbors> {
        &mut self.neighbors
    }
}

/// Hierarchical Navigable Small World graph over squared L2.
///
/// Built once from a bulk set of vectors; ids are insertion positions.
#[derive(Debug, Clone)]
pub struct HnswIndex {
    pub(crate) dimension: usize,
    pub(crate) params: HnswParams,
    /// Row-major vector storage.
    pub(crate) vectors: Vec<f32>,
    pub(crate) num_vectors: usize,
    pub(crate) layer_assignments: Vec<u8>,
    pub(crate) layers: Vec<Layer>,
    pub(crate) entry_point: u32,
    built: bool,
}

impl HnswIndex {
    pub fn new(dimension: usize, params: HnswParams) -> Result<Self> {
        if dimension == 0 {
            return Err(PyramidError::InvalidParameter(
                "dimension must be greater than 0".into(),
            ));
        }
        params.validate()?;
        Ok(Self {
            dimension,
            params,
            vectors: Vec::new(),
            num_vectors: 0,
            layer_assignments: Vec::new(),
            layers: Vec::new(),
            entry_point: 0,
            built: false,
        })
    }

    pub fn params(&self) -> &HnswParams {
        &self.params
    }

    /// Number of layers in the built graph.
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    pub(crate) fn get_vector(&self, idx: usize) -> &[f32] {
        row(&self.vectors, self.dimension, idx)
    }

    /// Search with an explicit candidate list size.
    pub fn search_with_ef(&self, query: &[f32], k: usize, ef: usize) -> Result<Vec<(u32, f32)>> {
        if !self.built {
            return Err(PyramidError::EmptyIndex);
        }
        if query.len() != self.dimension {
            return Err(PyramidError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if k == 0 {
            return Ok(Vec::new());
        }
        let ef = ef.max(k);

        // Descend with ef=1 to the base layer, then widen.
        let top = self.layer_assignments[self.entry_point as usize] as usize;
        let mut entry = self.entry_point;
        for layer_idx in (1..=top).rev() {
            let closest = search::greedy_search_layer(
                query,
                &[entry],
                &self.layers[layer_idx],
                &self.vectors,
                self.dimension,
                1,
            );
            if let Some(&(id, _)) = closest.first() {
                entry = id;
            }
        }

        // The global entry point reaches every node on the base layer, so seeding it
        // too keeps the result count at min(ef, len) even if `entry` sits in a
        // region with no way out.
        let mut results = search::greedy_search_layer(
            query,
            &[entry, self.entry_point],
            &self.layers[0],
            &self.vectors,
            self.dimension,
            ef,
        );
        results.truncate(k);
        Ok(results)
    }

    fn assign_levels(&mut self) {
        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let ml = self.params.level_multiplier();
        self.layer_assignments = (0..self.num_vectors)
            .map(|_| {
                // random::<f64>() is in [0, 1), so 1 - u is in (0, 1] and ln is finite.
                let u: f64 = rng.random();
                let level = (-(1.0 - u).ln() * ml).floor();
                (level as u64).min(MAX_LEVEL as u64) as u8
            })
            .collect();
    }
}

impl AnnIndex for HnswIndex {
    fn build(&mut self, vectors: &[f32], count: usize) -> Result<()> {
        if self.built {
            return Err(PyramidError::AlreadyBuilt);
        }
        let expected = matrix_len(count, self.dimension)?;
        if vectors.len() != expected {
            return Err(PyramidError::DimensionMismatch {
                expected,
                actual: vectors.len(),
            });
        }
        if count > u32::MAX as usize {
            return Err(PyramidError::InvalidParameter(format!(
                "hnsw holds at most {} vectors, got {count}",
                u32::MAX
            )));
        }
        self.vectors = vectors.to_vec();
        self.num_vectors = count;
        self.assign_levels();
        construction::construct_graph(self)?;
        self.built = true;
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(u32, f32)>> {
        self.search_with_ef(query, k, self.params.ef_search)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        self.num_vectors
    }

    fn algorithm(&self) -> &'static str {
        "HNSW"
    }
}

/// Factory for [`HnswIndex`] with fixed hyperparameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct HnswFactory {
    pub params: HnswParams,
}

impl HnswFactory {
    pub fn new(params: HnswParams) -> Self {
        Self { params }
    }
}

impl IndexFactory for HnswFactory {
    fn create(&self, dimension: usize) -> Result<Box<dyn AnnIndex>> {
        Ok(Box::new(HnswIndex::new(dimension, self.params)?))
    }
}
