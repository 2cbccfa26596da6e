//! Traits for the ANN indexes a pyramid is assembled from.

use crate::Result;

/// A bulk-built approximate nearest neighbor index over squared L2.
///
/// Both the routing index (one point per partition) and every local index (one
/// point per partition member) are `AnnIndex` values. Implementations are
/// queried concurrently from multiple threads once built, so `search` must be a
/// read-only operation.
pub trait AnnIndex: Send + Sync {
    /// Build the index from `count` row-major vectors in a single call.
    ///
    /// The position of a vector in `vectors` becomes its id. Calling `build` a
    /// second time is an error.
    fn build(&mut self, vectors: &[f32], count: usize) -> Result<()>;

    /// Search for the `k` nearest neighbors of `query`.
    ///
    /// Returns `(id, distance)` pairs ascending by distance, of length
    /// `min(k, len())` for a healthy index.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(u32, f32)>>;

    /// Vector dimension.
    fn dimension(&self) -> usize;

    /// Number of indexed vectors.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short algorithm name, for logs and stats.
    fn algorithm(&self) -> &'static str;
}

/// Creates fresh, unbuilt indexes of a fixed kind.
///
/// A pyramid asks its factory for one routing index and one index per
/// non-empty partition.
pub trait IndexFactory: Send + Sync {
    fn create(&self, dimension: usize) -> Result<Box<dyn AnnIndex>>;
}

impl<F> IndexFactory for F
where
    F: Fn(usize) -> Result<Box<dyn AnnIndex>> + Send + Sync,
{
    fn create(&self, dimension: usize) -> Result<Box<dyn AnnIndex>> {
        self(dimension)
    }
}
