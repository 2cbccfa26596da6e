//! Error types for pyramid.

use thiserror::Error;

/// Errors that can occur while building or querying an index.
///
/// Only a few of these ever reach callers of [`crate::PyramidIndex`]: clustering
/// failures are absorbed by the partitioner and search never fails.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PyramidError {
    /// Fewer points than requested clusters.
    #[error("insufficient points for clustering: {points} points, {clusters} clusters")]
    InsufficientPoints { points: usize, clusters: usize },

    /// Clustering diverged or produced unusable output.
    #[error("clustering failed: {0}")]
    Clustering(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Vector or dataset shape does not match the configured dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// `build` was called on an index that is already built.
    #[error("index is already built")]
    AlreadyBuilt,

    /// Index has nothing to search (not built, or built from zero vectors).
    #[error("index is empty")]
    EmptyIndex,

    /// Other failure reported by an index implementation.
    #[error("index error: {0}")]
    Index(String),
}

pub type Result<T> = std::result::Result<T, PyramidError>;
