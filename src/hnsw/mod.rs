//! Hierarchical Navigable Small World (HNSW) approximate nearest neighbor search.
//!
//! The default routing and local index of a pyramid.
//!
//! # Algorithm
//!
//! HNSW constructs a multi-layer graph where:
//! - **Upper layers**: Sparse, long-range connections for fast navigation
//! - **Lower layers**: Dense, local connections for precise search
//! - **Search**: Start at top layer, navigate down to base layer, beam search
//!
//! This implementation is bulk-only: vectors are supplied once to
//! [`AnnIndex::build`](crate::ann::AnnIndex::build), levels are drawn from a
//! seeded RNG, and nodes are inserted in id order. The same input and
//! [`HnswParams`] always produce the same graph.
//!
//! # Usage
//!
//! ```rust
//! use pyramid::ann::AnnIndex;
//! use pyramid::hnsw::{HnswIndex, HnswParams};
//!
//! # fn main() -> Result<(), pyramid::PyramidError> {
//! let mut index = HnswIndex::new(2, HnswParams::default())?;
//! index.build(&[0.0, 0.0, 1.0, 1.0, 5.0, 5.0], 3)?;
//!
//! let results = index.search(&[0.9, 1.2], 2)?;
//! assert_eq!(results[0].0, 1);
//! # Ok(())
//! # }
//! ```
//!
//! # References
//!
//! - Malkov & Yashunin (2016): "Efficient and robust approximate nearest neighbor search
//!   using Hierarchical Navigable Small World graphs"

pub(crate) mod construction;
pub(crate) mod graph;
pub(crate) mod search;

pub use graph::{HnswFactory, HnswIndex, HnswParams};
