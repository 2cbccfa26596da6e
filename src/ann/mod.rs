//! ANN index abstractions and the exact baseline.
//!
//! A pyramid never looks inside the indexes it routes through. It needs two
//! capabilities, both captured by [`AnnIndex`]:
//!
//! - a single bulk `build` over row-major vectors, where position = id
//! - `search(query, k)` returning up to `k` `(id, distance)` pairs, ascending
//!
//! [`IndexFactory`] creates the unbuilt instances. Closures of the form
//! `Fn(usize) -> Result<Box<dyn AnnIndex>>` are factories too, which keeps
//! test doubles short.
//!
//! Implementations in this crate:
//! - [`crate::hnsw::HnswIndex`]: hierarchical graph, the default
//! - [`FlatIndex`]: exhaustive scan, exact

pub mod flat;
pub mod traits;

pub use flat::{FlatFactory, FlatIndex};
pub use traits::{AnnIndex, IndexFactory};
