//! pyramid: two-level approximate nearest neighbor search.
//!
//! A coarse routing graph over cluster centroids sends each query to a few
//! promising partitions; each partition carries its own local graph over its
//! members. Probing `fan_out` of `num_partitions` partitions cuts per-query work
//! roughly by `num_partitions / fan_out`, at some cost in recall.
//!
//! - [`pyramid`]: the [`PyramidIndex`] itself, build and search orchestration
//! - [`partitioning`]: k-means, nearest-center assignment, round-robin fallback
//! - [`merge`]: ranked results, sentinels, merging of candidate lists
//! - [`hnsw`]: the default routing/local graph
//! - [`ann`]: the [`AnnIndex`] seam and an exact flat index
//! - [`distance`]: squared L2, angular distance, normalization
//!
//! # Critical Nuances
//!
//! ## Partition boundaries
//!
//! A query sitting between two clusters may have true neighbors in a partition
//! whose centroid is not among the `fan_out` nearest. Those neighbors are simply
//! not seen. The default `fan_out = 2` covers the common two-cluster boundary;
//! raise it for datasets with many small, overlapping clusters.
//!
//! ## Degenerate partitioning
//!
//! When clustering cannot run (fewer points than partitions) or fails, points
//! are dealt round-robin. Every query is still answered, but round-robin
//! partitions carry no locality, so recall at a fixed `fan_out` drops to about
//! `fan_out / num_partitions`. Check [`PyramidIndex::used_fallback`].
//!
//! ## Sentinels
//!
//! Searches never fail. Slots that could not be filled hold
//! [`Hit::SENTINEL`] (`id = -1`, `distance = +inf`), always at the tail.

pub mod ann;
pub mod distance;
pub mod error;
pub mod hnsw;
pub mod merge;
pub mod partitioning;
pub mod pyramid;

pub use ann::{AnnIndex, IndexFactory};
pub use error::{PyramidError, Result};
pub use merge::{merge_results, Hit, SearchResult, SENTINEL_ID};
pub use pyramid::{PyramidIndex, PyramidParams, PyramidStats};
