//! Dataset partitioning: clustering, nearest-center assignment and the
//! round-robin fallback.

pub mod kmeans;
pub mod partitioner;

pub use kmeans::KMeans;
pub use partitioner::{
    compute_centroids, extract_cluster_members, nearest_center_assign, round_robin_assignment,
    Clusterer, Clustering, PartitionOutcome, Partitioner,
};
