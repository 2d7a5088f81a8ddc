//! Clustering of daily traffic and customer feature vectors.
//!
//! Provides seeded k-means and a behavioral layer that standardizes
//! features and names clusters by activity level.
//!
//! # Example
//!
//! ```
//! use anofox_analytics::clustering::{kmeans, KMeansConfig};
//!
//! let points = vec![
//!     vec![1.0, 2.0],
//!     vec![1.1, 2.1],
//!     vec![10.0, 11.0],
//!     vec![10.1, 11.1],
//! ];
//! let config = KMeansConfig::default().k(2).seed(42);
//! let result = kmeans(&points, &config);
//! assert_eq!(result.centroids.len(), 2);
//! assert_eq!(result.labels[0], result.labels[1]);
//! ```

pub mod behavior;
pub mod kmeans;

pub use behavior::{
    activity_labels, cluster_behavior, relabel_by_volume, BehaviorClusters, ClusterConfig,
    ClusterProfile, MAX_CLUSTERS, MIN_CLUSTERS,
};
pub use kmeans::{elbow_inertias, kmeans, squared_distance, KMeansConfig, KMeansResult};
