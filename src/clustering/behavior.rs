//! Behavioral segmentation on top of k-means.
//!
//! Features are standardized, clustered, and the clusters are renumbered by
//! the mean of a volume feature so that cluster 0 is always the least active.

use super::kmeans::{kmeans, KMeansConfig};
use crate::core::SegmentAssignment;
use crate::error::{AnalyticsError, Result};
use crate::transform::{FeatureMatrix, StandardScaler};
use serde::{Deserialize, Serialize};

/// Smallest and largest supported cluster counts.
pub const MIN_CLUSTERS: usize = 2;
pub const MAX_CLUSTERS: usize = 5;

/// Behavioral clustering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Number of clusters, in `[2, 5]`.
    pub k: usize,
    /// Column whose unscaled mean orders the clusters.
    pub volume_feature: String,
    pub max_iter: usize,
    pub tolerance: f64,
    pub seed: u64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            k: 3,
            volume_feature: "sessions".to_string(),
            max_iter: 300,
            tolerance: 1e-4,
            seed: 42,
        }
    }
}

impl ClusterConfig {
    pub fn k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn volume_feature(mut self, name: impl Into<String>) -> Self {
        self.volume_feature = name.into();
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_CLUSTERS..=MAX_CLUSTERS).contains(&self.k) {
            return Err(AnalyticsError::invalid(
                "cluster_count",
                self.k,
                format!("must lie in [{}, {}]", MIN_CLUSTERS, MAX_CLUSTERS),
            ));
        }
        if self.max_iter == 0 {
            return Err(AnalyticsError::invalid(
                "clustering.max_iter",
                self.max_iter,
                "must be at least 1",
            ));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(AnalyticsError::invalid(
                "clustering.tolerance",
                self.tolerance,
                "must be a non-negative number",
            ));
        }
        Ok(())
    }
}

/// Names for clusters ordered from least to most active.
pub fn activity_labels(k: usize) -> &'static [&'static str] {
    match k {
        2 => &["Low Activity", "High Activity"],
        3 => &["Low Activity", "Medium Activity", "High Activity"],
        4 => &[
            "Low Activity",
            "Low-Medium Activity",
            "Medium-High Activity",
            "High Activity",
        ],
        _ => &[
            "Low Activity",
            "Low-Medium Activity",
            "Medium Activity",
            "Medium-High Activity",
            "High Activity",
        ],
    }
}

/// Summary of one relabeled cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterProfile {
    pub id: usize,
    pub label: String,
    pub size: usize,
    /// Centroid in standardized feature space.
    pub centroid: Vec<f64>,
    /// Mean of each original, unscaled feature; NaN for an empty cluster.
    pub feature_means: Vec<f64>,
}

/// Result of behavioral clustering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorClusters {
    pub feature_names: Vec<String>,
    /// Row ids of the input matrix.
    pub ids: Vec<String>,
    /// Relabeled cluster id per row.
    pub assignments: Vec<usize>,
    /// Profiles ordered by id.
    pub clusters: Vec<ClusterProfile>,
    pub inertia: f64,
    pub n_iter: usize,
    /// Columns that had zero variance and were ignored.
    pub degenerate_features: Vec<String>,
}

impl BehaviorClusters {
    pub fn label_of_row(&self, row: usize) -> Option<&str> {
        self.assignments
            .get(row)
            .map(|&c| self.clusters[c].label.as_str())
    }

    pub fn segment_assignments(&self) -> Vec<SegmentAssignment> {
        self.ids
            .iter()
            .zip(&self.assignments)
            .map(|(id, &c)| SegmentAssignment {
                entity_id: id.clone(),
                segment_label: self.clusters[c].label.clone(),
                cluster_id: Some(c),
            })
            .collect()
    }
}

/// Renumber raw cluster labels ascending by mean volume.
///
/// Returns `mapping[raw] = relabeled`. Empty clusters sort first; ties keep
/// the raw order.
pub fn relabel_by_volume(labels: &[usize], k: usize, volume: &[f64]) -> Vec<usize> {
    let mut sums = vec![0.0; k];
    let mut counts = vec![0usize; k];
    for (&l, &v) in labels.iter().zip(volume) {
        sums[l] += v;
        counts[l] += 1;
    }
    let means: Vec<f64> = sums
        .iter()
        .zip(&counts)
        .map(|(&s, &c)| {
            if c == 0 {
                f64::NEG_INFINITY
            } else {
                s / c as f64
            }
        })
        .collect();

    let mut order: Vec<usize> = (0..k).collect();
    order.sort_by(|&a, &b| means[a].total_cmp(&means[b]).then(a.cmp(&b)));

    let mut mapping = vec![0; k];
    for (new_id, &raw) in order.iter().enumerate() {
        mapping[raw] = new_id;
    }
    mapping
}

/// Cluster rows of a feature matrix into `k` named activity segments.
pub fn cluster_behavior(features: &FeatureMatrix, config: &ClusterConfig) -> Result<BehaviorClusters> {
    config.validate()?;
    let k = config.k;

    let volume_index = features.column_index(&config.volume_feature).ok_or_else(|| {
        AnalyticsError::invalid(
            "clustering.volume_feature",
            &config.volume_feature,
            format!("not one of the feature columns {:?}", features.columns()),
        )
    })?;

    if features.n_rows() < k {
        return Err(AnalyticsError::InsufficientData {
            needed: k,
            got: features.n_rows(),
        });
    }

    let (scaler, scaled) = StandardScaler::fit_transform(features)?;
    let degenerate_features: Vec<String> = scaler
        .degenerate_columns()
        .into_iter()
        .map(String::from)
        .collect();
    if !degenerate_features.is_empty() {
        tracing::warn!(
            columns = ?degenerate_features,
            "Zero-variance features ignored for clustering"
        );
    }

    let km_config = KMeansConfig::default()
        .k(k)
        .max_iter(config.max_iter)
        .tolerance(config.tolerance)
        .seed(config.seed);
    let result = kmeans(scaled.rows(), &km_config);

    let volume = features.column(volume_index);
    let mapping = relabel_by_volume(&result.labels, k, &volume);
    let assignments: Vec<usize> = result.labels.iter().map(|&l| mapping[l]).collect();

    let labels = activity_labels(k);
    let mut clusters: Vec<ClusterProfile> = (0..k)
        .map(|id| ClusterProfile {
            id,
            label: labels[id].to_string(),
            size: 0,
            centroid: Vec::new(),
            feature_means: vec![0.0; features.n_cols()],
        })
        .collect();
    for (raw, centroid) in result.centroids.into_iter().enumerate() {
        clusters[mapping[raw]].centroid = centroid;
    }
    for (row, &c) in features.rows().iter().zip(&assignments) {
        clusters[c].size += 1;
        for (m, x) in clusters[c].feature_means.iter_mut().zip(row) {
            *m += x;
        }
    }
    for cluster in &mut clusters {
        let size = cluster.size as f64;
        for m in &mut cluster.feature_means {
            *m = if cluster.size == 0 { f64::NAN } else { *m / size };
        }
    }

    let empty = clusters.iter().filter(|c| c.size == 0).count();
    if empty > 0 {
        tracing::warn!(k, empty, "Clustering produced empty clusters");
    }
    tracing::debug!(
        rows = features.n_rows(),
        k,
        n_iter = result.n_iter,
        converged = result.converged,
        inertia = result.inertia,
        "Behavioral clustering complete"
    );

    Ok(BehaviorClusters {
        feature_names: features.columns().to_vec(),
        ids: features.ids().to_vec(),
        assignments,
        clusters,
        inertia: result.inertia,
        n_iter: result.n_iter,
        degenerate_features,
    })
}
