//! K-means clustering.
//!
//! Lloyd's algorithm with k-means++ seeding drawn from a seeded RNG, so the
//! same input and seed always give the same clustering.

use rand::distributions::WeightedIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Settings for [`kmeans`].
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansConfig {
    /// Number of clusters
    pub k: usize,
    /// Maximum iterations
    pub max_iter: usize,
    /// Random seed for k-means++ initialization
    pub seed: u64,
    /// Stop once no centroid moves further than this
    pub tolerance: f64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            k: 3,
            max_iter: 300,
            seed: 42,
            tolerance: 1e-4,
        }
    }
}

impl KMeansConfig {
    /// Cluster count; at least 1.
    pub fn k(mut self, k: usize) -> Self {
        self.k = k.max(1);
        self
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// Output of [`kmeans`].
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansResult {
    /// Cluster index per input point.
    pub labels: Vec<usize>,
    pub centroids: Vec<Vec<f64>>,
    /// Sum of squared distances from each point to its centroid.
    pub inertia: f64,
    /// Lloyd iterations run.
    pub n_iter: usize,
    /// Whether the centroid shift fell below tolerance
    pub converged: bool,
}

impl KMeansResult {
    /// Points per cluster, indexed by cluster.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        self.labels
            .iter()
            .fold(vec![0; self.centroids.len()], |mut counts, &l| {
                counts[l] += 1;
                counts
            })
    }
}

/// Perform k-means clustering on equal-length points.
///
/// `k` is capped at the number of points.
pub fn kmeans(points: &[Vec<f64>], config: &KMeansConfig) -> KMeansResult {
    let n = points.len();
    let k = config.k.min(n);

    if n == 0 || k == 0 {
        return KMeansResult {
            labels: Vec::new(),
            centroids: Vec::new(),
            inertia: 0.0,
            n_iter: 0,
            converged: true,
        };
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut centroids = initialize_centroids(points, k, &mut rng);

    let mut labels = vec![0; n];
    let mut n_iter = 0;
    let mut converged = false;

    for iter in 0..config.max_iter {
        n_iter = iter + 1;

        // Assignment step
        for (i, p) in points.iter().enumerate() {
            labels[i] = find_nearest_centroid(p, &centroids).0;
        }

        // Update step
        let updated = update_centroids(points, &labels, &centroids);
        let shift = centroids
            .iter()
            .zip(&updated)
            .map(|(old, new)| squared_distance(old, new).sqrt())
            .fold(0.0, f64::max);
        centroids = updated;

        if shift < config.tolerance {
            converged = true;
            break;
        }
    }

    // Final assignment against the last centroids
    for (i, p) in points.iter().enumerate() {
        labels[i] = find_nearest_centroid(p, &centroids).0;
    }
    let inertia = compute_inertia(points, &labels, &centroids);

    KMeansResult {
        labels,
        centroids,
        inertia,
        n_iter,
        converged,
    }
}

/// Initialize centroids using the k-means++ algorithm.
fn initialize_centroids(points: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let n = points.len();
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.gen_range(0..n)].clone());

    while centroids.len() < k {
        // Squared distance to the nearest chosen centroid
        let distances: Vec<f64> = points
            .iter()
            .map(|p| find_nearest_centroid(p, &centroids).1)
            .collect();
        let selected = match WeightedIndex::new(&distances) {
            Ok(weights) => rng.sample(&weights),
            // Every point coincides with a centroid already
            Err(_) => rng.gen_range(0..n),
        };

        centroids.push(points[selected].clone());
    }

    centroids
}

/// Find the nearest centroid for a point, with its squared distance.
fn find_nearest_centroid(point: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
    let mut min_dist = f64::INFINITY;
    let mut nearest = 0;

    for (i, centroid) in centroids.iter().enumerate() {
        let dist = squared_distance(point, centroid);
        if dist < min_dist {
            min_dist = dist;
            nearest = i;
        }
    }

    (nearest, min_dist)
}

/// Squared Euclidean distance.
pub fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Mean of each cluster; an empty cluster keeps its previous centroid.
fn update_centroids(points: &[Vec<f64>], labels: &[usize], previous: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let dims = points.first().map_or(0, |p| p.len());
    let mut sums = vec![vec![0.0; dims]; previous.len()];
    let mut counts = vec![0usize; previous.len()];

    for (p, &l) in points.iter().zip(labels) {
        counts[l] += 1;
        for (s, x) in sums[l].iter_mut().zip(p) {
            *s += x;
        }
    }

    sums.into_iter()
        .zip(counts)
        .zip(previous)
        .map(|((sum, count), prev)| {
            if count == 0 {
                prev.clone()
            } else {
                sum.into_iter().map(|s| s / count as f64).collect()
            }
        })
        .collect()
}

/// Compute inertia (total within-cluster sum of squared distances).
fn compute_inertia(points: &[Vec<f64>], labels: &[usize], centroids: &[Vec<f64>]) -> f64 {
    points
        .iter()
        .zip(labels.iter())
        .map(|(p, &l)| squared_distance(p, &centroids[l]))
        .sum()
}

/// Inertia for every `k` in `1..=max_k`, for choosing a cluster count.
pub fn elbow_inertias(points: &[Vec<f64>], max_k: usize, seed: u64) -> Vec<f64> {
    (1..=max_k.min(points.len()))
        .map(|k| {
            let config = KMeansConfig::default().k(k).seed(seed);
            kmeans(points, &config).inertia
        })
        .collect()
}
