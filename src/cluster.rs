//! K-Means segmentation of students on standardized GPA and attendance

use linfa::prelude::*;
use linfa_clustering::KMeans;
use linfa_nn::distance::L2Dist;
use linfa_preprocessing::linear_scaling::LinearScaler;
use log::{info, warn};
use ndarray::{s, Array1, Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::data::{Column, Dataset, Field, Value, CLUSTER_COLUMN};
use crate::error::{PipelineError, SkipReason};

/// Clustering features, in column order of the feature matrix.
pub const CLUSTER_FEATURES: [Field; 2] = [Field::CurrentCgpa, Field::Attendance];

/// Clustering is skipped when fewer features are present.
pub const MIN_CLUSTER_FEATURES: usize = 2;

/// Rows used for the silhouette estimate.
const SILHOUETTE_SAMPLE: usize = 100;

/// Fitted K-Means model with the scaler needed to place new students.
///
/// Cluster ids are arbitrary; id 0 is not ranked above id 2.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterModel {
    features: Vec<Field>,
    scaler: LinearScaler<f64>,
    /// Training medians, substituted for non-finite inputs.
    medians: Vec<f64>,
    /// Centroids in standardized space, one row per cluster.
    centroids: Array2<f64>,
}

impl ClusterModel {
    pub fn features(&self) -> &[Field] {
        &self.features
    }

    pub fn n_clusters(&self) -> usize {
        self.centroids.nrows()
    }

    pub fn scaler(&self) -> &LinearScaler<f64> {
        &self.scaler
    }

    pub fn medians(&self) -> &[f64] {
        &self.medians
    }

    pub fn centroids(&self) -> &Array2<f64> {
        &self.centroids
    }

    /// Centroids mapped back to raw feature units.
    pub fn centroids_raw(&self) -> Array2<f64> {
        &self.centroids / self.scaler.scales() + self.scaler.offsets()
    }

    /// Assign raw (unscaled) feature values to the nearest centroid.
    ///
    /// NaN or infinite entries are treated as missing and replaced with the
    /// training median, as at fit time.
    pub fn predict(&self, features: &[f64]) -> Result<usize, PipelineError> {
        if features.len() != self.features.len() {
            return Err(PipelineError::InvalidFeatureVector {
                expected: self.features.len(),
                actual: features.len(),
            });
        }
        let filled: Array1<f64> = features
            .iter()
            .zip(&self.medians)
            .map(|(&v, &median)| if v.is_finite() { v } else { median })
            .collect();
        let scaled = self.scaler.transform(filled.insert_axis(Axis(0)));
        Ok(self.nearest_centroid(scaled.row(0)))
    }

    fn nearest_centroid(&self, point: ArrayView1<f64>) -> usize {
        let mut min_distance = f64::INFINITY;
        let mut closest = 0;
        for (cluster_idx, centroid) in self.centroids.outer_iter().enumerate() {
            let distance = (&centroid - &point).mapv(|d| d * d).sum();
            if distance < min_distance {
                min_distance = distance;
                closest = cluster_idx;
            }
        }
        closest
    }
}

/// Size and mean raw feature values of one cluster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSummary {
    pub cluster: usize,
    pub size: usize,
    /// Mean of each clustering feature (raw units), 0.0 for an empty cluster.
    pub means: Vec<f64>,
}

/// Everything the clustering stage produces.
#[derive(Debug, Clone)]
pub struct Clustering {
    pub model: ClusterModel,
    /// Cluster id per dataset row.
    pub labels: Vec<usize>,
    pub summaries: Vec<ClusterSummary>,
    /// Mean distance of a row to its centroid in standardized space, as
    /// reported by K-Means.
    pub inertia: f64,
    /// Mean silhouette over a leading sample of rows, in standardized space.
    pub silhouette: f64,
    /// Median-filled clustering features before scaling.
    pub raw_features: Array2<f64>,
}

impl Clustering {
    pub fn cluster_sizes(&self) -> Vec<usize> {
        self.summaries.iter().map(|s| s.size).collect()
    }
}

/// Result of the clustering stage. `Skipped` is a degraded outcome, not an error.
#[derive(Debug, Clone)]
pub enum ClusterOutcome {
    Clustered(Clustering),
    Skipped(SkipReason),
}

impl ClusterOutcome {
    pub fn model(&self) -> Option<&ClusterModel> {
        match self {
            ClusterOutcome::Clustered(c) => Some(&c.model),
            ClusterOutcome::Skipped(_) => None,
        }
    }

    pub fn labels(&self) -> &[usize] {
        match self {
            ClusterOutcome::Clustered(c) => &c.labels,
            ClusterOutcome::Skipped(_) => &[],
        }
    }

    /// `(model or none, labels)`; labels are empty when skipped.
    pub fn into_parts(self) -> (Option<ClusterModel>, Vec<usize>) {
        match self {
            ClusterOutcome::Clustered(c) => (Some(c.model), c.labels),
            ClusterOutcome::Skipped(_) => (None, Vec::new()),
        }
    }
}

/// Cluster with the default configuration.
pub fn cluster(dataset: &mut Dataset) -> ClusterOutcome {
    cluster_with(dataset, &PipelineConfig::default())
}

/// Fit K-Means on standardized `current_cgpa` and `attendance`.
///
/// On success the cluster id of every row is written to the `Cluster`
/// column of `dataset`.
///
/// # Arguments
/// * `dataset` - Cleaned dataset; receives the `Cluster` column
/// * `config` - Number of clusters, seed and convergence settings
pub fn cluster_with(dataset: &mut Dataset, config: &PipelineConfig) -> ClusterOutcome {
    let features = dataset.schema().available(&CLUSTER_FEATURES);
    if features.len() < MIN_CLUSTER_FEATURES {
        return skip(SkipReason::InsufficientFeatures {
            available: features.iter().map(|f| f.column_name().to_string()).collect(),
            required: MIN_CLUSTER_FEATURES,
        });
    }

    let n_clusters = config.n_clusters;
    if dataset.n_rows() < n_clusters {
        return skip(SkipReason::TooFewRows {
            rows: dataset.n_rows(),
            required: n_clusters,
        });
    }

    let (raw_features, medians) = dataset.median_filled(&features);
    let distinct = count_distinct_rows(&raw_features);
    if distinct < n_clusters {
        return skip(SkipReason::DegenerateData(format!(
            "{} distinct points for {} clusters",
            distinct, n_clusters
        )));
    }

    let scaler = match LinearScaler::standard().fit(&DatasetBase::from(raw_features.clone())) {
        Ok(scaler) => scaler,
        Err(e) => return skip(SkipReason::DegenerateData(e.to_string())),
    };
    let scaled = scaler.transform(raw_features.clone());

    let rng = StdRng::seed_from_u64(config.seed);
    let observations = DatasetBase::from(scaled.clone());
    let fitted = match KMeans::params_with(n_clusters, rng, L2Dist)
        .max_n_iterations(config.kmeans_max_iters)
        .tolerance(config.kmeans_tolerance)
        .fit(&observations)
    {
        Ok(fitted) => fitted,
        Err(e) => return skip(SkipReason::DegenerateData(e.to_string())),
    };

    let labels: Array1<usize> = fitted.predict(&scaled);
    let centroids = fitted.centroids().clone();
    let inertia = fitted.inertia();
    let silhouette = silhouette_sample(&scaled, &labels, SILHOUETTE_SAMPLE);
    let summaries = summarize(&raw_features, &labels, n_clusters);

    info!("Clustering completed: {} clusters, inertia {:.3}", n_clusters, inertia);
    for summary in &summaries {
        info!(
            "  cluster {}: {} rows, means {:?}",
            summary.cluster, summary.size, summary.means
        );
    }

    let labels = labels.to_vec();
    dataset.set_column(Column::new(
        CLUSTER_COLUMN,
        labels.iter().map(|&l| Value::Number(l as f64)).collect(),
    ));

    ClusterOutcome::Clustered(Clustering {
        model: ClusterModel {
            features,
            scaler,
            medians,
            centroids,
        },
        labels,
        summaries,
        inertia,
        silhouette,
        raw_features,
    })
}

fn skip(reason: SkipReason) -> ClusterOutcome {
    warn!("Clustering skipped: {}", reason);
    ClusterOutcome::Skipped(reason)
}

fn count_distinct_rows(features: &Array2<f64>) -> usize {
    let mut rows: Vec<Vec<f64>> = features.outer_iter().map(|r| r.to_vec()).collect();
    rows.sort_by(|a, b| {
        a.iter()
            .zip(b)
            .map(|(x, y)| x.total_cmp(y))
            .find(|o| o.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    rows.dedup();
    rows.len()
}

/// Per-cluster size and mean of the raw features.
fn summarize(raw: &Array2<f64>, labels: &Array1<usize>, n_clusters: usize) -> Vec<ClusterSummary> {
    let mut sums = Array2::<f64>::zeros((n_clusters, raw.ncols()));
    let mut sizes = vec![0usize; n_clusters];
    for (row, &cluster) in raw.outer_iter().zip(labels.iter()) {
        if cluster < n_clusters {
            sizes[cluster] += 1;
            let mut acc = sums.row_mut(cluster);
            acc += &row;
        }
    }
    (0..n_clusters)
        .map(|cluster| ClusterSummary {
            cluster,
            size: sizes[cluster],
            means: if sizes[cluster] == 0 {
                vec![0.0; raw.ncols()]
            } else {
                sums.row(cluster).iter().map(|s| s / sizes[cluster] as f64).collect()
            },
        })
        .collect()
}

/// Silhouette score over the first `sample_size` rows; 0.0 when it cannot
/// be computed.
fn silhouette_sample(scaled: &Array2<f64>, labels: &Array1<usize>, sample_size: usize) -> f64 {
    let n = scaled.nrows().min(sample_size);
    if n < 2 {
        return 0.0;
    }
    let sample = DatasetBase::new(scaled.slice(s![..n, ..]).to_owned(), labels.slice(s![..n]).to_owned());
    sample.silhouette_score().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Three well separated groups of three students.
    fn create_test_dataset() -> Dataset {
        Dataset::from_columns(vec![
            Column::numeric(
                "current_cgpa",
                &[3.9, 3.8, 3.85, 3.0, 3.1, 3.05, 1.0, 1.1, 1.05],
            ),
            Column::numeric(
                "attendance",
                &[95.0, 96.0, 94.0, 80.0, 81.0, 79.0, 50.0, 52.0, 51.0],
            ),
        ])
        .unwrap()
        .clean()
    }

    #[test]
    fn test_cluster_separates_groups() {
        let mut dataset = create_test_dataset();
        let outcome = cluster(&mut dataset);
        let ClusterOutcome::Clustered(clustering) = outcome else {
            panic!("expected clustering");
        };

        assert_eq!(clustering.labels.len(), 9);
        assert_eq!(clustering.model.n_clusters(), 3);
        for group in clustering.labels.chunks(3) {
            assert!(group.iter().all(|&l| l == group[0]));
        }
        let mut ids: Vec<usize> = clustering.labels.iter().step_by(3).copied().collect();
        ids.sort();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(clustering.cluster_sizes(), vec![3, 3, 3]);
        assert!(clustering.inertia >= 0.0 && clustering.inertia.is_finite());
        assert!(clustering.silhouette > 0.5);

        let column = dataset.field(Field::Cluster).unwrap();
        assert_eq!(column.len(), 9);
        assert!(dataset.schema().has(Field::Cluster));
    }

    #[test]
    fn test_cluster_means_in_raw_units() {
        let mut dataset = create_test_dataset();
        let ClusterOutcome::Clustered(clustering) = cluster(&mut dataset) else {
            panic!("expected clustering");
        };
        let low = clustering.labels[6];
        let summary = &clustering.summaries[low];
        assert!((summary.means[0] - 1.05).abs() < 1e-9);
        assert!((summary.means[1] - 51.0).abs() < 1e-9);
    }

    #[test]
    fn test_cluster_is_deterministic() {
        let mut a = create_test_dataset();
        let mut b = create_test_dataset();
        assert_eq!(cluster(&mut a).labels(), cluster(&mut b).labels());
    }

    #[test]
    fn test_predict_new_student() {
        let mut dataset = create_test_dataset();
        let outcome = cluster(&mut dataset);
        let clustering = match &outcome {
            ClusterOutcome::Clustered(c) => c,
            ClusterOutcome::Skipped(reason) => panic!("skipped: {}", reason),
        };
        let model = &clustering.model;

        assert_eq!(model.predict(&[3.88, 95.5]).unwrap(), clustering.labels[0]);
        assert_eq!(model.predict(&[1.02, 50.5]).unwrap(), clustering.labels[6]);
        assert!(model.predict(&[3.0]).is_err());

        let raw = model.centroids_raw();
        assert_eq!(raw.shape(), &[3, 2]);
        for summary in &clustering.summaries {
            assert!((raw[[summary.cluster, 0]] - summary.means[0]).abs() < 1e-6);
            assert!((raw[[summary.cluster, 1]] - summary.means[1]).abs() < 1e-6);
        }
    }

    #[test]
    fn test_retained_scaler_standardizes_training_rows() {
        let mut dataset = create_test_dataset();
        let ClusterOutcome::Clustered(clustering) = cluster(&mut dataset) else {
            panic!("expected clustering");
        };
        let scaled = clustering.model.scaler().transform(clustering.raw_features.clone());
        for column in scaled.axis_iter(Axis(1)) {
            assert!(column.mean().unwrap().abs() < 1e-9);
            assert!(column.iter().any(|&v| v.abs() > 0.5));
        }
    }

    #[test]
    fn test_predict_non_finite_uses_training_median() {
        let mut dataset = create_test_dataset();
        let ClusterOutcome::Clustered(clustering) = cluster(&mut dataset) else {
            panic!("expected clustering");
        };
        let model = &clustering.model;
        // Medians of the fixture are 3.05 and 80.0, inside the middle group.
        assert_eq!(model.medians(), &[3.05, 80.0]);
        let middle = clustering.labels[3];

        assert_eq!(model.predict(&[f64::NAN, f64::NAN]).unwrap(), middle);
        assert_eq!(model.predict(&[f64::INFINITY, 80.5]).unwrap(), middle);
    }

    #[test]
    fn test_missing_feature_column_is_degraded() {
        let mut dataset = Dataset::from_columns(vec![Column::numeric(
            "attendance",
            &[90.0, 80.0, 70.0, 60.0],
        )])
        .unwrap()
        .clean();
        let outcome = cluster(&mut dataset);
        assert!(matches!(
            outcome,
            ClusterOutcome::Skipped(SkipReason::InsufficientFeatures { .. })
        ));
        assert!(outcome.labels().is_empty());
        assert!(!dataset.schema().has(Field::Cluster));
    }

    #[test]
    fn test_empty_and_degenerate_datasets() {
        let mut empty = Dataset::from_columns(vec![
            Column::numeric("current_cgpa", &[]),
            Column::numeric("attendance", &[]),
        ])
        .unwrap()
        .clean();
        assert!(matches!(
            cluster(&mut empty),
            ClusterOutcome::Skipped(SkipReason::TooFewRows { rows: 0, .. })
        ));

        let mut identical = Dataset::from_columns(vec![
            Column::numeric("current_cgpa", &[3.0; 5]),
            Column::numeric("attendance", &[80.0; 5]),
        ])
        .unwrap()
        .clean();
        assert!(matches!(
            cluster(&mut identical),
            ClusterOutcome::Skipped(SkipReason::DegenerateData(_))
        ));
    }
}
