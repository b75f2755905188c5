//! Performance classifier: feature selection, seeded split, tree fit and evaluation

use log::{debug, info, warn};
use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::{LabelFallback, PipelineConfig};
use crate::data::{Column, Dataset, Field, CLUSTER_COLUMN};
use crate::error::{PipelineError, SkipReason};
use crate::tree::{argmax, DecisionTree, TreeParams};

/// Candidate training features, in the order they are fed to the tree.
pub const CLASSIFIER_FEATURES: [Field; 4] = [
    Field::Age,
    Field::CurrentSemester,
    Field::Attendance,
    Field::CreditsCompleted,
];

/// Training is skipped when fewer candidate features are present.
pub const MIN_CLASSIFIER_FEATURES: usize = 2;

/// At least one training and one held-out row.
const MIN_TRAINING_ROWS: usize = 2;

/// A fitted classifier. Immutable after training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierModel {
    features: Vec<Field>,
    label_column: String,
    classes: Vec<String>,
    medians: Vec<f64>,
    tree: DecisionTree,
}

impl ClassifierModel {
    /// Feature layout expected by [`ClassifierModel::predict`].
    pub fn features(&self) -> &[Field] {
        &self.features
    }

    pub fn label_column(&self) -> &str {
        &self.label_column
    }

    /// Class labels, indexed like the probability vector.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn tree(&self) -> &DecisionTree {
        &self.tree
    }

    /// Per-class probabilities for one feature vector.
    ///
    /// NaN entries are treated as missing and replaced with the training median.
    pub fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, PipelineError> {
        if features.len() != self.features.len() {
            return Err(PipelineError::InvalidFeatureVector {
                expected: self.features.len(),
                actual: features.len(),
            });
        }
        let row: Vec<f64> = features
            .iter()
            .zip(&self.medians)
            .map(|(&v, &median)| if v.is_nan() { median } else { v })
            .collect();
        Ok(self.tree.predict_proba(&row).to_vec())
    }

    pub fn predict(&self, features: &[f64]) -> Result<&str, PipelineError> {
        let proba = self.predict_proba(features)?;
        Ok(&self.classes[argmax(&proba)])
    }

    /// Normalised gini importance per feature, in training order.
    pub fn feature_importances(&self) -> Vec<(Field, f64)> {
        self.features
            .iter()
            .copied()
            .zip(self.tree.feature_importances().iter().copied())
            .collect()
    }
}

/// Held-out evaluation of a freshly trained model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    /// Fraction of exact label matches on the held-out rows.
    pub accuracy: f64,
    pub n_train: usize,
    pub n_test: usize,
    pub features: Vec<Field>,
    pub classes: Vec<String>,
    /// `confusion[actual][predicted]`, indexed like `classes`.
    pub confusion: Vec<Vec<usize>>,
    pub importances: Vec<(Field, f64)>,
}

#[derive(Debug, Clone)]
pub struct TrainedClassifier {
    pub model: ClassifierModel,
    pub evaluation: Evaluation,
}

/// Result of the training stage. `Skipped` is a degraded outcome, not an error.
#[derive(Debug, Clone)]
pub enum TrainOutcome {
    Trained(TrainedClassifier),
    Skipped(SkipReason),
}

impl TrainOutcome {
    /// Held-out accuracy, 0.0 when training was skipped.
    pub fn accuracy(&self) -> f64 {
        match self {
            TrainOutcome::Trained(trained) => trained.evaluation.accuracy,
            TrainOutcome::Skipped(_) => 0.0,
        }
    }

    pub fn model(&self) -> Option<&ClassifierModel> {
        match self {
            TrainOutcome::Trained(trained) => Some(&trained.model),
            TrainOutcome::Skipped(_) => None,
        }
    }

    /// `(model or none, accuracy)`.
    pub fn into_parts(self) -> (Option<ClassifierModel>, f64) {
        match self {
            TrainOutcome::Trained(trained) => (Some(trained.model), trained.evaluation.accuracy),
            TrainOutcome::Skipped(_) => (None, 0.0),
        }
    }
}

/// Train with the default configuration.
pub fn train(dataset: &Dataset) -> TrainOutcome {
    train_with(dataset, &PipelineConfig::default())
}

/// Train a decision tree on the available classifier features.
///
/// # Arguments
/// * `dataset` - Cleaned dataset
/// * `config` - Seed, split fraction, depth and label fallback
///
/// # Returns
/// * `TrainOutcome::Trained` with the model and held-out evaluation, or
///   `TrainOutcome::Skipped` when features, label or rows are insufficient
pub fn train_with(dataset: &Dataset, config: &PipelineConfig) -> TrainOutcome {
    let features = dataset.schema().available(&CLASSIFIER_FEATURES);
    if features.len() < MIN_CLASSIFIER_FEATURES {
        return skip(SkipReason::InsufficientFeatures {
            available: features.iter().map(|f| f.column_name().to_string()).collect(),
            required: MIN_CLASSIFIER_FEATURES,
        });
    }

    let Some(label_column) = resolve_label(dataset, &config.label_fallback) else {
        return skip(SkipReason::MissingLabel);
    };

    let n_rows = dataset.n_rows();
    let (train_rows, test_rows) = train_test_split(n_rows, config.test_fraction, config.seed);
    if n_rows < MIN_TRAINING_ROWS || train_rows.is_empty() || test_rows.is_empty() {
        return skip(SkipReason::TooFewRows {
            rows: n_rows,
            required: MIN_TRAINING_ROWS,
        });
    }
    debug!(
        "Split {} rows into {} train / {} test (seed {})",
        n_rows,
        train_rows.len(),
        test_rows.len(),
        config.seed
    );

    let (x, medians) = dataset.median_filled(&features);
    let labels: Vec<String> = label_column.values().iter().map(|v| v.to_string()).collect();
    let mut classes = labels.clone();
    classes.sort();
    classes.dedup();
    let y: Vec<usize> = labels
        .iter()
        .map(|l| classes.binary_search(l).unwrap_or_default())
        .collect();

    let x_train: Array2<f64> = x.select(Axis(0), &train_rows);
    let y_train: Vec<usize> = train_rows.iter().map(|&r| y[r]).collect();
    let params = TreeParams {
        max_depth: config.max_depth,
        ..TreeParams::default()
    };
    let tree = DecisionTree::fit(x_train.view(), &y_train, classes.len(), params);

    let mut confusion = vec![vec![0usize; classes.len()]; classes.len()];
    let mut correct = 0;
    for &r in &test_rows {
        let row = x.row(r).to_vec();
        let predicted = tree.predict(&row);
        confusion[y[r]][predicted] += 1;
        if predicted == y[r] {
            correct += 1;
        }
    }
    let accuracy = correct as f64 / test_rows.len() as f64;

    let model = ClassifierModel {
        features: features.clone(),
        label_column: label_column.name().to_string(),
        classes: classes.clone(),
        medians,
        tree,
    };

    info!("Classification model trained: accuracy {:.3}", accuracy);
    info!(
        "Features used: {:?}",
        features.iter().map(|f| f.column_name()).collect::<Vec<_>>()
    );

    let evaluation = Evaluation {
        accuracy,
        n_train: train_rows.len(),
        n_test: test_rows.len(),
        features,
        classes,
        confusion,
        importances: model.feature_importances(),
    };
    TrainOutcome::Trained(TrainedClassifier { model, evaluation })
}

/// Shuffle row indices with `seed` and hold out `ceil(n * test_fraction)` of them.
///
/// Returns `(train, test)`; identical inputs always give identical partitions.
pub fn train_test_split(n_rows: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let n_test = ((n_rows as f64) * test_fraction).ceil() as usize;
    let n_test = n_test.min(n_rows);

    let mut indices: Vec<usize> = (0..n_rows).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    (train, indices)
}

fn resolve_label<'a>(dataset: &'a Dataset, fallback: &LabelFallback) -> Option<&'a Column> {
    if let Some(column) = dataset.field(Field::PerformanceCategory) {
        return Some(column);
    }
    match fallback {
        LabelFallback::None => None,
        LabelFallback::LastColumn => {
            let column = dataset
                .columns()
                .iter()
                .rev()
                .find(|c| c.name() != CLUSTER_COLUMN)?;
            warn!(
                "No Performance_Category column; training on last column '{}'",
                column.name()
            );
            Some(column)
        }
        LabelFallback::Column(name) => dataset.column(name),
    }
}

fn skip(reason: SkipReason) -> TrainOutcome {
    warn!("Classification skipped: {}", reason);
    TrainOutcome::Skipped(reason)
}
