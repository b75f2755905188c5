//! End-to-end student performance analysis

use std::path::{Path, PathBuf};

use log::info;

use crate::category::{performance_distribution, PerformanceCategory};
use crate::classifier::{self, ClassifierModel, Evaluation, TrainOutcome};
use crate::cluster::{self, ClusterModel, ClusterOutcome, Clustering};
use crate::config::PipelineConfig;
use crate::data::{self, Dataset, SourceFormat};
use crate::error::{PipelineError, SkipReason};
use crate::persist;
use crate::predict::{self, PredictionResult};
use crate::rules::{self, AssociationRule};

/// Outcome of a stage that can degrade without failing the run.
#[derive(Debug, Clone)]
pub enum StageStatus<T> {
    Done(T),
    Unavailable(SkipReason),
}

impl<T> StageStatus<T> {
    pub fn as_done(&self) -> Option<&T> {
        match self {
            StageStatus::Done(value) => Some(value),
            StageStatus::Unavailable(_) => None,
        }
    }
}

/// Everything one pipeline run reports back to its caller.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub rows: usize,
    /// Rows per performance category; `None` without a `current_cgpa` column.
    pub distribution: Option<Vec<(PerformanceCategory, usize)>>,
    pub classification: StageStatus<Evaluation>,
    pub clustering: StageStatus<Clustering>,
    pub rules: Vec<AssociationRule>,
}

impl AnalysisReport {
    /// Held-out accuracy, 0.0 when the classifier is unavailable.
    pub fn accuracy(&self) -> f64 {
        self.classification.as_done().map_or(0.0, |e| e.accuracy)
    }
}

/// Holds the pipeline configuration and the models fitted by the latest run.
#[derive(Debug, Clone, Default)]
pub struct StudentPerformanceAnalyzer {
    config: PipelineConfig,
    classifier: Option<ClassifierModel>,
    cluster_model: Option<ClusterModel>,
}

impl StudentPerformanceAnalyzer {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            classifier: None,
            cluster_model: None,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn classifier(&self) -> Option<&ClassifierModel> {
        self.classifier.as_ref()
    }

    pub fn cluster_model(&self) -> Option<&ClusterModel> {
        self.cluster_model.as_ref()
    }

    /// Use a previously saved classifier for prediction.
    pub fn with_classifier(mut self, model: ClassifierModel) -> Self {
        self.classifier = Some(model);
        self
    }

    pub fn load(&self, path: impl AsRef<Path>, format: Option<SourceFormat>) -> Result<Dataset, PipelineError> {
        data::load(path, format)
    }

    /// Train and keep the model. A skipped run clears any earlier model.
    pub fn train(&mut self, dataset: &Dataset) -> TrainOutcome {
        let outcome = classifier::train_with(dataset, &self.config);
        self.classifier = outcome.model().cloned();
        outcome
    }

    /// Cluster, tag `dataset` with cluster ids and keep the model.
    pub fn cluster(&mut self, dataset: &mut Dataset) -> ClusterOutcome {
        let outcome = cluster::cluster_with(dataset, &self.config);
        self.cluster_model = outcome.model().cloned();
        outcome
    }

    pub fn mine(&self, dataset: &Dataset) -> Vec<AssociationRule> {
        rules::mine_with(dataset, &self.config.rule_templates)
    }

    pub fn predict(&self, features: &[f64]) -> Result<PredictionResult, PipelineError> {
        predict::predict(self.classifier.as_ref(), features)
    }

    /// Cluster id for raw clustering features, `None` without a fitted model.
    pub fn predict_cluster(&self, features: &[f64]) -> Result<Option<usize>, PipelineError> {
        self.cluster_model
            .as_ref()
            .map(|model| model.predict(features))
            .transpose()
    }

    pub fn save(&self, destination: impl AsRef<Path>) -> Result<Vec<PathBuf>, PipelineError> {
        persist::save(self.classifier.as_ref(), self.cluster_model.as_ref(), destination)
    }

    /// Run training, clustering and rule mining over a loaded dataset.
    pub fn run(&mut self, dataset: &mut Dataset) -> AnalysisReport {
        let distribution = performance_distribution(dataset);

        let classification = match self.train(dataset) {
            TrainOutcome::Trained(trained) => StageStatus::Done(trained.evaluation),
            TrainOutcome::Skipped(reason) => StageStatus::Unavailable(reason),
        };
        let clustering = match self.cluster(dataset) {
            ClusterOutcome::Clustered(clustering) => StageStatus::Done(clustering),
            ClusterOutcome::Skipped(reason) => StageStatus::Unavailable(reason),
        };
        let rules = self.mine(dataset);

        info!(
            "Analysis complete: {} rows, accuracy {:.3}, {} rules",
            dataset.n_rows(),
            classification.as_done().map_or(0.0, |e| e.accuracy),
            rules.len()
        );

        AnalysisReport {
            rows: dataset.n_rows(),
            distribution,
            classification,
            clustering,
            rules,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;
    use crate::predict::Prediction;

    #[test]
    fn test_run_on_sparse_dataset_degrades() {
        let mut dataset = Dataset::from_columns(vec![Column::numeric("attendance", &[90.0, 60.0])])
            .unwrap()
            .clean();
        let mut analyzer = StudentPerformanceAnalyzer::default();
        let report = analyzer.run(&mut dataset);

        assert!(report.distribution.is_none());
        assert!(matches!(report.classification, StageStatus::Unavailable(_)));
        assert!(matches!(report.clustering, StageStatus::Unavailable(_)));
        assert!(report.rules.is_empty());
        assert_eq!(report.accuracy(), 0.0);

        let prediction = analyzer.predict(&[1.0, 2.0]).unwrap();
        assert_eq!(prediction.prediction, Prediction::NotTrained);
        assert_eq!(analyzer.predict_cluster(&[3.0, 90.0]).unwrap(), None);
    }

    #[test]
    fn test_skipped_training_clears_model() {
        let mut full = Dataset::from_columns(vec![
            Column::numeric("age", &[20.0, 21.0, 22.0, 23.0, 24.0]),
            Column::numeric("attendance", &[60.0, 70.0, 80.0, 90.0, 95.0]),
            Column::numeric("current_cgpa", &[2.0, 2.6, 3.1, 3.6, 3.9]),
        ])
        .unwrap()
        .clean();
        let mut analyzer = StudentPerformanceAnalyzer::default();
        analyzer.run(&mut full);
        assert!(analyzer.classifier().is_some());
        assert!(analyzer.cluster_model().is_some());

        let sparse = Dataset::from_columns(vec![Column::numeric("age", &[20.0, 21.0])])
            .unwrap()
            .clean();
        analyzer.train(&sparse);
        assert!(analyzer.classifier().is_none());
    }
}
