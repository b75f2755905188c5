//! Single-student performance prediction

use serde::{Deserialize, Serialize};

use crate::classifier::ClassifierModel;
use crate::error::PipelineError;
use crate::tree::argmax;

/// Predicted label, or the sentinel for an untrained model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Prediction {
    Label(String),
    NotTrained,
}

impl std::fmt::Display for Prediction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Prediction::Label(label) => f.write_str(label),
            Prediction::NotTrained => f.write_str("Model not trained"),
        }
    }
}

/// Outcome of one prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub prediction: Prediction,
    /// Largest class probability of the leaf reached. Not a calibrated
    /// probability of being correct.
    pub confidence: f64,
}

impl PredictionResult {
    pub fn not_trained() -> Self {
        Self {
            prediction: Prediction::NotTrained,
            confidence: 0.0,
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.prediction, Prediction::NotTrained)
    }
}

/// Predict the performance label for one feature vector.
///
/// `features` must follow [`ClassifierModel::features`]. Without a model the
/// result is [`Prediction::NotTrained`] with confidence 0.0; a vector of the
/// wrong length is an error.
pub fn predict(model: Option<&ClassifierModel>, features: &[f64]) -> Result<PredictionResult, PipelineError> {
    let Some(model) = model else {
        return Ok(PredictionResult::not_trained());
    };

    let proba = model.predict_proba(features)?;
    let best = argmax(&proba);
    Ok(PredictionResult {
        prediction: Prediction::Label(model.classes()[best].clone()),
        confidence: proba[best],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{train, TrainOutcome};
    use crate::data::{Column, Dataset};

    fn trained_model() -> ClassifierModel {
        let dataset = Dataset::from_columns(vec![
            Column::numeric("age", &[20.0, 21.0, 22.0, 20.0, 21.0, 22.0, 23.0, 24.0, 20.0, 21.0]),
            Column::numeric(
                "attendance",
                &[95.0, 92.0, 90.0, 91.0, 94.0, 55.0, 50.0, 58.0, 52.0, 57.0],
            ),
            Column::numeric(
                "current_cgpa",
                &[3.8, 3.7, 3.9, 3.6, 3.75, 2.0, 2.1, 1.8, 2.2, 2.3],
            ),
        ])
        .unwrap()
        .clean();
        match train(&dataset) {
            TrainOutcome::Trained(trained) => trained.model,
            TrainOutcome::Skipped(reason) => panic!("training skipped: {}", reason),
        }
    }

    #[test]
    fn test_predict_without_model() {
        let result = predict(None, &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(result.prediction, Prediction::NotTrained);
        assert_eq!(result.confidence, 0.0);
        assert!(!result.is_available());
        assert_eq!(result.prediction.to_string(), "Model not trained");
    }

    #[test]
    fn test_predict_with_model() {
        let model = trained_model();
        let result = predict(Some(&model), &[21.0, 93.0]).unwrap();
        assert_eq!(result.prediction, Prediction::Label("Distinction".to_string()));
        assert!(result.confidence > 0.0 && result.confidence <= 1.0);

        let result = predict(Some(&model), &[21.0, 51.0]).unwrap();
        assert_eq!(result.prediction, Prediction::Label("Pass".to_string()));
    }

    #[test]
    fn test_predict_wrong_length() {
        let model = trained_model();
        let err = predict(Some(&model), &[21.0, 93.0, 4.0]).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InvalidFeatureVector {
                expected: 2,
                actual: 3
            }
        ));
    }
}
