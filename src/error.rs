//! Error types for the analysis pipeline.
//!
//! Only fatal failures are represented here. Degraded outcomes (too few
//! feature columns, too few rows, empty datasets) are ordinary return values
//! of each stage and never surface as an `Err`.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal pipeline failure. Any `Err` carrying this type aborts the run.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PipelineError {
    /// The tabular source could not be read or is not a rectangular table.
    #[error("failed to load dataset from {}: {reason}", .path.display())]
    DataLoad {
        /// Source that was being read.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// A feature vector does not match the layout used at fit time.
    #[error("invalid feature vector: expected {expected} values, got {actual}")]
    InvalidFeatureVector {
        /// Number of features the model was trained on.
        expected: usize,
        /// Number of features supplied by the caller.
        actual: usize,
    },

    /// A model snapshot could not be written or read back.
    #[error("model snapshot error at {}: {reason}", .path.display())]
    Persist {
        /// Artifact path.
        path: PathBuf,
        /// Underlying I/O or serialization failure.
        reason: String,
    },

    /// A chart could not be rendered.
    #[error("failed to render chart {}: {reason}", .path.display())]
    Plot {
        /// Output image path.
        path: PathBuf,
        /// Backend error.
        reason: String,
    },
}

impl PipelineError {
    pub(crate) fn data_load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::DataLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn persist(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Persist {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn plot(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Plot {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Why a stage returned no model instead of failing the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Fewer of the stage's canonical feature columns were present than needed.
    InsufficientFeatures {
        /// Columns that were found, in canonical order.
        available: Vec<String>,
        /// Minimum number of columns the stage needs.
        required: usize,
    },
    /// Not enough rows to fit or evaluate a model.
    TooFewRows {
        /// Rows in the dataset.
        rows: usize,
        /// Minimum rows the stage needs.
        required: usize,
    },
    /// No label column could be resolved for training.
    MissingLabel,
    /// The fitting routine rejected the data (e.g. all points identical).
    DegenerateData(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientFeatures {
                available,
                required,
            } => write!(
                f,
                "insufficient features: found {:?}, need at least {}",
                available, required
            ),
            Self::TooFewRows { rows, required } => {
                write!(f, "too few rows: {} (need at least {})", rows, required)
            }
            Self::MissingLabel => write!(f, "no label column available"),
            Self::DegenerateData(reason) => write!(f, "degenerate data: {}", reason),
        }
    }
}
