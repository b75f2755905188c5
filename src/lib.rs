//! GradeForge: student performance analytics
//!
//! Loads a table of student records, labels each student with a performance
//! category derived from GPA, trains a decision tree classifier, segments
//! students with K-Means and mines association rules between study habits
//! and outcomes.

pub mod analyzer;
pub mod category;
pub mod classifier;
pub mod cli;
pub mod cluster;
pub mod config;
pub mod data;
pub mod error;
pub mod persist;
pub mod predict;
pub mod rules;
pub mod tree;
pub mod viz;

// Re-export public items for easier access
pub use analyzer::{AnalysisReport, StageStatus, StudentPerformanceAnalyzer};
pub use category::{categorize, PerformanceCategory};
pub use classifier::{train, ClassifierModel, TrainOutcome};
pub use cli::Args;
pub use cluster::{cluster, ClusterModel, ClusterOutcome};
pub use config::{LabelFallback, PipelineConfig};
pub use data::{load, Dataset, Field, SourceFormat, Value};
pub use error::{PipelineError, SkipReason};
pub use persist::save;
pub use predict::{predict, Prediction, PredictionResult};
pub use rules::{mine, AssociationRule};

/// Result type used by the command-line driver
pub type Result<T> = anyhow::Result<T>;
