//! Command-line interface definitions and argument parsing

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::{LabelFallback, PipelineConfig};
use crate::data::SourceFormat;

/// Input format override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Csv,
    Xlsx,
}

impl From<FormatArg> for SourceFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => SourceFormat::Csv,
            FormatArg::Xlsx => SourceFormat::Xlsx,
        }
    }
}

/// Student performance analytics: classification, clustering and association rules
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input CSV or xlsx file
    #[arg(short, long, default_value = "students.csv")]
    pub input: PathBuf,

    /// Input format; inferred from the file extension when omitted
    #[arg(short, long, value_enum)]
    pub format: Option<FormatArg>,

    /// Prediction mode: feature values as comma-separated string, in the order
    /// age,current_semester,attendance,credits_completed (only columns present in the input)
    /// Example: --predict "20,3,92,45"
    #[arg(short, long)]
    pub predict: Option<String>,

    /// Directory to write the trained model snapshots to
    #[arg(short = 'm', long)]
    pub save_models: Option<PathBuf>,

    /// Output path for the cluster scatter plot (PNG); a size chart is written next to it
    #[arg(long)]
    pub plot: Option<PathBuf>,

    /// Seed for the train/test split and K-Means initialisation
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Maximum decision tree depth
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u64).range(1..=10))]
    pub max_depth: u64,

    /// Label column when Performance_Category cannot be derived: "none", "last" or a column name
    #[arg(long, default_value = "last")]
    pub label_fallback: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Parse the feature vector from the predict string
    pub fn parse_feature_vector(&self) -> crate::Result<Option<Vec<f64>>> {
        let Some(ref predict_str) = self.predict else {
            return Ok(None);
        };

        let values = predict_str
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<f64>()
                    .map_err(|_| anyhow::anyhow!("Invalid feature value: {}", part))
            })
            .collect::<crate::Result<Vec<f64>>>()?;

        if values.is_empty() {
            anyhow::bail!("Predict values must be a comma-separated list of numbers");
        }
        Ok(Some(values))
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        let label_fallback = self
            .label_fallback
            .parse::<LabelFallback>()
            .unwrap_or(LabelFallback::LastColumn);
        PipelineConfig {
            seed: self.seed,
            max_depth: self.max_depth as usize,
            label_fallback,
            ..PipelineConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(predict: Option<&str>) -> Args {
        Args {
            input: PathBuf::from("students.csv"),
            format: None,
            predict: predict.map(str::to_string),
            save_models: None,
            plot: None,
            seed: 7,
            max_depth: 5,
            label_fallback: "none".to_string(),
            verbose: false,
        }
    }

    #[test]
    fn test_parse_feature_vector() {
        let result = args(Some("20, 3,92.5,45")).parse_feature_vector().unwrap();
        assert_eq!(result, Some(vec![20.0, 3.0, 92.5, 45.0]));

        assert_eq!(args(None).parse_feature_vector().unwrap(), None);
        assert!(args(Some("20,abc")).parse_feature_vector().is_err());
    }

    #[test]
    fn test_pipeline_config() {
        let config = args(None).pipeline_config();
        assert_eq!(config.seed, 7);
        assert_eq!(config.max_depth, 5);
        assert_eq!(config.label_fallback, LabelFallback::None);
        assert_eq!(config.n_clusters, 3);
    }

    #[test]
    fn test_cli_parses() {
        let args = Args::try_parse_from(["gradeforge", "-i", "data.xlsx", "--format", "xlsx", "-p", "1,2"]).unwrap();
        assert_eq!(args.format, Some(FormatArg::Xlsx));
        assert_eq!(args.seed, 42);
        assert!(Args::try_parse_from(["gradeforge", "--max-depth", "11"]).is_err());
    }
}
