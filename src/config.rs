//! Pipeline configuration

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::rules::{default_templates, RuleTemplate};

/// Which column to train on when the dataset has no `Performance_Category`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelFallback {
    /// Skip training.
    None,
    /// Use the last column of the source table, ignoring the derived `Cluster` column.
    LastColumn,
    /// Use the named column.
    Column(String),
}

impl FromStr for LabelFallback {
    type Err = std::convert::Infallible;

    /// `none`, `last`, or any other string naming a column.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "none" => LabelFallback::None,
            "last" => LabelFallback::LastColumn,
            name => LabelFallback::Column(name.to_string()),
        })
    }
}

/// Settings shared by every pipeline stage. `Default` gives the reference
/// configuration: seed 42, 80/20 split, depth 10, three clusters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Seed for the train/test shuffle and K-Means initialisation.
    pub seed: u64,
    /// Fraction of rows held out for evaluation.
    pub test_fraction: f64,
    /// Maximum decision tree depth.
    pub max_depth: usize,
    pub n_clusters: usize,
    pub kmeans_max_iters: u64,
    pub kmeans_tolerance: f64,
    pub label_fallback: LabelFallback,
    pub rule_templates: Vec<RuleTemplate>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            test_fraction: 0.2,
            max_depth: 10,
            n_clusters: 3,
            kmeans_max_iters: 300,
            kmeans_tolerance: 1e-4,
            label_fallback: LabelFallback::LastColumn,
            rule_templates: default_templates(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_label_fallback() {
        assert_eq!("none".parse::<LabelFallback>().unwrap(), LabelFallback::None);
        assert_eq!("last".parse::<LabelFallback>().unwrap(), LabelFallback::LastColumn);
        assert_eq!(
            "grade".parse::<LabelFallback>().unwrap(),
            LabelFallback::Column("grade".to_string())
        );
    }

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.seed, 42);
        assert_eq!(config.n_clusters, 3);
        assert!(config.max_depth <= 10);
        assert!(!config.rule_templates.is_empty());
    }
}
