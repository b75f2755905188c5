//! Association rule mining over boolean predicates
//!
//! Each [`RuleTemplate`] pairs an antecedent and a consequent predicate.
//! Mining evaluates both over every row and derives support, confidence and
//! lift from the four counts; new templates never touch the metric code.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::category::PerformanceCategory;
use crate::data::{Dataset, Field};

/// A row-level boolean condition on one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// Numeric value `>= threshold`. Non-numeric cells are false.
    AtLeast { field: Field, threshold: f64 },
    /// Flag-style column holding a truthy value.
    Truthy { field: Field },
    /// `Performance_Category` is one of the given categories.
    CategoryIn { categories: Vec<PerformanceCategory> },
}

impl Predicate {
    /// Column the predicate reads.
    pub fn field(&self) -> Field {
        match self {
            Predicate::AtLeast { field, .. } | Predicate::Truthy { field } => *field,
            Predicate::CategoryIn { .. } => Field::PerformanceCategory,
        }
    }

    /// Evaluate on every row, or `None` when the column is absent.
    pub fn evaluate(&self, dataset: &Dataset) -> Option<Vec<bool>> {
        let column = dataset.field(self.field())?;
        let mask = column
            .values()
            .iter()
            .map(|value| match self {
                Predicate::AtLeast { threshold, .. } => {
                    value.as_f64().map_or(false, |v| v >= *threshold)
                }
                Predicate::Truthy { .. } => value.is_truthy(),
                Predicate::CategoryIn { categories } => value
                    .as_category()
                    .map_or(false, |c| categories.contains(&c)),
            })
            .collect();
        Some(mask)
    }
}

/// A candidate rule `antecedent -> consequent` with display names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTemplate {
    pub antecedent_name: String,
    pub consequent_name: String,
    pub antecedent: Predicate,
    pub consequent: Predicate,
}

impl RuleTemplate {
    pub fn new(
        antecedent_name: impl Into<String>,
        antecedent: Predicate,
        consequent_name: impl Into<String>,
        consequent: Predicate,
    ) -> Self {
        Self {
            antecedent_name: antecedent_name.into(),
            consequent_name: consequent_name.into(),
            antecedent,
            consequent,
        }
    }
}

/// Rules mined by default.
pub fn default_templates() -> Vec<RuleTemplate> {
    let good_performance = Predicate::CategoryIn {
        categories: vec![PerformanceCategory::Distinction, PerformanceCategory::FirstClass],
    };
    vec![
        RuleTemplate::new(
            "High Attendance (>=85%)",
            Predicate::AtLeast {
                field: Field::Attendance,
                threshold: 85.0,
            },
            "Good Performance",
            good_performance.clone(),
        ),
        RuleTemplate::new(
            "High Study Hours (>=4)",
            Predicate::AtLeast {
                field: Field::StudyHours,
                threshold: 4.0,
            },
            "High CGPA (>=3.5)",
            Predicate::AtLeast {
                field: Field::CurrentCgpa,
                threshold: 3.5,
            },
        ),
        RuleTemplate::new(
            "Co-curricular Activities",
            Predicate::Truthy {
                field: Field::CoCurricular,
            },
            "Good Performance",
            good_performance,
        ),
    ]
}

/// Support, confidence and lift of one rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleMetrics {
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
}

impl RuleMetrics {
    /// Metrics from raw counts. `None` when there are no rows.
    ///
    /// Confidence is 0 when the antecedent never holds; lift is 0 when the
    /// consequent never holds.
    pub fn from_counts(both: usize, antecedent: usize, consequent: usize, total: usize) -> Option<Self> {
        if total == 0 {
            return None;
        }
        let support = both as f64 / total as f64;
        let confidence = if antecedent > 0 {
            both as f64 / antecedent as f64
        } else {
            0.0
        };
        let lift = if consequent > 0 {
            confidence / (consequent as f64 / total as f64)
        } else {
            0.0
        };
        Some(Self {
            support,
            confidence,
            lift,
        })
    }
}

/// A mined rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationRule {
    pub antecedent: String,
    pub consequent: String,
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
}

/// Mine the default templates.
pub fn mine(dataset: &Dataset) -> Vec<AssociationRule> {
    mine_with(dataset, &default_templates())
}

/// Mine `templates` over `dataset`. Templates whose columns are absent are
/// skipped; an empty dataset yields no rules.
pub fn mine_with(dataset: &Dataset, templates: &[RuleTemplate]) -> Vec<AssociationRule> {
    let total = dataset.n_rows();
    let mut rules = Vec::new();

    for template in templates {
        let (Some(antecedent), Some(consequent)) = (
            template.antecedent.evaluate(dataset),
            template.consequent.evaluate(dataset),
        ) else {
            debug!(
                "Skipping rule '{} -> {}': required column missing",
                template.antecedent_name, template.consequent_name
            );
            continue;
        };

        let n_antecedent = antecedent.iter().filter(|&&a| a).count();
        let n_consequent = consequent.iter().filter(|&&c| c).count();
        let n_both = antecedent
            .iter()
            .zip(&consequent)
            .filter(|&(&a, &c)| a && c)
            .count();

        let Some(metrics) = RuleMetrics::from_counts(n_both, n_antecedent, n_consequent, total) else {
            continue;
        };
        rules.push(AssociationRule {
            antecedent: template.antecedent_name.clone(),
            consequent: template.consequent_name.clone(),
            support: metrics.support,
            confidence: metrics.confidence,
            lift: metrics.lift,
        });
    }

    info!("Generated {} association rules", rules.len());
    rules
}
