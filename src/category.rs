//! Performance categories derived from cumulative GPA

use serde::{Deserialize, Serialize};

use crate::data::{Dataset, Field, Value};

/// Four-level ordinal label derived from current cumulative GPA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PerformanceCategory {
    Distinction,
    #[serde(rename = "First Class")]
    FirstClass,
    #[serde(rename = "Second Class")]
    SecondClass,
    Pass,
}

impl PerformanceCategory {
    /// All categories, best first.
    pub const ALL: [PerformanceCategory; 4] = [
        PerformanceCategory::Distinction,
        PerformanceCategory::FirstClass,
        PerformanceCategory::SecondClass,
        PerformanceCategory::Pass,
    ];

    /// Label as written into the `Performance_Category` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Distinction => "Distinction",
            Self::FirstClass => "First Class",
            Self::SecondClass => "Second Class",
            Self::Pass => "Pass",
        }
    }

    /// Parse a label previously produced by [`PerformanceCategory::as_str`].
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == label.trim())
    }

    /// Distinction and First Class count as good performance.
    pub fn is_good(&self) -> bool {
        matches!(self, Self::Distinction | Self::FirstClass)
    }
}

impl std::fmt::Display for PerformanceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a GPA to its category.
///
/// Bands are closed at the bottom: `>= 3.5` Distinction, `>= 3.0` First
/// Class, `>= 2.5` Second Class, everything else (including NaN) Pass.
pub fn categorize(gpa: f64) -> PerformanceCategory {
    if gpa >= 3.5 {
        PerformanceCategory::Distinction
    } else if gpa >= 3.0 {
        PerformanceCategory::FirstClass
    } else if gpa >= 2.5 {
        PerformanceCategory::SecondClass
    } else {
        PerformanceCategory::Pass
    }
}

/// Categorize a raw cell. Missing or non-numeric cells yield `Pass`.
pub fn categorize_value(value: &Value) -> PerformanceCategory {
    value
        .as_f64()
        .map(categorize)
        .unwrap_or(PerformanceCategory::Pass)
}

/// Row counts per category, best first.
///
/// Returns `None` when the dataset carries no `Performance_Category` column.
/// Cells that do not hold a known label are not counted.
pub fn performance_distribution(dataset: &Dataset) -> Option<Vec<(PerformanceCategory, usize)>> {
    let column = dataset.field(Field::PerformanceCategory)?;
    let mut counts = [0usize; 4];
    for value in column.values() {
        if let Some(category) = value.as_category() {
            counts[category as usize] += 1;
        }
    }
    Some(
        PerformanceCategory::ALL
            .into_iter()
            .zip(counts)
            .collect(),
    )
}
