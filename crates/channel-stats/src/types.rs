use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::OutlierMethod;

// ============================================================================
// Validation Types
// ============================================================================

/// Outcome of one data-quality check, or of several merged together.
///
/// `issues` are failures (they make `passed` false for the owning check),
/// `warnings` are non-fatal anomalies, and `stats` holds counts and
/// percentages found along the way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub passed: bool,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
    pub stats: HashMap<String, serde_json::Value>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::passing()
    }
}

impl ValidationResult {
    /// A passing result with nothing recorded.
    pub fn passing() -> Self {
        Self {
            passed: true,
            issues: Vec::new(),
            warnings: Vec::new(),
            stats: HashMap::new(),
        }
    }

    /// Record a failure.
    pub fn add_issue(&mut self, issue: impl Into<String>) {
        self.passed = false;
        self.issues.push(issue.into());
    }

    /// Record a non-fatal anomaly.
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Record a finding.
    pub fn set_stat(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.stats.insert(key.into(), value.into());
    }

    /// Read back an integer stat.
    pub fn stat_u64(&self, key: &str) -> Option<u64> {
        self.stats.get(key).and_then(|v| v.as_u64())
    }

    /// Merge results in execution order.
    ///
    /// `passed` is the AND of all inputs, `issues` and `warnings` are
    /// concatenated in order, and later `stats` overwrite earlier ones on
    /// key collision.
    pub fn merge(results: impl IntoIterator<Item = ValidationResult>) -> Self {
        results
            .into_iter()
            .fold(Self::passing(), |mut merged, result| {
                merged.passed &= result.passed;
                merged.issues.extend(result.issues);
                merged.warnings.extend(result.warnings);
                merged.stats.extend(result.stats);
                merged
            })
    }
}

// ============================================================================
// Table Summary
// ============================================================================

/// Quick inspection summary of a loaded table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSummary {
    /// (rows, columns)
    pub shape: (usize, usize),
    /// Column names in table order.
    pub columns: Vec<String>,
    /// Column name -> dtype label.
    pub dtypes: HashMap<String, String>,
    /// Column name -> missing cell count.
    pub missing_counts: HashMap<String, usize>,
}

impl DatasetSummary {
    /// Total missing cells across all columns.
    pub fn total_missing(&self) -> usize {
        self.missing_counts.values().sum()
    }
}

// ============================================================================
// Analysis Types
// ============================================================================

/// A group key paired with an aggregate; `None` when the group has no values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupValue {
    pub group: String,
    pub value: Option<f64>,
}

/// A group key paired with a count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCount {
    pub group: String,
    pub count: usize,
}

/// Per-group aggregates of one metric column.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricGroupStats {
    pub metric: String,
    /// Sorted descending, groups without values last.
    pub mean: Vec<GroupValue>,
    /// Sorted descending, groups without values last.
    pub median: Vec<GroupValue>,
    /// Sorted descending.
    pub total: Vec<GroupValue>,
    /// Non-missing values per group, in group-key order.
    pub count: Vec<GroupCount>,
}

/// Result of a category or country breakdown.
///
/// Empty when the grouping column is absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupAnalysis {
    pub group_column: String,
    /// Rows per group, most frequent first.
    pub group_sizes: Vec<GroupCount>,
    pub metrics: Vec<MetricGroupStats>,
}

impl GroupAnalysis {
    pub fn is_empty(&self) -> bool {
        self.group_sizes.is_empty() && self.metrics.is_empty()
    }

    /// Stats for one metric column.
    pub fn metric(&self, name: &str) -> Option<&MetricGroupStats> {
        self.metrics.iter().find(|m| m.metric == name)
    }
}

/// A named derived value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementMetric {
    pub name: String,
    pub value: f64,
}

/// Engagement metrics in computation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngagementMetrics {
    pub metrics: Vec<EngagementMetric>,
}

impl EngagementMetrics {
    pub fn push(&mut self, name: impl Into<String>, value: f64) {
        self.metrics.push(EngagementMetric {
            name: name.into(),
            value,
        });
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.metrics.iter().find(|m| m.name == name).map(|m| m.value)
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EngagementMetric> {
        self.metrics.iter()
    }
}

/// Pairwise Pearson correlations between numeric columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major, `values[i][j]` correlates `columns[i]` with `columns[j]`.
    pub values: Vec<Vec<Option<f64>>>,
}

/// One off-diagonal entry of a [`CorrelationMatrix`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationPair {
    pub first: String,
    pub second: String,
    pub coefficient: f64,
}

impl CorrelationMatrix {
    /// Correlation between two named columns.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.values[i][j]
    }

    /// Pairs with |r| at or above the threshold, strongest first.
    pub fn strong_pairs(&self, threshold: f64) -> Vec<CorrelationPair> {
        let mut pairs = Vec::new();
        for i in 0..self.columns.len() {
            for j in (i + 1)..self.columns.len() {
                if let Some(r) = self.values[i][j]
                    && r.abs() >= threshold
                {
                    pairs.push(CorrelationPair {
                        first: self.columns[i].clone(),
                        second: self.columns[j].clone(),
                        coefficient: r,
                    });
                }
            }
        }
        pairs.sort_by(|a, b| {
            b.coefficient
                .abs()
                .partial_cmp(&a.coefficient.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        pairs
    }
}

/// Summary of an outlier scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierStats {
    pub method: OutlierMethod,
    pub column: String,
    /// IQR lower fence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lower_bound: Option<f64>,
    /// IQR upper fence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper_bound: Option<f64>,
    /// Z-score cutoff.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    pub n_outliers: usize,
    /// Percentage of all rows, missing values included in the denominator.
    pub pct_outliers: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_rules() {
        let mut first = ValidationResult::passing();
        first.add_warning("w1");
        first.set_stat("shared", 1);
        first.set_stat("only_first", true);

        let mut second = ValidationResult::passing();
        second.add_issue("i1");
        second.set_stat("shared", 2);

        let mut third = ValidationResult::passing();
        third.add_warning("w2");

        let merged = ValidationResult::merge(vec![first, second, third]);
        assert!(!merged.passed);
        assert_eq!(merged.issues, vec!["i1"]);
        assert_eq!(merged.warnings, vec!["w1", "w2"]);
        assert_eq!(merged.stats["shared"], json!(2));
        assert_eq!(merged.stats["only_first"], json!(true));
    }

    #[test]
    fn test_merge_empty_passes() {
        let merged = ValidationResult::merge(Vec::new());
        assert!(merged.passed);
        assert!(merged.issues.is_empty());
    }

    #[test]
    fn test_strong_pairs_sorted_by_magnitude() {
        let matrix = CorrelationMatrix {
            columns: vec!["a".into(), "b".into(), "c".into()],
            values: vec![
                vec![Some(1.0), Some(0.8), Some(-0.95)],
                vec![Some(0.8), Some(1.0), None],
                vec![Some(-0.95), None, Some(1.0)],
            ],
        };
        let pairs = matrix.strong_pairs(0.7);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].second, "c");
        assert_eq!(pairs[1].second, "b");
        assert_eq!(matrix.get("b", "c"), None);
    }

    #[test]
    fn test_engagement_lookup() {
        let mut metrics = EngagementMetrics::default();
        metrics.push("avg_views_per_upload", 10.0);
        assert_eq!(metrics.get("avg_views_per_upload"), Some(10.0));
        assert_eq!(metrics.get("missing"), None);
        assert_eq!(metrics.len(), 1);
    }
}
