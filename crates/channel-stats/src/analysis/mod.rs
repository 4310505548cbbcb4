//! Descriptive statistics over a channel statistics table.
//!
//! [`ChannelAnalyzer`] owns a working copy of the table in which the metric
//! columns (`subscribers`, `video views`, `uploads`) are coerced to `f64`.
//! Every routine reads that copy; nothing writes back to it. Derived
//! per-row values are returned in a new table by
//! [`ChannelAnalyzer::with_engagement_columns`].
//!
//! Submodules:
//! - `grouping`: category and country breakdowns
//! - `correlation`: Pearson correlation matrix
//! - `outliers`: IQR and z-score outlier detection
//! - `report`: the narrative text report

mod correlation;
mod grouping;
mod outliers;
mod report;

pub use outliers::{IQR_MULTIPLIER, ZSCORE_THRESHOLD};

use polars::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::OutlierMethod;
use crate::error::{AnalyticsError, Result};
use crate::reporting;
use crate::table::{self, columns};
use crate::types::{CorrelationMatrix, CorrelationPair, EngagementMetrics, GroupAnalysis, OutlierStats};
use crate::utils::{coerce_numeric_series, mean, median, numeric_values};

/// Columns coerced to numeric and aggregated per group.
pub const METRIC_COLUMNS: [&str; 3] = [columns::SUBSCRIBERS, columns::VIDEO_VIEWS, columns::UPLOADS];

/// Default number of rows returned by [`ChannelAnalyzer::top_performers`].
pub const DEFAULT_TOP_N: usize = 10;

/// A per-row ratio of two metric columns.
struct Ratio {
    name: &'static str,
    numerator: &'static str,
    denominator: &'static str,
}

const RATIOS: [Ratio; 3] = [
    Ratio {
        name: "views_per_subscriber",
        numerator: columns::VIDEO_VIEWS,
        denominator: columns::SUBSCRIBERS,
    },
    Ratio {
        name: "views_per_upload",
        numerator: columns::VIDEO_VIEWS,
        denominator: columns::UPLOADS,
    },
    Ratio {
        name: "subs_per_upload",
        numerator: columns::SUBSCRIBERS,
        denominator: columns::UPLOADS,
    },
];

/// Computes statistics over a working copy of a table.
#[derive(Debug, Clone)]
pub struct ChannelAnalyzer {
    df: DataFrame,
}

impl ChannelAnalyzer {
    /// Build an analyzer over a copy of `df`.
    ///
    /// Column names are trimmed and the metric columns present are coerced
    /// to `f64`, unparsable cells becoming null. The caller's table is left
    /// as it was.
    pub fn new(df: &DataFrame) -> Result<Self> {
        let mut working = df.clone();
        table::normalize_column_names(&mut working)?;

        for name in METRIC_COLUMNS {
            if !table::has_column(&working, name) {
                continue;
            }
            let series = working.column(name)?.as_materialized_series().clone();
            if series.dtype() != &DataType::Float64 {
                debug!("Coercing '{}' from {} to f64", name, series.dtype());
            }
            working.with_column(coerce_numeric_series(&series))?;
        }

        Ok(Self { df: working })
    }

    /// The working table.
    pub fn df(&self) -> &DataFrame {
        &self.df
    }

    /// Numeric view of a column, `None` when the column is absent.
    fn metric_values(&self, name: &str) -> Option<Vec<Option<f64>>> {
        self.df
            .column(name)
            .ok()
            .map(|c| numeric_values(c.as_materialized_series()))
    }

    /// The `n` rows with the largest `metric`, largest first.
    ///
    /// Rows are projected to `Youtuber`, `category` (when present) and the
    /// metric. Rows without a value are skipped; ties keep table order.
    ///
    /// # Errors
    ///
    /// [`AnalyticsError::UnknownColumn`] when `metric` is not a column.
    pub fn top_performers(&self, metric: &str, n: usize) -> Result<DataFrame> {
        let values = self
            .metric_values(metric)
            .ok_or_else(|| AnalyticsError::UnknownColumn(metric.to_string()))?;

        let mut ranked: Vec<(usize, f64)> = values
            .into_iter()
            .enumerate()
            .filter_map(|(row, value)| value.map(|v| (row, v)))
            .collect();
        // stable: equal values keep their row order
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(n);

        let mut projection: Vec<String> = Vec::with_capacity(3);
        for name in [columns::YOUTUBER, columns::CATEGORY, metric] {
            if table::has_column(&self.df, name) && !projection.iter().any(|p| p == name) {
                projection.push(name.to_string());
            }
        }

        let indices: Vec<IdxSize> = ranked.iter().map(|(row, _)| *row as IdxSize).collect();
        let top = self
            .df
            .select(projection)?
            .take(&IdxCa::from_vec("idx".into(), indices))?;
        Ok(top)
    }

    /// [`top_performers`](Self::top_performers) with [`DEFAULT_TOP_N`] rows.
    pub fn top_performers_default(&self, metric: &str) -> Result<DataFrame> {
        self.top_performers(metric, DEFAULT_TOP_N)
    }

    /// Per-row ratio values, `None` when either operand column is absent.
    ///
    /// Rows with a missing operand or a zero denominator are null.
    fn ratio_values(&self, ratio: &Ratio) -> Option<Vec<Option<f64>>> {
        let numerator = self.metric_values(ratio.numerator)?;
        let denominator = self.metric_values(ratio.denominator)?;
        Some(
            numerator
                .into_iter()
                .zip(denominator)
                .map(|(n, d)| match (n, d) {
                    (Some(n), Some(d)) if d != 0.0 => Some(n / d).filter(|v| v.is_finite()),
                    _ => None,
                })
                .collect(),
        )
    }

    /// Mean and median of each engagement ratio.
    ///
    /// Metrics are named `avg_<ratio>` and `median_<ratio>`. A ratio is
    /// skipped when its columns are missing or no row qualifies.
    pub fn engagement_metrics(&self) -> EngagementMetrics {
        let mut metrics = EngagementMetrics::default();
        for ratio in &RATIOS {
            let Some(values) = self.ratio_values(ratio) else {
                continue;
            };
            let values: Vec<f64> = values.into_iter().flatten().collect();
            if let (Some(avg), Some(mid)) = (mean(&values), median(&values)) {
                metrics.push(format!("avg_{}", ratio.name), avg);
                metrics.push(format!("median_{}", ratio.name), mid);
            } else {
                debug!("No qualifying rows for {}", ratio.name);
            }
        }
        metrics
    }

    /// A copy of the working table with the per-row ratio columns appended.
    pub fn with_engagement_columns(&self) -> Result<DataFrame> {
        let mut augmented = self.df.clone();
        for ratio in &RATIOS {
            if let Some(values) = self.ratio_values(ratio) {
                augmented.with_column(Series::new(ratio.name.into(), values))?;
            }
        }
        Ok(augmented)
    }

    /// Write the narrative report to `path`, creating parent directories.
    pub fn export_insights(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        reporting::write_report(&self.generate_report(), path)?;
        info!("Report exported to {}", path.display());
        Ok(path.to_path_buf())
    }

    /// Collect the structured results used for the JSON export.
    pub fn summary(
        &self,
        outlier_method: OutlierMethod,
        correlation_threshold: f64,
        top_n: usize,
    ) -> Result<AnalysisSummary> {
        let top_by_subscribers = if table::has_column(&self.df, columns::SUBSCRIBERS) {
            ranked_entries(&self.top_performers(columns::SUBSCRIBERS, top_n)?, columns::SUBSCRIBERS)
        } else {
            Vec::new()
        };

        let mut outliers = Vec::new();
        for name in METRIC_COLUMNS {
            if table::has_column(&self.df, name) {
                let (_, stats) = self.outlier_detection(name, outlier_method)?;
                outliers.push(stats);
            }
        }

        let correlation = self.correlation_analysis();
        let strong_correlations = correlation.strong_pairs(correlation_threshold);

        Ok(AnalysisSummary {
            total_channels: self.df.height(),
            top_by_subscribers,
            engagement: self.engagement_metrics(),
            category: self.category_analysis(),
            country: self.country_analysis(),
            correlation,
            strong_correlations,
            outliers,
        })
    }
}

/// One row of a top-performers ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub youtuber: Option<String>,
    pub category: Option<String>,
    pub value: f64,
}

/// Structured analysis results, serialized into `analysis.json`.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSummary {
    pub total_channels: usize,
    pub top_by_subscribers: Vec<RankedEntry>,
    pub engagement: EngagementMetrics,
    pub category: GroupAnalysis,
    pub country: GroupAnalysis,
    pub correlation: CorrelationMatrix,
    pub strong_correlations: Vec<CorrelationPair>,
    pub outliers: Vec<OutlierStats>,
}

/// Read a top-performers table back into entries.
pub(crate) fn ranked_entries(top: &DataFrame, metric: &str) -> Vec<RankedEntry> {
    let text = |name: &str| -> Vec<Option<String>> {
        match top.column(name) {
            Ok(column) => {
                let series = column.as_materialized_series();
                (0..series.len())
                    .map(|row| match series.get(row) {
                        Ok(AnyValue::Null) | Err(_) => None,
                        Ok(AnyValue::String(s)) => Some(s.to_string()),
                        Ok(other) => Some(other.to_string()),
                    })
                    .collect()
            }
            Err(_) => vec![None; top.height()],
        }
    };

    let names = text(columns::YOUTUBER);
    let categories = text(columns::CATEGORY);
    let values = top
        .column(metric)
        .map(|c| numeric_values(c.as_materialized_series()))
        .unwrap_or_default();

    names
        .into_iter()
        .zip(categories)
        .zip(values)
        .filter_map(|((youtuber, category), value)| {
            value.map(|value| RankedEntry {
                youtuber,
                category,
                value,
            })
        })
        .collect()
}
