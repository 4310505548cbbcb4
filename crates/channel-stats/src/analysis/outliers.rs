use polars::prelude::*;
use tracing::debug;

use super::ChannelAnalyzer;
use crate::config::OutlierMethod;
use crate::error::{AnalyticsError, Result};
use crate::types::OutlierStats;
use crate::utils::{mean, percentage, quantile_sorted, sample_std, sorted_copy};

/// Fence distance in interquartile ranges.
pub const IQR_MULTIPLIER: f64 = 1.5;

/// |z| above which a value is an outlier.
pub const ZSCORE_THRESHOLD: f64 = 3.0;

impl ChannelAnalyzer {
    /// Rows whose `column` value is an outlier, plus a summary.
    ///
    /// Bounds come from the non-missing values; rows with a missing value
    /// are never flagged. The z-score method uses the sample standard
    /// deviation and flags nothing when it is zero or undefined.
    ///
    /// # Errors
    ///
    /// [`AnalyticsError::UnknownColumn`] when `column` is absent.
    pub fn outlier_detection(
        &self,
        column: &str,
        method: OutlierMethod,
    ) -> Result<(DataFrame, OutlierStats)> {
        let values = self
            .metric_values(column)
            .ok_or_else(|| AnalyticsError::UnknownColumn(column.to_string()))?;
        let present: Vec<f64> = values.iter().flatten().copied().collect();

        let (mask, mut stats) = match method {
            OutlierMethod::Iqr => {
                let sorted = sorted_copy(&present);
                let bounds = quantile_sorted(&sorted, 0.25)
                    .zip(quantile_sorted(&sorted, 0.75))
                    .map(|(q1, q3)| {
                        let iqr = q3 - q1;
                        (q1 - IQR_MULTIPLIER * iqr, q3 + IQR_MULTIPLIER * iqr)
                    });

                let mask: Vec<bool> = values
                    .iter()
                    .map(|v| match (v, bounds) {
                        (Some(v), Some((lower, upper))) => *v < lower || *v > upper,
                        _ => false,
                    })
                    .collect();

                let stats = OutlierStats {
                    method,
                    column: column.to_string(),
                    lower_bound: bounds.map(|b| b.0),
                    upper_bound: bounds.map(|b| b.1),
                    threshold: None,
                    n_outliers: 0,
                    pct_outliers: 0.0,
                };
                (mask, stats)
            }
            OutlierMethod::Zscore => {
                let center = mean(&present);
                let spread = sample_std(&present).filter(|s| *s > 0.0);

                let mask: Vec<bool> = values
                    .iter()
                    .map(|v| match (v, center, spread) {
                        (Some(v), Some(m), Some(s)) => ((v - m) / s).abs() > ZSCORE_THRESHOLD,
                        _ => false,
                    })
                    .collect();

                let stats = OutlierStats {
                    method,
                    column: column.to_string(),
                    lower_bound: None,
                    upper_bound: None,
                    threshold: Some(ZSCORE_THRESHOLD),
                    n_outliers: 0,
                    pct_outliers: 0.0,
                };
                (mask, stats)
            }
        };

        let mask = BooleanChunked::from_slice("mask".into(), &mask);
        let outliers = self.df().filter(&mask)?;

        stats.n_outliers = outliers.height();
        stats.pct_outliers = percentage(outliers.height(), self.df().height());
        debug!(
            "{} outliers in '{}': {} ({:.1}%)",
            method, column, stats.n_outliers, stats.pct_outliers
        );

        Ok((outliers, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uploads(values: &[f64]) -> ChannelAnalyzer {
        let names: Vec<String> = (0..values.len()).map(|i| format!("ch{}", i)).collect();
        let df = df![
            "Youtuber" => names,
            "uploads" => values,
        ]
        .unwrap();
        ChannelAnalyzer::new(&df).unwrap()
    }

    #[test]
    fn test_iqr_flags_extreme_value() {
        let analyzer = uploads(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]);
        let (outliers, stats) = analyzer.outlier_detection("uploads", OutlierMethod::Iqr).unwrap();

        assert_eq!(stats.lower_bound, Some(2.25 - 1.5 * 2.5));
        assert_eq!(stats.upper_bound, Some(8.5));
        assert_eq!(stats.n_outliers, 1);
        assert_eq!(outliers.height(), 1);
        assert!((stats.pct_outliers - 100.0 / 6.0).abs() < 1e-9);

        let flagged = outliers.column("uploads").unwrap().get(0).unwrap();
        assert_eq!(flagged.try_extract::<f64>().unwrap(), 100.0);
        // input table keeps its shape
        assert_eq!(analyzer.df().height(), 6);
    }

    #[test]
    fn test_iqr_skips_missing_values() {
        let df = df![
            "uploads" => [Some(1.0), None, Some(2.0), Some(3.0), Some(4.0), Some(5.0), Some(100.0)],
        ]
        .unwrap();
        let analyzer = ChannelAnalyzer::new(&df).unwrap();
        let (outliers, stats) = analyzer.outlier_detection("uploads", OutlierMethod::Iqr).unwrap();
        assert_eq!(outliers.height(), 1);
        assert_eq!(stats.upper_bound, Some(8.5));
        assert!((stats.pct_outliers - 100.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_zscore_uses_sample_std() {
        let mut values = vec![10.0; 20];
        values.push(1000.0);
        let analyzer = uploads(&values);
        let (outliers, stats) = analyzer.outlier_detection("uploads", OutlierMethod::Zscore).unwrap();

        assert_eq!(stats.threshold, Some(ZSCORE_THRESHOLD));
        assert_eq!(stats.lower_bound, None);
        assert_eq!(stats.n_outliers, 1);
        assert_eq!(outliers.height(), 1);
    }

    #[test]
    fn test_zscore_constant_column_flags_nothing() {
        let analyzer = uploads(&[5.0, 5.0, 5.0]);
        let (_, stats) = analyzer.outlier_detection("uploads", OutlierMethod::Zscore).unwrap();
        assert_eq!(stats.n_outliers, 0);
    }

    #[test]
    fn test_unknown_column() {
        let analyzer = uploads(&[1.0]);
        let err = analyzer.outlier_detection("views", OutlierMethod::Iqr).unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_COLUMN");
    }

    #[test]
    fn test_empty_table() {
        let analyzer = uploads(&[]);
        let (outliers, stats) = analyzer.outlier_detection("uploads", OutlierMethod::Iqr).unwrap();
        assert_eq!(outliers.height(), 0);
        assert_eq!(stats.pct_outliers, 0.0);
        assert_eq!(stats.upper_bound, None);
    }
}
