use polars::prelude::cov::pearson_corr;
use polars::prelude::*;

use super::ChannelAnalyzer;
use crate::table;
use crate::types::CorrelationMatrix;
use crate::utils::numeric_values;

impl ChannelAnalyzer {
    /// Pearson correlation between every pair of numeric columns.
    ///
    /// Each pair uses only rows where both values are present. Entries are
    /// `None` when fewer than two such rows exist or either side has zero
    /// variance.
    pub fn correlation_analysis(&self) -> CorrelationMatrix {
        let columns = table::numeric_columns(self.df());
        let series_values: Vec<Vec<Option<f64>>> = columns
            .iter()
            .map(|name| {
                self.df()
                    .column(name)
                    .map(|c| numeric_values(c.as_materialized_series()))
                    .unwrap_or_default()
            })
            .collect();

        let size = columns.len();
        let mut values = vec![vec![None; size]; size];
        for i in 0..size {
            for j in i..size {
                let r = if i == j {
                    (series_values[i].iter().flatten().count() >= 2).then_some(1.0)
                } else {
                    pearson(&series_values[i], &series_values[j])
                };
                values[i][j] = r;
                values[j][i] = r;
            }
        }

        CorrelationMatrix { columns, values }
    }
}

/// Pairwise-complete Pearson coefficient.
fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let overlap = a
        .iter()
        .zip(b)
        .filter(|(x, y)| x.is_some() && y.is_some())
        .count();
    if overlap < 2 {
        return None;
    }

    let x = Float64Chunked::from_slice_options("x".into(), a);
    let y = Float64Chunked::from_slice_options("y".into(), b);
    // NaN when either side has zero variance
    pearson_corr(&x, &y)
        .filter(|r| r.is_finite())
        .map(|r| r.clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_matrix() {
        let df = df![
            "Youtuber" => ["A", "B", "C", "D"],
            "subscribers" => [1.0, 2.0, 3.0, 4.0],
            "video views" => [10.0, 20.0, 30.0, 40.0],
            "uploads" => [4.0, 3.0, 2.0, 1.0],
        ]
        .unwrap();
        let matrix = ChannelAnalyzer::new(&df).unwrap().correlation_analysis();

        assert_eq!(matrix.columns, vec!["subscribers", "video views", "uploads"]);
        assert_eq!(matrix.get("subscribers", "subscribers"), Some(1.0));
        assert!((matrix.get("subscribers", "video views").unwrap() - 1.0).abs() < 1e-12);
        assert!((matrix.get("uploads", "subscribers").unwrap() + 1.0).abs() < 1e-12);
        assert_eq!(
            matrix.get("video views", "uploads"),
            matrix.get("uploads", "video views")
        );
    }

    #[test]
    fn test_correlation_needs_two_overlapping_values() {
        let df = df![
            "a" => [Some(1.0), None, Some(3.0)],
            "b" => [None, Some(2.0), Some(5.0)],
            "c" => [Some(7.0), Some(7.0), Some(7.0)],
        ]
        .unwrap();
        let matrix = ChannelAnalyzer::new(&df).unwrap().correlation_analysis();
        // one overlapping row
        assert_eq!(matrix.get("a", "b"), None);
        // constant column
        assert_eq!(matrix.get("a", "c"), None);
        assert_eq!(matrix.get("a", "a"), Some(1.0));
    }

    #[test]
    fn test_pearson_pairwise_complete() {
        let a = [Some(1.0), Some(2.0), None, Some(4.0), Some(5.0)];
        let b = [Some(2.0), Some(4.0), Some(100.0), None, Some(10.0)];
        // rows 0, 1 and 4 overlap and lie on one line
        let r = pearson(&a, &b).unwrap();
        assert!((r - 1.0).abs() < 1e-12);

        let c = [Some(3.0), Some(1.0), Some(2.0)];
        let d = [Some(1.0), Some(2.0), Some(3.0)];
        assert!((pearson(&c, &d).unwrap() + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_correlation_no_numeric_columns() {
        let df = df!["Youtuber" => ["A", "B"]].unwrap();
        let matrix = ChannelAnalyzer::new(&df).unwrap().correlation_analysis();
        assert!(matrix.columns.is_empty());
        assert!(matrix.values.is_empty());
    }
}
