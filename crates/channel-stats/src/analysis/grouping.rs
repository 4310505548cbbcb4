use polars::prelude::*;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::{ChannelAnalyzer, METRIC_COLUMNS};
use crate::table::{self, columns};
use crate::types::{GroupAnalysis, GroupCount, GroupValue, MetricGroupStats};
use crate::utils::{mean, median};

impl ChannelAnalyzer {
    /// Metric aggregates per `category`. Empty when the column is absent.
    pub fn category_analysis(&self) -> GroupAnalysis {
        self.group_analysis(columns::CATEGORY)
    }

    /// Metric aggregates per `Country`. Empty when the column is absent.
    pub fn country_analysis(&self) -> GroupAnalysis {
        self.group_analysis(columns::COUNTRY)
    }

    fn group_analysis(&self, group_column: &str) -> GroupAnalysis {
        let Ok(column) = self.df().column(group_column) else {
            return GroupAnalysis::default();
        };
        let series = column.as_materialized_series();
        let keys = group_keys(series);

        let mut metrics = Vec::new();
        for name in METRIC_COLUMNS {
            let Some(values) = self.metric_values(name) else {
                continue;
            };

            // every keyed row contributes its group, even without a value
            let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
            for (key, value) in keys.iter().zip(values) {
                if let Some(key) = key {
                    let bucket = groups.entry(key.as_str()).or_default();
                    if let Some(value) = value {
                        bucket.push(value);
                    }
                }
            }
            metrics.push(metric_group_stats(name, &groups));
        }

        GroupAnalysis {
            group_column: group_column.to_string(),
            group_sizes: value_counts(series),
            metrics,
        }
    }
}

fn metric_group_stats(metric: &str, groups: &BTreeMap<&str, Vec<f64>>) -> MetricGroupStats {
    MetricGroupStats {
        metric: metric.to_string(),
        mean: aggregate(groups, mean),
        median: aggregate(groups, median),
        total: aggregate(groups, |values| Some(values.iter().sum())),
        count: groups
            .iter()
            .map(|(group, values)| GroupCount {
                group: group.to_string(),
                count: values.len(),
            })
            .collect(),
    }
}

fn aggregate<F>(groups: &BTreeMap<&str, Vec<f64>>, f: F) -> Vec<GroupValue>
where
    F: Fn(&[f64]) -> Option<f64>,
{
    let mut out: Vec<GroupValue> = groups
        .iter()
        .map(|(group, values)| GroupValue {
            group: group.to_string(),
            value: f(values.as_slice()),
        })
        .collect();
    sort_descending(&mut out);
    out
}

/// Sort largest first with undefined values last; stable.
fn sort_descending(values: &mut [GroupValue]) {
    values.sort_by(|a, b| match (a.value, b.value) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// Group key of every row as text, `None` for missing keys.
fn group_keys(series: &Series) -> Vec<Option<String>> {
    match series.cast(&DataType::String) {
        Ok(casted) => match casted.str() {
            Ok(ca) => ca.into_iter().map(|v| v.map(str::to_string)).collect(),
            Err(_) => vec![None; series.len()],
        },
        Err(_) => vec![None; series.len()],
    }
}

/// Rows per group, most frequent first, ties in order of first appearance.
pub(crate) fn value_counts(series: &Series) -> Vec<GroupCount> {
    table::value_counts(series)
        .unwrap_or_default()
        .into_iter()
        .map(|(group, count)| GroupCount { group, count })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn channels() -> DataFrame {
        df![
            "Youtuber" => ["A", "B", "C", "D", "E", "F"],
            "category" => [Some("Music"), Some("Gaming"), Some("Music"), None, Some("Gaming"), Some("Film")],
            "subscribers" => [Some(10.0), Some(30.0), Some(20.0), Some(99.0), Some(50.0), None],
            "uploads" => [1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        ]
        .unwrap()
    }

    fn pairs(values: &[GroupValue]) -> Vec<(String, Option<f64>)> {
        values.iter().map(|v| (v.group.clone(), v.value)).collect()
    }

    #[test]
    fn test_category_analysis() {
        let analysis = ChannelAnalyzer::new(&channels()).unwrap().category_analysis();
        assert_eq!(analysis.group_column, "category");
        assert_eq!(analysis.metrics.len(), 2);

        let subs = analysis.metric("subscribers").unwrap();
        assert_eq!(
            pairs(&subs.mean),
            vec![
                ("Gaming".to_string(), Some(40.0)),
                ("Music".to_string(), Some(15.0)),
                ("Film".to_string(), None),
            ]
        );
        assert_eq!(
            pairs(&subs.total),
            vec![
                ("Gaming".to_string(), Some(80.0)),
                ("Music".to_string(), Some(30.0)),
                ("Film".to_string(), Some(0.0)),
            ]
        );
        let counts: Vec<(String, usize)> = subs.count.iter().map(|c| (c.group.clone(), c.count)).collect();
        assert_eq!(
            counts,
            vec![
                ("Film".to_string(), 0),
                ("Gaming".to_string(), 2),
                ("Music".to_string(), 2),
            ]
        );
    }

    #[test]
    fn test_group_sizes_value_counts() {
        let analysis = ChannelAnalyzer::new(&channels()).unwrap().category_analysis();
        let sizes: Vec<(String, usize)> = analysis
            .group_sizes
            .iter()
            .map(|c| (c.group.clone(), c.count))
            .collect();
        assert_eq!(
            sizes,
            vec![
                ("Music".to_string(), 2),
                ("Gaming".to_string(), 2),
                ("Film".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_missing_group_column_is_empty() {
        let analyzer = ChannelAnalyzer::new(&channels()).unwrap();
        let country = analyzer.country_analysis();
        assert!(country.is_empty());
        assert!(country.metrics.is_empty());
    }

    #[test]
    fn test_country_analysis_median() {
        let df = df![
            "Country" => ["US", "US", "US", "IN"],
            "subscribers" => [1.0, 2.0, 9.0, 4.0],
        ]
        .unwrap();
        let analysis = ChannelAnalyzer::new(&df).unwrap().country_analysis();
        let subs = analysis.metric("subscribers").unwrap();
        assert_eq!(
            pairs(&subs.median),
            vec![("IN".to_string(), Some(4.0)), ("US".to_string(), Some(2.0))]
        );
    }
}
