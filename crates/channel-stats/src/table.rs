//! Table helpers shared by the validator and the analyzer.
//!
//! The table itself is a polars [`DataFrame`]. These helpers define what
//! "missing" and "duplicate" mean so every caller counts the same way.

use polars::prelude::*;
use std::collections::{HashMap, HashSet};

use crate::utils::{get_dtype_category, is_float_dtype, is_numeric_dtype, DtypeCategory};

/// Column names of the channel statistics dataset.
pub mod columns {
    pub const YOUTUBER: &str = "Youtuber";
    pub const CATEGORY: &str = "category";
    pub const COUNTRY: &str = "Country";
    pub const SUBSCRIBERS: &str = "subscribers";
    pub const VIDEO_VIEWS: &str = "video views";
    pub const UPLOADS: &str = "uploads";

    /// Metrics that can never be negative.
    pub const NON_NEGATIVE: [&str; 3] = [SUBSCRIBERS, VIDEO_VIEWS, UPLOADS];
}

/// Strip leading/trailing whitespace from every column name.
///
/// Fails when two names collapse onto the same key.
pub fn normalize_column_names(df: &mut DataFrame) -> PolarsResult<()> {
    let renames: Vec<(String, String)> = df
        .get_column_names()
        .iter()
        .filter_map(|name| {
            let trimmed = name.trim();
            (trimmed != name.as_str()).then(|| (name.to_string(), trimmed.to_string()))
        })
        .collect();

    let mut seen = HashSet::new();
    for name in df.get_column_names() {
        if !seen.insert(name.trim().to_string()) {
            polars_bail!(Duplicate: "column name '{}' is not unique after trimming", name.trim());
        }
    }

    for (old, new) in renames {
        df.rename(&old, new.into())?;
    }
    Ok(())
}

/// Column names as owned strings, in table order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Check whether the table has a column with this exact name.
pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == name)
}

/// Names of columns with a numeric dtype, in table order.
pub fn numeric_columns(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|c| is_numeric_dtype(c.dtype()))
        .map(|c| c.name().to_string())
        .collect()
}

/// Names of text-typed columns, in table order.
pub fn text_columns(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|c| get_dtype_category(c.dtype()) == DtypeCategory::String)
        .map(|c| c.name().to_string())
        .collect()
}

/// Number of missing cells in a Series: nulls, plus NaN in float columns.
pub fn missing_count(series: &Series) -> usize {
    let nulls = series.null_count();
    if !is_float_dtype(series.dtype()) {
        return nulls;
    }
    let nans = series
        .cast(&DataType::Float64)
        .ok()
        .and_then(|casted| {
            casted
                .f64()
                .ok()
                .map(|ca| ca.into_iter().flatten().filter(|v| v.is_nan()).count())
        })
        .unwrap_or(0);
    nulls + nans
}

/// Missing cell count for each column, in table order.
pub fn missing_counts(df: &DataFrame) -> Vec<(String, usize)> {
    df.get_columns()
        .iter()
        .map(|c| (c.name().to_string(), missing_count(c.as_materialized_series())))
        .collect()
}

/// Non-missing values of a Series as text with their row counts, most
/// frequent first, ties in order of first appearance.
pub fn value_counts(series: &Series) -> PolarsResult<Vec<(String, usize)>> {
    let mut values = series.cast(&DataType::String)?.drop_nulls();
    values.rename("value".into());

    let counted = values.value_counts(false, false, "count".into(), false)?;
    let keys = counted.column("value")?.as_materialized_series().clone();
    let counts = counted.column("count")?.cast(&DataType::UInt64)?;
    let lookup: HashMap<&str, usize> = keys
        .str()?
        .into_iter()
        .zip(counts.as_materialized_series().u64()?)
        .filter_map(|(key, count)| Some((key?, count? as usize)))
        .collect();

    let first_seen = values.unique_stable()?;
    let mut ranked: Vec<(String, usize)> = first_seen
        .str()?
        .into_iter()
        .flatten()
        .map(|key| (key.to_string(), lookup.get(key).copied().unwrap_or(0)))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(ranked)
}

/// Drop rows that repeat an earlier row, keeping first occurrences in order.
///
/// Rows compare equal when every cell is equal; missing cells are equal to
/// each other.
pub fn drop_duplicates(df: &DataFrame) -> PolarsResult<DataFrame> {
    if df.width() == 0 {
        return Ok(df.clone());
    }
    df.unique_stable(None, UniqueKeepStrategy::First, None)
}

/// Number of rows that repeat an earlier row.
pub fn duplicate_count(df: &DataFrame) -> usize {
    drop_duplicates(df)
        .map(|distinct| df.height() - distinct.height())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_column_names() {
        let mut df = df![
            " rank " => [1, 2],
            "Youtuber" => ["A", "B"],
        ]
        .unwrap();
        normalize_column_names(&mut df).unwrap();
        assert_eq!(column_names(&df), vec!["rank", "Youtuber"]);
    }

    #[test]
    fn test_normalize_column_names_collision() {
        let mut df = df![
            "views" => [1, 2],
            "views " => [3, 4],
        ]
        .unwrap();
        assert!(normalize_column_names(&mut df).is_err());
    }

    #[test]
    fn test_missing_count_includes_nan() {
        let series = Series::new("v".into(), &[Some(1.0f64), None, Some(f64::NAN)]);
        assert_eq!(missing_count(&series), 2);
    }

    #[test]
    fn test_duplicate_count_full_row() {
        let df = df![
            "name" => [Some("A"), Some("B"), Some("A"), Some("A"), None, None],
            "subs" => [Some(1.0), Some(2.0), Some(1.0), Some(3.0), None, None],
        ]
        .unwrap();
        // row 2 repeats row 0, row 5 repeats row 4 (missing == missing)
        assert_eq!(duplicate_count(&df), 2);
        assert_eq!(drop_duplicates(&df).unwrap().height(), 4);
    }

    #[test]
    fn test_distinct_large_floats_are_not_duplicates() {
        let df = df![
            "Youtuber" => ["A", "A"],
            "video views" => [228_000_000_001.0, 228_000_000_002.0],
        ]
        .unwrap();
        assert_eq!(duplicate_count(&df), 0);
        assert_eq!(drop_duplicates(&df).unwrap().height(), 2);
    }

    #[test]
    fn test_drop_duplicates_keeps_order() {
        let df = df![
            "name" => ["B", "A", "B", "C"],
        ]
        .unwrap();
        let deduped = drop_duplicates(&df).unwrap();
        let names: Vec<Option<&str>> = deduped
            .column("name")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(names, vec![Some("B"), Some("A"), Some("C")]);
    }

    #[test]
    fn test_value_counts_ties_keep_first_appearance() {
        let series = Series::new(
            "category".into(),
            &[Some("Gaming"), Some("Music"), None, Some("Music"), Some("Film"), Some("Gaming")],
        );
        assert_eq!(
            value_counts(&series).unwrap(),
            vec![
                ("Gaming".to_string(), 2),
                ("Music".to_string(), 2),
                ("Film".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_value_counts_column_named_count() {
        let series = Series::new("count".into(), &[1i64, 1, 2]);
        assert_eq!(
            value_counts(&series).unwrap(),
            vec![("1".to_string(), 2), ("2".to_string(), 1)]
        );
    }

    #[test]
    fn test_numeric_and_text_columns() {
        let df = df![
            "Youtuber" => ["A"],
            "subscribers" => [1.0],
            "uploads" => [3i64],
        ]
        .unwrap();
        assert_eq!(numeric_columns(&df), vec!["subscribers", "uploads"]);
        assert_eq!(text_columns(&df), vec!["Youtuber"]);
        assert!(has_column(&df, "uploads"));
        assert!(!has_column(&df, "Country"));
    }
}
