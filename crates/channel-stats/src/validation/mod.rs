//! Data-quality checks over a channel statistics table.
//!
//! Each check is independent: it reads the validator's snapshot and returns
//! a [`ValidationResult`]. Checks never fail with an error, malformed cells
//! are treated as missing. [`DataValidator::validate_all`] runs the battery
//! in a fixed order and merges the results.
//!
//! # Example
//!
//! ```rust,ignore
//! use channel_stats::{DataValidator, ValidationOptions};
//!
//! let validator = DataValidator::new(df)?;
//! let options = ValidationOptions::default()
//!     .required_columns(["Youtuber", "subscribers"]);
//! let result = validator.validate_all(&options);
//! if !result.passed {
//!     for issue in &result.issues {
//!         eprintln!("{}", issue);
//!     }
//! }
//! ```

mod report;

use polars::prelude::*;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

use crate::error::Result;
use crate::table::{self, columns};
use crate::types::ValidationResult;
use crate::utils::{dtype_label, matches_type_name, numeric_values, percentage};

/// Share of all rows that must parse as numbers before a text column is
/// flagged as a numeric candidate.
const NUMERIC_CANDIDATE_RATIO: f64 = 0.9;

/// Default maximum fraction of missing cells per column.
pub const DEFAULT_MISSING_THRESHOLD: f64 = 0.5;

/// Parameters for [`DataValidator::validate_all`].
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    /// Columns that must be present. The check is skipped when `None`.
    pub required_columns: Option<Vec<String>>,
    /// Column name -> expected type name.
    pub expected_types: Option<HashMap<String, String>>,
    /// Column name -> inclusive (min, max).
    pub value_ranges: Option<HashMap<String, (f64, f64)>>,
    pub missing_threshold: f64,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            required_columns: None,
            expected_types: None,
            value_ranges: None,
            missing_threshold: DEFAULT_MISSING_THRESHOLD,
        }
    }
}

impl ValidationOptions {
    pub fn required_columns<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_columns = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn expected_type(mut self, column: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.expected_types
            .get_or_insert_with(HashMap::new)
            .insert(column.into(), type_name.into());
        self
    }

    pub fn value_range(mut self, column: impl Into<String>, min: f64, max: f64) -> Self {
        self.value_ranges
            .get_or_insert_with(HashMap::new)
            .insert(column.into(), (min, max));
        self
    }

    pub fn missing_threshold(mut self, threshold: f64) -> Self {
        self.missing_threshold = threshold;
        self
    }
}

/// Runs data-quality checks against a table snapshot.
#[derive(Debug, Clone)]
pub struct DataValidator {
    df: DataFrame,
}

impl DataValidator {
    /// Take a snapshot of `df` with trimmed column names.
    ///
    /// Fails only when trimming makes two column names collide.
    pub fn new(df: &DataFrame) -> Result<Self> {
        let mut df = df.clone();
        table::normalize_column_names(&mut df)?;
        Ok(Self { df })
    }

    /// The snapshot under inspection.
    pub fn df(&self) -> &DataFrame {
        &self.df
    }

    /// Fail when any column's missing fraction exceeds `threshold`.
    ///
    /// Stats: `total_missing`, `columns_with_missing`.
    pub fn check_missing_values(&self, threshold: f64) -> ValidationResult {
        let mut result = ValidationResult::passing();
        let rows = self.df.height();

        let mut total_missing = 0usize;
        let mut columns_with_missing = 0usize;
        for (name, missing) in table::missing_counts(&self.df) {
            total_missing += missing;
            if missing > 0 {
                columns_with_missing += 1;
            }

            let fraction = if rows == 0 {
                0.0
            } else {
                missing as f64 / rows as f64
            };
            if fraction > threshold {
                result.add_issue(format!(
                    "Column '{}' has {:.1}% missing values (threshold {:.1}%)",
                    name,
                    fraction * 100.0,
                    threshold * 100.0
                ));
            }
        }

        result.set_stat("total_missing", total_missing);
        result.set_stat("columns_with_missing", columns_with_missing);
        debug!(
            "Missing values: {} cells across {} columns",
            total_missing, columns_with_missing
        );
        result
    }

    /// Count rows that repeat an earlier row. Never fails.
    ///
    /// Stats: `n_duplicates`, `duplicate_percentage`.
    pub fn check_duplicates(&self) -> ValidationResult {
        let mut result = ValidationResult::passing();
        let n_duplicates = table::duplicate_count(&self.df);
        let pct = percentage(n_duplicates, self.df.height());

        if n_duplicates > 0 {
            result.add_warning(format!(
                "Found {} duplicate rows ({:.1}%)",
                n_duplicates, pct
            ));
        }

        result.set_stat("n_duplicates", n_duplicates);
        result.set_stat("duplicate_percentage", pct);
        debug!("Duplicates: {}", n_duplicates);
        result
    }

    /// Compare column types with `expected_types` and scan text columns
    /// for numeric content.
    ///
    /// An expected name matches when it equals the dtype label (`f64`), the
    /// dtype category (`numeric`) or a type family (`int`, `float`),
    /// ignoring case. Expected columns absent from the table are skipped.
    ///
    /// Stats: `numeric_candidates`.
    pub fn check_data_types(&self, expected_types: Option<&HashMap<String, String>>) -> ValidationResult {
        let mut result = ValidationResult::passing();

        if let Some(expected_types) = expected_types {
            // sorted for a stable issue order
            let mut expected: Vec<(&String, &String)> = expected_types.iter().collect();
            expected.sort();

            for (name, expected_type) in expected {
                let Ok(column) = self.df.column(name) else {
                    continue;
                };
                if !matches_type_name(expected_type, column.dtype()) {
                    result.add_issue(format!(
                        "Column '{}' has type '{}', expected '{}'",
                        name,
                        dtype_label(column.dtype()),
                        expected_type
                    ));
                }
            }
        }

        let rows = self.df.height();
        let mut numeric_candidates = 0usize;
        for name in table::text_columns(&self.df) {
            let Ok(column) = self.df.column(&name) else {
                continue;
            };
            let convertible = numeric_values(column.as_materialized_series())
                .iter()
                .filter(|v| v.is_some())
                .count();
            if rows > 0 && convertible as f64 / rows as f64 >= NUMERIC_CANDIDATE_RATIO {
                numeric_candidates += 1;
                result.add_warning(format!(
                    "Column '{}' is text but could be numeric ({:.1}% convertible)",
                    name,
                    percentage(convertible, rows)
                ));
            }
        }

        result.set_stat("numeric_candidates", numeric_candidates);
        debug!("Data types: {} numeric candidates", numeric_candidates);
        result
    }

    /// Warn about values outside configured ranges and fail on negative
    /// subscribers, video views or uploads.
    ///
    /// Bounds are inclusive. Missing and unparsable cells are never counted.
    pub fn check_value_ranges(&self, ranges: Option<&HashMap<String, (f64, f64)>>) -> ValidationResult {
        let mut result = ValidationResult::passing();

        if let Some(ranges) = ranges {
            let mut ranges: Vec<(&String, &(f64, f64))> = ranges.iter().collect();
            ranges.sort_by(|a, b| a.0.cmp(b.0));

            for (name, &(min, max)) in ranges {
                let Some(values) = self.column_values(name) else {
                    continue;
                };
                let out_of_range = values
                    .iter()
                    .flatten()
                    .filter(|v| **v < min || **v > max)
                    .count();
                if out_of_range > 0 {
                    result.add_warning(format!(
                        "Column '{}' has {} values outside range [{}, {}]",
                        name, out_of_range, min, max
                    ));
                }
            }
        }

        for name in columns::NON_NEGATIVE {
            let Some(values) = self.column_values(name) else {
                continue;
            };
            let negative = values.iter().flatten().filter(|v| **v < 0.0).count();
            if negative > 0 {
                result.add_issue(format!("Column '{}' has {} negative values", name, negative));
            }
        }

        result
    }

    /// Fail when any of `required` is not a column of the table.
    pub fn check_required_columns<S: AsRef<str>>(&self, required: &[S]) -> ValidationResult {
        let mut result = ValidationResult::passing();
        let missing: BTreeSet<&str> = required
            .iter()
            .map(|name| name.as_ref())
            .filter(|name| !table::has_column(&self.df, name))
            .collect();

        if !missing.is_empty() {
            result.add_issue(format!(
                "Missing required columns: {}",
                missing.into_iter().collect::<Vec<_>>().join(", ")
            ));
        }
        result
    }

    /// Run every check and merge the results.
    ///
    /// Order: required columns (only when given), missing values,
    /// duplicates, data types, value ranges.
    pub fn validate_all(&self, options: &ValidationOptions) -> ValidationResult {
        let mut results = Vec::with_capacity(5);

        if let Some(required) = &options.required_columns {
            results.push(self.check_required_columns(required.as_slice()));
        }
        results.push(self.check_missing_values(options.missing_threshold));
        results.push(self.check_duplicates());
        results.push(self.check_data_types(options.expected_types.as_ref()));
        results.push(self.check_value_ranges(options.value_ranges.as_ref()));

        let merged = ValidationResult::merge(results);
        info!(
            "Validation {}: {} issues, {} warnings",
            if merged.passed { "passed" } else { "failed" },
            merged.issues.len(),
            merged.warnings.len()
        );
        merged
    }

    fn column_values(&self, name: &str) -> Option<Vec<Option<f64>>> {
        self.df
            .column(name)
            .ok()
            .map(|c| numeric_values(c.as_materialized_series()))
    }
}
