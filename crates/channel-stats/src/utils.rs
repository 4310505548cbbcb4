//! Shared utilities for validation and analysis.
//!
//! This module contains common helper functions used across multiple modules
//! to reduce code duplication and ensure consistency.

use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Category of a data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DtypeCategory {
    /// Integer or floating point numbers
    Numeric,
    /// Date or datetime types
    Datetime,
    /// Boolean type
    Boolean,
    /// String/text type
    String,
    /// Other/unknown types
    Other,
}

impl DtypeCategory {
    /// Lowercase label, also accepted as an expected type name.
    pub fn label(&self) -> &'static str {
        match self {
            DtypeCategory::Numeric => "numeric",
            DtypeCategory::Datetime => "datetime",
            DtypeCategory::Boolean => "binary",
            DtypeCategory::String => "string",
            DtypeCategory::Other => "other",
        }
    }
}

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is a floating point type (the only ones that can hold NaN).
#[inline]
pub fn is_float_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Float32 | DataType::Float64)
}

/// Check if a DataType is a datetime type.
#[inline]
pub fn is_datetime_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Datetime(_, _) | DataType::Date | DataType::Time
    )
}

/// Get the category of a DataType.
pub fn get_dtype_category(dtype: &DataType) -> DtypeCategory {
    if is_numeric_dtype(dtype) {
        DtypeCategory::Numeric
    } else if is_datetime_dtype(dtype) {
        DtypeCategory::Datetime
    } else if matches!(dtype, DataType::Boolean) {
        DtypeCategory::Boolean
    } else if matches!(dtype, DataType::String | DataType::Categorical(_, _)) {
        DtypeCategory::String
    } else {
        DtypeCategory::Other
    }
}

/// Short dtype label as polars prints it (`i64`, `f64`, `str`, ...).
pub fn dtype_label(dtype: &DataType) -> String {
    format!("{}", dtype)
}

/// Check a user-supplied type name against a dtype, ignoring case.
///
/// Accepts the polars label (`i64`), the category label (`numeric`) or a
/// type family name (`int`, `float`, `str`, `bool`).
pub fn matches_type_name(expected: &str, dtype: &DataType) -> bool {
    let expected = expected.trim().to_ascii_lowercase();
    if expected == dtype_label(dtype).to_ascii_lowercase()
        || expected == get_dtype_category(dtype).label()
    {
        return true;
    }

    let family: &[&str] = match dtype {
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 => {
            &["int", "integer"]
        }
        DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 => {
            &["int", "integer", "uint"]
        }
        DataType::Float32 | DataType::Float64 => &["float", "double"],
        DataType::String | DataType::Categorical(_, _) => &["str", "string", "text"],
        DataType::Boolean => &["bool", "boolean"],
        _ => &[],
    };
    family.contains(&expected.as_str())
}

// =============================================================================
// Numeric Coercion
// =============================================================================

/// Parse a text cell as a number.
///
/// Surrounding whitespace is ignored. Empty strings, unparsable text and NaN
/// all map to `None`; nothing here ever fails.
///
/// # Example
///
/// ```rust,ignore
/// use channel_stats::utils::coerce_numeric;
///
/// assert_eq!(coerce_numeric(" 42 "), Some(42.0));
/// assert_eq!(coerce_numeric("1e3"), Some(1000.0));
/// assert_eq!(coerce_numeric("n/a"), None);
/// ```
pub fn coerce_numeric(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Numeric view of a Series, one entry per row.
///
/// Numeric and boolean columns are cast, text columns are parsed cell by
/// cell with [`coerce_numeric`], and any other type is all-missing. NaN is
/// reported as missing.
pub fn numeric_values(series: &Series) -> Vec<Option<f64>> {
    let len = series.len();
    match get_dtype_category(series.dtype()) {
        DtypeCategory::Numeric | DtypeCategory::Boolean => series
            .cast(&DataType::Float64)
            .ok()
            .and_then(|casted| {
                casted.f64().ok().map(|ca| {
                    ca.into_iter()
                        .map(|v| v.filter(|val| !val.is_nan()))
                        .collect::<Vec<Option<f64>>>()
                })
            })
            .unwrap_or_else(|| vec![None; len]),
        DtypeCategory::String => series
            .cast(&DataType::String)
            .ok()
            .and_then(|casted| {
                casted.str().ok().map(|ca| {
                    ca.into_iter()
                        .map(|v| v.and_then(coerce_numeric))
                        .collect::<Vec<Option<f64>>>()
                })
            })
            .unwrap_or_else(|| vec![None; len]),
        _ => vec![None; len],
    }
}

/// Build a Float64 Series from a column, coercing text cells.
pub fn coerce_numeric_series(series: &Series) -> Series {
    Series::new(series.name().clone(), numeric_values(series))
}

// =============================================================================
// Descriptive Statistics
// =============================================================================

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator), `None` below two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let mean = mean(values)?;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n as f64 - 1.0);
    Some(variance.sqrt())
}

/// Sort a copy of the values ascending.
pub fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    sorted
}

/// Quantile of ascending-sorted values using linear interpolation between
/// the two closest ranks.
pub fn quantile_sorted(sorted: &[f64], quantile: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = quantile.clamp(0.0, 1.0) * (sorted.len() as f64 - 1.0);
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        return Some(sorted[lower]);
    }
    let weight = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Median, `None` for an empty slice.
pub fn median(values: &[f64]) -> Option<f64> {
    quantile_sorted(&sorted_copy(values), 0.5)
}

// =============================================================================
// Formatting Utilities
// =============================================================================

/// Format a number with thousands separators and a fixed number of decimals.
///
/// Non-finite values render as `n/a`.
pub fn format_grouped(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }
    let formatted = format!("{:.*}", decimals, value);
    let (sign, unsigned) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

/// Format an optional number, rendering `None` as `n/a`.
pub fn format_optional(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format_grouped(v, decimals))
        .unwrap_or_else(|| "n/a".to_string())
}

/// Format a count with thousands separators.
pub fn format_count(count: usize) -> String {
    format_grouped(count as f64, 0)
}

/// Percentage of `part` in `whole`, 0 when `whole` is zero.
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Turn a snake_case key into a title-cased label (`avg_views` -> `Avg Views`).
pub fn title_case_label(key: &str) -> String {
    key.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(|c| c.to_lowercase()))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Truncate a string to max characters with ellipsis.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

// =============================================================================
// Tests
// =============================================================================
