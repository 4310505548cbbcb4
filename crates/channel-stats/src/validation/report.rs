use polars::prelude::*;

use super::DataValidator;
use crate::table;
use crate::utils::{
    dtype_label, format_count, format_optional, mean, numeric_values, percentage, sample_std,
};

const RULE_WIDTH: usize = 80;
const MAX_NUMERIC_COLUMNS: usize = 10;

impl DataValidator {
    /// Render the plain-text data quality report.
    ///
    /// Counts are recomputed here, independently of the checks, with the
    /// same missing/duplicate definitions so the numbers agree.
    pub fn generate_quality_report(&self) -> String {
        let df = self.df();
        let rows = df.height();
        let heavy = "=".repeat(RULE_WIDTH);
        let light = "-".repeat(RULE_WIDTH);
        let mut lines: Vec<String> = Vec::new();

        lines.push(heavy.clone());
        lines.push("DATA QUALITY REPORT".to_string());
        lines.push(heavy.clone());
        lines.push(String::new());

        lines.push("DATASET OVERVIEW".to_string());
        lines.push(light.clone());
        lines.push(format!("Rows: {}", format_count(rows)));
        lines.push(format!("Columns: {}", df.width()));
        lines.push(format!(
            "Memory usage: {:.2} MB",
            df.estimated_size() as f64 / (1024.0 * 1024.0)
        ));
        lines.push(String::new());

        lines.push("MISSING VALUES".to_string());
        lines.push(light.clone());
        let missing: Vec<(String, usize)> = table::missing_counts(df)
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .collect();
        if missing.is_empty() {
            lines.push("No missing values detected".to_string());
        } else {
            for (name, count) in missing {
                lines.push(format!(
                    "{:<30} {:>8} ({:>6.2}%)",
                    name,
                    format_count(count),
                    percentage(count, rows)
                ));
            }
        }
        lines.push(String::new());

        let n_duplicates = table::duplicate_count(df);
        lines.push("DUPLICATES".to_string());
        lines.push(light.clone());
        lines.push(format!(
            "Duplicate rows: {} ({:.2}%)",
            format_count(n_duplicates),
            percentage(n_duplicates, rows)
        ));
        lines.push(String::new());

        lines.push("DATA TYPES".to_string());
        lines.push(light.clone());
        for (label, count) in dtype_counts(self) {
            lines.push(format!("{:<20} {:>3} columns", label, count));
        }
        lines.push(String::new());

        let numeric = table::numeric_columns(df);
        if !numeric.is_empty() {
            lines.push("NUMERIC COLUMN STATISTICS".to_string());
            lines.push(light.clone());
            lines.push(format!(
                "{:<30} {:>12} {:>12} {:>12} {:>12}",
                "Column", "Min", "Max", "Mean", "Std"
            ));
            lines.push(light.clone());
            for name in numeric.iter().take(MAX_NUMERIC_COLUMNS) {
                let values: Vec<f64> = df
                    .column(name)
                    .map(|c| numeric_values(c.as_materialized_series()))
                    .unwrap_or_default()
                    .into_iter()
                    .flatten()
                    .collect();
                let min = values.iter().copied().reduce(f64::min);
                let max = values.iter().copied().reduce(f64::max);
                lines.push(format!(
                    "{:<30} {:>12} {:>12} {:>12} {:>12}",
                    name,
                    format_optional(min, 0),
                    format_optional(max, 0),
                    format_optional(mean(&values), 0),
                    format_optional(sample_std(&values), 0)
                ));
            }
        }

        lines.push(String::new());
        lines.push(heavy);
        lines.join("\n")
    }
}

/// Columns per dtype label, most frequent first, ties by first appearance.
fn dtype_counts(validator: &DataValidator) -> Vec<(String, usize)> {
    let labels: Vec<String> = validator
        .df()
        .get_columns()
        .iter()
        .map(|c| dtype_label(c.dtype()))
        .collect();
    table::value_counts(&Series::new("dtype".into(), labels)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_quality_report_sections() {
        let df = df![
            "Youtuber" => [Some("A"), Some("B"), None, Some("A")],
            "subscribers" => [Some(1000.0), Some(2000.0), Some(3000.0), Some(1000.0)],
            "uploads" => [Some(1i64), Some(2), Some(3), Some(1)],
        ]
        .unwrap();
        let validator = DataValidator::new(&df).unwrap();
        let report = validator.generate_quality_report();
        let lines: Vec<&str> = report.lines().collect();

        assert_eq!(lines[1], "DATA QUALITY REPORT");
        assert_eq!(lines[6], "Rows: 4");
        assert_eq!(lines[7], "Columns: 3");
        assert!(lines[8].starts_with("Memory usage: "));
        assert!(report.contains(&format!("{:<30} {:>8} ({:>6.2}%)", "Youtuber", "1", 25.0)));
        assert!(report.contains("Duplicate rows: 0 (0.00%)"));
        assert!(report.contains(&format!("{:<20} {:>3} columns", "str", 1)));
        assert!(report.contains(&format!(
            "{:<30} {:>12} {:>12} {:>12} {:>12}",
            "subscribers", "1,000", "3,000", "1,750", "957"
        )));
        assert!(report.ends_with(&"=".repeat(80)));
    }

    #[test]
    fn test_quality_report_no_missing_no_numeric() {
        let df = df!["Youtuber" => ["A", "A"]].unwrap();
        let report = DataValidator::new(&df).unwrap().generate_quality_report();
        assert!(report.contains("No missing values detected"));
        assert!(report.contains("Duplicate rows: 1 (50.00%)"));
        assert!(!report.contains("NUMERIC COLUMN STATISTICS"));
    }

    #[test]
    fn test_report_counts_match_checks() {
        let df = df![
            "a" => [Some(1.0), None, Some(1.0), Some(f64::NAN)],
            "b" => [Some("x"), Some("y"), Some("x"), None],
        ]
        .unwrap();
        let validator = DataValidator::new(&df).unwrap();
        let report = validator.generate_quality_report();

        let dupes = validator.check_duplicates().stat_u64("n_duplicates").unwrap();
        assert!(report.contains(&format!("Duplicate rows: {} ", dupes)));

        let missing = validator.check_missing_values(0.5).stat_u64("total_missing").unwrap();
        assert_eq!(missing, 3);
        assert!(report.contains(&format!("{:<30} {:>8} ({:>6.2}%)", "a", "2", 50.0)));
    }

    #[test]
    fn test_dtype_counts_ordering() {
        let df = df![
            "s1" => ["a"],
            "f1" => [1.0],
            "f2" => [2.0],
        ]
        .unwrap();
        let validator = DataValidator::new(&df).unwrap();
        assert_eq!(
            dtype_counts(&validator),
            vec![("f64".to_string(), 2), ("str".to_string(), 1)]
        );
    }
}
