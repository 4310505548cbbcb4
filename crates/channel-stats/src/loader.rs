//! CSV loading, quick inspection, and lightweight cleaning.

use encoding_rs::Encoding;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::DataConfig;
use crate::error::{AnalyticsError, Result, ResultExt};
use crate::table::{self, columns};
use crate::types::DatasetSummary;
use crate::utils::{coerce_numeric_series, dtype_label};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Load a delimited text file into a table.
///
/// The file is decoded with `config.encoding` first. If decoding or parsing
/// fails, the raw bytes are decoded again with `config.fallback_encoding`
/// and parsed from memory. Column names are trimmed; nothing is validated.
///
/// # Errors
///
/// - [`AnalyticsError::FileNotFound`] when `path` does not exist.
/// - [`AnalyticsError::EncodingFailure`] when the fallback attempt fails too.
pub fn load_table(path: impl AsRef<Path>, config: &DataConfig) -> Result<DataFrame> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(AnalyticsError::FileNotFound(path.to_path_buf()));
    }

    info!("Loading {}", path.display());
    let bytes = std::fs::read(path).context(format!("Failed to read {}", path.display()))?;

    let mut df = match parse_with_encoding(&bytes, &config.encoding, config) {
        Ok(df) => df,
        Err(primary) => {
            warn!(
                "Reading as {} failed ({}), retrying as {}",
                config.encoding, primary, config.fallback_encoding
            );
            parse_with_encoding(&bytes, &config.fallback_encoding, config).map_err(|e| {
                AnalyticsError::EncodingFailure {
                    encoding: config.fallback_encoding.clone(),
                    reason: e.to_string(),
                }
            })?
        }
    };

    table::normalize_column_names(&mut df)?;
    info!("Loaded {} rows x {} columns", df.height(), df.width());
    Ok(df)
}

/// Decode `bytes` with the named encoding and parse the text as CSV.
fn parse_with_encoding(bytes: &[u8], label: &str, config: &DataConfig) -> Result<DataFrame> {
    let encoding = Encoding::for_label(label.as_bytes())
        .ok_or_else(|| AnalyticsError::InvalidConfig(format!("Unknown encoding '{}'", label)))?;

    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let text = encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .ok_or_else(|| AnalyticsError::EncodingFailure {
            encoding: encoding.name().to_string(),
            reason: "input contains malformed byte sequences".to_string(),
        })?;
    debug!("Decoded {} bytes as {}", body.len(), encoding.name());

    let cursor = Cursor::new(text.into_owned());
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(config.infer_schema_length)
        .into_reader_with_file_handle(cursor)
        .finish()?;
    Ok(df)
}

/// Shape, column names, dtype labels and missing counts of a table.
pub fn summarize(df: &DataFrame) -> DatasetSummary {
    let columns = table::column_names(df);
    let dtypes: HashMap<String, String> = df
        .get_columns()
        .iter()
        .map(|c| (c.name().to_string(), dtype_label(c.dtype())))
        .collect();
    let missing_counts: HashMap<String, usize> = table::missing_counts(df).into_iter().collect();

    DatasetSummary {
        shape: (df.height(), df.width()),
        columns,
        dtypes,
        missing_counts,
    }
}

/// Return a cleaned copy of the table.
///
/// - column names are trimmed
/// - `subscribers` is coerced to numeric (unparsable cells become missing)
/// - `video views` gets a numeric copy named `video_views`
/// - exact duplicate rows are dropped, first occurrences kept in order
pub fn basic_cleaning(df: &DataFrame) -> Result<DataFrame> {
    let mut cleaned = df.clone();
    table::normalize_column_names(&mut cleaned)?;

    if table::has_column(&cleaned, columns::SUBSCRIBERS) {
        let series = cleaned
            .column(columns::SUBSCRIBERS)?
            .as_materialized_series()
            .clone();
        cleaned.with_column(coerce_numeric_series(&series))?;
    }

    if table::has_column(&cleaned, columns::VIDEO_VIEWS) {
        let series = cleaned
            .column(columns::VIDEO_VIEWS)?
            .as_materialized_series()
            .clone();
        let mut numeric = coerce_numeric_series(&series);
        numeric.rename("video_views".into());
        cleaned.with_column(numeric)?;
    }

    let before = cleaned.height();
    let cleaned = table::drop_duplicates(&cleaned)?;
    let dropped = before - cleaned.height();
    if dropped > 0 {
        info!("Dropped {} duplicate rows", dropped);
    }
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_table("does/not/exist.csv", &DataConfig::default()).unwrap_err();
        assert!(matches!(err, AnalyticsError::FileNotFound(_)));
    }

    #[test]
    fn test_load_trims_headers() {
        let file = write_temp(b" Youtuber ,subscribers\nA,10\nB,20\n");
        let df = load_table(file.path(), &DataConfig::default()).unwrap();
        assert_eq!(table::column_names(&df), vec!["Youtuber", "subscribers"]);
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn test_load_falls_back_to_latin1() {
        // 0xE9 is 'e' with acute accent in windows-1252 and invalid UTF-8 on its own
        let file = write_temp(b"Youtuber,Country\nJos\xE9,Spain\n");
        let df = load_table(file.path(), &DataConfig::default()).unwrap();
        let names = df
            .column("Youtuber")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .clone();
        assert_eq!(names.get(0), Some("José"));
    }

    #[test]
    fn test_load_unknown_fallback_encoding() {
        let file = write_temp(b"a\n\xFF\n");
        let config = DataConfig {
            fallback_encoding: "no-such-encoding".to_string(),
            ..DataConfig::default()
        };
        let err = load_table(file.path(), &config).unwrap_err();
        assert_eq!(err.error_code(), "ENCODING_FAILURE");
    }

    #[test]
    fn test_summarize() {
        let df = df![
            "Youtuber" => [Some("A"), None],
            "subscribers" => [Some(1.0), Some(f64::NAN)],
        ]
        .unwrap();
        let summary = summarize(&df);
        assert_eq!(summary.shape, (2, 2));
        assert_eq!(summary.columns, vec!["Youtuber", "subscribers"]);
        assert_eq!(summary.dtypes["subscribers"], "f64");
        assert_eq!(summary.missing_counts["Youtuber"], 1);
        assert_eq!(summary.missing_counts["subscribers"], 1);
        assert_eq!(summary.total_missing(), 2);
    }

    #[test]
    fn test_basic_cleaning() {
        let df = df![
            "Youtuber " => ["A", "B", "A"],
            "subscribers" => ["100", "oops", "100"],
            "video views" => ["5", "6", "5"],
        ]
        .unwrap();
        let cleaned = basic_cleaning(&df).unwrap();

        assert_eq!(
            table::column_names(&cleaned),
            vec!["Youtuber", "subscribers", "video views", "video_views"]
        );
        assert_eq!(cleaned.height(), 2);

        let subs = cleaned.column("subscribers").unwrap();
        assert_eq!(subs.dtype(), &DataType::Float64);
        assert_eq!(subs.null_count(), 1);

        // the input is untouched
        assert_eq!(df.column("subscribers").unwrap().dtype(), &DataType::String);
    }
}
