//! Configuration types for channel statistics analysis.
//!
//! Configuration is an explicitly constructed value passed to whichever
//! component needs it (loader, report writer, CLI). Use
//! [`AnalyticsConfig::builder()`] for a fluent setup, or
//! [`AnalyticsConfig::from_json_file`] to read a JSON document.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{AnalyticsError, Result};

/// Method used to flag outliers in a numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutlierMethod {
    /// Tukey fences: outside [Q1 - 1.5*IQR, Q3 + 1.5*IQR]
    #[default]
    Iqr,
    /// More than 3 sample standard deviations from the mean
    Zscore,
}

impl OutlierMethod {
    /// Name used in reports and stats records.
    pub fn display_name(&self) -> &'static str {
        match self {
            OutlierMethod::Iqr => "IQR",
            OutlierMethod::Zscore => "Z-score",
        }
    }
}

impl fmt::Display for OutlierMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for OutlierMethod {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "iqr" => Ok(OutlierMethod::Iqr),
            "zscore" | "z-score" | "z_score" => Ok(OutlierMethod::Zscore),
            other => Err(AnalyticsError::InvalidConfig(format!(
                "unknown outlier method '{}' (expected 'iqr' or 'zscore')",
                other
            ))),
        }
    }
}

/// Input settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Default CSV path when the CLI is not given one.
    pub csv_path: Option<PathBuf>,
    /// Primary text encoding label.
    /// Default: "utf-8"
    pub encoding: String,
    /// Encoding label tried when the primary decode fails.
    /// Default: "latin-1"
    pub fallback_encoding: String,
    /// Rows used for schema inference (None = whole file).
    /// Default: Some(1000)
    pub infer_schema_length: Option<usize>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            csv_path: None,
            encoding: "utf-8".to_string(),
            fallback_encoding: "latin-1".to_string(),
            infer_schema_length: Some(1000),
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory that receives reports.
    /// Default: "outputs"
    pub base_dir: PathBuf,
    /// Whether to also write JSON versions of the results.
    /// Default: true
    pub write_json: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("outputs"),
            write_json: true,
        }
    }
}

/// Analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Number of rows returned by top-performer queries from the CLI.
    /// Default: 20
    pub top_n: usize,
    /// Outlier method used by the CLI.
    /// Default: Iqr
    pub outlier_method: OutlierMethod,
    /// Missing-value fraction above which a column fails validation (0.0 - 1.0).
    /// Default: 0.5
    pub missing_threshold: f64,
    /// Absolute correlation at which a pair is reported as strong (0.0 - 1.0).
    /// Default: 0.7
    pub correlation_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_n: 20,
            outlier_method: OutlierMethod::default(),
            missing_threshold: 0.5,
            correlation_threshold: 0.7,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive (trace, debug, info, warn, error).
    /// Default: "info"
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Complete configuration.
///
/// # Example
///
/// ```rust,ignore
/// use channel_stats::config::{AnalyticsConfig, OutlierMethod};
///
/// let config = AnalyticsConfig::builder()
///     .missing_threshold(0.3)
///     .outlier_method(OutlierMethod::Zscore)
///     .build()?;
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub data: DataConfig,
    pub output: OutputConfig,
    pub analysis: AnalysisConfig,
    pub logging: LoggingConfig,
}

impl AnalyticsConfig {
    /// Create a new configuration builder.
    pub fn builder() -> AnalyticsConfigBuilder {
        AnalyticsConfigBuilder::default()
    }

    /// Read and validate a JSON configuration file.
    ///
    /// Missing sections and fields fall back to their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AnalyticsError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let config: AnalyticsConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        if !(0.0..=1.0).contains(&self.analysis.missing_threshold) {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "missing_threshold".to_string(),
                value: self.analysis.missing_threshold,
            });
        }

        if !(0.0..=1.0).contains(&self.analysis.correlation_threshold) {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "correlation_threshold".to_string(),
                value: self.analysis.correlation_threshold,
            });
        }

        if self.analysis.top_n == 0 {
            return Err(ConfigValidationError::InvalidTopN(self.analysis.top_n));
        }

        for label in [&self.data.encoding, &self.data.fallback_encoding] {
            if encoding_rs::Encoding::for_label(label.as_bytes()).is_none() {
                return Err(ConfigValidationError::UnknownEncoding(label.clone()));
            }
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid threshold for '{field}': {value} (must be between 0.0 and 1.0)")]
    InvalidThreshold { field: String, value: f64 },

    #[error("Invalid top_n: {0} (must be at least 1)")]
    InvalidTopN(usize),

    #[error("Unknown text encoding label: '{0}'")]
    UnknownEncoding(String),
}

/// Builder for [`AnalyticsConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct AnalyticsConfigBuilder {
    csv_path: Option<PathBuf>,
    encoding: Option<String>,
    fallback_encoding: Option<String>,
    infer_schema_length: Option<Option<usize>>,
    output_dir: Option<PathBuf>,
    write_json: Option<bool>,
    top_n: Option<usize>,
    outlier_method: Option<OutlierMethod>,
    missing_threshold: Option<f64>,
    correlation_threshold: Option<f64>,
    log_level: Option<String>,
}

impl AnalyticsConfigBuilder {
    /// Set the default CSV path.
    pub fn csv_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.csv_path = Some(path.into());
        self
    }

    /// Set the primary encoding label.
    pub fn encoding(mut self, label: impl Into<String>) -> Self {
        self.encoding = Some(label.into());
        self
    }

    /// Set the encoding label used after a failed primary decode.
    pub fn fallback_encoding(mut self, label: impl Into<String>) -> Self {
        self.fallback_encoding = Some(label.into());
        self
    }

    /// Set how many rows are used for schema inference (`None` scans everything).
    pub fn infer_schema_length(mut self, rows: Option<usize>) -> Self {
        self.infer_schema_length = Some(rows);
        self
    }

    /// Set the output directory for reports.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Enable or disable JSON result files.
    pub fn write_json(mut self, write: bool) -> Self {
        self.write_json = Some(write);
        self
    }

    /// Set the number of top performers listed by the CLI.
    pub fn top_n(mut self, n: usize) -> Self {
        self.top_n = Some(n);
        self
    }

    /// Set the outlier method.
    pub fn outlier_method(mut self, method: OutlierMethod) -> Self {
        self.outlier_method = Some(method);
        self
    }

    /// Set the missing-value threshold.
    ///
    /// # Arguments
    /// * `threshold` - Value between 0.0 and 1.0 (e.g., 0.5 = 50%)
    pub fn missing_threshold(mut self, threshold: f64) -> Self {
        self.missing_threshold = Some(threshold);
        self
    }

    /// Set the threshold for reporting strongly correlated pairs.
    pub fn correlation_threshold(mut self, threshold: f64) -> Self {
        self.correlation_threshold = Some(threshold);
        self
    }

    /// Set the default log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `AnalyticsConfig` or an error if validation fails.
    pub fn build(self) -> std::result::Result<AnalyticsConfig, ConfigValidationError> {
        let defaults = AnalyticsConfig::default();
        let config = AnalyticsConfig {
            data: DataConfig {
                csv_path: self.csv_path,
                encoding: self.encoding.unwrap_or(defaults.data.encoding),
                fallback_encoding: self
                    .fallback_encoding
                    .unwrap_or(defaults.data.fallback_encoding),
                infer_schema_length: self
                    .infer_schema_length
                    .unwrap_or(defaults.data.infer_schema_length),
            },
            output: OutputConfig {
                base_dir: self.output_dir.unwrap_or(defaults.output.base_dir),
                write_json: self.write_json.unwrap_or(defaults.output.write_json),
            },
            analysis: AnalysisConfig {
                top_n: self.top_n.unwrap_or(defaults.analysis.top_n),
                outlier_method: self.outlier_method.unwrap_or_default(),
                missing_threshold: self
                    .missing_threshold
                    .unwrap_or(defaults.analysis.missing_threshold),
                correlation_threshold: self
                    .correlation_threshold
                    .unwrap_or(defaults.analysis.correlation_threshold),
            },
            logging: LoggingConfig {
                level: self.log_level.unwrap_or(defaults.logging.level),
            },
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalyticsConfig::default();
        assert_eq!(config.data.encoding, "utf-8");
        assert_eq!(config.data.fallback_encoding, "latin-1");
        assert_eq!(config.output.base_dir, PathBuf::from("outputs"));
        assert_eq!(config.analysis.top_n, 20);
        assert_eq!(config.analysis.outlier_method, OutlierMethod::Iqr);
        assert_eq!(config.analysis.missing_threshold, 0.5);
        assert_eq!(config.analysis.correlation_threshold, 0.7);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_builder_defaults_are_valid() {
        let config = AnalyticsConfig::builder().build().unwrap();
        assert_eq!(config.analysis.missing_threshold, 0.5);
        assert!(config.output.write_json);
    }

    #[test]
    fn test_builder_custom_values() {
        let config = AnalyticsConfig::builder()
            .missing_threshold(0.25)
            .outlier_method(OutlierMethod::Zscore)
            .top_n(5)
            .output_dir("reports")
            .log_level("debug")
            .build()
            .unwrap();

        assert_eq!(config.analysis.missing_threshold, 0.25);
        assert_eq!(config.analysis.outlier_method, OutlierMethod::Zscore);
        assert_eq!(config.analysis.top_n, 5);
        assert_eq!(config.output.base_dir, PathBuf::from("reports"));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_validation_invalid_threshold() {
        let result = AnalyticsConfig::builder().missing_threshold(1.5).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidThreshold { .. }
        ));
    }

    #[test]
    fn test_validation_zero_top_n() {
        let result = AnalyticsConfig::builder().top_n(0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidTopN(0)
        ));
    }

    #[test]
    fn test_validation_unknown_encoding() {
        let result = AnalyticsConfig::builder()
            .fallback_encoding("klingon-8")
            .build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::UnknownEncoding(_)
        ));
    }

    #[test]
    fn test_outlier_method_parsing() {
        assert_eq!("iqr".parse::<OutlierMethod>().unwrap(), OutlierMethod::Iqr);
        assert_eq!("ZSCORE".parse::<OutlierMethod>().unwrap(), OutlierMethod::Zscore);
        assert_eq!("z-score".parse::<OutlierMethod>().unwrap(), OutlierMethod::Zscore);
        assert!("mad".parse::<OutlierMethod>().is_err());
        assert_eq!(OutlierMethod::Iqr.to_string(), "IQR");
        assert_eq!(OutlierMethod::Zscore.to_string(), "Z-score");
    }

    #[test]
    fn test_config_from_partial_json() {
        let json = r#"{
            "analysis": { "top_n": 7, "outlier_method": "zscore" },
            "output": { "base_dir": "custom_output" }
        }"#;

        let config: AnalyticsConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.analysis.top_n, 7);
        assert_eq!(config.analysis.outlier_method, OutlierMethod::Zscore);
        assert_eq!(config.analysis.missing_threshold, 0.5);
        assert_eq!(config.output.base_dir, PathBuf::from("custom_output"));
        assert_eq!(config.data.fallback_encoding, "latin-1");
    }

    #[test]
    fn test_from_json_file_missing() {
        let err = AnalyticsConfig::from_json_file("does/not/exist.json").unwrap_err();
        assert_eq!(err.error_code(), "FILE_NOT_FOUND");
    }
}
