//! Channel Statistics Library
//!
//! Data-quality checks and descriptive statistics for a table of channel
//! statistics (subscribers, video views, uploads, category, country), built
//! on Polars.
//!
//! # Overview
//!
//! - **Loading**: CSV input with an encoding fallback ([`load_table`])
//! - **Validation**: independent quality checks merged into one
//!   [`ValidationResult`] ([`DataValidator`])
//! - **Analysis**: top performers, group breakdowns, engagement ratios,
//!   correlations and outliers ([`ChannelAnalyzer`])
//! - **Reporting**: plain-text and JSON artifacts ([`ReportWriter`])
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use channel_stats::{
//!     AnalyticsConfig, ChannelAnalyzer, DataValidator, ReportWriter, ValidationOptions,
//!     load_table,
//! };
//!
//! let config = AnalyticsConfig::builder()
//!     .csv_path("data/channels.csv")
//!     .top_n(10)
//!     .build()?;
//!
//! let df = load_table("data/channels.csv", &config.data)?;
//!
//! let validator = DataValidator::new(&df)?;
//! let result = validator.validate_all(&ValidationOptions::default());
//! println!("passed: {}", result.passed);
//!
//! let analyzer = ChannelAnalyzer::new(&df)?;
//! let top = analyzer.top_performers("subscribers", 10)?;
//! println!("{}", top);
//!
//! let writer = ReportWriter::new(&config.output.base_dir);
//! writer.write_text("analysis_report.txt", &analyzer.generate_report())?;
//! ```
//!
//! # Missing values
//!
//! A cell is missing when it is null, or NaN in a floating-point column.
//! Text that does not parse as a number becomes missing wherever a numeric
//! view of a column is needed; it never raises an error.

pub mod analysis;
pub mod config;
pub mod error;
pub mod loader;
pub mod reporting;
pub mod table;
pub mod types;
pub mod utils;
pub mod validation;

// Re-exports for convenient access
pub use analysis::{AnalysisSummary, ChannelAnalyzer, RankedEntry};
pub use config::{
    AnalysisConfig, AnalyticsConfig, AnalyticsConfigBuilder, ConfigValidationError, DataConfig,
    LoggingConfig, OutlierMethod, OutputConfig,
};
pub use error::{AnalyticsError, Result as AnalyticsResult, ResultExt};
pub use loader::{basic_cleaning, load_table, summarize};
pub use reporting::{ReportWriter, export_csv, write_report};
pub use types::{
    CorrelationMatrix, CorrelationPair, DatasetSummary, EngagementMetric, EngagementMetrics,
    GroupAnalysis, GroupCount, GroupValue, MetricGroupStats, OutlierStats, ValidationResult,
};
pub use utils::{DtypeCategory, coerce_numeric, get_dtype_category, is_numeric_dtype};
pub use validation::{DataValidator, ValidationOptions};
