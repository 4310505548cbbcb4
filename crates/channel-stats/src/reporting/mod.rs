//! Report sink.
//!
//! Writes rendered text reports, JSON result files and cleaned tables to
//! disk. Parent directories are created on demand and existing files are
//! overwritten.
//!
//! # Example
//!
//! ```rust,ignore
//! use channel_stats::reporting::ReportWriter;
//!
//! let writer = ReportWriter::new("outputs");
//! writer.write_text("quality_report.txt", &validator.generate_quality_report())?;
//! writer.write_json("validation.json", &result)?;
//! ```

mod writer;

pub use writer::{export_csv, write_report, JsonEnvelope, ReportWriter};
