//! Custom error types for channel statistics analysis.
//!
//! This module provides the error hierarchy using `thiserror`. Data-quality
//! checks never produce these errors: they encode failures in a
//! [`ValidationResult`](crate::types::ValidationResult) instead. Errors are
//! reserved for loading problems and for statistics routines asked about a
//! column that does not exist.

use std::path::PathBuf;

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

use crate::config::ConfigValidationError;

/// The main error type for loading and analyzing a table.
#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// The source file does not exist.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// A metric or column name is not present in the table.
    #[error("Column '{0}' not found in dataset")]
    UnknownColumn(String),

    /// Decoding with the fallback encoding failed as well.
    #[error("Failed to decode input as {encoding}: {reason}")]
    EncodingFailure { encoding: String, reason: String },

    /// An option value could not be interpreted.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration builder validation failed.
    #[error(transparent)]
    Config(#[from] ConfigValidationError),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<AnalyticsError>,
    },
}

impl AnalyticsError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        AnalyticsError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable, machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::FileNotFound(_) => "FILE_NOT_FOUND",
            Self::UnknownColumn(_) => "UNKNOWN_COLUMN",
            Self::EncodingFailure { .. } => "ENCODING_FAILURE",
            Self::InvalidConfig(_) | Self::Config(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if the caller can reasonably retry with different input.
    ///
    /// A missing file or an undecodable file is fatal; asking for a column
    /// that doesn't exist is not.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::UnknownColumn(_) | Self::InvalidConfig(_) | Self::Config(_) => true,
            Self::WithContext { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for AnalyticsError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("AnalyticsError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| AnalyticsError::Polars(e).with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| AnalyticsError::Io(e).with_context(context))
    }
}
