use chrono::Local;
use polars::prelude::*;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{Result, ResultExt};

/// Write `content` to `path`, creating parent directories and replacing
/// any existing file.
pub fn write_report(content: &str, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .context(format!("Failed to create directory {}", parent.display()))?;
    }
    let mut file =
        File::create(path).context(format!("Failed to create {}", path.display()))?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

/// Export a table as CSV with a header row.
pub fn export_csv(df: &DataFrame, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    let mut df = df.clone();
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .finish(&mut df)?;
    info!("Dataset saved: {}", path.display());
    Ok(())
}

/// JSON file layout: a generation timestamp wrapped around the payload.
#[derive(Debug, Serialize)]
pub struct JsonEnvelope<'a, T: Serialize> {
    pub generated_at: String,
    pub data: &'a T,
}

/// Writes report artifacts under one output directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write a complete report to an explicit path.
    pub fn write_report(&self, content: &str, path: impl AsRef<Path>) -> Result<PathBuf> {
        write_report(content, path.as_ref())?;
        info!("Report saved: {}", path.as_ref().display());
        Ok(path.as_ref().to_path_buf())
    }

    /// Write a text report named `file_name` inside the output directory.
    pub fn write_text(&self, file_name: &str, content: &str) -> Result<PathBuf> {
        self.write_report(content, self.output_dir.join(file_name))
    }

    /// Write `value` as pretty JSON with a `generated_at` timestamp.
    pub fn write_json<T: Serialize>(&self, file_name: &str, value: &T) -> Result<PathBuf> {
        let envelope = JsonEnvelope {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            data: value,
        };
        let json = serde_json::to_string_pretty(&envelope)?;
        self.write_report(&json, self.output_dir.join(file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_report_creates_parents_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/report.txt");

        write_report("first", &path).unwrap();
        write_report("second", &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn test_write_json_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path());
        let path = writer
            .write_json("result.json", &serde_json::json!({"passed": true}))
            .unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(parsed["data"]["passed"], serde_json::json!(true));
        assert!(parsed["generated_at"].is_string());
    }

    #[test]
    fn test_export_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clean.csv");
        let df = df!["Youtuber" => ["A", "B"], "subscribers" => [1.0, 2.0]].unwrap();

        export_csv(&df, &path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("Youtuber,subscribers\n"));
        assert_eq!(content.lines().count(), 3);
    }
}
