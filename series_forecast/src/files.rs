//! Reading, writing and naming the files behind a series

use crate::data::{TimeSeries, DATE_COLUMN, VALUE_COLUMN};
use crate::error::{ForecastError, Result};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Number of rows polars inspects when inferring column types
const SCHEMA_INFERENCE_ROWS: usize = 1000;

/// File operations for uploaded series
#[derive(Debug)]
pub struct FileManager;

impl FileManager {
    /// Read a CSV with a header row into a DataFrame
    pub fn read_file<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(Some(SCHEMA_INFERENCE_ROWS))
            .has_header(true)
            .finish()?;

        debug!(path = %path.display(), rows = df.height(), "csv file read");
        Ok(df)
    }

    /// Write a cleaned series back out as `date,value` rows
    pub fn save_file<P: AsRef<Path>>(path: P, series: &TimeSeries) -> Result<()> {
        let mut writer = csv::Writer::from_path(path.as_ref())?;
        writer.write_record([DATE_COLUMN, VALUE_COLUMN])?;
        for (date, value) in series.dates().iter().zip(series.values()) {
            writer.write_record([date.as_str(), &value.to_string()])?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Store uploaded bytes under `dir`, returning the stored path
    pub fn store_upload<P: AsRef<Path>>(dir: P, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let safe_name = Self::sanitize_file_name(file_name)?;
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let path = dir.join(&safe_name);
        fs::write(&path, bytes)?;

        info!(file = %safe_name, bytes = bytes.len(), "upload stored");
        Ok(path)
    }

    /// Resolve a client supplied file name inside `dir`
    ///
    /// Fails with [`ForecastError::InvalidParameter`] when the name is unsafe
    /// or no such file exists.
    pub fn resolve<P: AsRef<Path>>(dir: P, file_name: &str) -> Result<PathBuf> {
        let safe_name = Self::sanitize_file_name(file_name)?;
        if safe_name != file_name {
            return Err(ForecastError::InvalidParameter(format!(
                "Invalid file name '{}'",
                file_name
            )));
        }

        let path = dir.as_ref().join(safe_name);
        if !path.is_file() {
            return Err(ForecastError::InvalidParameter(format!(
                "Unknown file '{}'",
                file_name
            )));
        }
        Ok(path)
    }

    /// Series name of a file: its final component up to the first `.`
    pub fn series_name<P: AsRef<Path>>(path: P) -> Result<String> {
        let path = path.as_ref();
        path.file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.split('.').next())
            .filter(|stem| !stem.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                ForecastError::DataError(format!("Cannot name series from '{}'", path.display()))
            })
    }

    /// Keep only the final path component, restricted to a portable charset
    fn sanitize_file_name(file_name: &str) -> Result<String> {
        let base = file_name
            .rsplit(|c: char| c == '/' || c == '\\')
            .next()
            .unwrap_or_default()
            .trim();

        let sanitized: String = base
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        if sanitized.is_empty() || sanitized.starts_with('.') {
            return Err(ForecastError::InvalidParameter(format!(
                "Invalid file name '{}'",
                file_name
            )));
        }
        Ok(sanitized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tempfile::tempdir;

    #[rstest]
    #[case("sales.csv", "sales")]
    #[case("data/monthly_beer.csv", "monthly_beer")]
    #[case("archive.tar.gz", "archive")]
    fn test_series_name(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(FileManager::series_name(path).unwrap(), expected);
    }

    #[rstest]
    #[case("sales.csv", "sales.csv")]
    #[case("../../etc/passwd", "passwd")]
    #[case("C:\\temp\\my file.csv", "my_file.csv")]
    fn test_sanitize_file_name(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(FileManager::sanitize_file_name(raw).unwrap(), expected);
    }

    #[test]
    fn test_sanitize_rejects_hidden_and_empty() {
        assert!(FileManager::sanitize_file_name(".env").is_err());
        assert!(FileManager::sanitize_file_name("dir/").is_err());
    }

    #[test]
    fn test_store_and_resolve_upload() {
        let dir = tempdir().unwrap();
        let stored =
            FileManager::store_upload(dir.path(), "series.csv", b"date,value\n2023-01,1\n").unwrap();
        assert_eq!(stored, dir.path().join("series.csv"));

        let resolved = FileManager::resolve(dir.path(), "series.csv").unwrap();
        assert_eq!(resolved, stored);

        assert!(FileManager::resolve(dir.path(), "missing.csv").unwrap_err().is_client_error());
        assert!(FileManager::resolve(dir.path(), "../series.csv")
            .unwrap_err()
            .is_client_error());
    }

    #[test]
    fn test_save_file_writes_cleaned_values() {
        let dir = tempdir().unwrap();
        let series =
            TimeSeries::new("saved", &["2023-01-01", "2023-01-02"], &[1.0, 0.0]).unwrap();
        let path = dir.path().join("saved.csv");

        FileManager::save_file(&path, &series).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "date,value\n2023-01-01,1\n2023-01-02,1\n");
    }
}
