// ⚠️ Error types - load and aggregation failures
// Load failures are fatal: the dashboard never renders from partial tables

use std::path::PathBuf;
use thiserror::Error;

/// Failure while reading one of the two source tables
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("data file not found: {path}")]
    MissingFile { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path} is missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: String },

    #[error("{path} line {line}: {message}")]
    InvalidRow {
        path: PathBuf,
        line: u64,
        message: String,
    },
}

impl DataLoadError {
    /// The resource this error refers to
    pub fn path(&self) -> &PathBuf {
        match self {
            DataLoadError::MissingFile { path }
            | DataLoadError::Unreadable { path, .. }
            | DataLoadError::MissingColumn { path, .. }
            | DataLoadError::InvalidRow { path, .. } => path,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum AggregateError {
    #[error("grouping supports 1 or 2 dimensions, got {0}")]
    UnsupportedDimensions(usize),

    #[error("dense reindex needs a two-dimension series, got {0}")]
    NotTwoDimensional(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_load_error_display() {
        let err = DataLoadError::MissingFile {
            path: PathBuf::from("records.csv"),
        };
        assert!(format!("{}", err).contains("not found"));
        assert!(format!("{}", err).contains("records.csv"));

        let err = DataLoadError::MissingColumn {
            path: PathBuf::from("key.csv"),
            column: "Institution".to_string(),
        };
        assert!(format!("{}", err).contains("'Institution'"));
        assert_eq!(err.path(), &PathBuf::from("key.csv"));

        let err = DataLoadError::InvalidRow {
            path: PathBuf::from("records.csv"),
            line: 7,
            message: "bad amount".to_string(),
        };
        assert!(format!("{}", err).contains("line 7"));
    }

    #[test]
    fn test_aggregate_error_display() {
        let err = AggregateError::UnsupportedDimensions(3);
        assert!(format!("{}", err).contains("got 3"));
    }
}
