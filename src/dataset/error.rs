//! Dataset error types
//!
//! Defines all errors that can occur while loading records, hints and schemas.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading input files
#[derive(Error, Debug)]
pub enum DatasetError {
    /// File could not be read
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON parsing failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV parsing failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// File extension is not a known record format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Two records share an id
    #[error("Duplicate record id: {0}")]
    DuplicateId(String),

    /// A record has an empty id
    #[error("Empty record id at row {0}")]
    EmptyId(usize),
}

/// Result type alias for dataset operations
pub type DatasetResult<T> = Result<T, DatasetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DatasetError::DuplicateId("b1".to_string());
        assert_eq!(err.to_string(), "Duplicate record id: b1");

        let err = DatasetError::UnsupportedFormat("xml".to_string());
        assert_eq!(err.to_string(), "Unsupported format: xml");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: DatasetError = json_err.into();
        assert!(matches!(err, DatasetError::Json(_)));
    }
}
