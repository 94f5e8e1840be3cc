//! Dataset loading
//!
//! Reads the inputs a discovery backend hands over: batch records (JSON or
//! CSV), numeric bin hints, category group hints and an optional schema.
//!
//! Record ids must be unique within one file.

mod csv_records;
mod error;

pub use csv_records::CsvRecordReader;
pub use error::{DatasetError, DatasetResult};

use crate::resample::{CategoryGroupHints, MetricRecord, NumericBinHints};
use crate::schema::DiscoverySchema;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::path::Path;

/// Load records, choosing the format from the file extension
pub fn load_records(path: &Path) -> DatasetResult<Vec<MetricRecord>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let records = match extension.as_str() {
        "json" => load_json(path)?,
        "csv" => CsvRecordReader::new().read_path(path)?,
        other => return Err(DatasetError::UnsupportedFormat(other.to_string())),
    };

    check_unique_ids(&records)?;
    tracing::info!(path = %path.display(), records = records.len(), "loaded records");
    Ok(records)
}

/// Parse records from a JSON array
pub fn records_from_json(json: &str) -> DatasetResult<Vec<MetricRecord>> {
    let records: Vec<MetricRecord> = serde_json::from_str(json)?;
    check_unique_ids(&records)?;
    Ok(records)
}

/// Load numeric bin hints (`{"field": [edges...]}`)
pub fn load_numeric_hints(path: &Path) -> DatasetResult<NumericBinHints> {
    load_json(path)
}

/// Load category group hints (`{"groups": {...}, "order": [...]}`)
pub fn load_category_hints(path: &Path) -> DatasetResult<CategoryGroupHints> {
    load_json(path)
}

/// Load a discovery schema
pub fn load_schema(path: &Path) -> DatasetResult<DiscoverySchema> {
    load_json(path)
}

/// Reject empty or repeated ids
pub fn check_unique_ids(records: &[MetricRecord]) -> DatasetResult<()> {
    let mut seen = HashSet::with_capacity(records.len());
    for (row, record) in records.iter().enumerate() {
        if record.id.is_empty() {
            return Err(DatasetError::EmptyId(row + 1));
        }
        if !seen.insert(record.id.as_str()) {
            return Err(DatasetError::DuplicateId(record.id.clone()));
        }
    }
    Ok(())
}

fn load_json<T: DeserializeOwned>(path: &Path) -> DatasetResult<T> {
    let content = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}
