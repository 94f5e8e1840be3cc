//! CSV Record Reader
//!
//! Reads batch records from CSV exports with a header row.
//! Named columns map onto the record id, timestamp and category; every
//! other column becomes a field, typed per cell.

use super::error::{DatasetError, DatasetResult};
use crate::resample::{FieldValue, MetricRecord};
use std::io::Read;
use std::path::Path;

/// CSV reader with configurable column names
pub struct CsvRecordReader {
    /// Column holding the record id
    id_column: String,
    /// Column holding the timestamp
    time_column: String,
    /// Column holding the category
    category_column: String,
    /// Field delimiter
    delimiter: u8,
}

impl Default for CsvRecordReader {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvRecordReader {
    /// Create a reader for `id`, `time` and `category` columns
    pub fn new() -> Self {
        Self {
            id_column: "id".to_string(),
            time_column: "time".to_string(),
            category_column: "category".to_string(),
            delimiter: b',',
        }
    }

    /// Set the id column name
    pub fn with_id_column(mut self, column: &str) -> Self {
        self.id_column = column.to_string();
        self
    }

    /// Set the timestamp column name
    pub fn with_time_column(mut self, column: &str) -> Self {
        self.time_column = column.to_string();
        self
    }

    /// Set the category column name
    pub fn with_category_column(mut self, column: &str) -> Self {
        self.category_column = column.to_string();
        self
    }

    /// Set the field delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Read records from a CSV file
    pub fn read_path(&self, path: &Path) -> DatasetResult<Vec<MetricRecord>> {
        let file = std::fs::File::open(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.read(file)
    }

    /// Read records from any CSV source
    ///
    /// Without an id column, records are numbered from 1 by row.
    pub fn read<R: Read>(&self, source: R) -> DatasetResult<Vec<MetricRecord>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .delimiter(self.delimiter)
            .from_reader(source);

        let headers = reader.headers()?.clone();
        let id_idx = headers.iter().position(|h| h == self.id_column);

        let mut records = Vec::new();
        for (row, result) in reader.records().enumerate() {
            let row_number = row + 1;
            let row_data = result?;

            let id = match id_idx {
                Some(idx) => row_data.get(idx).unwrap_or_default().to_string(),
                None => row_number.to_string(),
            };
            if id.is_empty() {
                return Err(DatasetError::EmptyId(row_number));
            }

            let mut record = MetricRecord::new(id);
            for (idx, header) in headers.iter().enumerate() {
                if Some(idx) == id_idx {
                    continue;
                }
                let cell = row_data.get(idx).unwrap_or_default();

                if header == self.time_column {
                    record.time = non_empty(cell);
                } else if header == self.category_column {
                    record.category = non_empty(cell);
                } else {
                    record.fields.insert(header.to_string(), parse_cell(cell));
                }
            }

            records.push(record);
        }

        tracing::debug!(records = records.len(), "read CSV records");
        Ok(records)
    }
}

fn non_empty(cell: &str) -> Option<String> {
    (!cell.is_empty()).then(|| cell.to_string())
}

/// Type a CSV cell: empty is null, then number, then boolean, else text
fn parse_cell(cell: &str) -> FieldValue {
    if cell.is_empty() {
        return FieldValue::Null;
    }
    if let Ok(n) = cell.parse::<f64>() {
        if n.is_finite() {
            return FieldValue::Number(n);
        }
    }
    match cell.to_lowercase().as_str() {
        "true" => FieldValue::Bool(true),
        "false" => FieldValue::Bool(false),
        _ => FieldValue::Text(cell.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_typed_columns() {
        let csv = "id,time,category,rows,parent,note,ok\n\
                   b1,2024-01-01,x,10,2,first,true\n\
                   b2,,y,20,,second,false\n";
        let records = CsvRecordReader::new().read(csv.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "b1");
        assert_eq!(records[0].time.as_deref(), Some("2024-01-01"));
        assert_eq!(records[0].category.as_deref(), Some("x"));
        assert_eq!(records[0].number("rows"), Some(10.0));
        assert_eq!(records[0].text("note").as_deref(), Some("first"));
        assert_eq!(records[0].fields.get("ok"), Some(&FieldValue::Bool(true)));

        assert!(records[1].time.is_none());
        assert_eq!(records[1].fields.get("parent"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_read_without_id_column() {
        let csv = "time,rows\n2024-01-01,1\n2024-01-02,2\n";
        let records = CsvRecordReader::new().read(csv.as_bytes()).unwrap();

        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_custom_columns_and_delimiter() {
        let csv = "batch;period;group;rows\nA;2024-02-01;north;5\n";
        let records = CsvRecordReader::new()
            .with_id_column("batch")
            .with_time_column("period")
            .with_category_column("group")
            .with_delimiter(b';')
            .read(csv.as_bytes())
            .unwrap();

        assert_eq!(records[0].id, "A");
        assert_eq!(records[0].time.as_deref(), Some("2024-02-01"));
        assert_eq!(records[0].category.as_deref(), Some("north"));
        assert_eq!(records[0].number("rows"), Some(5.0));
    }

    #[test]
    fn test_empty_id_rejected() {
        let csv = "id,rows\n,1\n";
        let result = CsvRecordReader::new().read(csv.as_bytes());

        assert!(matches!(result, Err(DatasetError::EmptyId(1))));
    }
}
