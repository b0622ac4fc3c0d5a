//! Tabular dataset model

use std::path::Path;

use crate::error::Result;

/// A tabular dataset with string cells.
///
/// The empty string marks a cell with no value. Per-file cleaning replaces
/// empties with the `"N/A"` sentinel, so after cleaning an empty cell only
/// arises from schema-union holes introduced by the merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl AssetTable {
    /// Create an empty table with the given columns
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Read a CSV file with a header row.
    ///
    /// Every record must have as many fields as the header; ragged input is
    /// a parse error, which the caller treats as a skippable file.
    pub fn read_csv(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;

        let columns: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
        if columns.is_empty() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("{} has no header row", path.display()),
            )
            .into());
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|cell| cell.to_string()).collect());
        }

        Ok(Self { columns, rows })
    }

    /// Write the table as CSV with a header row
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;

        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;

        Ok(())
    }

    /// Index of the first column with this exact name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Append a column, one value per existing row.
    ///
    /// `values` must have exactly one entry per row; rows and columns stay
    /// aligned at all times.
    pub fn push_column(&mut self, name: &str, values: Vec<String>) {
        debug_assert_eq!(values.len(), self.rows.len());

        self.columns.push(name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
    }
}

/// Normalize a column name: lowercase, spaces replaced with underscores.
///
/// Destination schema fields are matched against columns under the same
/// normalization.
pub fn normalize_column(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_column() {
        assert_eq!(normalize_column("Creation Time"), "creation_time");
        assert_eq!(normalize_column("name"), "name");
        assert_eq!(normalize_column("Asset  Type"), "asset__type");
    }

    #[test]
    fn test_csv_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assets.csv");

        let table = AssetTable {
            columns: vec!["name".to_string(), "labels".to_string()],
            rows: vec![
                vec!["projects/a/vm".to_string(), "env=prod".to_string()],
                vec!["projects/b/vm".to_string(), String::new()],
            ],
        };

        table.write_csv(&path).unwrap();
        let read = AssetTable::read_csv(&path).unwrap();

        assert_eq!(read, table);
    }

    #[test]
    fn test_read_rejects_ragged_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ragged.csv");
        std::fs::write(&path, "a,b\n1,2\n3\n").unwrap();

        assert!(AssetTable::read_csv(&path).is_err());
    }

    #[test]
    fn test_read_rejects_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        std::fs::write(&path, "").unwrap();

        assert!(AssetTable::read_csv(&path).is_err());
    }

    #[test]
    fn test_read_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AssetTable::read_csv(&dir.path().join("absent.csv")).is_err());
    }

    #[test]
    fn test_push_column() {
        let mut table = AssetTable {
            columns: vec!["name".to_string()],
            rows: vec![vec!["a".to_string()], vec!["b".to_string()]],
        };

        table.push_column("project", vec!["p1".to_string(), "p2".to_string()]);

        assert_eq!(table.columns, vec!["name", "project"]);
        assert_eq!(table.rows[0], vec!["a", "p1"]);
        assert_eq!(table.rows[1], vec!["b", "p2"]);
        assert_eq!(table.column_index("project"), Some(1));
        assert_eq!(table.column_index("missing"), None);
    }
}
