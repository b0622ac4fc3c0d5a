//! Clean & merge
//!
//! Turns the downloaded per-project CSV exports into one merged dataset.
//! Each file is cleaned independently; a file that fails to parse is logged
//! and skipped, and the run only fails when no file survives. The cleaned
//! tables are then concatenated under a schema union, de-duplicated, and
//! stamped with the run timestamp.

pub mod table;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::{Result, SyncError};

pub use table::{normalize_column, AssetTable};

/// Sentinel written into cells that arrived empty
pub const MISSING_VALUE: &str = "N/A";

/// Provenance column recording which downloaded file a row came from
pub const SOURCE_FILE_COLUMN: &str = "source_file";

/// Run-timestamp column applied to every merged row
pub const LAST_UPDATED_COLUMN: &str = "last_updated";

/// Clean every staged file and merge the survivors into one dataset.
///
/// The merged table is written to `output_path` as CSV and returned.
pub fn clean_and_merge(files: &[PathBuf], output_path: &Path) -> Result<AssetTable> {
    let mut tables = Vec::new();

    for file in files {
        match load_and_clean(file) {
            Ok(table) => {
                debug!(
                    "Processed {}: {} rows, {} columns",
                    file.display(),
                    table.rows.len(),
                    table.columns.len()
                );
                tables.push(table);
            }
            Err(e @ (SyncError::Csv(_) | SyncError::Io(_))) => {
                warn!("Error processing file {}: {}", file.display(), e);
            }
            Err(e) => return Err(e),
        }
    }

    let processed = tables.len();
    let merged = merge_tables(tables, &run_timestamp())?;
    merged.write_csv(output_path)?;

    info!(
        "Merged {} files into {} rows and {} columns",
        processed,
        merged.rows.len(),
        merged.columns.len()
    );

    Ok(merged)
}

/// Load one downloaded file and apply the per-file cleaning steps
pub fn load_and_clean(path: &Path) -> Result<AssetTable> {
    let mut table = AssetTable::read_csv(path)?;
    clean_table(&mut table, &path.to_string_lossy());
    Ok(table)
}

/// Per-file cleaning, in order: provenance column, missing-value fill,
/// temporal canonicalization, derived `project` and `environment` columns.
fn clean_table(table: &mut AssetTable, source: &str) {
    table.push_column(
        SOURCE_FILE_COLUMN,
        vec![source.to_string(); table.rows.len()],
    );

    for row in &mut table.rows {
        for cell in row.iter_mut() {
            if cell.is_empty() {
                *cell = MISSING_VALUE.to_string();
            }
        }
    }

    canonicalize_temporal_columns(table);
    derive_project_column(table);
    derive_environment_column(table);
}

/// Rewrite temporal columns in canonical RFC 3339 UTC.
///
/// Applies to every column whose name contains `time` or `date`
/// (case-insensitive). All-or-nothing per column: a single cell no accepted
/// format can parse leaves the whole column untouched. Best effort by
/// design, so failures are not logged.
fn canonicalize_temporal_columns(table: &mut AssetTable) {
    for index in 0..table.columns.len() {
        let name = table.columns[index].to_lowercase();
        if !name.contains("time") && !name.contains("date") {
            continue;
        }

        let parsed: Option<Vec<String>> = table
            .rows
            .iter()
            .map(|row| parse_timestamp(&row[index]).map(format_timestamp))
            .collect();

        if let Some(values) = parsed {
            for (row, value) in table.rows.iter_mut().zip(values) {
                row[index] = value;
            }
        }
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Parse a cell with the accepted temporal formats.
///
/// Offsets are honored when present (RFC 3339); naive values are taken as
/// UTC, dates as midnight UTC.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Some(datetime.with_timezone(&Utc));
    }

    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            return Some(datetime.and_utc());
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
        }
    }

    None
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Derive `project` from the `name` column when one exists
fn derive_project_column(table: &mut AssetTable) {
    let Some(name_index) = table.column_index("name") else {
        return;
    };

    let values = table
        .rows
        .iter()
        .map(|row| derive_project(&row[name_index]))
        .collect();
    table.push_column("project", values);
}

/// The second slash-delimited segment of an asset name, e.g.
/// `projects/myproj/assets/x` yields `myproj`. Names without a slash have
/// no project to extract.
fn derive_project(name: &str) -> String {
    if name.contains('/') {
        name.split('/').nth(1).unwrap_or("unknown").to_string()
    } else {
        "unknown".to_string()
    }
}

/// Derive `environment` from the `labels` column when one exists
fn derive_environment_column(table: &mut AssetTable) {
    let Some(labels_index) = table.column_index("labels") else {
        return;
    };

    let values = table
        .rows
        .iter()
        .map(|row| derive_environment(&row[labels_index]).to_string())
        .collect();
    table.push_column("environment", values);
}

/// `prod` wins over `dev` when a label value mentions both
fn derive_environment(labels: &str) -> &'static str {
    if labels.contains("prod") {
        "prod"
    } else if labels.contains("dev") {
        "dev"
    } else {
        "unknown"
    }
}

/// Merge cleaned tables into one dataset.
///
/// Columns are the first-seen union across inputs; rows from tables lacking
/// a column get empty cells for it. Exact duplicates are dropped, compared
/// on every column except the provenance column so the same asset exported
/// by two projects collapses to its first occurrence. Column names are then
/// normalized and every surviving row is stamped with `last_updated`.
pub fn merge_tables(tables: Vec<AssetTable>, last_updated: &str) -> Result<AssetTable> {
    if tables.is_empty() {
        return Err(SyncError::NoUsableInput);
    }

    let mut columns: Vec<String> = Vec::new();
    for table in &tables {
        for column in &table.columns {
            if !columns.contains(column) {
                columns.push(column.clone());
            }
        }
    }

    let mut rows: Vec<Vec<String>> = Vec::new();
    for table in &tables {
        let indices: Vec<Option<usize>> = columns
            .iter()
            .map(|column| table.column_index(column))
            .collect();

        for row in &table.rows {
            rows.push(
                indices
                    .iter()
                    .map(|index| index.map(|i| row[i].clone()).unwrap_or_default())
                    .collect(),
            );
        }
    }

    let provenance = columns.iter().position(|c| c == SOURCE_FILE_COLUMN);
    let mut seen: HashSet<Vec<String>> = HashSet::new();
    rows.retain(|row| {
        let key: Vec<String> = row
            .iter()
            .enumerate()
            .filter(|&(index, _)| Some(index) != provenance)
            .map(|(_, cell)| cell.clone())
            .collect();
        seen.insert(key)
    });

    for column in &mut columns {
        *column = normalize_column(column);
    }

    columns.push(LAST_UPDATED_COLUMN.to_string());
    for row in &mut rows {
        row.push(last_updated.to_string());
    }

    Ok(AssetTable { columns, rows })
}

fn run_timestamp() -> String {
    format_timestamp(Utc::now())
}

// ============================================================================
// Tests
// ============================================================================
