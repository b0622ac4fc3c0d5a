//! Clean & merge integration tests
//!
//! Exercise the full file-to-file path over a temp directory: per-file
//! cleaning, the schema union, cross-file de-duplication, and the
//! skip-bad-files policy.

use std::path::PathBuf;

use aim_core::transform::{
    clean_and_merge, AssetTable, LAST_UPDATED_COLUMN, MISSING_VALUE, SOURCE_FILE_COLUMN,
};
use aim_core::SyncError;
use tempfile::TempDir;

fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_merges_cleaned_files_and_drops_shared_assets() {
    let dir = tempfile::tempdir().unwrap();
    let alpha = write_file(
        &dir,
        "alpha.csv",
        "name,labels,Disk Size\n\
         projects/alpha/instances/vm-1,env=prod,100\n\
         projects/shared/instances/vm-9,env=prod,50\n",
    );
    let beta = write_file(
        &dir,
        "beta.csv",
        "name,labels,Disk Size\n\
         projects/beta/instances/vm-2,env=dev,200\n\
         projects/shared/instances/vm-9,env=prod,50\n",
    );
    let output = dir.path().join("merged.csv");

    let merged = clean_and_merge(&[alpha.clone(), beta], &output).unwrap();

    // The asset exported by both projects survives once
    assert_eq!(merged.rows.len(), 3);

    assert_eq!(
        merged.columns,
        vec![
            "name",
            "labels",
            "disk_size",
            SOURCE_FILE_COLUMN,
            "project",
            "environment",
            LAST_UPDATED_COLUMN,
        ]
    );

    let name = merged.column_index("name").unwrap();
    let project = merged.column_index("project").unwrap();
    let environment = merged.column_index("environment").unwrap();
    let source = merged.column_index(SOURCE_FILE_COLUMN).unwrap();

    let shared = merged
        .rows
        .iter()
        .find(|row| row[name].contains("vm-9"))
        .unwrap();
    assert_eq!(shared[project], "shared");
    assert_eq!(shared[environment], "prod");
    // First occurrence wins, so provenance points at the first file
    assert_eq!(shared[source], alpha.to_string_lossy());

    let beta_row = merged
        .rows
        .iter()
        .find(|row| row[name].contains("vm-2"))
        .unwrap();
    assert_eq!(beta_row[project], "beta");
    assert_eq!(beta_row[environment], "dev");
}

#[test]
fn test_merged_output_is_written_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(
        &dir,
        "alpha.csv",
        "name,zone\nprojects/alpha/instances/vm-1,us-east1\n",
    );
    let output = dir.path().join("merged.csv");

    let merged = clean_and_merge(&[input], &output).unwrap();

    let written = AssetTable::read_csv(&output).unwrap();
    assert_eq!(written, merged);
}

#[test]
fn test_schema_union_fills_holes_with_empty_cells() {
    let dir = tempfile::tempdir().unwrap();
    let alpha = write_file(&dir, "alpha.csv", "name,zone\nvm-1,us-east1\n");
    let beta = write_file(&dir, "beta.csv", "name,Disk Size\nvm-2,100\n");
    let output = dir.path().join("merged.csv");

    let merged = clean_and_merge(&[alpha, beta], &output).unwrap();

    let zone = merged.column_index("zone").unwrap();
    let disk = merged.column_index("disk_size").unwrap();
    let name = merged.column_index("name").unwrap();

    let vm2 = merged.rows.iter().find(|row| row[name] == "vm-2").unwrap();
    assert_eq!(vm2[zone], "");
    assert_eq!(vm2[disk], "100");

    let vm1 = merged.rows.iter().find(|row| row[name] == "vm-1").unwrap();
    assert_eq!(vm1[zone], "us-east1");
    assert_eq!(vm1[disk], "");
}

#[test]
fn test_empty_cells_become_missing_sentinel() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(&dir, "alpha.csv", "name,owner\nvm-1,\n");
    let output = dir.path().join("merged.csv");

    let merged = clean_and_merge(&[input], &output).unwrap();

    let owner = merged.column_index("owner").unwrap();
    assert_eq!(merged.rows[0][owner], MISSING_VALUE);
}

#[test]
fn test_unparseable_file_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_file(&dir, "good.csv", "name\nvm-1\nvm-2\n");
    // Second record has the wrong field count
    let ragged = write_file(&dir, "ragged.csv", "name,zone\nvm-3,us-east1\nvm-4\n");
    let output = dir.path().join("merged.csv");

    let merged = clean_and_merge(&[good, ragged], &output).unwrap();

    assert_eq!(merged.rows.len(), 2);
    let name = merged.column_index("name").unwrap();
    assert!(merged.rows.iter().all(|row| row[name].starts_with("vm-")));
    assert!(merged.column_index("zone").is_none());
}

#[test]
fn test_missing_file_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_file(&dir, "good.csv", "name\nvm-1\n");
    let absent = dir.path().join("never-downloaded.csv");
    let output = dir.path().join("merged.csv");

    let merged = clean_and_merge(&[absent, good], &output).unwrap();
    assert_eq!(merged.rows.len(), 1);
}

#[test]
fn test_no_surviving_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let empty = write_file(&dir, "empty.csv", "");
    let ragged = write_file(&dir, "ragged.csv", "a,b\n1\n");
    let output = dir.path().join("merged.csv");

    let result = clean_and_merge(&[empty, ragged], &output);
    assert!(matches!(result, Err(SyncError::NoUsableInput)));
    assert!(!output.exists());
}
