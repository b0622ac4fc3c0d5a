//! End-to-end tests for the `aim transform` subcommand
//!
//! Transform runs entirely against local files, so these tests drive the
//! real binary without any network mocking.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_transform_merges_local_files() {
    let dir = tempfile::tempdir().unwrap();
    let alpha = dir.path().join("alpha.csv");
    let beta = dir.path().join("beta.csv");
    let output = dir.path().join("merged.csv");

    std::fs::write(&alpha, "name,zone\nprojects/alpha/assets/vm-1,us-east1\n").unwrap();
    std::fs::write(&beta, "name,Disk Size\nprojects/beta/assets/vm-2,100\n").unwrap();

    let mut cmd = Command::cargo_bin("aim").unwrap();
    cmd.arg("transform")
        .arg("--input")
        .arg(&alpha)
        .arg(&beta)
        .arg("--output")
        .arg(&output);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("2 rows"));

    let merged = std::fs::read_to_string(&output).unwrap();
    let header = merged.lines().next().unwrap();
    assert!(header.contains("disk_size"));
    assert!(header.contains("source_file"));
    assert!(header.contains("project"));
    assert!(header.contains("last_updated"));
}

#[test]
fn test_transform_fails_when_no_file_survives() {
    let dir = tempfile::tempdir().unwrap();
    let ragged = dir.path().join("ragged.csv");
    let output = dir.path().join("merged.csv");

    std::fs::write(&ragged, "a,b\n1\n").unwrap();

    let mut cmd = Command::cargo_bin("aim").unwrap();
    cmd.arg("transform")
        .arg("--input")
        .arg(&ragged)
        .arg("--output")
        .arg(&output);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("no input files survived"));
}

#[test]
fn test_transform_requires_input() {
    let mut cmd = Command::cargo_bin("aim").unwrap();
    cmd.arg("transform").arg("--output").arg("out.csv");

    cmd.assert().failure();
}
