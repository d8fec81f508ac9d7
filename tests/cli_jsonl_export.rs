//! End-to-end CLI coverage using `assert_cmd`/`predicates` to drive the
//! built binary directly.
#![allow(deprecated)] // suppress assert_cmd::Command::cargo_bin deprecation in tests

use std::io::Write;

use predicates::prelude::*;

fn write_fixture() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"{{"ts":0,"cap":0,"spec":{{"kind":"UserMessage","Text":"ot2 begin span 1 work"}}}}"#
    )
    .unwrap();
    writeln!(
        file,
        r#"{{"ts":10,"cap":0,"spec":{{"kind":"UserMessage","Text":"ot2 end span 1"}}}}"#
    )
    .unwrap();
    file
}

#[test]
fn test_jsonl_export_writes_one_span_record() {
    let input = write_fixture();
    let out = tempfile::NamedTempFile::new().unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("eventlog-otel");
    cmd.arg(input.path())
        .arg("--export")
        .arg("jsonl")
        .arg("--export-path")
        .arg(out.path())
        .assert()
        .success();

    let contents = std::fs::read_to_string(out.path()).unwrap();
    assert!(contents.contains("\"operation\":\"work\""));
}

#[test]
fn test_jsonl_export_without_path_fails() {
    let input = write_fixture();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("eventlog-otel");
    cmd.arg(input.path())
        .arg("--export")
        .arg("jsonl")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--export-path"));
}

#[test]
fn test_tracing_export_is_the_default() {
    let input = write_fixture();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("eventlog-otel");
    cmd.arg(input.path()).assert().success();
}
