use std::io::Write;

use assert_cmd::Command;
use predicates::str::contains;

#[test]
fn convert_seals_schema_for_openai_strict() {
    let mut schema_file = tempfile::NamedTempFile::new().unwrap();
    write!(
        schema_file,
        r#"{{"type": "object", "properties": {{"a": {{"type": "string"}}}}, "required": ["a"]}}"#
    )
    .unwrap();

    Command::cargo_bin("jsonschema-llm")
        .unwrap()
        .args([
            "convert",
            schema_file.path().to_str().unwrap(),
            "--target",
            "openai-strict",
        ])
        .assert()
        .success()
        .stdout(contains("\"additionalProperties\": false"));
}

#[test]
fn convert_rejects_invalid_json() {
    let mut schema_file = tempfile::NamedTempFile::new().unwrap();
    write!(schema_file, "not json").unwrap();

    Command::cargo_bin("jsonschema-llm")
        .unwrap()
        .args([
            "convert",
            schema_file.path().to_str().unwrap(),
            "--target",
            "openai-strict",
        ])
        .assert()
        .failure();
}

#[test]
fn list_components_reports_defs() {
    let mut schema_file = tempfile::NamedTempFile::new().unwrap();
    write!(schema_file, r#"{{"$defs": {{"Foo": {{"type": "string"}}}}}}"#).unwrap();

    Command::cargo_bin("jsonschema-llm")
        .unwrap()
        .args(["list-components", schema_file.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("#/$defs/Foo"));
}
