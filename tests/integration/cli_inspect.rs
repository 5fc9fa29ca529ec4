#![allow(missing_docs)]

use std::fs;
use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::{json, Value};
use tempfile::TempDir;

fn setup_set(name: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join(format!("{name}.json"));
    let doc = json!({
        "name": "sqlset",
        "attributes": { "namespace": "ns" },
        "children": [
            {
                "name": "sql",
                "attributes": { "id": "search" },
                "children": [
                    "SELECT * FROM USERS WHERE 1=1",
                    { "name": "dynamic", "children": [" AND NAME = :name"] },
                    { "name": "dynamic", "children": [" AND AGE > :age"] }
                ]
            },
            {
                "name": "row-mapper",
                "attributes": { "id": "userRow", "class": "map" }
            }
        ]
    });
    fs::write(&path, serde_json::to_vec_pretty(&doc).expect("encode")).expect("write set");
    (dir, path)
}

#[test]
fn list_prints_ids_as_text() {
    let (_dir, path) = setup_set("list_text");
    let output = cargo_bin_cmd!("sqlset-inspect")
        .arg("list")
        .arg(&path)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).expect("utf8");
    assert!(text.contains("Statements:"));
    assert!(text.contains("  ns.search"));
    assert!(text.contains("  ns.userRow"));
}

#[test]
fn list_as_json() {
    let (_dir, path) = setup_set("list_json");
    let output = cargo_bin_cmd!("sqlset-inspect")
        .args(["--format", "json", "list"])
        .arg(&path)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(json["statements"], json!(["ns.search"]));
    assert_eq!(json["row_mappers"], json!(["ns.userRow"]));
    assert_eq!(json["resources"].as_array().map(Vec::len), Some(1));
}

#[test]
fn render_drops_fragments_without_values() {
    let (_dir, path) = setup_set("render");
    let output = cargo_bin_cmd!("sqlset-inspect")
        .args(["--format", "json", "render", "--id", "ns.search", "--params", r#"{"name":"x"}"#])
        .arg(&path)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(json["id"], "ns.search");
    assert_eq!(json["kind"], "PREPARED");
    assert_eq!(json["sql"], "SELECT * FROM USERS WHERE 1=1 AND NAME = ?");
    assert_eq!(json["values"], json!([{ "name": "name", "value": "x", "resolved": true }]));
}

#[test]
fn render_reads_extras_and_cache_key() {
    let (_dir, path) = setup_set("render_extra");
    let output = cargo_bin_cmd!("sqlset-inspect")
        .args([
            "render",
            "--id",
            "ns.search",
            "--params",
            r#"{"name":"x"}"#,
            "--extra",
            r#"{"age":30}"#,
            "--cache-key",
            "name+age",
        ])
        .arg(&path)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).expect("utf8");
    assert!(text.contains("SELECT * FROM USERS WHERE 1=1 AND NAME = ? AND AGE > ?"));
    assert!(text.contains("$2 age = 30"));
}

#[test]
fn unknown_statement_fails() {
    let (_dir, path) = setup_set("missing");
    let output = cargo_bin_cmd!("sqlset-inspect")
        .args(["render", "--id", "ns.nope"])
        .arg(&path)
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    let text = String::from_utf8(output).expect("utf8");
    assert!(text.contains("ns.nope"));
}

#[test]
fn config_file_rejects_unknown_keys() {
    let (dir, path) = setup_set("config");
    let config = dir.path().join("sqlset.toml");
    fs::write(&config, "[catalog]\ntext_cache_size = 4\n").expect("write config");
    cargo_bin_cmd!("sqlset-inspect")
        .arg("--config")
        .arg(&config)
        .arg("list")
        .arg(&path)
        .assert()
        .failure();

    fs::write(&config, "[catalog]\ntext_cache_capacity = 4\nduplicate_policy = \"reject\"\n")
        .expect("write config");
    cargo_bin_cmd!("sqlset-inspect")
        .arg("--config")
        .arg(&config)
        .arg("list")
        .arg(&path)
        .assert()
        .success();
}

#[test]
fn list_scans_directories() {
    let (dir, _path) = setup_set("scan");
    let nested = dir.path().join("sets");
    fs::create_dir_all(&nested).expect("create dir");
    let (_other, path) = setup_set("orders");
    fs::copy(&path, nested.join("orders.sqlset.json")).expect("copy set");
    let output = cargo_bin_cmd!("sqlset-inspect")
        .args(["--format", "json", "list"])
        .arg(dir.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(json["statements"], json!(["ns.search"]));
    assert_eq!(json["resources"].as_array().map(Vec::len), Some(1));
}
