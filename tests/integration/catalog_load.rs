#![allow(missing_docs)]

use std::fs;
use std::sync::Arc;

use serde_json::json;
use sqlset::{
    params, Catalog, CatalogOptions, DuplicatePolicy, Element, JsonDefinitionSource, SqlsetError,
    StatementKind, Value,
};
use tempfile::TempDir;

fn users_document() -> serde_json::Value {
    json!({
        "name": "sqlset",
        "attributes": { "name": "users-set", "namespace": "ns", "version": "1" },
        "children": [
            {
                "name": "sql-query",
                "attributes": { "id": "findById", "fetchSize": "10", "statementType": "PLAIN" },
                "children": [
                    { "name": "parameter-mappings", "children": [
                        { "name": "parameter", "attributes": { "name": "id", "mode": "IN", "javaType": "long" } }
                    ]},
                    "SELECT * FROM USERS WHERE ID = ?"
                ]
            },
            {
                "name": "sql",
                "attributes": { "name": "search" },
                "children": [
                    "SELECT * FROM USERS WHERE 1=1",
                    { "name": "dynamic", "children": [" AND NAME = :name"] },
                    { "name": "dynamic", "children": [" AND AGE > #{age}"] }
                ]
            },
            {
                "name": "row-mapper",
                "attributes": { "id": "ghost", "class": "com.acme.Ghost" }
            },
            {
                "name": "row-mapper",
                "attributes": { "id": "userRow", "class": "java.util.Map" },
                "children": [
                    { "name": "parameterMapping", "attributes": { "name": "enabled", "column": "ENABLED", "javaType": "boolean" } }
                ]
            },
            {
                "name": "sql-query",
                "attributes": { "id": "afterBadMapper" },
                "children": ["SELECT 1"]
            }
        ]
    })
}

fn write_document(dir: &TempDir, file: &str, doc: &serde_json::Value) -> std::path::PathBuf {
    let path = dir.path().join(file);
    fs::write(&path, serde_json::to_vec_pretty(doc).unwrap()).unwrap();
    path
}

#[test]
fn loading_same_resource_twice_registers_once() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_document(&dir, "a.def", &users_document());
    let catalog = Catalog::default();

    let source = JsonDefinitionSource::open(&path).with_resource_id("a.def");
    let first = catalog.load_source(&source).unwrap();
    assert_eq!(first.namespace.as_deref(), Some("ns"));
    assert_eq!(first.statements, 3);
    let ids_after_first = catalog.statement_ids();
    let stmt = catalog.statement("ns", "findById").unwrap();

    let second = catalog.load_source(&source).unwrap();
    assert!(second.already_loaded);
    assert_eq!(catalog.statement_ids(), ids_after_first);
    assert!(Arc::ptr_eq(&stmt, &catalog.statement("ns", "findById").unwrap()));
    assert_eq!(catalog.loaded_resources(), ["a.def"]);
}

#[test]
fn unresolvable_row_mapper_target_does_not_stop_the_resource() {
    let root: Element = serde_json::from_value(users_document()).unwrap();
    let catalog = Catalog::default();
    let report = catalog.load("users", &root).unwrap();
    assert_eq!(report.row_mappers, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(catalog.row_mapper_ids(), ["ns.userRow"]);
    assert!(catalog.has_statement("ns", "afterBadMapper"));
    assert!(matches!(
        catalog.row_mapper("ns", "ghost"),
        Err(SqlsetError::RowMapperNotFound(_))
    ));
}

#[test]
fn loaded_statements_render_with_their_metadata() {
    let root: Element = serde_json::from_value(users_document()).unwrap();
    let catalog = Catalog::new(CatalogOptions::default().with_default_statement_timeout(30));
    catalog.load("users", &root).unwrap();

    let find = catalog.statement_by_qualified("ns.findById").unwrap();
    assert_eq!(find.fetch_size(), 10);
    assert_eq!(find.timeout(), 30);
    assert_eq!(find.kind(), StatementKind::Prepared);
    assert_eq!(find.declared_kind(), Some(StatementKind::Plain));
    let rendered = find.render(&params! { "id" => 5i64 }).unwrap();
    assert_eq!(rendered.sql(), "SELECT * FROM USERS WHERE ID = ?");
    assert_eq!(rendered.value_list(), vec![Value::Int(5)]);

    let search = catalog.statement("ns", "search").unwrap();
    let rendered = search.render(&params! { "age" => 30i64 }).unwrap();
    assert_eq!(rendered.sql(), "SELECT * FROM USERS WHERE 1=1 AND AGE > ?");
    assert_eq!(rendered.value_list(), vec![Value::Int(30)]);
}

#[test]
fn reject_policy_keeps_first_definition() {
    let dir = TempDir::new().expect("tempdir");
    let a = write_document(&dir, "a.json", &users_document());
    let b = write_document(&dir, "b.json", &users_document());
    let catalog = Catalog::new(CatalogOptions::default().with_duplicate_policy(DuplicatePolicy::Reject));
    catalog.load_source(&JsonDefinitionSource::open(&a)).unwrap();
    let report = catalog.load_source(&JsonDefinitionSource::open(&b)).unwrap();
    assert_eq!(report.statements, 0);
    let stmt = catalog.statement("ns", "search").unwrap();
    assert_eq!(stmt.resource(), a.display().to_string());
}

#[test]
fn malformed_document_reports_io_or_json_errors() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ not json").unwrap();
    let catalog = Catalog::default();
    assert!(matches!(
        catalog.load_source(&JsonDefinitionSource::open(&path)),
        Err(SqlsetError::Json(_))
    ));
    assert!(matches!(
        catalog.load_source(&JsonDefinitionSource::open(dir.path().join("missing.json"))),
        Err(SqlsetError::Io(_))
    ));
    assert!(catalog.loaded_resources().is_empty());
}
