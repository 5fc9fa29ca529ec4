#![allow(missing_docs)]

use std::fs;
use std::path::Path;

use serde_json::json;
use sqlset::{Catalog, CatalogOptions, SqlsetError};
use tempfile::TempDir;

fn write_set(path: &Path, namespace: &str, id: &str) {
    let doc = json!({
        "name": "sqlset",
        "attributes": { "namespace": namespace },
        "children": [
            { "name": "sql", "attributes": { "id": id }, "children": ["SELECT 1"] }
        ]
    });
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(path, serde_json::to_vec(&doc).expect("encode")).expect("write set");
}

fn setup_tree() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    write_set(&dir.path().join("users.sqlset.json"), "users", "findById");
    write_set(&dir.path().join("billing/invoices.sqlset.json"), "billing", "open");
    write_set(&dir.path().join("billing/legacy.json"), "legacy", "old");
    fs::write(dir.path().join("notes.txt"), "not a statement set").expect("write notes");
    fs::write(dir.path().join("broken.sqlset.json"), "{ not json").expect("write broken");
    dir
}

#[test]
fn scan_loads_matching_files_only() {
    let dir = setup_tree();
    let catalog = Catalog::default();
    let reports = catalog.load_directory(dir.path()).unwrap();
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| !r.already_loaded && r.statements == 1));
    assert_eq!(catalog.statement_ids(), ["billing.open", "users.findById"]);
    assert!(!catalog.has_statement("legacy", "old"));
    assert_eq!(catalog.loaded_resources().len(), 2);
}

#[test]
fn repeated_scan_is_a_no_op() {
    let dir = setup_tree();
    let catalog = Catalog::default();
    catalog.load_directory(dir.path()).unwrap();
    let before = catalog.statement("users", "findById").unwrap();

    let again = catalog.load_directory(dir.path()).unwrap();
    assert_eq!(again.len(), 2);
    assert!(again.iter().all(|r| r.already_loaded && r.statements == 0));
    let after = catalog.statement("users", "findById").unwrap();
    assert!(std::sync::Arc::ptr_eq(&before, &after));
    assert_eq!(catalog.statement_ids(), ["billing.open", "users.findById"]);
}

#[test]
fn prefix_and_suffix_come_from_options() {
    let dir = setup_tree();
    let catalog = Catalog::new(CatalogOptions::default().with_definition_prefix("inv"));
    catalog.load_directory(dir.path()).unwrap();
    assert_eq!(catalog.statement_ids(), ["billing.open"]);

    let catalog = Catalog::new(CatalogOptions::default().with_definition_suffix("legacy.json"));
    catalog.load_directory(dir.path()).unwrap();
    assert_eq!(catalog.statement_ids(), ["legacy.old"]);
}

#[test]
fn sealed_catalog_rescans_but_refuses_new_files() {
    let dir = setup_tree();
    let catalog = Catalog::default();
    catalog.load_directory(dir.path()).unwrap();
    catalog.seal();
    assert!(catalog.load_directory(dir.path()).unwrap().iter().all(|r| r.already_loaded));

    write_set(&dir.path().join("late.sqlset.json"), "late", "q");
    assert!(matches!(
        catalog.load_directory(dir.path()),
        Err(SqlsetError::Sealed(_))
    ));
    assert!(!catalog.has_statement("late", "q"));
}

#[test]
fn missing_directory_is_an_error() {
    let dir = TempDir::new().expect("tempdir");
    let err = Catalog::default()
        .load_directory(dir.path().join("absent"))
        .unwrap_err();
    assert!(matches!(err, SqlsetError::Io(_)));
}
