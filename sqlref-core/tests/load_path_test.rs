//! Loading documents from disk

mod common;

use common::{init_test_logging, JOINS_DOCUMENT};
use sqlref_core::{Catalog, CatalogError};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_load_path_reads_document() {
    init_test_logging();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("joins.md");
    fs::write(&path, JOINS_DOCUMENT).unwrap();

    let catalog = Catalog::load_path(&path).unwrap();
    assert_eq!(catalog.list_topics(), vec!["Joins"]);
    assert_eq!(catalog.source_name(), path.display().to_string());
}

#[test]
fn test_load_path_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("absent.md");

    match Catalog::load_path(&path) {
        Err(CatalogError::Read { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected Read error, got {other:?}"),
    }
}

#[test]
fn test_load_path_empty_file() {
    init_test_logging();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("empty.md");
    fs::write(&path, "").unwrap();

    match Catalog::load_path(&path) {
        Err(CatalogError::EmptyDocument { source_name }) => {
            assert!(source_name.ends_with("empty.md"));
        }
        other => panic!("expected EmptyDocument, got {other:?}"),
    }
}
