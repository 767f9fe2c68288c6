use integra_core::catalog::{Catalog, ModuleCatalog};
use integra_core::module::ModuleRecord;
use tempfile::TempDir;

const CATALOG: &str = r#"
[[module]]
coordinate = "acme:app"
version = "1.0.0"
dependencies = ["acme:core@^1.0.0"]

[[module]]
coordinate = "acme:core"
version = "1.0.0"

[[module]]
coordinate = "acme:core"
version = "1.4.0"
"#;

#[test]
fn parse_groups_records_by_coordinate() {
    let catalog = ModuleCatalog::parse_toml(CATALOG).unwrap();
    assert_eq!(catalog.len(), 3);
    assert_eq!(catalog.versions("acme:core").len(), 2);
    assert_eq!(catalog.versions("acme:core")[1].version, "1.4.0");
    assert_eq!(catalog.coordinates().collect::<Vec<_>>(), ["acme:app", "acme:core"]);
}

#[test]
fn unknown_coordinate_has_no_versions() {
    let catalog = ModuleCatalog::parse_toml(CATALOG).unwrap();
    assert!(catalog.versions("acme:missing").is_empty());
    assert!(!catalog.contains("acme:missing"));
}

#[test]
fn empty_catalog_parses() {
    let catalog = ModuleCatalog::parse_toml("").unwrap();
    assert!(catalog.is_empty());
    assert_eq!(catalog.len(), 0);
}

#[test]
fn malformed_catalog_is_a_catalog_error() {
    let err = ModuleCatalog::parse_toml("[[module]]\ncoordinate = 3\n").unwrap_err();
    assert!(err.to_string().contains("Catalog error"), "got: {err}");
}

#[test]
fn serialize_then_parse_keeps_records() {
    let catalog = ModuleCatalog::from_records([
        ModuleRecord::new("acme:app", "2.0.0").with_dependency("acme:core", Some(">=1.0.0")),
        ModuleRecord::new("acme:core", "1.0.0"),
    ]);
    let text = catalog.to_string_pretty().unwrap();
    let reparsed = ModuleCatalog::parse_toml(&text).unwrap();
    assert_eq!(reparsed.versions("acme:app"), catalog.versions("acme:app"));
    assert_eq!(reparsed.len(), 2);
}

#[test]
fn from_path_reads_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("integra-catalog.toml");
    std::fs::write(&path, CATALOG).unwrap();
    let catalog = ModuleCatalog::from_path(&path).unwrap();
    assert_eq!(catalog.versions("acme:app").len(), 1);
}

#[test]
fn from_path_missing_file_fails() {
    let tmp = TempDir::new().unwrap();
    assert!(ModuleCatalog::from_path(&tmp.path().join("nope.toml")).is_err());
}
