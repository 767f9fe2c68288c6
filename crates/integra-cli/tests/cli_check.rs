use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[allow(deprecated)]
fn integra_cmd() -> Command {
    Command::cargo_bin("integra").unwrap()
}

#[test]
fn test_check_clean_catalog() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("integra-catalog.toml"),
        r#"
[[module]]
coordinate = "acme:a"
version = "1.0.0"
dependencies = [{ coordinate = "acme:b", constraint = "~1.2.0" }]

[[module]]
coordinate = "acme:b"
version = "1.2.3"
"#,
    )
    .unwrap();

    integra_cmd()
        .current_dir(tmp.path())
        .args(["check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Checking 2 module version(s)"))
        .stdout(predicate::str::contains("No problems found."));
}

#[test]
fn test_check_lists_problems() {
    let tmp = TempDir::new().unwrap();
    let catalog = tmp.path().join("cat.toml");
    fs::write(
        &catalog,
        r#"
[[module]]
coordinate = "acme:a"
version = "1.0.0"
dependencies = ["acme:ghost", "acme:a@^x"]

[[module]]
coordinate = "acme:a"
version = "1.0.0"
"#,
    )
    .unwrap();

    integra_cmd()
        .current_dir(tmp.path())
        .args(["check", "--catalog"])
        .arg(&catalog)
        .assert()
        .failure()
        .stdout(predicate::str::contains(
            "acme:a@1.0.0: depends on acme:ghost which is not in the catalog",
        ))
        .stdout(predicate::str::contains("Malformed version range '^x'"))
        .stdout(predicate::str::contains("duplicate entry for this version"))
        .stderr(predicate::str::contains("3 problem(s) found"));
}

#[test]
fn test_check_invalid_toml() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("integra-catalog.toml"), "[[module]\n").unwrap();

    integra_cmd()
        .current_dir(tmp.path())
        .args(["check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse catalog"));
}
