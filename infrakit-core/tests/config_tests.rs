//! Config loading error-message and required-section integration tests.

use assert_fs::prelude::*;
use infrakit_core::{config, ConfigError};
use predicates::prelude::predicate;
use rstest::rstest;

const SECTIONS: [(&str, &str); 4] = [
    ("redis", "redis:\n  url: redis://localhost:6379/0\n"),
    (
        "postgresql",
        "postgresql:\n  url: postgres://infrakit@localhost/infrakit\n",
    ),
    (
        "argocd",
        "argocd:\n  apiUrl: https://argocd.example.com\n  username: admin\n  password: pw\n  namespace: argocd\n",
    ),
    ("go_service", "go_service:\n  path: /opt/infrakit/go-service\n"),
];

fn document_without(skip: Option<&str>) -> String {
    SECTIONS
        .iter()
        .filter(|(name, _)| Some(*name) != skip)
        .map(|(_, body)| *body)
        .collect()
}

// ---------------------------------------------------------------------------
// 1. Required sections
// ---------------------------------------------------------------------------

#[rstest]
#[case("redis")]
#[case("postgresql")]
#[case("argocd")]
#[case("go_service")]
fn missing_required_section_is_named(#[case] section: &'static str) {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("config.yaml");
    file.write_str(&document_without(Some(section))).expect("write");

    let err = config::load_at(file.path()).unwrap_err();
    assert!(
        matches!(err, ConfigError::MissingSection(name) if name == section),
        "got: {err}"
    );
    assert!(err.to_string().contains(section));
}

#[test]
fn complete_document_loads() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("config.yaml");
    file.write_str(&document_without(None)).expect("write");
    file.assert(predicate::str::contains("apiUrl"));

    let config = config::load_at(file.path()).expect("load");
    assert_eq!(config.redis.url, "redis://localhost:6379/0");
    assert_eq!(config.argocd.namespace, "argocd");
    assert!(config.argocd.clusters.is_empty());
}

// ---------------------------------------------------------------------------
// 2. File-level errors
// ---------------------------------------------------------------------------

#[test]
fn missing_file_returns_not_found_with_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let path = dir.path().join("absent.yaml");
    let err = config::load_at(&path).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("absent.yaml"));
}

#[test]
fn corrupt_yaml_returns_parse_error_with_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("config.yaml");
    file.write_str(": : corrupt : yaml : !!!\n  - broken: [unclosed")
        .expect("write");

    let err = config::load_at(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("config.yaml"));
}

#[test]
fn section_missing_a_field_is_a_parse_error() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("config.yaml");
    let yaml = document_without(Some("argocd"))
        + "argocd:\n  apiUrl: https://argocd.example.com\n  username: admin\n";
    file.write_str(&yaml).expect("write");

    let err = config::load_at(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
}
