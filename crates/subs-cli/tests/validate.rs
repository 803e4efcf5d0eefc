use std::fs;

use subs_cli::validation::validate_file;
use subs_model::GroupScope;
use tempfile::tempdir;

const VALID: &str = r#"{
    "id": 12,
    "name": "Tidy",
    "version": 4,
    "globalGroups": [
        { "key": 0, "name": "Skip", "rules": [{ "matches": ["[text=Skip]"] }] }
    ],
    "apps": [
        {
            "id": "com.example.app",
            "groups": [
                {
                    "key": 1,
                    "name": "Popup",
                    "rules": [
                        { "key": 0, "matches": ["[id=open]"] },
                        { "key": 1, "preKeys": [0], "matches": ["[id=close]"] }
                    ]
                }
            ]
        }
    ]
}"#;

const BROKEN_GROUPS: &str = r#"{
    "id": -1,
    "name": "Local",
    "version": 1,
    "globalGroups": [
        { "key": 0, "name": "First", "rules": [{ "matches": ["[text=A]"] }] },
        { "key": 0, "name": "Again", "rules": [{ "matches": ["[text=B]"] }] }
    ],
    "apps": [
        {
            "id": "com.example.app",
            "groups": [
                { "key": 3, "name": "Dangling", "categoryKey": 9, "rules": [{ "matches": ["[id=x]"] }] }
            ]
        }
    ]
}"#;

#[test]
fn valid_file_reports_counts() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tidy.json");
    fs::write(&path, VALID).unwrap();

    let report = validate_file(&path).unwrap();

    assert!(report.is_valid());
    assert_eq!(report.id, 12);
    assert_eq!(report.version, 4);
    assert_eq!(report.groups, 2);
    assert_eq!(report.rules, 3);
}

#[test]
fn invalid_groups_are_listed_with_scope() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("local.json");
    fs::write(&path, BROKEN_GROUPS).unwrap();

    let report = validate_file(&path).unwrap();

    assert!(!report.is_valid());
    assert_eq!(report.issues.len(), 2);
    assert_eq!(report.issues[0].scope, GroupScope::Global);
    assert_eq!(report.issues[0].name, "Again");
    assert_eq!(
        report.issues[1].scope,
        GroupScope::App("com.example.app".to_string())
    );
    assert!(report.issues[1].problem.contains("category"));
}

#[test]
fn malformed_file_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, "{ \"id\": \"twelve\" }").unwrap();

    let error = validate_file(&path).unwrap_err();
    assert!(format!("{error:#}").contains("bad.json"));
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempdir().unwrap();
    assert!(validate_file(&dir.path().join("absent.json")).is_err());
}
