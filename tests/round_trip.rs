use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;

use treeboard::io::interchange::{self, InterchangeError};
use treeboard::model::{AppData, ColumnId, ProjectStatus, Theme};
use treeboard::ops::tree;

fn load_fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Could not read fixture {}: {}", name, e))
}

#[test]
fn fixture_parses_and_validates() {
    let data = interchange::parse(&load_fixture("grouping.toml")).unwrap();
    interchange::validate(&data).unwrap();

    assert_eq!(data.theme, Theme::Dark);
    assert_eq!(data.projects.len(), 2);
    let release = &data.projects[0];
    assert_eq!(release.status, Some(ProjectStatus::Active));
    assert_eq!(release.columns.backlog.len(), 2);
    assert_eq!(release.columns.backlog[0].children.len(), 2);
    assert_eq!(tree::count_leaves(release.columns.get(ColumnId::InProgress)), 3);
    assert!(data.projects[1].columns.is_empty());
}

#[test]
fn export_parse_round_trip() {
    let original = interchange::parse(&load_fixture("grouping.toml")).unwrap();
    let text = interchange::export(&original).unwrap();
    let reparsed = interchange::parse(&text).unwrap();
    assert_eq!(reparsed, original);

    // and once more, the rendering is stable
    assert_eq!(interchange::export(&reparsed).unwrap(), text);
}

#[test]
fn json_store_format_round_trip() {
    let original = interchange::parse(&load_fixture("grouping.toml")).unwrap();
    let json = serde_json::to_string_pretty(&original).unwrap();
    assert!(json.contains("\"activeProjectId\": \"p-001\""));
    assert!(json.contains("\"in-progress\""));
    let back: AppData = serde_json::from_str(&json).unwrap();
    assert_eq!(back, original);
}

#[test]
fn apply_rejects_fixture_with_duplicate_id() {
    let current = interchange::parse(&load_fixture("grouping.toml")).unwrap();
    let broken = load_fixture("grouping.toml").replace("id = \"c3\"", "id = \"b1\"");
    let err = interchange::apply(&current, &broken).unwrap_err();
    match err {
        InterchangeError::DuplicateTask { project, task } => {
            assert_eq!(project, "p-001");
            assert_eq!(task, "b1");
        }
        other => panic!("unexpected error: {}", other),
    }
}
