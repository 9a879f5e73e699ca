use super::{date, fixtures};
use crate::error::ScrapeError;
use crate::partition::DateRange;
use crate::writer::{HeaderPolicy, IncrementalTextWriter, OutputKey, WriteOutcome};
use std::fs;
use tempfile::TempDir;

fn numbered_block(prefix: &str, count: usize) -> String {
    (1..=count)
        .map(|n| format!("{}{}", prefix, n))
        .collect::<Vec<_>>()
        .join("\n")
}

fn key(name: &str) -> OutputKey {
    OutputKey::new(
        name,
        DateRange::new(date(2002, 1, 1), date(2022, 12, 31)).unwrap(),
    )
}

#[test]
fn test_file_name_uses_overall_range() {
    assert_eq!(key("サンプルダム").file_name(), "サンプルダム20020101-20221231.txt");
}

#[test]
fn test_file_name_is_sanitized() {
    assert_eq!(key("A/B: dam").file_name(), "A_B_ dam20020101-20221231.txt");
}

#[test]
fn test_first_write_is_verbatim() {
    let dir = TempDir::new().unwrap();
    let mut writer = IncrementalTextWriter::new(dir.path(), HeaderPolicy::default());
    let block = numbered_block("L", 12);

    let outcome = writer.append(&key("dam"), &block, false).unwrap();

    let path = dir.path().join("dam20020101-20221231.txt");
    assert_eq!(outcome, WriteOutcome::Created { path: path.clone() });
    assert_eq!(fs::read_to_string(&path).unwrap(), format!("{}\n", block));
}

#[test]
fn test_second_write_strips_header() {
    let dir = TempDir::new().unwrap();
    let mut writer = IncrementalTextWriter::new(dir.path(), HeaderPolicy::default());
    let block = numbered_block("L", 12);

    writer.append(&key("dam"), &block, false).unwrap();
    let outcome = writer.append(&key("dam"), &block, false).unwrap();

    assert!(matches!(outcome, WriteOutcome::Appended { lines: 3, .. }));
    let content = fs::read_to_string(outcome.path()).unwrap();
    assert_eq!(content, format!("{}\nL10\nL11\nL12\n", block));
}

#[test]
fn test_fixture_months_append_data_rows_only() {
    let dir = TempDir::new().unwrap();
    let mut writer = IncrementalTextWriter::new(dir.path(), HeaderPolicy::default());
    let january = fixtures::load_response_fixture("dam_2002_01");
    let february = fixtures::load_response_fixture("dam_2002_02");

    writer.append(&key("サンプルダム"), &january, false).unwrap();
    let outcome = writer.append(&key("サンプルダム"), &february, false).unwrap();

    let content = fs::read_to_string(outcome.path()).unwrap();
    assert_eq!(content.matches("観測所名").count(), 1);
    assert_eq!(content.lines().count(), 9 + 3 + 2);
    assert!(content.ends_with("2002/02/01,02:00,2.5,15110,2.05,1.20,79.6\n"));
}

#[test]
fn test_header_mismatch_fails_and_leaves_file_alone() {
    let dir = TempDir::new().unwrap();
    let mut writer = IncrementalTextWriter::new(dir.path(), HeaderPolicy::default());
    let january = fixtures::load_response_fixture("dam_2002_01");
    let changed = fixtures::load_response_fixture("dam_2002_03_changed_header");

    let created = writer.append(&key("サンプルダム"), &january, false).unwrap();
    let before = fs::read_to_string(created.path()).unwrap();

    let result = writer.append(&key("サンプルダム"), &changed, false);
    match result {
        Err(ScrapeError::HeaderMismatch { reason, .. }) => {
            assert!(reason.contains("line 9"), "unexpected reason: {}", reason)
        }
        other => panic!("expected HeaderMismatch, got {:?}", other),
    }
    assert_eq!(fs::read_to_string(created.path()).unwrap(), before);
}

#[test]
fn test_short_block_is_a_mismatch() {
    let dir = TempDir::new().unwrap();
    let mut writer = IncrementalTextWriter::new(dir.path(), HeaderPolicy::default());
    let january = fixtures::load_response_fixture("dam_2002_01");
    let empty_month = fixtures::load_failure_response("empty_month").unwrap();

    writer.append(&key("サンプルダム"), &january, false).unwrap();
    let result = writer.append(&key("サンプルダム"), &empty_month, false);

    assert!(matches!(result, Err(ScrapeError::HeaderMismatch { .. })));
}

#[test]
fn test_mismatch_is_tolerated_without_validation() {
    let dir = TempDir::new().unwrap();
    let policy = HeaderPolicy {
        lines: 9,
        validate: false,
    };
    let mut writer = IncrementalTextWriter::new(dir.path(), policy);
    let january = fixtures::load_response_fixture("dam_2002_01");
    let changed = fixtures::load_response_fixture("dam_2002_03_changed_header");

    writer.append(&key("サンプルダム"), &january, false).unwrap();
    let outcome = writer.append(&key("サンプルダム"), &changed, false).unwrap();

    assert!(matches!(outcome, WriteOutcome::Appended { lines: 1, .. }));
    let content = fs::read_to_string(outcome.path()).unwrap();
    assert!(content.ends_with("2002/03/01,01:00,0.0,15000,1.00,1.00,79.0,\n"));
}

#[test]
fn test_header_is_read_back_from_existing_file() {
    let dir = TempDir::new().unwrap();
    let block = numbered_block("L", 12);
    IncrementalTextWriter::new(dir.path(), HeaderPolicy::default())
        .append(&key("dam"), &block, false)
        .unwrap();

    // A fresh writer, as after a restart
    let mut writer = IncrementalTextWriter::new(dir.path(), HeaderPolicy::default());
    writer.append(&key("dam"), &block, false).unwrap();
    let result = writer.append(&key("dam"), &numbered_block("X", 12), false);

    assert!(matches!(result, Err(ScrapeError::HeaderMismatch { .. })));
    let content = fs::read_to_string(dir.path().join("dam20020101-20221231.txt")).unwrap();
    assert_eq!(content, format!("{}\nL10\nL11\nL12\n", block));
}

#[test]
fn test_custom_header_size() {
    let dir = TempDir::new().unwrap();
    let policy = HeaderPolicy {
        lines: 2,
        validate: true,
    };
    let mut writer = IncrementalTextWriter::new(dir.path(), policy);

    writer.append(&key("dam"), "H1\nH2\na\nb", false).unwrap();
    let outcome = writer.append(&key("dam"), "H1\nH2\nc", false).unwrap();

    let content = fs::read_to_string(outcome.path()).unwrap();
    assert_eq!(content, "H1\nH2\na\nb\nc\n");
}

#[test]
fn test_header_only_block_appends_blank_line() {
    let dir = TempDir::new().unwrap();
    let policy = HeaderPolicy {
        lines: 2,
        validate: true,
    };
    let mut writer = IncrementalTextWriter::new(dir.path(), policy);

    writer.append(&key("dam"), "H1\nH2\na", false).unwrap();
    let outcome = writer.append(&key("dam"), "H1\nH2", false).unwrap();

    assert!(matches!(outcome, WriteOutcome::Appended { lines: 0, .. }));
    let content = fs::read_to_string(outcome.path()).unwrap();
    assert_eq!(content, "H1\nH2\na\n\n");
}

#[test]
fn test_missing_directory_is_a_storage_error() {
    let dir = TempDir::new().unwrap();
    let mut writer =
        IncrementalTextWriter::new(dir.path().join("does/not/exist"), HeaderPolicy::default());

    let result = writer.append(&key("dam"), "block", false);
    assert!(matches!(result, Err(ScrapeError::Storage { .. })));
}

#[test]
fn test_first_write_replaces_stale_file() {
    let dir = TempDir::new().unwrap();
    let mut writer = IncrementalTextWriter::new(dir.path(), HeaderPolicy::default());
    let stale = numbered_block("L", 12);
    writer.append(&key("dam"), &stale, false).unwrap();
    writer.append(&key("dam"), &stale, false).unwrap();

    let fresh = numbered_block("L", 10);
    let outcome = writer.append(&key("dam"), &fresh, true).unwrap();

    assert!(matches!(outcome, WriteOutcome::Created { .. }));
    assert_eq!(
        fs::read_to_string(outcome.path()).unwrap(),
        format!("{}\n", fresh)
    );

    // The replaced file's header is the one later blocks are checked against
    let outcome = writer.append(&key("dam"), &fresh, false).unwrap();
    assert!(matches!(outcome, WriteOutcome::Appended { lines: 1, .. }));
}
