use chrono::NaiveDate;
use mdjournal_core::ops::{tag_recent_entries, RECENT_TAG};
use tempfile::tempdir;

fn after() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 8, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

#[test]
fn recent_headings_gain_the_tag_token() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    std::fs::write(
        root.join("log.md"),
        "### 2024-08-18 xwork\nfresh\n\n### 2024-01-01\nold\n",
    )
    .unwrap();

    let modified = tag_recent_entries(root, after(), RECENT_TAG).unwrap();
    assert_eq!(modified, vec!["log.md".to_string()]);

    let rewritten = std::fs::read_to_string(root.join("log.md")).unwrap();
    assert!(rewritten.contains("### 2024-08-18 xwork xrecent"));
    // Entries outside the window keep their heading untouched.
    assert!(rewritten.contains("### 2024-01-01\n"));
}

#[test]
fn repeated_runs_are_idempotent() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    std::fs::write(root.join("log.md"), "### 2024-08-18\nfresh\n").unwrap();

    tag_recent_entries(root, after(), RECENT_TAG).unwrap();
    let first = std::fs::read_to_string(root.join("log.md")).unwrap();
    assert_eq!(first.matches("xrecent").count(), 1);

    let second_run = tag_recent_entries(root, after(), RECENT_TAG).unwrap();
    assert!(second_run.is_empty());
    assert_eq!(std::fs::read_to_string(root.join("log.md")).unwrap(), first);
}

#[test]
fn untouched_files_are_not_rewritten() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    std::fs::write(root.join("old.md"), "### 2024-01-01\nold only\n").unwrap();
    std::fs::write(root.join("new.md"), "### 2024-08-18\nfresh\n").unwrap();

    let modified = tag_recent_entries(root, after(), RECENT_TAG).unwrap();
    assert_eq!(modified, vec!["new.md".to_string()]);
    assert_eq!(
        std::fs::read_to_string(root.join("old.md")).unwrap(),
        "### 2024-01-01\nold only\n"
    );
}

#[test]
fn custom_recent_tag_is_honored() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    std::fs::write(root.join("log.md"), "### 2024-08-18\nfresh\n").unwrap();

    tag_recent_entries(root, after(), "week34").unwrap();
    let rewritten = std::fs::read_to_string(root.join("log.md")).unwrap();
    assert!(rewritten.contains("### 2024-08-18 xweek34"));
}
