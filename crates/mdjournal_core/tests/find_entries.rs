use chrono::NaiveDate;
use mdjournal_core::ops::{find_entries, FindOptions};
use std::path::PathBuf;
use tempfile::tempdir;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 8, 20).unwrap()
}

fn options(terms: &[&str]) -> FindOptions {
    FindOptions {
        search: terms.iter().map(|t| t.to_string()).collect(),
        ignore_older_than_months: 3,
        out: None,
    }
}

fn setup_journal(root: &std::path::Path) {
    std::fs::create_dir_all(root.join("journal")).unwrap();
    std::fs::write(
        root.join("journal/2024-Q3.md"),
        "### 2024-08-18 xwork\nrefactor parser module\n\n### 2024-08-10 xinbox\nrenew passport, maybe\n",
    )
    .unwrap();
}

#[test]
fn every_term_must_prefix_match_a_word() {
    let dir = tempdir().unwrap();
    setup_journal(dir.path());

    let report = find_entries(dir.path(), today(), &options(&["refact", "pars"])).unwrap();
    assert_eq!(report.entries_scanned, 2);
    assert_eq!(report.matches.len(), 1);
    assert_eq!(report.matches[0].path, "journal/2024-Q3.md");
    assert_eq!(report.matches[0].position, 1);
    assert_eq!(
        report.matches[0].location.as_deref(),
        Some("/journal/2024-Q3.md#L1")
    );

    // Punctuation never blocks a match.
    let report = find_entries(dir.path(), today(), &options(&["passport", "maybe"])).unwrap();
    assert_eq!(report.matches.len(), 1);
    assert_eq!(report.matches[0].position, 4);

    // One stray term is enough to reject an entry.
    let report = find_entries(dir.path(), today(), &options(&["renew", "parser"])).unwrap();
    assert!(report.matches.is_empty());
}

#[test]
fn tags_seen_are_ordered_newest_first() {
    let dir = tempdir().unwrap();
    setup_journal(dir.path());

    let report = find_entries(dir.path(), today(), &options(&["zzz-no-match"])).unwrap();
    assert_eq!(
        report.tags_seen,
        vec![("work".to_string(), 1), ("inbox".to_string(), 1)]
    );
}

#[test]
fn old_entries_fall_out_of_the_search_window() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("journal")).unwrap();
    std::fs::write(
        root.join("journal/2023-Q1.md"),
        "### 2023-01-05 xwork\nancient refactor\n",
    )
    .unwrap();

    let report = find_entries(root, today(), &options(&["refactor"])).unwrap();
    assert_eq!(report.entries_scanned, 0);
    assert!(report.matches.is_empty());

    let mut unwindowed = options(&["refactor"]);
    unwindowed.ignore_older_than_months = 0;
    let report = find_entries(root, today(), &unwindowed).unwrap();
    assert_eq!(report.matches.len(), 1);
}

#[test]
fn out_file_collects_matches_with_backlinks() {
    let dir = tempdir().unwrap();
    setup_journal(dir.path());

    let mut opts = options(&["refactor"]);
    opts.out = Some(PathBuf::from("found.md"));
    let report = find_entries(dir.path(), today(), &opts).unwrap();
    assert_eq!(report.out_file.as_deref(), Some("found.md"));

    let written = std::fs::read_to_string(dir.path().join("found.md")).unwrap();
    assert!(written.contains("refactor parser module"));
    assert!(written.contains("[source: /journal/2024-Q3.md#L1](/journal/2024-Q3.md#L1)"));
    assert!(!written.contains("passport"));
}
