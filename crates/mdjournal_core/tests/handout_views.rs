use chrono::NaiveDate;
use mdjournal_core::ops::{compile_handout, HandoutOptions};
use tempfile::tempdir;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 8, 20).unwrap()
}

#[test]
fn handout_files_carry_count_prefixes_and_backlinks() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("journal")).unwrap();
    std::fs::write(
        root.join("journal/2024-Q3.md"),
        "### 2024-08-18 xwork\nfresh work item\n\n### 2024-07-01 xwork xinbox\nolder inboxed item\n",
    )
    .unwrap();

    let report = compile_handout(root, today(), &HandoutOptions::default()).unwrap();
    assert!(report
        .written_files
        .iter()
        .any(|f| f == "handout/01-01-001_work.md"));

    let work = std::fs::read_to_string(root.join("handout/01-01-001_work.md")).unwrap();
    assert!(work.starts_with("# work\n"));
    assert!(work.contains("1 recent / 1 in inbox / 1 older"));
    assert!(work.contains("fresh work item"));
    // Older entries collapse into a details block, inbox ones get a div.
    assert!(work.contains("<summary>work: older entries</summary>"));
    assert!(work.contains("<div style=\"color:orange\">"));
    assert!(work.contains("[source: /journal/2024-Q3.md#L1](/journal/2024-Q3.md#L1)"));
}

#[test]
fn stale_tags_are_skipped_and_reported() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("journal")).unwrap();
    std::fs::write(
        root.join("journal/2024-Q3.md"),
        "### 2024-08-18 xwork\nfresh\n\n### 2024-01-01 xstale\nforgotten\n",
    )
    .unwrap();

    let report = compile_handout(root, today(), &HandoutOptions::default()).unwrap();
    assert_eq!(report.skipped_tags, vec!["stale".to_string()]);
    assert!(report.written_files.iter().all(|f| !f.contains("stale")));
}

#[test]
fn namespaced_tags_route_into_handout_subfolders() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("journal")).unwrap();
    std::fs::write(
        root.join("journal/2024-Q3.md"),
        "### 2024-08-18 xproj_alpha\nnamespaced\n",
    )
    .unwrap();

    let report = compile_handout(root, today(), &HandoutOptions::default()).unwrap();
    assert!(report
        .written_files
        .iter()
        .any(|f| f == "handout/proj/01-00-000_alpha.md"));
}

#[test]
fn handout_directory_is_rebuilt_from_scratch() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("journal")).unwrap();
    std::fs::create_dir_all(root.join("handout")).unwrap();
    std::fs::write(root.join("handout/leftover.md"), "stale view\n").unwrap();
    std::fs::write(
        root.join("journal/2024-Q3.md"),
        "### 2024-08-18 xwork\nfresh\n",
    )
    .unwrap();

    compile_handout(root, today(), &HandoutOptions::default()).unwrap();
    assert!(!root.join("handout/leftover.md").exists());
}

#[test]
fn tag_files_are_pinned_with_demoted_headings() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("journal")).unwrap();
    std::fs::write(
        root.join("journal/2024-Q3.md"),
        "### 2024-08-18 xwork\nfresh\n",
    )
    .unwrap();
    std::fs::write(
        root.join("work.md"),
        "# work\nkanban: [board](./boards/work.md)\n",
    )
    .unwrap();

    compile_handout(root, today(), &HandoutOptions::default()).unwrap();
    let view = std::fs::read_to_string(root.join("handout/01-00-000_work.md")).unwrap();

    // The whole file rides along in a pinned section above the entries.
    assert!(view.contains("<div style=\"color:#00FFFF\">"));
    assert!(view.contains("## \u{1F4CC} work.md"));
    assert!(view.contains("### work\n"));
    assert!(view.contains("[board](../boards/work.md)"));
    assert!(view.contains("[source: /work.md](/work.md)"));
    assert!(view.find("\u{1F4CC}").unwrap() < view.find("fresh").unwrap());

    // Files whose stem is not a tag are never pinned.
    assert!(!view.contains("journal/2024-Q3.md\n"));
}

#[test]
fn links_are_rewritten_relative_to_the_handout_file() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("journal")).unwrap();
    std::fs::write(
        root.join("journal/2024-Q3.md"),
        "### 2024-08-18 xproj_alpha\n![shot](./img/s.png)\n",
    )
    .unwrap();

    compile_handout(root, today(), &HandoutOptions::default()).unwrap();
    let view = std::fs::read_to_string(root.join("handout/proj/01-00-000_alpha.md")).unwrap();
    assert!(view.contains("![shot](../../journal/img/s.png)"));
}
