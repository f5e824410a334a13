use mdjournal_core::{ensure_tag_file_path, tag_relative_path, TAG_NAMESPACE_SEPARATOR};
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn namespaced_tag_routes_to_nested_file() {
    assert_eq!(
        tag_relative_path("proj_alpha_bug", TAG_NAMESPACE_SEPARATOR),
        PathBuf::from("proj/alpha/bug.md")
    );
}

#[test]
fn ensure_creates_namespace_directories_on_demand() {
    let dir = tempdir().unwrap();
    let path = ensure_tag_file_path(dir.path(), "proj_alpha_bug", TAG_NAMESPACE_SEPARATOR).unwrap();

    assert_eq!(path, dir.path().join("proj/alpha/bug.md"));
    assert!(dir.path().join("proj").is_dir());
    assert!(dir.path().join("proj/alpha").is_dir());
    // The file itself is only routed, never created here.
    assert!(!path.exists());
}

#[test]
fn custom_separator_is_honored() {
    assert_eq!(
        tag_relative_path("proj.alpha", "."),
        PathBuf::from("proj/alpha.md")
    );
    assert_eq!(
        tag_relative_path("plain", TAG_NAMESPACE_SEPARATOR),
        PathBuf::from("plain.md")
    );
}
