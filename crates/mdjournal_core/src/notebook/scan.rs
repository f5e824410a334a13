//! Markdown file discovery.
//!
//! # Responsibility
//! - Recursively enumerate `*.md` files under a directory, in deterministic
//!   order.
//! - Skip archive folders and dot-prefixed names.
//! - Optionally skip files not modified since the last run.

use crate::ARCHIVE_FOLDERNAME;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Lists Markdown files under `dir`, recursively, sorted by path.
///
/// Directories named `_Archive` and any dot-prefixed file or directory are
/// skipped. When `modified_after` is given, only files with a newer
/// modification time are returned.
pub fn markdown_files(dir: &Path, modified_after: Option<SystemTime>) -> io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    collect(dir, modified_after, &mut found)?;
    found.sort();
    Ok(found)
}

fn collect(
    dir: &Path,
    modified_after: Option<SystemTime>,
    found: &mut Vec<PathBuf>,
) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') {
            continue;
        }

        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            if name == ARCHIVE_FOLDERNAME {
                continue;
            }
            collect(&path, modified_after, found)?;
        } else if file_type.is_file() && is_markdown(&path) {
            if let Some(after) = modified_after {
                let modified = entry.metadata()?.modified()?;
                if modified <= after {
                    continue;
                }
            }
            found.push(path);
        }
    }
    Ok(())
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("md"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::markdown_files;
    use tempfile::tempdir;

    #[test]
    fn scan_skips_archive_and_hidden_entries() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("journal")).unwrap();
        std::fs::create_dir_all(root.join("_Archive/2024/Q1")).unwrap();
        std::fs::create_dir_all(root.join(".obsidian")).unwrap();
        std::fs::write(root.join("journal/2024-Q1.md"), "").unwrap();
        std::fs::write(root.join("inbox.MD"), "").unwrap();
        std::fs::write(root.join("notes.txt"), "").unwrap();
        std::fs::write(root.join(".hidden.md"), "").unwrap();
        std::fs::write(root.join("_Archive/2024/Q1/old.md"), "").unwrap();
        std::fs::write(root.join(".obsidian/cache.md"), "").unwrap();

        let found = markdown_files(root, None).unwrap();
        assert_eq!(
            found,
            vec![root.join("inbox.MD"), root.join("journal/2024-Q1.md")]
        );
    }
}
