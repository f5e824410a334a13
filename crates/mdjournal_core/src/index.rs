//! Tag index and namespace routing.
//!
//! # Responsibility
//! - Aggregate entries across files into a tag → entries mapping.
//! - Map namespaced tags to nested file paths.
//!
//! # Invariants
//! - An entry with N tags appears under N keys, by shared handle; mutating
//!   the entry is visible through every bucket.
//! - The index is owned by the calling operation; there is no process-wide
//!   state.
//! - `a_b_c` maps to `a/b/c.md`, deterministically.

use crate::model::SharedEntry;
use crate::{MARKDOWN_SUFFIX, TAG_NAMESPACE_SEPARATOR};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Mapping from tag to the entries carrying it, in insertion order.
#[derive(Debug, Default)]
pub struct TagIndex {
    buckets: BTreeMap<String, Vec<SharedEntry>>,
}

impl TagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Files `entry` under every one of its tags.
    pub fn insert(&mut self, entry: &SharedEntry) {
        self.insert_filtered(entry, &[]);
    }

    /// Files `entry` under every tag not listed in `ignored`.
    pub fn insert_filtered(&mut self, entry: &SharedEntry, ignored: &[String]) {
        for tag in entry.borrow().tags.iter() {
            if ignored.iter().any(|i| i == tag) {
                continue;
            }
            self.buckets
                .entry(tag.clone())
                .or_default()
                .push(Rc::clone(entry));
        }
    }

    /// Returns the entries filed under `tag`.
    pub fn get(&self, tag: &str) -> Option<&[SharedEntry]> {
        self.buckets.get(tag).map(Vec::as_slice)
    }

    /// Iterates buckets in tag order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<SharedEntry>)> {
        self.buckets.iter()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Maps a tag to its file path relative to the notebook root.
///
/// All namespace components but the last become nested directories; the
/// last becomes the filename stem: `proj_alpha_bug` → `proj/alpha/bug.md`.
pub fn tag_relative_path(tag: &str, separator: &str) -> PathBuf {
    let mut components: Vec<&str> = tag.split(separator).collect();
    let stem = components.pop().expect("split yields at least one component");
    let mut path = PathBuf::new();
    for dir in components {
        path.push(dir);
    }
    path.push(format!("{stem}{MARKDOWN_SUFFIX}"));
    path
}

/// Resolves a tag's file under `root`, creating namespace directories on
/// demand.
pub fn ensure_tag_file_path(root: &Path, tag: &str, separator: &str) -> io::Result<PathBuf> {
    let path = root.join(tag_relative_path(tag, separator));
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(path)
}

/// Default namespace routing using the `_` separator.
pub fn default_tag_relative_path(tag: &str) -> PathBuf {
    tag_relative_path(tag, TAG_NAMESPACE_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::{tag_relative_path, TagIndex};
    use crate::model::Entry;
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn entry_with_tags(tags: &[&str]) -> crate::model::SharedEntry {
        Entry {
            date: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            content: vec!["### 2024-01-01".to_string()],
            tags: tags.iter().map(|t| t.to_string()).collect(),
            location: Some("/a.md#L1".to_string()),
            position: 1,
        }
        .into_shared()
    }

    #[test]
    fn namespaced_tags_map_to_nested_paths() {
        assert_eq!(
            tag_relative_path("proj_alpha_bug", "_"),
            PathBuf::from("proj/alpha/bug.md")
        );
        assert_eq!(tag_relative_path("inbox", "_"), PathBuf::from("inbox.md"));
    }

    #[test]
    fn entry_is_filed_under_every_tag_by_reference() {
        let entry = entry_with_tags(&["work", "inbox"]);
        let mut index = TagIndex::new();
        index.insert(&entry);

        assert_eq!(index.len(), 2);
        entry.borrow_mut().location = None;
        for (_, bucket) in index.iter() {
            assert!(bucket[0].borrow().location.is_none());
        }
    }

    #[test]
    fn ignored_tags_are_not_indexed() {
        let entry = entry_with_tags(&["work", "rs"]);
        let mut index = TagIndex::new();
        index.insert_filtered(&entry, &["rs".to_string()]);
        assert!(index.get("rs").is_none());
        assert_eq!(index.get("work").unwrap().len(), 1);
    }

    #[test]
    fn duplicate_tags_file_the_entry_twice() {
        let entry = entry_with_tags(&["work", "work"]);
        let mut index = TagIndex::new();
        index.insert(&entry);
        assert_eq!(index.get("work").unwrap().len(), 2);
    }
}
