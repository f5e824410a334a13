//! Entry domain model.
//!
//! # Responsibility
//! - Define the canonical record produced by the parser and consumed by the
//!   writer and every orchestration operation.
//! - Provide the shared-handle type that lets one entry live in several tag
//!   buckets at once.
//!
//! # Invariants
//! - `date` is the primary identity; `Entry::id()` is the dedupe key used
//!   when merging entries across files.
//! - `tags` is ordered and case-preserving; duplicates are kept.
//! - `location` becomes `None` when an entry is detached for relocation, so
//!   the destination file never backlinks itself.

use chrono::NaiveDateTime;
use std::cell::RefCell;
use std::rc::Rc;

/// Format of the per-entry dedupe key derived from the heading timestamp.
pub const ENTRY_ID_FORMAT: &str = "%Y%m%d-%H%M%S";

/// One dated, tagged block of Markdown content extracted from a file.
///
/// Entries are ephemeral: constructed fresh on every parse, mutated in
/// memory, and discarded after the owning operation writes them back out.
/// The filesystem plus the heading text is the durable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Heading timestamp. Date-only headings parse to midnight.
    pub date: NaiveDateTime,
    /// Heading line plus body lines, trailing blank lines trimmed.
    pub content: Vec<String>,
    /// Sigil-prefixed tokens found anywhere in `content`, in order of first
    /// occurrence. Not deduplicated.
    pub tags: Vec<String>,
    /// Backlink anchor `/<path relative to notebook root>#L<line>`, or
    /// `None` once the entry has been detached from its source file.
    pub location: Option<String>,
    /// 1-based line number of the heading within the source file at parse
    /// time. Display/debug only, never identity.
    pub position: usize,
}

/// Shared mutable handle to one entry.
///
/// A single entry is referenced from every tag bucket it is indexed under;
/// mutating it through one handle (e.g. clearing `location`) is visible
/// through all of them.
pub type SharedEntry = Rc<RefCell<Entry>>;

impl Entry {
    /// Wraps this entry into a shared handle.
    pub fn into_shared(self) -> SharedEntry {
        Rc::new(RefCell::new(self))
    }

    /// Returns the formatted-timestamp dedupe key.
    pub fn id(&self) -> String {
        self.date.format(ENTRY_ID_FORMAT).to_string()
    }

    /// Returns whether `tag` occurs in this entry's tag list.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Result of parsing one Markdown file.
#[derive(Debug, Clone, Default)]
pub struct ParsedFile {
    /// Raw lines preceding the first heading, round-tripped verbatim apart
    /// from trailing blank compaction.
    pub prefix: Vec<String>,
    /// Entries in file order.
    pub entries: Vec<SharedEntry>,
}

impl ParsedFile {
    /// Returns whether the prefix contains only blank lines.
    pub fn prefix_is_blank(&self) -> bool {
        self.prefix.iter().all(|line| line.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::Entry;
    use chrono::NaiveDate;

    fn sample() -> Entry {
        Entry {
            date: NaiveDate::from_ymd_opt(2024, 3, 5)
                .unwrap()
                .and_hms_opt(14, 30, 0)
                .unwrap(),
            content: vec!["### 2024-03-05 14:30 note".to_string()],
            tags: vec!["work".to_string()],
            location: Some("/journal/2024-Q1.md#L12".to_string()),
            position: 12,
        }
    }

    #[test]
    fn id_uses_compact_timestamp_format() {
        assert_eq!(sample().id(), "20240305-143000");
    }

    #[test]
    fn shared_handle_mutation_is_visible_through_clones() {
        let shared = sample().into_shared();
        let alias = shared.clone();
        alias.borrow_mut().location = None;
        assert!(shared.borrow().location.is_none());
    }
}
