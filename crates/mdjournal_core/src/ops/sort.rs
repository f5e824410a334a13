//! Journal regrouping.
//!
//! # Responsibility
//! - Move every journal entry into the quarter file its date belongs to,
//!   removing the regrouped source files.
//!
//! # Invariants
//! - The prefix of an existing quarter file survives the regroup; other
//!   prefixes travel nowhere and are dropped with their file.

use crate::model::SharedEntry;
use crate::notebook::{markdown_files, quarter_file_name};
use crate::ops::{io_at, rel_posix, OpResult};
use crate::parse::Parser;
use crate::write::{write_file, WriteMode};
use log::info;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Regroups all journal entries into `<YYYY>-Q<n>.md` files.
///
/// Returns the notebook-relative paths of the quarter files written.
pub fn sort_journal(notebook_root: &Path, journal_rel: &str) -> OpResult<Vec<String>> {
    let parser = Parser::new();
    let journal_dir = notebook_root.join(journal_rel);

    let mut buckets: BTreeMap<String, Vec<SharedEntry>> = BTreeMap::new();
    let mut prefixes: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for file in markdown_files(&journal_dir, None).map_err(io_at(&journal_dir))? {
        let origin = file.parent().expect("scanned files have a parent");
        let parsed = parser.parse_file(&file, notebook_root, None, Some(origin))?;

        let file_name = file
            .file_name()
            .expect("scanned files have a name")
            .to_string_lossy()
            .into_owned();
        for entry in parsed.entries {
            let quarter_name = quarter_file_name(entry.borrow().date.date(), "");
            buckets.entry(quarter_name).or_default().push(entry);
        }
        // Keep a quarter file's own front matter when it gets rewritten.
        prefixes.insert(file_name, parsed.prefix);

        fs::remove_file(&file).map_err(io_at(&file))?;
    }

    let mut written = Vec::new();
    for (quarter_name, entries) in buckets {
        let target = journal_dir.join(&quarter_name);
        let prefix = prefixes.remove(&quarter_name).unwrap_or_default();
        write_file(&target, &prefix, &entries, WriteMode::Truncate, false, false)?;
        written.push(rel_posix(&target, notebook_root));
    }

    info!(
        "event=sort_journal module=ops status=ok quarters={}",
        written.len()
    );
    Ok(written)
}
