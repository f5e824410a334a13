//! Recent-entry tagging.
//!
//! # Responsibility
//! - Append a `recent` tag token to the heading of every entry inside the
//!   window that does not carry it yet.
//!
//! # Invariants
//! - Already-tagged entries are never touched, so repeated runs are
//!   idempotent.
//! - Files without a change are not rewritten.

use crate::notebook::markdown_files;
use crate::ops::{io_at, rel_posix, OpResult};
use crate::parse::Parser;
use crate::write::{write_file, WriteMode};
use chrono::NaiveDateTime;
use log::info;
use std::path::Path;

/// Default tag appended to recent entries.
pub const RECENT_TAG: &str = "recent";

/// Tags every entry dated `after` or later with `recent_tag`.
///
/// Returns the notebook-relative paths of the rewritten files.
pub fn tag_recent_entries(
    notebook_root: &Path,
    after: NaiveDateTime,
    recent_tag: &str,
) -> OpResult<Vec<String>> {
    let parser = Parser::new();
    let mut modified_files = Vec::new();

    for file in markdown_files(notebook_root, None).map_err(io_at(notebook_root))? {
        let origin = file.parent().expect("scanned files have a parent");
        let parsed = parser.parse_file(&file, notebook_root, None, Some(origin))?;

        let mut modified = false;
        for entry in &parsed.entries {
            let mut entry = entry.borrow_mut();
            if entry.has_tag(recent_tag) || entry.date < after {
                continue;
            }
            let token = parser.tag_token(recent_tag);
            let heading = entry
                .content
                .first_mut()
                .expect("closed entries keep their heading line");
            heading.push(' ');
            heading.push_str(&token);
            entry.tags.push(recent_tag.to_string());
            modified = true;
        }

        if modified {
            write_file(
                &file,
                &parsed.prefix,
                &parsed.entries,
                WriteMode::Truncate,
                false,
                false,
            )?;
            modified_files.push(rel_posix(&file, notebook_root));
        }
    }

    info!(
        "event=tag_recent module=ops status=ok modified={}",
        modified_files.len()
    );
    Ok(modified_files)
}
