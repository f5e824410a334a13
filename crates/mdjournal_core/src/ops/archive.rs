//! Entry archiving.
//!
//! # Responsibility
//! - Move entries older than a cutoff into per-quarter archive files next
//!   to their source file.
//!
//! # Invariants
//! - Entries tagged `sticky` never move.
//! - Archive folders (`_Archive/<YYYY>/Q<n>`) are created on demand and
//!   merged with, never truncated blindly.
//! - A source file left with no entries and a blank prefix is removed.

use crate::model::SharedEntry;
use crate::notebook::{markdown_files, quarter_of};
use crate::ops::{io_at, rel_posix, OpResult};
use crate::parse::Parser;
use crate::write::{write_file, WriteMode};
use crate::ARCHIVE_FOLDERNAME;
use chrono::{Datelike, NaiveDateTime};
use log::info;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;

/// Entries carrying this tag are exempt from archiving.
pub const STICKY_TAG: &str = "sticky";

/// Outcome of one archive run.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveReport {
    /// Archive files created or extended, notebook-relative.
    pub archive_files: Vec<String>,
    /// Source files removed because nothing recent remained.
    pub removed_files: Vec<String>,
}

/// Moves entries older than `older_than` into `_Archive/<YYYY>/Q<n>/`.
///
/// `working_dir` bounds the scan; it must live under `notebook_root`.
pub fn archive_entries(
    notebook_root: &Path,
    working_dir: &Path,
    older_than: NaiveDateTime,
) -> OpResult<ArchiveReport> {
    let parser = Parser::new();
    let mut archive_files = Vec::new();
    let mut removed_files = Vec::new();

    for file in markdown_files(working_dir, None).map_err(io_at(working_dir))? {
        let origin = file.parent().expect("scanned files have a parent");
        let parsed = parser.parse_file(&file, notebook_root, None, Some(origin))?;

        let mut recent: Vec<SharedEntry> = Vec::new();
        let mut old: BTreeMap<(i32, u32), Vec<SharedEntry>> = BTreeMap::new();
        for entry in &parsed.entries {
            let (date, is_sticky) = {
                let entry = entry.borrow();
                (entry.date, entry.has_tag(STICKY_TAG))
            };
            if !is_sticky && date < older_than {
                old.entry((date.year(), quarter_of(date.date())))
                    .or_default()
                    .push(Rc::clone(entry));
            } else {
                recent.push(Rc::clone(entry));
            }
        }

        if old.is_empty() {
            continue;
        }

        if recent.is_empty() && parsed.prefix_is_blank() {
            fs::remove_file(&file).map_err(io_at(&file))?;
            removed_files.push(rel_posix(&file, notebook_root));
        } else {
            write_file(&file, &parsed.prefix, &recent, WriteMode::Truncate, false, false)?;
        }

        let file_name = file.file_name().expect("scanned files have a name");
        for ((year, quarter), mut entries) in old {
            let archive_dir = origin
                .join(ARCHIVE_FOLDERNAME)
                .join(year.to_string())
                .join(format!("Q{quarter}"));
            fs::create_dir_all(&archive_dir).map_err(io_at(&archive_dir))?;
            let archive_file = archive_dir.join(file_name);

            if archive_file.exists() {
                let existing =
                    parser.parse_file(&archive_file, notebook_root, None, Some(&archive_dir))?;
                entries.extend(existing.entries);
            }
            // The archive file's own prefix is dropped; archives hold
            // entries only.
            write_file(&archive_file, &[], &entries, WriteMode::Truncate, false, false)?;
            archive_files.push(rel_posix(&archive_file, notebook_root));
        }
    }

    archive_files.sort();
    archive_files.dedup();
    info!(
        "event=archive_entries module=ops status=ok archives={} removed={}",
        archive_files.len(),
        removed_files.len()
    );

    Ok(ArchiveReport {
        archive_files,
        removed_files,
    })
}
