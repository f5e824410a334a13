//! Tag compilation.
//!
//! # Responsibility
//! - Move tagged journal entries into their per-tag files and copy tagged
//!   note entries there by reference.
//! - Keep runs incremental via the `.notes.json` last-run timestamp.
//!
//! # Invariants
//! - Moved entries have their location nulled before filing, so a tag file
//!   never backlinks itself.
//! - Per-tag merge dedupes by the formatted-timestamp entry id.
//! - Journal files are only rewritten (or removed) when entries actually
//!   moved out of them.

use crate::index::{ensure_tag_file_path, TagIndex};
use crate::model::SharedEntry;
use crate::notebook::{ensure_quarter_file, markdown_files, NotebookConfig};
use crate::ops::{io_at, rel_posix, OpResult};
use crate::parse::Parser;
use crate::write::{write_file, WriteMode};
use crate::TAG_NAMESPACE_SEPARATOR;
use chrono::NaiveDate;
use log::info;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Instant;

/// Options for one compile run.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Journal directory, relative to the notebook root.
    pub journal_rel: String,
    /// Tags that never get a file of their own.
    pub ignore_tags: Vec<String>,
    /// Parse every file regardless of modification timestamps.
    pub ignore_modification_timestamps: bool,
    /// Write tag files newest-first.
    pub reverse_tag_files: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            journal_rel: "journal".to_string(),
            ignore_tags: Vec::new(),
            ignore_modification_timestamps: false,
            reverse_tag_files: true,
        }
    }
}

/// Outcome of one compile run.
#[derive(Debug, Clone, Serialize)]
pub struct CompileReport {
    /// Tag files created or updated, notebook-relative.
    pub modified_files: Vec<String>,
    /// Journal files removed after all their entries moved out.
    pub removed_files: Vec<String>,
    /// The current quarter file, notebook-relative.
    pub quarter_file: String,
}

/// Compiles tagged entries into per-tag files.
///
/// Journal entries (files under the journal directory) are MOVED: filed
/// into tag files with their location cleared, and the journal file is
/// rewritten with only its untagged remainder (or deleted when nothing,
/// not even prefix content, remains). Note entries elsewhere are COPIED:
/// their location survives, so the tag file gains a source backlink.
pub fn compile_notes(
    notebook_root: &Path,
    today: NaiveDate,
    options: &CompileOptions,
) -> OpResult<CompileReport> {
    let started_at = Instant::now();
    let parser = Parser::new();
    let journal_dir = notebook_root.join(&options.journal_rel);

    let mut config = NotebookConfig::load(notebook_root)?;
    let modified_after = if options.ignore_modification_timestamps {
        None
    } else {
        config.lastrun_system_time()
    };

    let quarter_file =
        ensure_quarter_file(&journal_dir, today, "").map_err(io_at(&journal_dir))?;

    let all_files = markdown_files(notebook_root, modified_after).map_err(io_at(notebook_root))?;
    let (journal_files, note_files): (Vec<PathBuf>, Vec<PathBuf>) = all_files
        .into_iter()
        .partition(|path| path.starts_with(&journal_dir));

    let mut tags = TagIndex::new();
    let mut removed_files = Vec::new();

    // Journal pass: detach tagged entries from their source files.
    for file in &journal_files {
        let origin = file.parent().expect("scanned files have a parent");
        let parsed = parser.parse_file(file, notebook_root, None, Some(origin))?;

        let mut kept: Vec<SharedEntry> = Vec::new();
        let mut moved_any = false;
        for entry in &parsed.entries {
            let files_somewhere = entry
                .borrow()
                .tags
                .iter()
                .any(|tag| !options.ignore_tags.contains(tag));
            if files_somewhere {
                entry.borrow_mut().location = None;
                tags.insert_filtered(entry, &options.ignore_tags);
                moved_any = true;
            } else {
                kept.push(Rc::clone(entry));
            }
        }

        if kept.is_empty() && parsed.prefix_is_blank() {
            fs::remove_file(file).map_err(io_at(file))?;
            removed_files.push(rel_posix(file, notebook_root));
        } else if moved_any {
            write_file(file, &parsed.prefix, &kept, WriteMode::Truncate, false, false)?;
        }
    }

    // Notes pass: file entries by reference, locations intact.
    for file in &note_files {
        let origin = file.parent().expect("scanned files have a parent");
        let parsed = parser.parse_file(file, notebook_root, None, Some(origin))?;
        for entry in &parsed.entries {
            tags.insert_filtered(entry, &options.ignore_tags);
        }
    }

    // Merge each bucket into its tag file, deduping by entry id.
    let mut modified_files = Vec::new();
    for (tag, bucket) in tags.iter() {
        let tag_file = ensure_tag_file_path(notebook_root, tag, TAG_NAMESPACE_SEPARATOR)
            .map_err(io_at(notebook_root))?;

        let mut prefix = Vec::new();
        let mut file_entries: Vec<SharedEntry> = Vec::new();
        let mut seen_ids: HashSet<String> = HashSet::new();
        if tag_file.is_file() {
            let existing = parser.parse_file(&tag_file, notebook_root, None, None)?;
            prefix = existing.prefix;
            for entry in existing.entries {
                // Entries already living here must not backlink themselves.
                entry.borrow_mut().location = None;
                seen_ids.insert(entry.borrow().id());
                file_entries.push(entry);
            }
        }

        let mut modified = false;
        for entry in bucket {
            if seen_ids.insert(entry.borrow().id()) {
                file_entries.push(Rc::clone(entry));
                modified = true;
            }
        }

        if modified {
            write_file(
                &tag_file,
                &prefix,
                &file_entries,
                WriteMode::Truncate,
                options.reverse_tag_files,
                true,
            )?;
            modified_files.push(rel_posix(&tag_file, notebook_root));
        }
    }
    modified_files.sort();

    config.touch_lastrun();
    config.store(notebook_root)?;

    info!(
        "event=compile_notes module=ops status=ok tags={} modified={} removed={} duration_ms={}",
        tags.len(),
        modified_files.len(),
        removed_files.len(),
        started_at.elapsed().as_millis()
    );

    Ok(CompileReport {
        modified_files,
        removed_files,
        quarter_file: rel_posix(&quarter_file, notebook_root),
    })
}
