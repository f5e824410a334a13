//! Handout generation.
//!
//! # Responsibility
//! - Rebuild the `handout/` directory with one static per-tag view file.
//! - Re-express links relative to each handout file, since handouts live
//!   outside the source tree layout.
//!
//! # Invariants
//! - The handout directory is wiped and rebuilt from scratch on every run.
//! - Tags whose newest entry is older than the ignore window are skipped
//!   and reported, not silently dropped.
//! - Entries tagged `ignore` never appear.
//! - A notebook file whose stem equals a tag is pinned at the top of that
//!   tag's view, headings demoted.

use crate::links::rewrite_links;
use crate::model::SharedEntry;
use crate::notebook::markdown_files;
use crate::ops::{io_at, rel_posix, OpResult};
use crate::parse::{Parser, DEFAULT_UNTAGGED_TAG};
use crate::{MARKDOWN_SUFFIX, TAG_NAMESPACE_SEPARATOR};
use chrono::{Days, NaiveDate, NaiveDateTime};
use log::info;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Tag that excludes an entry from handouts entirely.
pub const IGNORE_TAG: &str = "ignore";
/// Tag counted separately and highlighted in handout views.
pub const INBOX_TAG: &str = "inbox";
/// Handout directory name under the notebook root.
pub const HANDOUT_DIRNAME: &str = "handout";

/// Options for one handout run.
#[derive(Debug, Clone)]
pub struct HandoutOptions {
    /// Entries newer than this many weeks count as recent.
    pub weeks: u64,
    /// Tags whose newest entry is older than this many months are skipped;
    /// zero disables the window.
    pub ignore_older_than_months: u64,
}

impl Default for HandoutOptions {
    fn default() -> Self {
        Self {
            weeks: 1,
            ignore_older_than_months: 3,
        }
    }
}

/// Outcome of one handout run.
#[derive(Debug, Clone, Serialize)]
pub struct HandoutReport {
    /// Handout files written, notebook-relative.
    pub written_files: Vec<String>,
    /// Tags skipped because their newest entry fell out of the window.
    pub skipped_tags: Vec<String>,
}

#[derive(Default)]
struct TagStats {
    recent: u32,
    inbox: u32,
    older: u32,
}

/// Rebuilds `handout/` with one counts-prefixed file per tag.
pub fn compile_handout(
    notebook_root: &Path,
    today: NaiveDate,
    options: &HandoutOptions,
) -> OpResult<HandoutReport> {
    let parser = Parser::new();
    let journal_dir = notebook_root.join("journal");
    let handout_dir = notebook_root.join(HANDOUT_DIRNAME);

    if handout_dir.exists() {
        fs::remove_dir_all(&handout_dir).map_err(io_at(&handout_dir))?;
    }
    fs::create_dir_all(&handout_dir).map_err(io_at(&handout_dir))?;

    let after_date = midnight(
        today
            .checked_sub_days(Days::new(options.weeks * 7))
            .unwrap_or(today),
    );
    let ignore_older_than = if options.ignore_older_than_months > 0 {
        Some(midnight(
            today
                .checked_sub_days(Days::new(options.ignore_older_than_months * 30))
                .unwrap_or(today),
        ))
    } else {
        None
    };

    // Scanned before any view is written, so freshly built handout files
    // can never pin themselves.
    let notebook_files = markdown_files(notebook_root, None).map_err(io_at(notebook_root))?;

    let mut tags: BTreeMap<String, Vec<SharedEntry>> = BTreeMap::new();
    let mut stats: BTreeMap<String, TagStats> = BTreeMap::new();
    for file in markdown_files(&journal_dir, None).map_err(io_at(&journal_dir))? {
        let origin = file.parent().expect("scanned files have a parent");
        let parsed =
            parser.parse_file(&file, notebook_root, Some(DEFAULT_UNTAGGED_TAG), Some(origin))?;
        for entry in &parsed.entries {
            if entry.borrow().has_tag(IGNORE_TAG) {
                continue;
            }
            let (date, in_inbox, entry_tags) = {
                let entry = entry.borrow();
                (entry.date, entry.has_tag(INBOX_TAG), entry.tags.clone())
            };
            for tag in entry_tags {
                tags.entry(tag.clone()).or_default().push(Rc::clone(entry));
                let tag_stats = stats.entry(tag).or_default();
                if in_inbox {
                    tag_stats.inbox += 1;
                }
                if date < after_date {
                    tag_stats.older += 1;
                } else {
                    tag_stats.recent += 1;
                }
            }
        }
    }

    for bucket in tags.values_mut() {
        bucket.sort_by(|a, b| b.borrow().date.cmp(&a.borrow().date));
    }

    // Newest tag first, matching the attention order of the handout.
    let mut ordered: Vec<(&String, &Vec<SharedEntry>)> = tags.iter().collect();
    ordered.sort_by(|a, b| {
        let newest = |bucket: &[SharedEntry]| bucket.first().map(|e| e.borrow().date);
        newest(b.1).cmp(&newest(a.1))
    });

    let mut written_files = Vec::new();
    let mut skipped_tags = Vec::new();
    for (tag, bucket) in ordered {
        let newest = match bucket.first() {
            Some(entry) => entry.borrow().date,
            None => continue,
        };
        if matches!(ignore_older_than, Some(cutoff) if newest < cutoff) {
            skipped_tags.push(tag.clone());
            continue;
        }

        let tag_stats = &stats[tag];
        let path = handout_file_path(&handout_dir, tag, tag_stats);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_at(parent))?;
        }

        let body = render_tag_handout(
            tag,
            bucket,
            tag_stats,
            &notebook_files,
            after_date,
            today,
            notebook_root,
            path.parent().expect("handout files have a parent"),
        )?;
        fs::write(&path, body).map_err(io_at(&path))?;
        written_files.push(rel_posix(&path, notebook_root));
    }

    info!(
        "event=compile_handout module=ops status=ok written={} skipped={}",
        written_files.len(),
        skipped_tags.len()
    );

    Ok(HandoutReport {
        written_files,
        skipped_tags,
    })
}

/// `a_b_c` routes to `a/b/<RR>-<II>-<OOO>_c.md` under the handout dir.
fn handout_file_path(handout_dir: &Path, tag: &str, stats: &TagStats) -> PathBuf {
    let mut components: Vec<&str> = tag.split(TAG_NAMESPACE_SEPARATOR).collect();
    let stem = components.pop().expect("split yields at least one component");
    let mut path = handout_dir.to_path_buf();
    for dir in components {
        path.push(dir);
    }
    path.push(format!(
        "{:02}-{:02}-{:03}_{stem}{MARKDOWN_SUFFIX}",
        stats.recent, stats.inbox, stats.older
    ));
    path
}

#[allow(clippy::too_many_arguments)]
fn render_tag_handout(
    tag: &str,
    bucket: &[SharedEntry],
    stats: &TagStats,
    notebook_files: &[PathBuf],
    after_date: NaiveDateTime,
    today: NaiveDate,
    notebook_root: &Path,
    destination_dir: &Path,
) -> OpResult<String> {
    let mut out = String::new();
    out.push_str(&format!(
        "# {tag}\n**{} - {}  //  {} recent / {} in inbox / {} older**\n\n",
        after_date.format("%d.%m.%Y"),
        today.format("%d.%m.%Y"),
        stats.recent,
        stats.inbox,
        stats.older
    ));

    for file in notebook_files {
        let matches_tag = file
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_lowercase() == tag)
            .unwrap_or(false);
        if !matches_tag {
            continue;
        }
        out.push_str(&render_pinned_file(file, notebook_root, destination_dir)?);
    }

    let mut historical = false;
    for entry in bucket {
        let entry = entry.borrow();
        if !historical && entry.date < after_date {
            historical = true;
            out.push_str(&format!(
                "<details style=\"color:gray; border:2px solid; padding: 1em\">\n  <summary>{tag}: older entries</summary>\n\n"
            ));
        }

        let in_inbox = entry.has_tag(INBOX_TAG);
        if in_inbox {
            out.push_str("<div style=\"color:orange\">\n\n");
        }

        for line in &entry.content {
            // Content is already root-canonical from parse time; re-express
            // it relative to this handout file.
            let rewritten =
                rewrite_links(line, notebook_root, notebook_root, Some(destination_dir))?;
            out.push_str(&rewritten);
            out.push('\n');
        }
        if let Some(location) = entry.location.as_deref() {
            out.push_str(&format!("\n[source: {location}]({location})\n"));
        }
        out.push('\n');

        if in_inbox {
            out.push_str("</div>\n\n");
        }
    }
    if historical {
        out.push_str("</details>\n\n");
    }

    Ok(out)
}

/// Embeds a whole notebook file as a pinned section of a tag view.
///
/// The file's headings are demoted below the view's own, and its links are
/// re-expressed relative to the handout file like everything else.
fn render_pinned_file(
    file: &Path,
    notebook_root: &Path,
    destination_dir: &Path,
) -> OpResult<String> {
    let rel = rel_posix(file, notebook_root);
    let origin = file.parent().expect("scanned files have a parent");
    let text = fs::read_to_string(file).map_err(io_at(file))?;

    let mut out = String::new();
    out.push_str("<div style=\"color:#00FFFF\">\n\n");
    out.push_str(&format!("## \u{1F4CC} {rel}\n\n"));
    for line in text.lines() {
        let rewritten = rewrite_links(line, notebook_root, origin, Some(destination_dir))?;
        if rewritten.starts_with('#') {
            out.push_str("##");
        }
        out.push_str(&rewritten);
        out.push('\n');
    }
    out.push_str(&format!("\n[source: /{rel}](/{rel})\n\n"));
    out.push_str("</div>\n\n");
    Ok(out)
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(0, 0, 0).expect("midnight is always valid")
}
