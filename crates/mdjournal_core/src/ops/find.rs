//! Entry search.
//!
//! # Responsibility
//! - Prefix-match search terms against punctuation-split content words.
//! - Surface results on stdout or as a generated Markdown file.

use crate::notebook::markdown_files;
use crate::ops::{io_at, rel_posix, OpResult};
use crate::parse::{Parser, DEFAULT_UNTAGGED_TAG};
use chrono::{Days, NaiveDate, NaiveDateTime};
use log::info;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Options for one search run.
#[derive(Debug, Clone)]
pub struct FindOptions {
    /// Search terms; every term must prefix-match a word of the entry.
    pub search: Vec<String>,
    /// Entries older than this many months are not searched; zero disables
    /// the window.
    pub ignore_older_than_months: u64,
    /// When set, results are written here (notebook-relative) instead of
    /// being returned for display only.
    pub out: Option<PathBuf>,
}

/// One matched entry, detached from the parse result for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct FoundEntry {
    pub content: Vec<String>,
    pub location: Option<String>,
    pub path: String,
    pub position: usize,
}

/// Outcome of one search run.
#[derive(Debug, Clone, Serialize)]
pub struct FindReport {
    pub matches: Vec<FoundEntry>,
    /// Tag name → occurrence count, newest-first.
    pub tags_seen: Vec<(String, usize)>,
    pub entries_scanned: usize,
    /// Where results were written, when an out file was requested.
    pub out_file: Option<String>,
}

/// Searches journal entries for `options.search` terms.
pub fn find_entries(
    notebook_root: &Path,
    today: NaiveDate,
    options: &FindOptions,
) -> OpResult<FindReport> {
    let parser = Parser::new();
    let journal_dir = notebook_root.join("journal");

    let ignore_older_than = if options.ignore_older_than_months > 0 {
        today
            .checked_sub_days(Days::new(options.ignore_older_than_months * 30))
            .map(midnight)
    } else {
        None
    };

    let mut matches = Vec::new();
    let mut tag_dates: BTreeMap<String, Vec<NaiveDateTime>> = BTreeMap::new();
    let mut entries_scanned = 0usize;

    for file in markdown_files(&journal_dir, None).map_err(io_at(&journal_dir))? {
        let parsed = parser.parse_file(&file, notebook_root, Some(DEFAULT_UNTAGGED_TAG), None)?;
        let file_rel = rel_posix(&file, notebook_root);

        for entry in &parsed.entries {
            let entry = entry.borrow();
            if matches!(ignore_older_than, Some(cutoff) if entry.date < cutoff) {
                continue;
            }
            entries_scanned += 1;
            for tag in &entry.tags {
                tag_dates.entry(tag.clone()).or_default().push(entry.date);
            }

            if entry.content.is_empty() {
                continue;
            }
            let words = content_words(&entry.content);
            let all_terms_match = options
                .search
                .iter()
                .all(|term| words.iter().any(|word| word.starts_with(term.as_str())));
            if all_terms_match {
                matches.push(FoundEntry {
                    content: entry.content.clone(),
                    location: entry.location.clone(),
                    path: file_rel.clone(),
                    position: entry.position,
                });
            }
        }
    }

    let mut tags_seen: Vec<(String, usize)> = tag_dates
        .iter()
        .map(|(tag, dates)| (tag.clone(), dates.len()))
        .collect();
    tags_seen.sort_by(|a, b| {
        let newest = |tag: &str| tag_dates[tag].iter().max().copied();
        newest(&b.0).cmp(&newest(&a.0))
    });

    let out_file = match options.out.as_ref() {
        Some(out_rel) => {
            let out_path = notebook_root.join(out_rel);
            let mut body = String::new();
            for found in &matches {
                body.push_str(&found.content.join("\n"));
                if let Some(location) = found.location.as_deref() {
                    body.push_str(&format!("\n\n[source: {location}]({location})"));
                }
                body.push_str("\n\n");
            }
            fs::write(&out_path, body).map_err(io_at(&out_path))?;
            Some(rel_posix(&out_path, notebook_root))
        }
        None => None,
    };

    info!(
        "event=find_entries module=ops status=ok scanned={entries_scanned} matches={}",
        matches.len()
    );

    Ok(FindReport {
        matches,
        tags_seen,
        entries_scanned,
        out_file,
    })
}

/// Splits entry content into words, treating punctuation as whitespace.
fn content_words(content: &[String]) -> Vec<String> {
    content
        .join(" ")
        .chars()
        .map(|c| if c.is_ascii_punctuation() { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(0, 0, 0).expect("midnight is always valid")
}

#[cfg(test)]
mod tests {
    use super::content_words;

    #[test]
    fn punctuation_splits_words() {
        let content = vec!["done: xwork, see [ref](a.md)".to_string()];
        let words = content_words(&content);
        assert!(words.contains(&"xwork".to_string()));
        assert!(words.contains(&"ref".to_string()));
        assert!(!words.iter().any(|w| w.contains(',')));
    }
}
