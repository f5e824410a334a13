//! Entry parsing.
//!
//! # Responsibility
//! - Segment a Markdown file into dated entries plus an untagged prefix.
//! - Extract sigil tags from every content line.
//! - Track line provenance for `#L`-style backlink anchors.
//!
//! # Invariants
//! - Entries are produced in file order; the parser never reorders or
//!   deduplicates.
//! - A marker line whose remainder is not date-shaped is ordinary content.
//! - A date-shaped heading that fails calendar validation is fatal for the
//!   whole file.

use crate::links::{rewrite_links, LinkError};
use crate::model::{Entry, ParsedFile, SharedEntry};
use chrono::{NaiveDate, NaiveDateTime};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Marker that starts an entry heading line.
pub const DEFAULT_HEADING_MARKER: &str = "### ";
/// Sigil character that starts a tag token.
pub const DEFAULT_TAG_SIGIL: &str = "x";
/// Label injected for entries without any tag token.
pub const DEFAULT_UNTAGGED_TAG: &str = "untagged";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeadingDateFormat {
    /// `YYYY-MM-DD HH:MM`
    DateMinute,
    /// `YYYY-MM-DD`
    DateOnly,
    /// `YYYYMMDD`
    Compact,
}

// Ordered by specificity; the first date-shaped match wins.
static HEADING_DATE_PATTERNS: Lazy<[(Regex, HeadingDateFormat); 3]> = Lazy::new(|| {
    [
        (
            Regex::new(r"^(\d{4}-\d{2}-\d{2} \d{2}:\d{2}) ?(.*)$").expect("valid date regex"),
            HeadingDateFormat::DateMinute,
        ),
        (
            Regex::new(r"^(\d{4}-\d{2}-\d{2}) ?(.*)$").expect("valid date regex"),
            HeadingDateFormat::DateOnly,
        ),
        (
            Regex::new(r"^(\d{8}) ?(.*)$").expect("valid date regex"),
            HeadingDateFormat::Compact,
        ),
    ]
});

pub type ParseResult<T> = Result<T, ParseError>;

/// Fatal error while parsing one Markdown file.
#[derive(Debug)]
pub enum ParseError {
    Io {
        path: PathBuf,
        source: io::Error,
    },
    /// Heading is date-shaped but the digit groups do not form a calendar
    /// date (e.g. month 13).
    InvalidHeadingDate {
        path: PathBuf,
        line_number: usize,
        text: String,
        source: chrono::ParseError,
    },
    /// File does not live under the notebook root.
    OutsideNotebookRoot {
        path: PathBuf,
    },
    Link(LinkError),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read `{}`: {source}", path.display())
            }
            Self::InvalidHeadingDate {
                path,
                line_number,
                text,
                source,
            } => write!(
                f,
                "invalid heading date at {}:{line_number} `{text}`: {source}",
                path.display()
            ),
            Self::OutsideNotebookRoot { path } => {
                write!(f, "`{}` is outside the notebook root", path.display())
            }
            Self::Link(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ParseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::InvalidHeadingDate { source, .. } => Some(source),
            Self::OutsideNotebookRoot { .. } => None,
            Self::Link(err) => Some(err),
        }
    }
}

impl From<LinkError> for ParseError {
    fn from(value: LinkError) -> Self {
        Self::Link(value)
    }
}

/// Line-oriented entry parser with configurable heading marker and tag sigil.
pub struct Parser {
    heading_marker: String,
    tag_sigil: String,
    tag_re: Regex,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Creates a parser with the canonical `### ` marker and `x` sigil.
    pub fn new() -> Self {
        Self::with_markers(DEFAULT_HEADING_MARKER, DEFAULT_TAG_SIGIL)
    }

    /// Creates a parser with custom heading marker and tag sigil.
    pub fn with_markers(heading_marker: &str, tag_sigil: &str) -> Self {
        // Boundary-anchored so a sigil inside another word never matches.
        let tag_re = Regex::new(&format!(
            r"(?:^|\s+){}(\w+)\b",
            regex::escape(tag_sigil)
        ))
        .expect("valid tag regex");
        Self {
            heading_marker: heading_marker.to_string(),
            tag_sigil: tag_sigil.to_string(),
            tag_re,
        }
    }

    /// Returns the source form of a tag, sigil included.
    pub fn tag_token(&self, tag: &str) -> String {
        format!("{}{tag}", self.tag_sigil)
    }

    /// Parses one Markdown file into `(prefix, entries)`.
    ///
    /// `untagged_tag` — when `Some`, entries with zero tag tokens get this
    /// single synthetic label so every entry stays tag-addressable.
    /// `origin_dir` — when `Some`, every line (prefix and content) is passed
    /// through the link rewriter with this directory as origin.
    ///
    /// # Errors
    /// - `ParseError::Io` when the file cannot be read.
    /// - `ParseError::InvalidHeadingDate` on a date-shaped heading that fails
    ///   calendar validation; the whole file parse is abandoned.
    /// - `ParseError::OutsideNotebookRoot` when `path` does not live under
    ///   `notebook_root`.
    /// - `ParseError::Link` when a rewritten link escapes the notebook root.
    pub fn parse_file(
        &self,
        path: &Path,
        notebook_root: &Path,
        untagged_tag: Option<&str>,
        origin_dir: Option<&Path>,
    ) -> ParseResult<ParsedFile> {
        let relative = path
            .strip_prefix(notebook_root)
            .map_err(|_| ParseError::OutsideNotebookRoot {
                path: path.to_path_buf(),
            })?;
        let relative_posix = path_to_posix(relative);

        let text = fs::read_to_string(path).map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut prefix: Vec<String> = Vec::new();
        let mut entries: Vec<SharedEntry> = Vec::new();
        let mut current: Option<OpenEntry> = None;

        for (index, raw_line) in text.lines().enumerate() {
            let mut line = raw_line.trim_end().to_string();
            if let Some(origin) = origin_dir {
                line = rewrite_links(&line, notebook_root, origin, None)?;
            }

            if let Some(heading_date) = self.match_heading(&line, path, index + 1)? {
                if let Some(open) = current.take() {
                    entries.push(open.close(untagged_tag, &relative_posix));
                }
                let tags = self.find_tags(&line);
                current = Some(OpenEntry {
                    date: heading_date,
                    content: vec![line],
                    tags,
                    position: index + 1,
                });
            } else {
                match current.as_mut() {
                    Some(open) => {
                        open.tags.extend(self.find_tags(&line));
                        open.content.push(line);
                    }
                    None => prefix.push(line),
                }
            }
        }

        if let Some(open) = current.take() {
            entries.push(open.close(untagged_tag, &relative_posix));
        }

        debug!(
            "event=parse_file module=parse status=ok path={relative_posix} entries={} prefix_lines={}",
            entries.len(),
            prefix.len()
        );

        Ok(ParsedFile { prefix, entries })
    }

    /// Returns the heading timestamp when `line` is an entry heading.
    fn match_heading(
        &self,
        line: &str,
        path: &Path,
        line_number: usize,
    ) -> ParseResult<Option<NaiveDateTime>> {
        let Some(rest) = line.strip_prefix(&self.heading_marker) else {
            return Ok(None);
        };
        let candidate = rest.trim_start();

        for (pattern, format) in HEADING_DATE_PATTERNS.iter() {
            if let Some(caps) = pattern.captures(candidate) {
                let date_text = &caps[1];
                let date = parse_heading_date(date_text, *format).map_err(|source| {
                    ParseError::InvalidHeadingDate {
                        path: path.to_path_buf(),
                        line_number,
                        text: line.to_string(),
                        source,
                    }
                })?;
                return Ok(Some(date));
            }
        }
        Ok(None)
    }

    fn find_tags(&self, line: &str) -> Vec<String> {
        self.tag_re
            .captures_iter(line)
            .map(|caps| caps[1].to_string())
            .collect()
    }
}

fn parse_heading_date(
    text: &str,
    format: HeadingDateFormat,
) -> Result<NaiveDateTime, chrono::ParseError> {
    match format {
        HeadingDateFormat::DateMinute => NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M"),
        HeadingDateFormat::DateOnly => {
            NaiveDate::parse_from_str(text, "%Y-%m-%d").map(at_midnight)
        }
        HeadingDateFormat::Compact => NaiveDate::parse_from_str(text, "%Y%m%d").map(at_midnight),
    }
}

fn at_midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(0, 0, 0).expect("midnight is always valid")
}

struct OpenEntry {
    date: NaiveDateTime,
    content: Vec<String>,
    tags: Vec<String>,
    position: usize,
}

impl OpenEntry {
    fn close(mut self, untagged_tag: Option<&str>, relative_posix: &str) -> SharedEntry {
        while matches!(self.content.last(), Some(line) if line.trim().is_empty()) {
            self.content.pop();
        }
        if self.tags.is_empty() {
            if let Some(label) = untagged_tag {
                self.tags.push(label.to_string());
            }
        }
        Entry {
            date: self.date,
            content: self.content,
            tags: self.tags,
            location: Some(format!("/{relative_posix}#L{}", self.position)),
            position: self.position,
        }
        .into_shared()
    }
}

fn path_to_posix(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
