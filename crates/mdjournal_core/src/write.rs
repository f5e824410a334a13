//! Entry serialization.
//!
//! # Responsibility
//! - Write a prefix and a set of entries back to disk as Markdown.
//! - Enforce the one canonical on-disk order (sorted by date).
//!
//! # Invariants
//! - Append mode with a non-empty prefix is rejected before any byte is
//!   written; prefixes only make sense on a full rewrite.
//! - Caller-supplied entry order is never trusted.
//! - A file produced here re-parses into equal `(date, tags, content)`
//!   tuples, modulo source footers and synthetic untagged labels.

use crate::model::SharedEntry;
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// How the destination file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Replace the file contents.
    Truncate,
    /// Append after the existing contents.
    Append,
}

pub type WriteResult<T> = Result<T, WriteError>;

/// Fatal error while serializing entries.
#[derive(Debug)]
pub enum WriteError {
    /// Append mode was requested together with a non-empty prefix.
    PrefixWithAppend { path: PathBuf },
    Io { path: PathBuf, source: io::Error },
}

impl Display for WriteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PrefixWithAppend { path } => write!(
                f,
                "refusing to append to `{}` with a non-empty prefix",
                path.display()
            ),
            Self::Io { path, source } => {
                write!(f, "cannot write `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for WriteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::PrefixWithAppend { .. } => None,
            Self::Io { source, .. } => Some(source),
        }
    }
}

/// Serializes `prefix` and `entries` to `path`.
///
/// Entries are sorted by date, ascending, or descending when `reverse` is
/// set. When `source_footer` is set, every entry that still carries a
/// location gets a `[source: <loc>](<loc>)` backlink line.
///
/// # Errors
/// - `WriteError::PrefixWithAppend` on the documented precondition
///   violation; nothing is written.
/// - `WriteError::Io` on filesystem failures.
pub fn write_file(
    path: &Path,
    prefix: &[String],
    entries: &[SharedEntry],
    mode: WriteMode,
    reverse: bool,
    source_footer: bool,
) -> WriteResult<()> {
    if mode == WriteMode::Append && !prefix.is_empty() {
        return Err(WriteError::PrefixWithAppend {
            path: path.to_path_buf(),
        });
    }

    let mut sorted: Vec<SharedEntry> = entries.to_vec();
    if reverse {
        sorted.sort_by(|a, b| b.borrow().date.cmp(&a.borrow().date));
    } else {
        sorted.sort_by(|a, b| a.borrow().date.cmp(&b.borrow().date));
    }

    let io_err = |source: io::Error| WriteError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = match mode {
        WriteMode::Truncate => OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path),
        WriteMode::Append => OpenOptions::new().append(true).create(true).open(path),
    }
    .map_err(io_err)?;
    let mut out = BufWriter::new(file);

    let mut write = |text: &str| -> WriteResult<()> {
        out.write_all(text.as_bytes()).map_err(io_err)?;
        out.write_all(b"\n").map_err(io_err)
    };

    for line in prefix {
        write(line)?;
    }

    for entry in &sorted {
        let entry = entry.borrow();
        for line in &entry.content {
            write(line)?;
        }
        if source_footer {
            if let Some(location) = entry.location.as_deref() {
                write(&format!("[source: {location}]({location})"))?;
            }
        }
        write("")?;
    }

    out.flush().map_err(io_err)?;

    debug!(
        "event=write_file module=write status=ok path={} entries={} mode={mode:?}",
        path.display(),
        sorted.len()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{write_file, WriteError, WriteMode};
    use std::path::Path;

    #[test]
    fn append_with_prefix_is_rejected_before_any_write() {
        let target = Path::new("/nonexistent-dir/never-created.md");
        let err = write_file(
            target,
            &["front matter".to_string()],
            &[],
            WriteMode::Append,
            false,
            false,
        )
        .unwrap_err();
        assert!(matches!(err, WriteError::PrefixWithAppend { .. }));
        assert!(!target.exists());
    }
}
