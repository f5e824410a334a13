//! Quarter journal files.
//!
//! # Responsibility
//! - Quarter math and `<YYYY>-Q<1-4>.md` file naming.
//! - Auto-creation of the current quarter file with a single header line.

use crate::MARKDOWN_SUFFIX;
use chrono::{Datelike, NaiveDate};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Returns the calendar quarter (1-4) of `date`.
pub fn quarter_of(date: NaiveDate) -> u32 {
    (date.month() - 1) / 3 + 1
}

/// Returns the quarter file name for `date`, e.g. `2024-Q3.md`.
pub fn quarter_file_name(date: NaiveDate, file_prefix: &str) -> String {
    format!(
        "{file_prefix}{}-Q{}{MARKDOWN_SUFFIX}",
        date.year(),
        quarter_of(date)
    )
}

/// Ensures the quarter file for `date` exists under `journal_dir`.
///
/// A missing file is created with a single `# <name>` header line.
pub fn ensure_quarter_file(
    journal_dir: &Path,
    date: NaiveDate,
    file_prefix: &str,
) -> io::Result<PathBuf> {
    let name = quarter_file_name(date, file_prefix);
    let path = journal_dir.join(&name);
    if !path.exists() {
        fs::create_dir_all(journal_dir)?;
        fs::write(&path, format!("# {name}\n\n"))?;
    }
    Ok(path)
}
