//! Core engine for a Markdown journal notebook.
//!
//! Parses date-stamped entries out of Markdown files, extracts sigil tags,
//! tracks line provenance for backlinks, rewrites relative links when
//! content moves, and serializes entries back deterministically. The `ops`
//! module holds the orchestration clients (compile, archive, handout,
//! search, regroup) built on that engine.

pub mod index;
pub mod links;
pub mod logging;
pub mod model;
pub mod notebook;
pub mod ops;
pub mod parse;
pub mod write;

pub use index::{ensure_tag_file_path, tag_relative_path, TagIndex};
pub use links::{rewrite_links, LinkError, LinkResult};
pub use logging::{default_log_level, init_logging};
pub use model::{Entry, ParsedFile, SharedEntry, ENTRY_ID_FORMAT};
pub use parse::{
    ParseError, ParseResult, Parser, DEFAULT_HEADING_MARKER, DEFAULT_TAG_SIGIL,
    DEFAULT_UNTAGGED_TAG,
};
pub use write::{write_file, WriteError, WriteMode, WriteResult};

/// File extension shared by every notebook document.
pub const MARKDOWN_SUFFIX: &str = ".md";
/// Folder that holds archived entries, excluded from scans.
pub const ARCHIVE_FOLDERNAME: &str = "_Archive";
/// Separator splitting a tag into nested namespace components.
pub const TAG_NAMESPACE_SEPARATOR: &str = "_";

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
