//! Orchestration operations.
//!
//! Every operation here is a client of the engine: it parses files, mutates
//! the returned entry lists in memory, and writes them back. No operation
//! keeps state between runs beyond `.notes.json`.

pub mod archive;
pub mod compile;
pub mod find;
pub mod handout;
pub mod sort;
pub mod tag_recent;

use crate::links::LinkError;
use crate::notebook::ConfigError;
use crate::parse::ParseError;
use crate::write::WriteError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::{Component, Path, PathBuf};

pub use archive::{archive_entries, ArchiveReport, STICKY_TAG};
pub use compile::{compile_notes, CompileOptions, CompileReport};
pub use find::{find_entries, FindOptions, FindReport, FoundEntry};
pub use handout::{compile_handout, HandoutOptions, HandoutReport};
pub use sort::sort_journal;
pub use tag_recent::{tag_recent_entries, RECENT_TAG};

pub type OpResult<T> = Result<T, OpError>;

/// Fatal error surfaced by an orchestration operation.
#[derive(Debug)]
pub enum OpError {
    Parse(ParseError),
    Write(WriteError),
    Link(LinkError),
    Config(ConfigError),
    Io { path: PathBuf, source: io::Error },
}

impl Display for OpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "{err}"),
            Self::Write(err) => write!(f, "{err}"),
            Self::Link(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
            Self::Io { path, source } => write!(f, "io error at `{}`: {source}", path.display()),
        }
    }
}

impl Error for OpError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Write(err) => Some(err),
            Self::Link(err) => Some(err),
            Self::Config(err) => Some(err),
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<ParseError> for OpError {
    fn from(value: ParseError) -> Self {
        Self::Parse(value)
    }
}

impl From<WriteError> for OpError {
    fn from(value: WriteError) -> Self {
        Self::Write(value)
    }
}

impl From<LinkError> for OpError {
    fn from(value: LinkError) -> Self {
        Self::Link(value)
    }
}

impl From<ConfigError> for OpError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

/// Wraps an io error with the path it happened at.
pub(crate) fn io_at(path: &Path) -> impl Fn(io::Error) -> OpError + '_ {
    move |source| OpError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Renders `path` relative to `root` with `/` separators, for reports.
pub(crate) fn rel_posix(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
