//! Domain model for parsed journal data.

pub mod entry;

pub use entry::{Entry, ParsedFile, SharedEntry, ENTRY_ID_FORMAT};
