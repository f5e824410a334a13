//! Notebook-level helpers: per-notebook config, quarter files, file
//! discovery.

pub mod config;
pub mod quarter;
pub mod scan;

pub use config::{ConfigError, ConfigResult, NotebookConfig, CONFIG_FILE_NAME};
pub use quarter::{ensure_quarter_file, quarter_file_name, quarter_of};
pub use scan::markdown_files;
