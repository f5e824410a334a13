//! Per-notebook `.notes.json` configuration.
//!
//! # Responsibility
//! - Persist `lastrun_timestamp` so incremental runs can skip unchanged
//!   files.
//! - Round-trip unknown keys untouched.
//!
//! # Invariants
//! - A missing config file loads as the default config, never an error.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub const CONFIG_FILE_NAME: &str = ".notes.json";

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Error while loading or storing the notebook config.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: io::Error },
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot access config `{}`: {source}", path.display())
            }
            Self::Json { path, source } => {
                write!(f, "malformed config `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
        }
    }
}

/// Contents of `<notebook>/.notes.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotebookConfig {
    /// Unix epoch seconds of the last compile run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastrun_timestamp: Option<f64>,
    /// Keys owned by other tools; preserved verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl NotebookConfig {
    fn path_in(notebook_root: &Path) -> PathBuf {
        notebook_root.join(CONFIG_FILE_NAME)
    }

    /// Loads the config from the notebook root, defaulting when absent.
    pub fn load(notebook_root: &Path) -> ConfigResult<Self> {
        let path = Self::path_in(notebook_root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Json { path, source })
    }

    /// Writes the config back, pretty-printed.
    pub fn store(&self, notebook_root: &Path) -> ConfigResult<()> {
        let path = Self::path_in(notebook_root);
        let text = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, text).map_err(|source| ConfigError::Io { path, source })
    }

    /// Stamps the config with the current wall-clock time.
    pub fn touch_lastrun(&mut self) {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        self.lastrun_timestamp = Some(now.as_secs_f64());
    }

    /// Returns the last-run moment as a `SystemTime`, when recorded.
    pub fn lastrun_system_time(&self) -> Option<SystemTime> {
        self.lastrun_timestamp
            .map(|secs| UNIX_EPOCH + std::time::Duration::from_secs_f64(secs.max(0.0)))
    }
}
