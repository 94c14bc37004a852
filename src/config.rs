//! Configuration loading and management
//!
//! Handles the optional `config.toml` and the `TASK_MANAGER_FILE_PATH`
//! override. The backing file is chosen in this order:
//!
//! 1. explicit path (CLI `--file`)
//! 2. `TASK_MANAGER_FILE_PATH`
//! 3. `file_path` in the config file
//! 4. `<data dir>/tasks.json` from the platform conventions

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::lock::DEFAULT_LOCK_TIMEOUT_MS;

/// Environment variable selecting the backing file
pub const FILE_PATH_ENV: &str = "TASK_MANAGER_FILE_PATH";

/// Environment variable selecting the config file
pub const CONFIG_PATH_ENV: &str = "TASKQUEUE_CONFIG";

/// Default name of the state document inside the data directory
pub const DEFAULT_FILE_NAME: &str = "tasks.json";

const CONFIG_FILE_NAME: &str = "config.toml";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Location of the state document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,

    /// How long to wait for the state file lock
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            file_path: None,
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

fn default_lock_timeout_ms() -> u64 {
    DEFAULT_LOCK_TIMEOUT_MS
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "taskqueue")
}

/// Platform default for the state document
pub fn default_file_path() -> Result<PathBuf> {
    project_dirs()
        .map(|dirs| dirs.data_dir().join(DEFAULT_FILE_NAME))
        .ok_or_else(|| {
            Error::InvalidConfig(format!(
                "no home directory found; set {FILE_PATH_ENV} to choose a task file"
            ))
        })
}

/// Platform default for the config file, if a home directory exists
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, else from the platform config file when it
    /// exists, else defaults.
    ///
    /// An explicitly named file must exist.
    pub fn discover(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Apply a file path override, ignoring empty values
    pub fn with_file_path(mut self, path: Option<OsString>) -> Self {
        if let Some(path) = path.filter(|value| !value.is_empty()) {
            self.file_path = Some(PathBuf::from(path));
        }
        self
    }

    /// Apply `TASK_MANAGER_FILE_PATH` from the process environment
    pub fn with_env(self) -> Self {
        self.with_file_path(std::env::var_os(FILE_PATH_ENV))
    }

    /// Backing file path after all overrides
    pub fn resolve_file_path(&self) -> Result<PathBuf> {
        match &self.file_path {
            Some(path) => Ok(path.clone()),
            None => default_file_path(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.lock_timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "lock_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self
            .file_path
            .as_ref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            return Err(Error::InvalidConfig(
                "file_path cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
