//! Persistence of the whole [`State`] document.
//!
//! A store loads and saves the entire state at once; there is no partial
//! persistence. [`JsonFileStore`] is the on-disk implementation:
//!
//! ```text
//! <dir>/
//!   tasks.json        # pretty-printed state document
//!   tasks.json.lock   # advisory lock held for each load-mutate-save
//! ```
//!
//! A missing (or blank) file loads as the empty state. Saves go through
//! [`crate::lock::write_atomic`], so a reader never sees a torn file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::lock::{self, FileLock, DEFAULT_LOCK_TIMEOUT_MS};
use crate::model::State;

/// Backing medium for the state document.
///
/// Callers hold the guard returned by [`StateStore::lock`] across a full
/// load-validate-save sequence.
pub trait StateStore: Send {
    type Guard;

    fn lock(&self) -> Result<Self::Guard>;

    fn load(&self) -> Result<State>;

    fn save(&mut self, state: &State) -> Result<()>;
}

/// State stored as a single JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    lock_timeout_ms: u64,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }

    pub fn with_lock_timeout(mut self, timeout_ms: u64) -> Self {
        self.lock_timeout_ms = timeout_ms;
        self
    }

    /// Path to the state document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path to the sidecar lock file
    pub fn lock_path(&self) -> PathBuf {
        lock::lock_path_for(&self.path)
    }
}

impl StateStore for JsonFileStore {
    type Guard = FileLock;

    fn lock(&self) -> Result<FileLock> {
        FileLock::acquire(self.lock_path(), self.lock_timeout_ms)
    }

    fn load(&self) -> Result<State> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "state file missing; starting empty");
                return Ok(State::default());
            }
            Err(err) => return Err(Error::Io(err)),
        };

        if content.trim().is_empty() {
            return Ok(State::default());
        }

        serde_json::from_str(&content).map_err(|source| Error::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&mut self, state: &State) -> Result<()> {
        let json = serde_json::to_string_pretty(state)?;
        lock::write_atomic(&self.path, json.as_bytes())?;
        tracing::debug!(
            path = %self.path.display(),
            projects = state.projects.len(),
            "state saved"
        );
        Ok(())
    }
}

/// State kept in memory; counts saves so callers can observe persistence.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: State,
    saves: usize,
}

impl MemoryStore {
    /// Number of successful `save` calls so far
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl StateStore for MemoryStore {
    type Guard = ();

    fn lock(&self) -> Result<()> {
        Ok(())
    }

    fn load(&self) -> Result<State> {
        Ok(self.state.clone())
    }

    fn save(&mut self, state: &State) -> Result<()> {
        self.state = state.clone();
        self.saves += 1;
        Ok(())
    }
}
