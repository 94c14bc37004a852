//! taskqueue - file-backed project and task tracking
//!
//! This library provides the core of the taskqueue CLI: a persistent
//! store of projects and ordered tasks, with approval and finalization
//! gates, exposed as a set of named JSON tools.
//!
//! # Core Concepts
//!
//! - **Projects**: an initial prompt, a plan and an ordered task list
//! - **Tasks**: `not started` / `in progress` / `done`, frozen once approved
//! - **Finalization**: a project closes only when every task is done and approved
//! - **Tools**: named operations taking and returning JSON
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap, plus the JSON-lines server
//! - `config`: Configuration loading from `config.toml` and the environment
//! - `error`: Error types, error kinds and result aliases
//! - `ids`: `proj-<n>` / `task-<n>` allocation
//! - `lifecycle`: Task and project state rules
//! - `lock`: File locking and atomic writes
//! - `manager`: Serialized operations over a store
//! - `model`: Persisted document and response types
//! - `output`: Shared CLI output formatting
//! - `store`: Whole-document persistence
//! - `tools`: Tool registry and argument handling

pub mod cli;
pub mod config;
pub mod error;
pub mod ids;
pub mod lifecycle;
pub mod lock;
pub mod manager;
pub mod model;
pub mod output;
pub mod store;
pub mod tools;

pub use error::{Error, ErrorKind, Result};
pub use manager::TaskManager;
pub use store::{JsonFileStore, MemoryStore, StateStore};
pub use tools::ToolRegistry;
