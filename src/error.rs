//! Error types for taskqueue
//!
//! Every failure belongs to exactly one [`ErrorKind`], which is what the
//! operation surface reports to callers.
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (missing field, invalid value, unknown id, bad config)
//! - 3: Blocked (mutation of an approved task)
//! - 4: Operation failed (corrupt state file, I/O, lock timeout)

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Exit codes for the taskqueue CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const BLOCKED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Error category reported to callers of the operation surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    #[serde(rename = "ValidationError")]
    Validation,
    #[serde(rename = "NotFoundError")]
    NotFound,
    #[serde(rename = "ParseError")]
    Parse,
    #[serde(rename = "ConflictError")]
    Conflict,
    #[serde(rename = "StorageError")]
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "ValidationError",
            ErrorKind::NotFound => "NotFoundError",
            ErrorKind::Parse => "ParseError",
            ErrorKind::Conflict => "ConflictError",
            ErrorKind::Storage => "StorageError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for taskqueue operations
#[derive(Error, Debug)]
pub enum Error {
    // Validation (exit code 2)
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Project {project_id} cannot be finalized; blocking tasks: {}", .blocking.join(", "))]
    FinalizeBlocked {
        project_id: String,
        blocking: Vec<String>,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    // Not found (exit code 2)
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Task not found: {task_id} in project {project_id}")]
    TaskNotFound { project_id: String, task_id: String },

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    // Conflicts (exit code 3)
    #[error("Task {0} is approved and can no longer be modified")]
    TaskFrozen(String),

    #[error("Task {0} is already approved")]
    AlreadyApproved(String),

    // Operation failures (exit code 4)
    #[error("Failed to parse state file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("Operation failed: {0}")]
    OperationFailed(String),

    #[error("No {0}<n> identifiers left to allocate")]
    IdSpaceExhausted(String),
}

impl Error {
    /// Category of this error as seen by tool callers
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingField(_)
            | Error::InvalidArgument(_)
            | Error::FinalizeBlocked { .. }
            | Error::InvalidConfig(_)
            | Error::TomlParse(_) => ErrorKind::Validation,

            Error::ProjectNotFound(_) | Error::TaskNotFound { .. } | Error::UnknownTool(_) => {
                ErrorKind::NotFound
            }

            Error::TaskFrozen(_) | Error::AlreadyApproved(_) => ErrorKind::Conflict,

            Error::Parse { .. } => ErrorKind::Parse,

            Error::Io(_)
            | Error::Json(_)
            | Error::LockFailed(_)
            | Error::OperationFailed(_)
            | Error::IdSpaceExhausted(_) => ErrorKind::Storage,
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::NotFound => exit_codes::USER_ERROR,
            ErrorKind::Conflict => exit_codes::BLOCKED,
            ErrorKind::Parse | ErrorKind::Storage => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured fields for machine consumers
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::MissingField(field) => Some(json!({ "field": field })),
            Error::FinalizeBlocked {
                project_id,
                blocking,
            } => Some(json!({ "projectId": project_id, "blockingTasks": blocking })),
            Error::ProjectNotFound(project_id) => Some(json!({ "projectId": project_id })),
            Error::TaskNotFound {
                project_id,
                task_id,
            } => Some(json!({ "projectId": project_id, "taskId": task_id })),
            Error::TaskFrozen(task_id) | Error::AlreadyApproved(task_id) => {
                Some(json!({ "taskId": task_id }))
            }
            Error::UnknownTool(name) => Some(json!({ "tool": name })),
            Error::IdSpaceExhausted(prefix) => Some(json!({ "prefix": prefix })),
            Error::Parse { path, .. } | Error::LockFailed(path) => {
                Some(json!({ "path": path.display().to_string() }))
            }
            _ => None,
        }
    }
}

/// Result type alias for taskqueue operations
pub type Result<T> = std::result::Result<T, Error>;

/// Structured `{kind, message}` error body
#[derive(Debug, Clone, serde::Serialize)]
pub struct JsonError {
    pub kind: ErrorKind,
    pub message: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            kind: err.kind(),
            message: err.to_string(),
            code: err.exit_code(),
            details: err.details(),
        }
    }
}
