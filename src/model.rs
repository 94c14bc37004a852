//! Persisted data model.
//!
//! The whole state is one JSON document:
//!
//! ```text
//! { "projects": [ { "projectId": "proj-1", ..., "tasks": [ { "id": "task-1", ... } ] } ] }
//! ```
//!
//! Field names are camelCase on the wire. The `projectCounter` and
//! `taskCounter` fields record the highest ID number ever handed out in
//! their scope (see [`crate::ids`]).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Aggregate root: every project, in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub project_counter: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "projectId")]
    pub id: String,
    pub initial_prompt: String,
    pub project_plan: String,
    #[serde(default)]
    pub auto_approve: bool,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub task_counter: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub approved: bool,
    #[serde(default)]
    pub completed_details: String,
    #[serde(default)]
    pub tool_recommendations: String,
    #[serde(default)]
    pub rule_recommendations: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "not started")]
    NotStarted,
    #[serde(rename = "in progress")]
    InProgress,
    #[serde(rename = "done")]
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "not started",
            TaskStatus::InProgress => "in progress",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim() {
            "not started" => Ok(TaskStatus::NotStarted),
            "in progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            other => Err(Error::InvalidArgument(format!(
                "unknown task status '{other}' (expected 'not started', 'in progress' or 'done')"
            ))),
        }
    }
}

/// Derived classification of a project, used by `list_projects`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectState {
    Open,
    PendingApproval,
    Completed,
}

/// Derived classification of a task, used by `list_tasks`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Open,
    PendingApproval,
    Completed,
}

/// Parse a list filter. `None`, empty and `all` disable filtering.
pub fn parse_state_filter<T: FromStr<Err = Error>>(value: Option<&str>) -> Result<Option<T>> {
    match value.map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(raw) => raw.parse().map(Some),
    }
}

fn unknown_state(value: &str) -> Error {
    Error::InvalidArgument(format!(
        "unknown state filter '{value}' (expected open, pending_approval, completed or all)"
    ))
}

impl FromStr for ProjectState {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim() {
            "open" => Ok(ProjectState::Open),
            "pending_approval" => Ok(ProjectState::PendingApproval),
            "completed" => Ok(ProjectState::Completed),
            other => Err(unknown_state(other)),
        }
    }
}

impl FromStr for TaskState {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim() {
            "open" => Ok(TaskState::Open),
            "pending_approval" => Ok(TaskState::PendingApproval),
            "completed" => Ok(TaskState::Completed),
            other => Err(unknown_state(other)),
        }
    }
}

/// List view of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub project_id: String,
    pub initial_prompt: String,
    pub project_plan: String,
    pub auto_approve: bool,
    pub completed: bool,
    pub state: ProjectState,
    pub total_tasks: usize,
    pub done_tasks: usize,
    pub approved_tasks: usize,
}

impl From<&Project> for ProjectSummary {
    fn from(project: &Project) -> Self {
        Self {
            project_id: project.id.clone(),
            initial_prompt: project.initial_prompt.clone(),
            project_plan: project.project_plan.clone(),
            auto_approve: project.auto_approve,
            completed: project.completed,
            state: project.state(),
            total_tasks: project.tasks.len(),
            done_tasks: project
                .tasks
                .iter()
                .filter(|task| task.status == TaskStatus::Done)
                .count(),
            approved_tasks: project.tasks.iter().filter(|task| task.approved).count(),
        }
    }
}

/// List view of a task, tagged with its owning project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskEntry {
    pub project_id: String,
    #[serde(flatten)]
    pub task: Task,
    pub state: TaskState,
}

/// Result of `get_next_task`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NextTask {
    NextTask { task: Task },
    AllTasksApproved { message: String },
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}
