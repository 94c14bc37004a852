//! Tool surface over the [`TaskManager`].
//!
//! Tools take a JSON argument object with camelCase field names and return
//! JSON data. The name -> handler table is built once by
//! [`ToolRegistry::new`]; dispatch is a map lookup.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{Error, JsonError, Result};
use crate::lifecycle::{NewProject, NewTask, TaskUpdate};
use crate::manager::TaskManager;
use crate::model::{parse_state_filter, ProjectState, TaskState};
use crate::store::{JsonFileStore, StateStore};

pub type ToolHandler<S> = fn(&TaskManager<S>, Value) -> Result<Value>;

pub struct Tool<S: StateStore> {
    pub name: &'static str,
    pub description: &'static str,
    pub mutating: bool,
    handler: ToolHandler<S>,
}

/// Catalogue entry for a tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub mutating: bool,
}

/// Result of a tool call as returned to transport callers
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolOutcome {
    Success { data: Value },
    Error { error: JsonError },
}

impl ToolOutcome {
    pub fn from_result(result: Result<Value>) -> Self {
        match result {
            Ok(data) => ToolOutcome::Success { data },
            Err(err) => ToolOutcome::Error {
                error: JsonError::from(&err),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolOutcome::Success { .. })
    }
}

pub struct ToolRegistry<S: StateStore = JsonFileStore> {
    tools: BTreeMap<&'static str, Tool<S>>,
}

impl<S: StateStore> Default for ToolRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: StateStore> ToolRegistry<S> {
    pub fn new() -> Self {
        let table: [Tool<S>; 13] = [
            Tool {
                name: "list_projects",
                description: "List projects, optionally filtered by state (open, pending_approval, completed, all)",
                mutating: false,
                handler: list_projects::<S>,
            },
            Tool {
                name: "read_project",
                description: "Read a project and all of its tasks",
                mutating: false,
                handler: read_project::<S>,
            },
            Tool {
                name: "create_project",
                description: "Create a project from an initial prompt, with optional plan, tasks and autoApprove",
                mutating: true,
                handler: create_project::<S>,
            },
            Tool {
                name: "delete_project",
                description: "Delete a project and its tasks",
                mutating: true,
                handler: delete_project::<S>,
            },
            Tool {
                name: "add_tasks_to_project",
                description: "Append tasks to a project in the given order",
                mutating: true,
                handler: add_tasks_to_project::<S>,
            },
            Tool {
                name: "finalize_project",
                description: "Mark a project completed once every task is done and approved",
                mutating: true,
                handler: finalize_project::<S>,
            },
            Tool {
                name: "list_tasks",
                description: "List tasks, optionally for one project and filtered by state",
                mutating: false,
                handler: list_tasks::<S>,
            },
            Tool {
                name: "read_task",
                description: "Read a single task",
                mutating: false,
                handler: read_task::<S>,
            },
            Tool {
                name: "create_task",
                description: "Append one task to a project",
                mutating: true,
                handler: create_task::<S>,
            },
            Tool {
                name: "update_task",
                description: "Update fields of an unapproved task; done requires completedDetails",
                mutating: true,
                handler: update_task::<S>,
            },
            Tool {
                name: "delete_task",
                description: "Delete an unapproved task",
                mutating: true,
                handler: delete_task::<S>,
            },
            Tool {
                name: "approve_task",
                description: "Approve a done task, freezing it",
                mutating: true,
                handler: approve_task::<S>,
            },
            Tool {
                name: "get_next_task",
                description: "Return the first task in a project that is not yet approved",
                mutating: false,
                handler: get_next_task::<S>,
            },
        ];

        Self {
            tools: table.into_iter().map(|tool| (tool.name, tool)).collect(),
        }
    }

    /// Catalogue of registered tools, sorted by name
    pub fn tools(&self) -> Vec<ToolInfo> {
        self.tools
            .values()
            .map(|tool| ToolInfo {
                name: tool.name,
                description: tool.description,
                mutating: tool.mutating,
            })
            .collect()
    }

    /// Run the named tool
    pub fn call(&self, manager: &TaskManager<S>, name: &str, args: Value) -> Result<Value> {
        crate::lifecycle::require("tool", name)?;
        let tool = self
            .tools
            .get(name.trim())
            .ok_or_else(|| Error::UnknownTool(name.to_string()))?;
        tracing::debug!(tool = tool.name, mutating = tool.mutating, "tool call");
        (tool.handler)(manager, args)
    }

    /// Run the named tool and fold the result into a transport outcome
    pub fn invoke(&self, manager: &TaskManager<S>, name: &str, args: Value) -> ToolOutcome {
        ToolOutcome::from_result(self.call(manager, name, args))
    }
}

// =============================================================================
// Arguments
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectArgs {
    #[serde(default)]
    project_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskArgs {
    #[serde(default)]
    project_id: String,
    #[serde(default)]
    task_id: String,
}

#[derive(Deserialize)]
struct ListProjectsArgs {
    #[serde(default)]
    state: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListTasksArgs {
    #[serde(default)]
    project_id: Option<String>,
    #[serde(default)]
    state: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddTasksArgs {
    #[serde(default)]
    project_id: String,
    #[serde(default)]
    tasks: Vec<NewTask>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTaskArgs {
    #[serde(default)]
    project_id: String,
    #[serde(flatten)]
    task: NewTask,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateTaskArgs {
    #[serde(default)]
    project_id: String,
    #[serde(default)]
    task_id: String,
    #[serde(flatten)]
    update: TaskUpdate,
}

fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T> {
    let args = if args.is_null() { json!({}) } else { args };
    serde_json::from_value(args)
        .map_err(|err| Error::InvalidArgument(format!("invalid arguments for {tool}: {err}")))
}

fn to_data<T: Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

// =============================================================================
// Handlers
// =============================================================================

fn list_projects<S: StateStore>(manager: &TaskManager<S>, args: Value) -> Result<Value> {
    let args: ListProjectsArgs = parse_args("list_projects", args)?;
    let filter: Option<ProjectState> = parse_state_filter(args.state.as_deref())?;
    let projects = manager.list_projects(filter)?;
    Ok(json!({ "projects": projects }))
}

fn read_project<S: StateStore>(manager: &TaskManager<S>, args: Value) -> Result<Value> {
    let args: ProjectArgs = parse_args("read_project", args)?;
    to_data(&manager.read_project(&args.project_id)?)
}

fn create_project<S: StateStore>(manager: &TaskManager<S>, args: Value) -> Result<Value> {
    let new: NewProject = parse_args("create_project", args)?;
    to_data(&manager.create_project(new)?)
}

fn delete_project<S: StateStore>(manager: &TaskManager<S>, args: Value) -> Result<Value> {
    let args: ProjectArgs = parse_args("delete_project", args)?;
    to_data(&manager.delete_project(&args.project_id)?)
}

fn add_tasks_to_project<S: StateStore>(manager: &TaskManager<S>, args: Value) -> Result<Value> {
    let args: AddTasksArgs = parse_args("add_tasks_to_project", args)?;
    let tasks = manager.add_tasks_to_project(&args.project_id, args.tasks)?;
    Ok(json!({ "projectId": args.project_id, "tasks": tasks }))
}

fn finalize_project<S: StateStore>(manager: &TaskManager<S>, args: Value) -> Result<Value> {
    let args: ProjectArgs = parse_args("finalize_project", args)?;
    to_data(&manager.finalize_project(&args.project_id)?)
}

fn list_tasks<S: StateStore>(manager: &TaskManager<S>, args: Value) -> Result<Value> {
    let args: ListTasksArgs = parse_args("list_tasks", args)?;
    let filter: Option<TaskState> = parse_state_filter(args.state.as_deref())?;
    let project_id = args
        .project_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());
    let tasks = manager.list_tasks(project_id, filter)?;
    Ok(json!({ "tasks": tasks }))
}

fn read_task<S: StateStore>(manager: &TaskManager<S>, args: Value) -> Result<Value> {
    let args: TaskArgs = parse_args("read_task", args)?;
    to_data(&manager.read_task(&args.project_id, &args.task_id)?)
}

fn create_task<S: StateStore>(manager: &TaskManager<S>, args: Value) -> Result<Value> {
    let args: CreateTaskArgs = parse_args("create_task", args)?;
    to_data(&manager.create_task(&args.project_id, args.task)?)
}

fn update_task<S: StateStore>(manager: &TaskManager<S>, args: Value) -> Result<Value> {
    let args: UpdateTaskArgs = parse_args("update_task", args)?;
    to_data(&manager.update_task(&args.project_id, &args.task_id, &args.update)?)
}

fn delete_task<S: StateStore>(manager: &TaskManager<S>, args: Value) -> Result<Value> {
    let args: TaskArgs = parse_args("delete_task", args)?;
    to_data(&manager.delete_task(&args.project_id, &args.task_id)?)
}

fn approve_task<S: StateStore>(manager: &TaskManager<S>, args: Value) -> Result<Value> {
    let args: TaskArgs = parse_args("approve_task", args)?;
    to_data(&manager.approve_task(&args.project_id, &args.task_id)?)
}

fn get_next_task<S: StateStore>(manager: &TaskManager<S>, args: Value) -> Result<Value> {
    let args: ProjectArgs = parse_args("get_next_task", args)?;
    to_data(&manager.get_next_task(&args.project_id)?)
}
