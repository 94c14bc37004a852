//! Task manager: the named operations over a [`StateStore`].
//!
//! Each operation runs end-to-end under the manager's mutex and the store's
//! own guard: load, validate, mutate, save. A rejected operation returns
//! before `save`, so the backing store only ever sees fully applied changes.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::ids;
use crate::lifecycle::{require, NewProject, NewTask, TaskUpdate};
use crate::model::{
    NextTask, Project, ProjectState, ProjectSummary, State, Task, TaskEntry, TaskState,
};
use crate::store::{JsonFileStore, StateStore};

const ALL_TASKS_APPROVED: &str = "All tasks have been completed and approved.";

/// Serialized access to the project/task state.
#[derive(Debug)]
pub struct TaskManager<S: StateStore = JsonFileStore> {
    store: Mutex<S>,
}

impl TaskManager<JsonFileStore> {
    /// Manager over the JSON file at `path` with default settings
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(JsonFileStore::new(path))
    }

    /// Manager over the file selected by `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let path = config.resolve_file_path()?;
        tracing::debug!(path = %path.display(), "opening task store");
        Ok(Self::new(
            JsonFileStore::new(path).with_lock_timeout(config.lock_timeout_ms),
        ))
    }
}

impl<S: StateStore> TaskManager<S> {
    pub fn new(store: S) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }

    // =========================================================================
    // Projects
    // =========================================================================

    pub fn create_project(&self, new: NewProject) -> Result<Project> {
        new.validate()?;
        self.mutate("create_project", |state| {
            let project_id = ids::next_project_id(state)?;
            let (mut project, tasks) = new.into_project(project_id);
            for task in tasks {
                let task_id = ids::next_task_id(&mut project)?;
                project.tasks.push(task.into_task(task_id));
            }
            tracing::info!(
                project_id = %project.id,
                tasks = project.tasks.len(),
                auto_approve = project.auto_approve,
                "project created"
            );
            state.projects.push(project.clone());
            Ok(project)
        })
    }

    pub fn read_project(&self, project_id: &str) -> Result<Project> {
        require("projectId", project_id)?;
        self.read(|state| find_project(state, project_id).cloned())
    }

    pub fn delete_project(&self, project_id: &str) -> Result<Project> {
        require("projectId", project_id)?;
        self.mutate("delete_project", |state| {
            let index = state
                .projects
                .iter()
                .position(|project| project.id == project_id)
                .ok_or_else(|| Error::ProjectNotFound(project_id.to_string()))?;
            Ok(state.projects.remove(index))
        })
    }

    pub fn add_tasks_to_project(&self, project_id: &str, tasks: Vec<NewTask>) -> Result<Vec<Task>> {
        require("projectId", project_id)?;
        if tasks.is_empty() {
            return Err(Error::MissingField("tasks".to_string()));
        }
        tasks.iter().try_for_each(NewTask::validate)?;

        self.mutate("add_tasks_to_project", |state| {
            let project = find_project_mut(state, project_id)?;
            project.ensure_not_completed()?;
            let mut added = Vec::with_capacity(tasks.len());
            for new in tasks {
                let task_id = ids::next_task_id(project)?;
                let task = new.into_task(task_id);
                added.push(task.clone());
                project.tasks.push(task);
            }
            Ok(added)
        })
    }

    pub fn finalize_project(&self, project_id: &str) -> Result<Project> {
        require("projectId", project_id)?;
        self.mutate("finalize_project", |state| {
            let project = find_project_mut(state, project_id)?;
            project.finalize()?;
            tracing::info!(project_id, "project finalized");
            Ok(project.clone())
        })
    }

    pub fn list_projects(&self, filter: Option<ProjectState>) -> Result<Vec<ProjectSummary>> {
        self.read(|state| {
            Ok(state
                .projects
                .iter()
                .filter(|project| filter.map_or(true, |wanted| project.state() == wanted))
                .map(ProjectSummary::from)
                .collect())
        })
    }

    // =========================================================================
    // Tasks
    // =========================================================================

    pub fn create_task(&self, project_id: &str, new: NewTask) -> Result<Task> {
        let mut added = self.add_tasks_to_project(project_id, vec![new])?;
        added
            .pop()
            .ok_or_else(|| Error::OperationFailed("task was not created".to_string()))
    }

    pub fn read_task(&self, project_id: &str, task_id: &str) -> Result<Task> {
        require("projectId", project_id)?;
        require("taskId", task_id)?;
        self.read(|state| find_project(state, project_id)?.task(task_id).cloned())
    }

    pub fn update_task(&self, project_id: &str, task_id: &str, update: &TaskUpdate) -> Result<Task> {
        require("projectId", project_id)?;
        require("taskId", task_id)?;
        self.mutate("update_task", |state| {
            let project = find_project_mut(state, project_id)?;
            let auto_approve = project.auto_approve;
            let task = project.task_mut(task_id)?;
            task.apply_update(update, auto_approve)?;
            tracing::debug!(project_id, task_id, status = %task.status, approved = task.approved, "task updated");
            Ok(task.clone())
        })
    }

    pub fn delete_task(&self, project_id: &str, task_id: &str) -> Result<Task> {
        require("projectId", project_id)?;
        require("taskId", task_id)?;
        self.mutate("delete_task", |state| {
            find_project_mut(state, project_id)?.remove_task(task_id)
        })
    }

    pub fn approve_task(&self, project_id: &str, task_id: &str) -> Result<Task> {
        require("projectId", project_id)?;
        require("taskId", task_id)?;
        self.mutate("approve_task", |state| {
            let task = find_project_mut(state, project_id)?.task_mut(task_id)?;
            task.approve()?;
            tracing::info!(project_id, task_id, "task approved");
            Ok(task.clone())
        })
    }

    pub fn get_next_task(&self, project_id: &str) -> Result<NextTask> {
        require("projectId", project_id)?;
        self.read(|state| {
            let project = find_project(state, project_id)?;
            Ok(match project.next_task() {
                Some(task) => NextTask::NextTask { task: task.clone() },
                None => NextTask::AllTasksApproved {
                    message: ALL_TASKS_APPROVED.to_string(),
                },
            })
        })
    }

    pub fn list_tasks(
        &self,
        project_id: Option<&str>,
        filter: Option<TaskState>,
    ) -> Result<Vec<TaskEntry>> {
        self.read(|state| {
            let projects: Vec<&Project> = match project_id {
                Some(project_id) => vec![find_project(state, project_id)?],
                None => state.projects.iter().collect(),
            };

            Ok(projects
                .into_iter()
                .flat_map(|project| {
                    project.tasks.iter().map(|task| TaskEntry {
                        project_id: project.id.clone(),
                        task: task.clone(),
                        state: task.state(),
                    })
                })
                .filter(|entry| filter.map_or(true, |wanted| entry.state == wanted))
                .collect())
        })
    }

    // =========================================================================
    // Locked access
    // =========================================================================

    fn lock_store(&self) -> MutexGuard<'_, S> {
        // State is reloaded on every operation, so a poisoned lock holds
        // nothing stale.
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read<T>(&self, f: impl FnOnce(&State) -> Result<T>) -> Result<T> {
        let store = self.lock_store();
        let _guard = store.lock()?;
        let state = store.load()?;
        f(&state)
    }

    fn mutate<T>(&self, operation: &'static str, f: impl FnOnce(&mut State) -> Result<T>) -> Result<T> {
        let mut store = self.lock_store();
        let _guard = store.lock()?;
        let mut state = store.load()?;
        ids::reconcile(&mut state);

        match f(&mut state) {
            Ok(value) => {
                store.save(&state)?;
                Ok(value)
            }
            Err(err) => {
                tracing::warn!(operation, kind = %err.kind(), error = %err, "operation rejected");
                Err(err)
            }
        }
    }
}

fn find_project<'a>(state: &'a State, project_id: &str) -> Result<&'a Project> {
    state
        .projects
        .iter()
        .find(|project| project.id == project_id)
        .ok_or_else(|| Error::ProjectNotFound(project_id.to_string()))
}

fn find_project_mut<'a>(state: &'a mut State, project_id: &str) -> Result<&'a mut Project> {
    state
        .projects
        .iter_mut()
        .find(|project| project.id == project_id)
        .ok_or_else(|| Error::ProjectNotFound(project_id.to_string()))
}
