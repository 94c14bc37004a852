//! Task and project lifecycle rules.
//!
//! - A task is frozen once `approved` is set; nothing on it may change.
//! - Until then its status may move freely between `not started`,
//!   `in progress` and `done`.
//! - `done` requires non-empty `completedDetails`; details exist only while
//!   the task is `done`.
//! - Approval requires `done`. On auto-approve projects reaching `done`
//!   approves the task in the same step.
//! - A project is finalized explicitly, once, and only when every task is
//!   `done` and approved.
//!
//! Every mutating rule validates against a copy and commits only on
//! success, so a rejected call leaves the entity untouched.

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::model::{Project, ProjectState, Task, TaskState, TaskStatus};

/// Fields supplied when creating a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tool_recommendations: Option<String>,
    #[serde(default)]
    pub rule_recommendations: Option<String>,
}

impl NewTask {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        require("title", &self.title)?;
        require("description", &self.description)
    }

    pub(crate) fn into_task(self, id: String) -> Task {
        Task {
            id,
            title: self.title,
            description: self.description,
            status: TaskStatus::NotStarted,
            approved: false,
            completed_details: String::new(),
            tool_recommendations: self.tool_recommendations.unwrap_or_default(),
            rule_recommendations: self.rule_recommendations.unwrap_or_default(),
        }
    }
}

/// Fields supplied when creating a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    #[serde(default)]
    pub initial_prompt: String,
    #[serde(default)]
    pub project_plan: Option<String>,
    #[serde(default)]
    pub auto_approve: bool,
    #[serde(default)]
    pub tasks: Vec<NewTask>,
}

impl NewProject {
    pub fn new(initial_prompt: impl Into<String>) -> Self {
        Self {
            initial_prompt: initial_prompt.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        require("initialPrompt", &self.initial_prompt)?;
        self.tasks.iter().try_for_each(NewTask::validate)
    }

    /// Build the project shell; tasks are attached by the caller so that
    /// IDs come from the allocator.
    pub(crate) fn into_project(self, id: String) -> (Project, Vec<NewTask>) {
        let project_plan = self
            .project_plan
            .filter(|plan| !plan.trim().is_empty())
            .unwrap_or_else(|| self.initial_prompt.clone());
        let project = Project {
            id,
            initial_prompt: self.initial_prompt,
            project_plan,
            auto_approve: self.auto_approve,
            completed: false,
            tasks: Vec::new(),
            task_counter: 0,
        };
        (project, self.tasks)
    }
}

/// Partial update of a task. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub completed_details: Option<String>,
    #[serde(default)]
    pub tool_recommendations: Option<String>,
    #[serde(default)]
    pub rule_recommendations: Option<String>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.completed_details.is_none()
            && self.tool_recommendations.is_none()
            && self.rule_recommendations.is_none()
    }
}

/// Fail with a validation error naming `field` when `value` is blank.
pub fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(Error::MissingField(field.to_string()))
    } else {
        Ok(())
    }
}

impl Task {
    pub fn state(&self) -> TaskState {
        match (self.status, self.approved) {
            (TaskStatus::Done, true) => TaskState::Completed,
            (TaskStatus::Done, false) => TaskState::PendingApproval,
            _ => TaskState::Open,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status == TaskStatus::Done && self.approved
    }

    /// Apply a partial update, enforcing the freeze and completion rules.
    pub fn apply_update(&mut self, update: &TaskUpdate, auto_approve: bool) -> Result<()> {
        if self.approved {
            return Err(Error::TaskFrozen(self.id.clone()));
        }
        if update.is_empty() {
            return Err(Error::InvalidArgument(
                "update must change at least one field".to_string(),
            ));
        }

        let mut next = self.clone();
        if let Some(title) = &update.title {
            require("title", title)?;
            next.title = title.clone();
        }
        if let Some(description) = &update.description {
            require("description", description)?;
            next.description = description.clone();
        }
        if let Some(tools) = &update.tool_recommendations {
            next.tool_recommendations = tools.clone();
        }
        if let Some(rules) = &update.rule_recommendations {
            next.rule_recommendations = rules.clone();
        }

        next.status = update.status.unwrap_or(self.status);
        if next.status == TaskStatus::Done {
            if let Some(details) = &update.completed_details {
                next.completed_details = details.clone();
            }
            if next.completed_details.trim().is_empty() {
                return Err(Error::InvalidArgument(format!(
                    "completedDetails is required to mark {} as done",
                    self.id
                )));
            }
            if auto_approve {
                next.approved = true;
            }
        } else {
            if update
                .completed_details
                .as_deref()
                .is_some_and(|details| !details.trim().is_empty())
            {
                return Err(Error::InvalidArgument(format!(
                    "completedDetails can only be set when {} is done",
                    self.id
                )));
            }
            next.completed_details.clear();
        }

        *self = next;
        Ok(())
    }

    pub fn approve(&mut self) -> Result<()> {
        if self.approved {
            return Err(Error::AlreadyApproved(self.id.clone()));
        }
        if self.status != TaskStatus::Done {
            return Err(Error::InvalidArgument(format!(
                "task {} is '{}'; only done tasks can be approved",
                self.id, self.status
            )));
        }
        self.approved = true;
        Ok(())
    }
}

impl Project {
    pub fn state(&self) -> ProjectState {
        if self.completed {
            ProjectState::Completed
        } else if self.tasks.is_empty()
            || self.tasks.iter().any(|task| task.status != TaskStatus::Done)
        {
            ProjectState::Open
        } else {
            ProjectState::PendingApproval
        }
    }

    pub fn task(&self, task_id: &str) -> Result<&Task> {
        self.tasks
            .iter()
            .find(|task| task.id == task_id)
            .ok_or_else(|| self.task_not_found(task_id))
    }

    pub fn task_mut(&mut self, task_id: &str) -> Result<&mut Task> {
        let missing = self.task_not_found(task_id);
        self.tasks
            .iter_mut()
            .find(|task| task.id == task_id)
            .ok_or(missing)
    }

    /// First task in sequence order that still awaits approval.
    pub fn next_task(&self) -> Option<&Task> {
        self.tasks.iter().find(|task| !task.approved)
    }

    /// IDs of tasks that keep the project from being finalized.
    pub fn blocking_tasks(&self) -> Vec<String> {
        self.tasks
            .iter()
            .filter(|task| !task.is_finished())
            .map(|task| task.id.clone())
            .collect()
    }

    pub fn finalize(&mut self) -> Result<()> {
        if self.completed {
            return Err(Error::InvalidArgument(format!(
                "project {} is already completed",
                self.id
            )));
        }
        let blocking = self.blocking_tasks();
        if !blocking.is_empty() {
            return Err(Error::FinalizeBlocked {
                project_id: self.id.clone(),
                blocking,
            });
        }
        self.completed = true;
        Ok(())
    }

    /// Reject structural changes to a finalized project.
    pub fn ensure_not_completed(&self) -> Result<()> {
        if self.completed {
            Err(Error::InvalidArgument(format!(
                "project {} is completed; tasks can no longer be added",
                self.id
            )))
        } else {
            Ok(())
        }
    }

    pub fn remove_task(&mut self, task_id: &str) -> Result<Task> {
        let index = self
            .tasks
            .iter()
            .position(|task| task.id == task_id)
            .ok_or_else(|| self.task_not_found(task_id))?;
        if self.tasks[index].approved {
            return Err(Error::TaskFrozen(task_id.to_string()));
        }
        Ok(self.tasks.remove(index))
    }

    fn task_not_found(&self, task_id: &str) -> Error {
        Error::TaskNotFound {
            project_id: self.id.clone(),
            task_id: task_id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn sample_task(id: &str) -> Task {
        NewTask::new("Write docs", "Document the API").into_task(id.to_string())
    }

    fn sample_project(tasks: Vec<Task>) -> Project {
        let (mut project, _) = NewProject::new("Ship v1").into_project("proj-1".to_string());
        project.tasks = tasks;
        project
    }

    fn done_update(details: &str) -> TaskUpdate {
        TaskUpdate {
            status: Some(TaskStatus::Done),
            completed_details: Some(details.to_string()),
            ..TaskUpdate::default()
        }
    }

    #[test]
    fn status_may_skip_in_progress() {
        let mut task = sample_task("task-1");
        task.apply_update(&done_update("shipped"), false).expect("done");
        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.completed_details, "shipped");
        assert!(!task.approved);
    }

    #[test]
    fn done_without_details_is_rejected_and_leaves_task_unchanged() {
        let mut task = sample_task("task-1");
        let before = task.clone();
        let update = TaskUpdate {
            status: Some(TaskStatus::Done),
            title: Some("Renamed".to_string()),
            ..TaskUpdate::default()
        };
        let err = task.apply_update(&update, false).expect_err("missing details");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(task, before);
    }

    #[test]
    fn previously_recorded_details_satisfy_done() {
        let mut task = sample_task("task-1");
        task.apply_update(&done_update("first pass"), false).expect("done");
        let retitle = TaskUpdate {
            title: Some("Write better docs".to_string()),
            ..TaskUpdate::default()
        };
        task.apply_update(&retitle, false).expect("retitle keeps done");
        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.completed_details, "first pass");
    }

    #[test]
    fn moving_out_of_done_clears_details() {
        let mut task = sample_task("task-1");
        task.apply_update(&done_update("oops"), false).expect("done");
        let reopen = TaskUpdate {
            status: Some(TaskStatus::InProgress),
            ..TaskUpdate::default()
        };
        task.apply_update(&reopen, false).expect("reopen");
        assert_eq!(task.status, TaskStatus::InProgress);
        assert!(task.completed_details.is_empty());
    }

    #[test]
    fn details_without_done_are_rejected() {
        let mut task = sample_task("task-1");
        let update = TaskUpdate {
            completed_details: Some("early".to_string()),
            ..TaskUpdate::default()
        };
        assert!(task.apply_update(&update, false).is_err());
        assert!(task.completed_details.is_empty());
    }

    #[test]
    fn blank_title_names_the_field() {
        let mut task = sample_task("task-1");
        let update = TaskUpdate {
            title: Some("   ".to_string()),
            ..TaskUpdate::default()
        };
        let err = task.apply_update(&update, false).expect_err("blank");
        assert!(matches!(err, Error::MissingField(ref field) if field == "title"));
    }

    #[test]
    fn empty_update_is_rejected() {
        let mut task = sample_task("task-1");
        assert!(task.apply_update(&TaskUpdate::default(), false).is_err());
    }

    #[test]
    fn auto_approve_applies_on_done() {
        let mut task = sample_task("task-1");
        task.apply_update(&done_update("done"), true).expect("done");
        assert!(task.approved);
    }

    #[test]
    fn approved_task_is_frozen() {
        let mut task = sample_task("task-1");
        task.apply_update(&done_update("done"), false).expect("done");
        task.approve().expect("approve");
        let before = task.clone();

        let reopen = TaskUpdate {
            status: Some(TaskStatus::InProgress),
            ..TaskUpdate::default()
        };
        let err = task.apply_update(&reopen, false).expect_err("frozen");
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(task, before);

        let err = task.approve().expect_err("already approved");
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn approval_requires_done() {
        let mut task = sample_task("task-1");
        let err = task.approve().expect_err("not done");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(!task.approved);
    }

    #[test]
    fn next_task_returns_first_unapproved_regardless_of_status() {
        let mut first = sample_task("task-1");
        first.apply_update(&done_update("a"), true).expect("done");
        let mut second = sample_task("task-2");
        second
            .apply_update(
                &TaskUpdate {
                    status: Some(TaskStatus::InProgress),
                    ..TaskUpdate::default()
                },
                false,
            )
            .expect("start");
        let third = sample_task("task-3");
        let project = sample_project(vec![first, second, third]);
        assert_eq!(project.next_task().map(|t| t.id.as_str()), Some("task-2"));

        let mut done_unapproved = sample_task("task-1");
        done_unapproved
            .apply_update(&done_update("b"), false)
            .expect("done");
        let project = sample_project(vec![done_unapproved, sample_task("task-2")]);
        assert_eq!(project.next_task().map(|t| t.id.as_str()), Some("task-1"));
    }

    #[test]
    fn finalize_lists_blocking_tasks() {
        let mut approved = sample_task("task-1");
        approved.apply_update(&done_update("a"), true).expect("done");
        let mut pending = sample_task("task-2");
        pending.apply_update(&done_update("b"), false).expect("done");
        let mut project = sample_project(vec![approved, pending, sample_task("task-3")]);

        let err = project.finalize().expect_err("blocked");
        match err {
            Error::FinalizeBlocked { blocking, .. } => {
                assert_eq!(blocking, vec!["task-2".to_string(), "task-3".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!project.completed);
    }

    #[test]
    fn finalize_is_not_idempotent() {
        let mut project = sample_project(Vec::new());
        project.finalize().expect("empty project finalizes");
        assert!(project.completed);
        let err = project.finalize().expect_err("second finalize");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn project_state_classification() {
        assert_eq!(sample_project(Vec::new()).state(), ProjectState::Open);
        assert_eq!(sample_project(vec![sample_task("task-1")]).state(), ProjectState::Open);

        let mut done = sample_task("task-1");
        done.apply_update(&done_update("a"), false).expect("done");
        let mut project = sample_project(vec![done]);
        assert_eq!(project.state(), ProjectState::PendingApproval);

        project.tasks[0].approve().expect("approve");
        assert_eq!(project.state(), ProjectState::PendingApproval);

        project.finalize().expect("finalize");
        assert_eq!(project.state(), ProjectState::Completed);
    }

    #[test]
    fn approved_tasks_cannot_be_removed() {
        let mut done = sample_task("task-1");
        done.apply_update(&done_update("a"), true).expect("done");
        let mut project = sample_project(vec![done, sample_task("task-2")]);
        let err = project.remove_task("task-1").expect_err("frozen");
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(project.remove_task("task-2").expect("remove").id, "task-2");
        assert_eq!(
            project.remove_task("task-9").expect_err("missing").kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn blank_project_plan_defaults_to_prompt() {
        let mut new = NewProject::new("Build a parser");
        new.project_plan = Some(" ".to_string());
        let (project, _) = new.into_project("proj-1".to_string());
        assert_eq!(project.project_plan, "Build a parser");
    }
}
