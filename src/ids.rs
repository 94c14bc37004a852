//! Sequential, human-readable identifiers.
//!
//! Projects get `proj-<n>` from a state-wide counter and tasks get
//! `task-<n>` from a per-project counter. Counters only move forward:
//! deleting an entity never frees its number.
//!
//! Files written before counters were persisted carry no counter field;
//! the counter is then reconciled with the highest suffix still present.

use crate::error::{Error, Result};
use crate::model::{Project, State};

pub const PROJECT_ID_PREFIX: &str = "proj-";
pub const TASK_ID_PREFIX: &str = "task-";

/// Raise every counter in `state` to the highest suffix still present.
///
/// Run before any mutation, so that removing the newest entity of a
/// counterless document cannot free its number.
pub fn reconcile(state: &mut State) {
    let highest = highest_suffix(
        state.projects.iter().map(|project| project.id.as_str()),
        PROJECT_ID_PREFIX,
    );
    state.project_counter = state.project_counter.max(highest);

    for project in &mut state.projects {
        let highest = highest_suffix(
            project.tasks.iter().map(|task| task.id.as_str()),
            TASK_ID_PREFIX,
        );
        project.task_counter = project.task_counter.max(highest);
    }
}

/// Allocate the next project id and advance the state counter.
pub fn next_project_id(state: &mut State) -> Result<String> {
    let highest = highest_suffix(
        state.projects.iter().map(|project| project.id.as_str()),
        PROJECT_ID_PREFIX,
    );
    let next = advance(&mut state.project_counter, highest, PROJECT_ID_PREFIX)?;
    Ok(format!("{PROJECT_ID_PREFIX}{next}"))
}

/// Allocate the next task id within `project` and advance its counter.
pub fn next_task_id(project: &mut Project) -> Result<String> {
    let highest = highest_suffix(
        project.tasks.iter().map(|task| task.id.as_str()),
        TASK_ID_PREFIX,
    );
    let next = advance(&mut project.task_counter, highest, TASK_ID_PREFIX)?;
    Ok(format!("{TASK_ID_PREFIX}{next}"))
}

fn advance(counter: &mut u64, highest: u64, prefix: &str) -> Result<u64> {
    let next = (*counter)
        .max(highest)
        .checked_add(1)
        .ok_or_else(|| Error::IdSpaceExhausted(prefix.to_string()))?;
    *counter = next;
    Ok(next)
}

fn highest_suffix<'a>(ids: impl Iterator<Item = &'a str>, prefix: &str) -> u64 {
    ids.filter_map(|id| id.strip_prefix(prefix))
        .filter_map(|suffix| suffix.parse::<u64>().ok())
        .max()
        .unwrap_or(0)
}
