#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use taskqueue::lifecycle::{NewProject, NewTask, TaskUpdate};
use taskqueue::model::{Project, TaskStatus};
use taskqueue::TaskManager;
use tempfile::TempDir;

/// A task file in its own temporary directory
pub struct TestStore {
    dir: TempDir,
}

impl TestStore {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        fs::write(dir.path().join("config.toml"), "").expect("write empty config");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self) -> PathBuf {
        self.dir.path().join("tasks.json")
    }

    pub fn config_file(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    pub fn manager(&self) -> TaskManager {
        TaskManager::open(self.file())
    }

    pub fn write_raw(&self, contents: &str) {
        fs::write(self.file(), contents).expect("write task file");
    }

    pub fn read_raw(&self) -> Value {
        let raw = fs::read_to_string(self.file()).expect("read task file");
        serde_json::from_str(&raw).expect("task file is json")
    }

    /// `taskqueue` bound to this store, isolated from user config
    pub fn cli(&self) -> Command {
        let mut cmd = Command::cargo_bin("taskqueue").expect("binary");
        cmd.env("TASK_MANAGER_FILE_PATH", self.file())
            .env("TASKQUEUE_CONFIG", self.config_file())
            .env_remove("RUST_LOG");
        cmd
    }
}

pub fn new_tasks(titles: &[&str]) -> Vec<NewTask> {
    titles
        .iter()
        .map(|title| NewTask::new(*title, format!("{title} description")))
        .collect()
}

pub fn project_with_tasks(manager: &TaskManager, prompt: &str, titles: &[&str]) -> Project {
    manager
        .create_project(NewProject {
            tasks: new_tasks(titles),
            ..NewProject::new(prompt)
        })
        .expect("create project")
}

pub fn done(details: &str) -> TaskUpdate {
    TaskUpdate {
        status: Some(TaskStatus::Done),
        completed_details: Some(details.to_string()),
        ..TaskUpdate::default()
    }
}

pub fn status(status: TaskStatus) -> TaskUpdate {
    TaskUpdate {
        status: Some(status),
        ..TaskUpdate::default()
    }
}
