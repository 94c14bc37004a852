//! taskqueue call command implementation
//!
//! Runs a single tool and prints its data.

use std::io::Read;

use serde_json::Value;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::manager::TaskManager;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::tools::ToolRegistry;

/// Options for `taskqueue call`
pub struct CallOptions {
    pub tool: String,
    pub args: String,
    pub config: Config,
    pub json: bool,
    pub quiet: bool,
}

pub fn run(options: CallOptions) -> Result<()> {
    let arguments = parse_arguments(&options.args)?;
    let manager = TaskManager::from_config(&options.config)?;
    let registry = ToolRegistry::new();

    let data = registry.call(&manager, &options.tool, arguments)?;
    let human = describe(&options.tool, &data);

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        &format!("call {}", options.tool),
        &data,
        Some(&human),
    )
}

fn parse_arguments(raw: &str) -> Result<Value> {
    let raw = if raw.trim() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        raw.to_string()
    };

    if raw.trim().is_empty() {
        return Ok(Value::Null);
    }

    let value: Value = serde_json::from_str(&raw)
        .map_err(|err| Error::InvalidArgument(format!("--args is not valid JSON: {err}")))?;
    if !(value.is_object() || value.is_null()) {
        return Err(Error::InvalidArgument(
            "--args must be a JSON object".to_string(),
        ));
    }
    Ok(value)
}

fn describe(tool: &str, data: &Value) -> HumanOutput {
    let mut human = HumanOutput::new(format!("taskqueue call {tool}"));

    let Some(fields) = data.as_object() else {
        human.push_detail(data.to_string());
        return human;
    };

    for (key, value) in fields {
        match value {
            Value::Array(items) => {
                human.push_summary(key.as_str(), items.len().to_string());
                for item in items {
                    human.push_detail(describe_item(item));
                }
            }
            Value::Object(_) => human.push_detail(describe_item(value)),
            Value::Null => {}
            Value::String(text) => human.push_summary(key.as_str(), text.as_str()),
            other => human.push_summary(key.as_str(), other.to_string()),
        }
    }

    if data.get("completed") == Some(&Value::Bool(true)) {
        human.push_warning("project is completed; it no longer accepts tasks");
    }

    if let Some(task_id) = data
        .get("task")
        .and_then(|task| task.get("id"))
        .and_then(Value::as_str)
    {
        human.push_next_step(format!("taskqueue call update_task (taskId {task_id})"));
    }

    human
}

/// One-line rendering of a project or task
fn describe_item(item: &Value) -> String {
    let field = |name: &str| item.get(name).and_then(Value::as_str);

    let id = match (field("projectId"), field("id")) {
        (Some(project_id), Some(task_id)) => format!("{project_id}/{task_id}"),
        (Some(id), None) | (None, Some(id)) => id.to_string(),
        (None, None) => "-".to_string(),
    };
    let label = field("title").or_else(|| field("initialPrompt")).unwrap_or("");

    match field("state").or_else(|| field("status")) {
        Some(state) => format!("{id} [{state}] {label}"),
        None => format!("{id} {label}"),
    }
}
