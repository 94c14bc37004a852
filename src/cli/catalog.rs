//! taskqueue tools command implementation

use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::tools::ToolRegistry;

/// Options for `taskqueue tools`
pub struct ToolsOptions {
    pub json: bool,
    pub quiet: bool,
}

pub fn run(options: ToolsOptions) -> Result<()> {
    let registry: ToolRegistry = ToolRegistry::new();
    let tools = registry.tools();

    let mut human = HumanOutput::new(format!("taskqueue tools: {}", tools.len()));
    for tool in &tools {
        let access = if tool.mutating { "write" } else { "read" };
        human.push_detail(format!("{} ({access}): {}", tool.name, tool.description));
    }
    human.push_next_step("taskqueue call <tool> --args '{...}'");

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "tools",
        &tools,
        Some(&human),
    )
}
