//! Command-line interface for taskqueue
//!
//! This module defines the CLI structure using clap derive macros.
//! Each subcommand is defined in its own submodule.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{Config, CONFIG_PATH_ENV};
use crate::error::Result;

mod call;
mod catalog;
pub mod serve;

/// taskqueue - file-backed projects and tasks with approval gates
///
/// Every operation is a named tool taking a JSON argument object. Use
/// `tools` to list them, `call` to run one, or `serve` to answer
/// JSON-lines requests on stdin.
#[derive(Parser, Debug)]
#[command(name = "taskqueue")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Task file (overrides TASK_MANAGER_FILE_PATH and the config file)
    #[arg(long, global = true)]
    pub file: Option<PathBuf>,

    /// Config file (defaults to TASKQUEUE_CONFIG, then the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the available tools
    Tools,

    /// Run one tool against the task file
    Call {
        /// Tool name (e.g. create_project, update_task)
        tool: String,

        /// Tool arguments as a JSON object, or `-` to read them from stdin
        #[arg(long, default_value = "{}")]
        args: String,
    },

    /// Answer JSON-lines tool requests on stdin until EOF
    Serve,
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Tools => catalog::run(catalog::ToolsOptions {
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Call { tool, args } => {
                let config = resolve_config(self.config, self.file)?;
                call::run(call::CallOptions {
                    tool,
                    args,
                    config,
                    json: self.json,
                    quiet: self.quiet,
                })
            }
            Commands::Serve => {
                let config = resolve_config(self.config, self.file)?;
                serve::run(serve::ServeOptions { config })
            }
        }
    }
}

/// Config file, then `TASK_MANAGER_FILE_PATH`, then `--file`.
fn resolve_config(config: Option<PathBuf>, file: Option<PathBuf>) -> Result<Config> {
    let config_path = config.or_else(|| {
        std::env::var_os(CONFIG_PATH_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
    });

    Ok(Config::discover(config_path.as_deref())?
        .with_env()
        .with_file_path(file.map(PathBuf::into_os_string)))
}
