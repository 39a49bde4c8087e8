//! Command-line interface for taskflow
//!
//! This module defines the CLI structure using clap derive macros.
//! The interactive shell and the config helpers live in submodules.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::error::Result;

mod config;
mod shell;

/// taskflow - in-memory task manager
///
/// Add, edit and complete tasks, filter and sort the list, and ask an
/// optional streaming assistant for advice about the current board.
#[derive(Parser, Debug)]
#[command(name = "taskflow")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to taskflow.toml (defaults to the platform config directory)
    #[arg(long, global = true, env = "TASKFLOW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output in JSON format (one envelope per line)
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Start with an empty board instead of the sample tasks
    #[arg(long, global = true)]
    pub no_samples: bool,

    /// Assistant endpoint, overriding `[assistant] endpoint`
    #[arg(long, global = true, env = "TASKFLOW_ASSISTANT_URL")]
    pub assistant_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive session reading commands from stdin (default)
    Shell,

    /// Configuration helpers
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write a default taskflow.toml
    Init {
        /// Destination (defaults to --config or the platform config directory)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the resolved configuration
    Show,
}

impl Cli {
    /// Name used in output envelopes for the selected command
    pub fn command_name(&self) -> &'static str {
        match &self.command {
            None | Some(Commands::Shell) => "shell",
            Some(Commands::Config(ConfigCommands::Init { .. })) => "config init",
            Some(Commands::Config(ConfigCommands::Show)) => "config show",
        }
    }

    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        match self.command.unwrap_or(Commands::Shell) {
            Commands::Shell => shell::run(shell::ShellOptions {
                config: self.config,
                assistant_url: self.assistant_url,
                no_samples: self.no_samples,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Config(cmd) => match cmd {
                ConfigCommands::Init { path, force } => config::run_init(config::InitOptions {
                    path: path.or(self.config),
                    force,
                    json: self.json,
                    quiet: self.quiet,
                }),
                ConfigCommands::Show => config::run_show(config::ShowOptions {
                    config: self.config,
                    json: self.json,
                    quiet: self.quiet,
                }),
            },
        }
    }
}
