//! taskflow config command implementation
//!
//! Writes a default `taskflow.toml` and prints the resolved configuration.

use std::path::PathBuf;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};

/// Options for `taskflow config init`
pub struct InitOptions {
    pub path: Option<PathBuf>,
    pub force: bool,
    pub json: bool,
    pub quiet: bool,
}

/// Options for `taskflow config show`
pub struct ShowOptions {
    pub config: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(serde::Serialize)]
struct InitReport {
    path: PathBuf,
    overwritten: bool,
}

#[derive(serde::Serialize)]
struct ShowReport {
    source: Option<PathBuf>,
    config: Config,
}

pub fn run_init(options: InitOptions) -> Result<()> {
    let path = match options.path {
        Some(path) => path,
        None => Config::default_path().ok_or_else(|| {
            Error::OperationFailed("could not determine a config directory; pass --path".to_string())
        })?,
    };

    let existed = path.exists();
    if existed && !options.force {
        return Err(Error::InvalidArgument(format!(
            "{} already exists (pass --force to overwrite)",
            path.display()
        )));
    }

    Config::default().save(&path)?;

    let report = InitReport {
        path: path.clone(),
        overwritten: existed,
    };

    let mut human = HumanOutput::new(format!("taskflow config init: {}", path.display()));
    human.push_summary("path", path.display().to_string());
    if existed {
        human.push_warning("existing file overwritten");
    }
    human.push_next_step("set [assistant] endpoint to enable `ask`");

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "config init",
        &report,
        Some(&human),
    )
}

pub fn run_show(options: ShowOptions) -> Result<()> {
    let (config, source) = Config::resolve(options.config.as_deref())?;

    let mut human = HumanOutput::new(match &source {
        Some(path) => format!("taskflow config: {}", path.display()),
        None => "taskflow config: defaults".to_string(),
    });
    human.push_summary("board.seed_samples", config.board.seed_samples.to_string());
    human.push_summary("view.sort", config.view.sort.clone());
    human.push_summary("view.status", config.view.status.clone());
    human.push_summary("view.category", config.view.category.clone());
    human.push_summary("view.priority", config.view.priority.clone());
    human.push_summary(
        "assistant.endpoint",
        config.assistant.endpoint.clone().unwrap_or_else(|| "(disabled)".to_string()),
    );
    human.push_summary("assistant.api_key_env", config.assistant.api_key_env.clone());
    human.push_summary("assistant.timeout_secs", config.assistant.timeout_secs.to_string());
    if source.is_none() {
        human.push_next_step("taskflow config init");
    }

    let report = ShowReport { source, config };

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "config show",
        &report,
        Some(&human),
    )
}
