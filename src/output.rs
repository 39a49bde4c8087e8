//! Shared output formatting for taskflow commands.
//!
//! Every command reports through [`emit_success`] / [`emit_error`], which
//! print either a human block or a versioned JSON envelope.

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::task::{short_id, Task};
use crate::view::{Projection, TaskStats};

pub const SCHEMA_VERSION: &str = "taskflow.v1";

pub const EMPTY_FILTERED: &str = "No tasks match your filters";
pub const EMPTY_BOARD: &str = "No tasks yet";

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

#[derive(Debug, Clone)]
pub struct HumanOutput {
    header: String,
    summary: Vec<(String, String)>,
    details: Vec<String>,
    warnings: Vec<String>,
    next_steps: Vec<String>,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            summary: Vec::new(),
            details: Vec::new(),
            warnings: Vec::new(),
            next_steps: Vec::new(),
        }
    }

    pub fn push_summary(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.summary.push((key.into(), value.into()));
    }

    pub fn push_detail(&mut self, value: impl Into<String>) {
        self.details.push(value.into());
    }

    pub fn push_warning(&mut self, value: impl Into<String>) {
        self.warnings.push(value.into());
    }

    pub fn push_next_step(&mut self, value: impl Into<String>) {
        self.next_steps.push(value.into());
    }
}

pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    if options.json {
        let warnings = human.map(|h| h.warnings.clone()).unwrap_or_default();
        let next_steps = human.map(|h| h.next_steps.clone()).unwrap_or_default();

        #[derive(Serialize)]
        struct Envelope<'a, T: Serialize> {
            schema_version: &'static str,
            command: &'a str,
            status: &'static str,
            data: &'a T,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            warnings: Vec<String>,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            next_steps: Vec<String>,
        }

        let payload = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "success",
            data,
            warnings,
            next_steps,
        };

        println!("{}", serde_json::to_string(&payload)?);
        return Ok(());
    }

    if options.quiet {
        return Ok(());
    }

    if let Some(human) = human {
        println!("{}", format_human(human));
    }

    Ok(())
}

pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let next_steps = error_next_steps(err);
    let hint = next_steps.first().map(|step| step.as_str());
    if json {
        #[derive(Serialize)]
        struct ErrorBody<'a> {
            message: &'a str,
            code: i32,
            kind: &'static str,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<serde_json::Value>,
        }

        #[derive(Serialize)]
        struct Envelope<'a> {
            schema_version: &'static str,
            command: &'a str,
            status: &'static str,
            error: ErrorBody<'a>,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            next_steps: Vec<String>,
        }

        let payload = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "error",
            error: ErrorBody {
                message: &err.to_string(),
                code: err.exit_code(),
                kind: error_kind(err),
                details: err.details(),
            },
            next_steps,
        };

        println!("{}", serde_json::to_string(&payload)?);
        return Ok(());
    }

    eprintln!("error: {err}");
    if let Some(hint) = hint {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

pub fn format_human(output: &HumanOutput) -> String {
    let mut lines = Vec::new();
    lines.push(output.header.clone());

    push_summary(&mut lines, &output.summary);
    push_section(&mut lines, "Details", &output.details);
    push_section(&mut lines, "Warnings", &output.warnings);
    push_section(&mut lines, "Next steps", &output.next_steps);

    lines.join("\n")
}

// =============================================================================
// Task rendering
// =============================================================================

/// Relative due label: "Today", "Tomorrow", otherwise e.g. "Mar 5".
///
/// Days are compared in `tz`, so the label follows the viewer's calendar.
pub fn due_label<Tz: TimeZone>(due: DateTime<Utc>, now: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let due_local = due.with_timezone(tz);
    let due_day = due_local.date_naive();
    let today = now.with_timezone(tz).date_naive();

    if due_day == today {
        "Today".to_string()
    } else if Some(due_day) == today.checked_add_signed(Duration::days(1)) {
        "Tomorrow".to_string()
    } else {
        due_local.format("%b %-d").to_string()
    }
}

/// One-line summary of a task, e.g.
/// `[ ] 3f9k2a  Buy groceries  (Low, Shopping, due Tomorrow)`.
pub fn format_task_line(task: &Task, now: DateTime<Utc>) -> String {
    let mark = if task.completed { "x" } else { " " };
    let mut tags = vec![task.priority.label().to_string(), task.category.label().to_string()];
    if let Some(due) = task.due_date {
        tags.push(format!("due {}", due_label(due, now, &Local)));
    }
    let overdue = if task.is_overdue(now) { "  OVERDUE" } else { "" };
    format!(
        "[{mark}] {}  {}  ({}){overdue}",
        short_id(&task.id),
        task.title,
        tags.join(", ")
    )
}

pub fn format_stats(stats: &TaskStats) -> String {
    format!(
        "{} total, {} active, {} completed, {} overdue ({}% done)",
        stats.total,
        stats.active,
        stats.completed,
        stats.overdue,
        stats.completion_rate()
    )
}

/// Message shown when a projection has no visible tasks.
pub fn empty_state(has_filters: bool) -> &'static str {
    if has_filters {
        EMPTY_FILTERED
    } else {
        EMPTY_BOARD
    }
}

/// Human block for a projection: stats header, then one line per task.
pub fn projection_human(projection: &Projection, has_filters: bool, now: DateTime<Utc>) -> HumanOutput {
    let mut human = HumanOutput::new(format!("taskflow: {}", format_stats(&projection.stats)));
    if projection.tasks.is_empty() {
        human.push_detail(empty_state(has_filters));
        if !has_filters {
            human.push_next_step("add \"<title>\"");
        }
    } else {
        for task in &projection.tasks {
            human.push_detail(format_task_line(task, now));
        }
    }
    human
}

fn error_kind(err: &Error) -> &'static str {
    match err.exit_code() {
        2 => "user_error",
        _ => "operation_failed",
    }
}

fn error_next_steps(err: &Error) -> Vec<String> {
    match err {
        Error::UnknownOption { expected, .. } => vec![format!("use one of: {expected}")],
        Error::TaskNotFound(_) => vec!["list".to_string()],
        Error::AmbiguousTaskId { .. } => vec!["use more characters of the task id".to_string()],
        Error::ConfigNotFound(path) => {
            vec![format!("taskflow config init --path {}", path.display())]
        }
        Error::InvalidConfig(_) => vec!["fix taskflow.toml then retry".to_string()],
        _ => Vec::new(),
    }
}

fn push_summary(lines: &mut Vec<String>, summary: &[(String, String)]) {
    if summary.is_empty() {
        return;
    }

    lines.push(String::new());
    lines.push("Summary:".to_string());
    for (key, value) in summary {
        if value.is_empty() {
            lines.push(format!("- {key}"));
        } else {
            lines.push(format!("- {key}: {value}"));
        }
    }
}

fn push_section(lines: &mut Vec<String>, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }

    lines.push(String::new());
    lines.push(format!("{title}:"));
    for item in items {
        lines.push(format!("- {item}"));
    }
}
