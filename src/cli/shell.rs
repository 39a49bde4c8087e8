//! taskflow shell implementation
//!
//! Reads one command per line from stdin, so the same loop serves an
//! interactive terminal and a piped script. A failing line is reported and
//! the session carries on.

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::runtime::Runtime;
use tokio::sync::futures::Notified;
use tokio::sync::Notify;
use tracing::debug;

use crate::assistant::{AskOutcome, AssistantClient, ChatMessage, Conversation, Role};
use crate::board::TaskBoard;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::{self, emit_error, emit_success, HumanOutput, OutputOptions};
use crate::task::{short_id, Task, TaskDraft, TaskPatch};
use crate::view::{self, Criteria, TaskStats};

const COMPLETED_MESSAGE: &str = "Well done! Task marked as complete.";
const CANCELLED_DETAIL: &str = "Request cancelled";
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Options for `taskflow shell`
pub struct ShellOptions {
    pub config: Option<PathBuf>,
    pub assistant_url: Option<String>,
    pub no_samples: bool,
    pub json: bool,
    pub quiet: bool,
}

// =============================================================================
// Command grammar
// =============================================================================

#[derive(Parser, Debug)]
#[command(name = "taskflow", no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug)]
enum ShellCommand {
    /// Add a task (title words need no quotes)
    Add {
        #[arg(required = true)]
        title: Vec<String>,

        #[arg(short, long)]
        description: Option<String>,

        /// high, medium, low
        #[arg(short, long)]
        priority: Option<String>,

        /// work, personal, health, shopping
        #[arg(short, long)]
        category: Option<String>,

        /// RFC 3339, YYYY-MM-DD, today, tomorrow or +Nd
        #[arg(long)]
        due: Option<String>,
    },

    /// Change fields of a task
    Edit {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(short, long, conflicts_with = "clear_description")]
        description: Option<String>,

        #[arg(long)]
        clear_description: bool,

        #[arg(short, long)]
        priority: Option<String>,

        #[arg(short, long)]
        category: Option<String>,

        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,

        #[arg(long)]
        clear_due: bool,

        /// true or false
        #[arg(long)]
        completed: Option<bool>,
    },

    /// Toggle completion
    Done { id: String },

    /// Delete a task
    #[command(alias = "delete")]
    Rm { id: String },

    /// Show one task
    Show { id: String },

    /// Show the filtered, sorted list
    #[command(alias = "ls")]
    List,

    /// Show statistics for all tasks
    Stats,

    /// Set the search text (no words clears it)
    Search {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        query: Vec<String>,
    },

    /// Status filter: all, active, completed
    Status { value: String },

    /// Category filter: all or a category
    Category { value: String },

    /// Priority filter: all or a priority
    Priority { value: String },

    /// Sort: createdAt, dueDate, priority, alphabetical
    Sort { value: String },

    /// Clear search and filters, restore the default sort
    Reset,

    /// Ask the assistant about your tasks
    Ask {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        question: Vec<String>,
    },

    /// Print the assistant conversation
    History,

    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

impl ShellCommand {
    fn name(&self) -> &'static str {
        match self {
            ShellCommand::Add { .. } => "add",
            ShellCommand::Edit { .. } => "edit",
            ShellCommand::Done { .. } => "done",
            ShellCommand::Rm { .. } => "rm",
            ShellCommand::Show { .. } => "show",
            ShellCommand::List => "list",
            ShellCommand::Stats => "stats",
            ShellCommand::Search { .. } => "search",
            ShellCommand::Status { .. } => "status",
            ShellCommand::Category { .. } => "category",
            ShellCommand::Priority { .. } => "priority",
            ShellCommand::Sort { .. } => "sort",
            ShellCommand::Reset => "reset",
            ShellCommand::Ask { .. } => "ask",
            ShellCommand::History => "history",
            ShellCommand::Quit => "quit",
        }
    }
}

// =============================================================================
// Reports
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskReport<'a> {
    message: &'a str,
    task: &'a Task,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsReport {
    #[serde(flatten)]
    stats: TaskStats,
    completion_rate: u32,
}

impl From<TaskStats> for StatsReport {
    fn from(stats: TaskStats) -> Self {
        Self {
            completion_rate: stats.completion_rate(),
            stats,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListReport<'a> {
    tasks: &'a [Task],
    stats: StatsReport,
    criteria: &'a Criteria,
    has_filters: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    empty_message: Option<&'static str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AskReport<'a> {
    question: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

#[derive(Serialize)]
struct HistoryReport<'a> {
    messages: &'a [ChatMessage],
}

// =============================================================================
// Session
// =============================================================================

enum Flow {
    Continue,
    Quit,
}

struct Session {
    board: TaskBoard,
    conversation: Conversation,
    assistant: Option<AssistantClient>,
    runtime: Option<Runtime>,
    interrupts: Interrupts,
    output: OutputOptions,
}

/// What a Ctrl-C means at the moment it arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interrupted {
    CancelAsk,
    ExitShell,
}

/// Routes Ctrl-C to the in-flight `ask`, or ends the session when idle.
#[derive(Debug, Clone, Default)]
struct Interrupts {
    asking: Arc<AtomicBool>,
    cancel: Arc<Notify>,
}

impl Interrupts {
    fn begin_ask(&self) {
        self.asking.store(true, Ordering::SeqCst);
    }

    fn end_ask(&self) {
        self.asking.store(false, Ordering::SeqCst);
    }

    /// Resolves on the next interrupt delivered while asking.
    fn cancelled(&self) -> Notified<'_> {
        self.cancel.notified()
    }

    fn handle(&self) -> Interrupted {
        if self.asking.load(Ordering::SeqCst) {
            self.cancel.notify_waiters();
            Interrupted::CancelAsk
        } else {
            Interrupted::ExitShell
        }
    }

    /// Installing tokio's SIGINT handler replaces the default one for the
    /// rest of the process, so idle interrupts have to exit explicitly.
    fn watch(&self, runtime: &Runtime) {
        let interrupts = self.clone();
        runtime.spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if interrupts.handle() == Interrupted::ExitShell {
                    debug!("interrupted at prompt");
                    println!();
                    std::process::exit(INTERRUPTED_EXIT_CODE);
                }
            }
        });
    }
}

pub fn run(options: ShellOptions) -> Result<()> {
    let (mut config, source) = Config::resolve(options.config.as_deref())?;
    if let Some(url) = options.assistant_url {
        config.assistant.endpoint = Some(url);
    }

    let mut board = if config.board.seed_samples && !options.no_samples {
        TaskBoard::with_samples()
    } else {
        TaskBoard::new()
    };
    board.apply_view_config(&config.view)?;

    let assistant = AssistantClient::from_config(&config.assistant)?;
    let runtime = match assistant {
        Some(_) => Some(
            tokio::runtime::Builder::new_multi_thread()
                .worker_threads(1)
                .enable_all()
                .build()?,
        ),
        None => None,
    };

    debug!(
        config = ?source,
        tasks = board.tasks().len(),
        assistant = assistant.is_some(),
        "shell started"
    );

    let interrupts = Interrupts::default();
    if let Some(runtime) = runtime.as_ref() {
        interrupts.watch(runtime);
    }

    let mut session = Session {
        board,
        conversation: Conversation::new(),
        assistant,
        runtime,
        interrupts,
        output: OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
    };

    let stdin = io::stdin();
    let interactive = stdin.is_terminal() && !options.json;
    if interactive && !options.quiet {
        println!("taskflow shell - type `help` for commands, `quit` to leave");
    }

    let mut input = stdin.lock();
    let mut line = String::new();
    loop {
        if interactive {
            print!("> ");
            io::stdout().flush()?;
        }
        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        match session.execute_line(&line) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err((command, err)) => emit_error(command, &err, options.json)?,
        }
    }

    debug!(tasks = session.board.tasks().len(), "shell finished");
    Ok(())
}

impl Session {
    fn execute_line(&mut self, line: &str) -> std::result::Result<Flow, (&'static str, Error)> {
        let tokens = tokenize(line).map_err(|err| ("shell", err))?;
        if tokens.is_empty() {
            return Ok(Flow::Continue);
        }

        let parsed = match ShellLine::try_parse_from(&tokens) {
            Ok(parsed) => parsed,
            Err(err) => return parse_error_flow(err),
        };

        match parsed.command {
            ShellCommand::Quit => Ok(Flow::Quit),
            command => {
                let name = command.name();
                self.execute(command)
                    .map(|_| Flow::Continue)
                    .map_err(|err| (name, err))
            }
        }
    }

    fn execute(&mut self, command: ShellCommand) -> Result<()> {
        let now = Utc::now();
        match command {
            ShellCommand::Add {
                title,
                description,
                priority,
                category,
                due,
            } => {
                let mut draft = TaskDraft::new(required_title(&title.join(" "))?);
                if let Some(description) = description.filter(|d| !d.trim().is_empty()) {
                    draft = draft.description(description);
                }
                if let Some(priority) = priority {
                    draft = draft.priority(priority.parse()?);
                }
                if let Some(category) = category {
                    draft = draft.category(category.parse()?);
                }
                if let Some(due) = due {
                    draft = draft.due(parse_due(&due, now)?);
                }
                let task = self.board.add(draft);
                self.emit_task("add", "Task created", &task, now)
            }

            ShellCommand::Edit {
                id,
                title,
                description,
                clear_description,
                priority,
                category,
                due,
                clear_due,
                completed,
            } => {
                let id = self.board.resolve_id(&id)?;
                let mut patch = TaskPatch::new();
                if let Some(title) = title {
                    patch = patch.title(required_title(&title)?);
                }
                if clear_description {
                    patch = patch.description(None);
                } else if let Some(description) = description {
                    patch = patch.description(Some(description).filter(|d| !d.trim().is_empty()));
                }
                if let Some(priority) = priority {
                    patch = patch.priority(priority.parse()?);
                }
                if let Some(category) = category {
                    patch = patch.category(category.parse()?);
                }
                if clear_due {
                    patch = patch.due(None);
                } else if let Some(due) = due {
                    patch = patch.due(Some(parse_due(&due, now)?));
                }
                if let Some(completed) = completed {
                    patch = patch.completed(completed);
                }
                let task = self
                    .board
                    .update(&id, patch)
                    .ok_or_else(|| Error::TaskNotFound(id.clone()))?;
                self.emit_task("edit", "Task updated", &task, now)
            }

            ShellCommand::Done { id } => {
                let id = self.board.resolve_id(&id)?;
                let task = self
                    .board
                    .toggle_complete(&id)
                    .ok_or_else(|| Error::TaskNotFound(id.clone()))?;
                let message = if task.completed {
                    COMPLETED_MESSAGE
                } else {
                    "Task marked as active"
                };
                self.emit_task("done", message, &task, now)
            }

            ShellCommand::Rm { id } => {
                let id = self.board.resolve_id(&id)?;
                let task = self
                    .board
                    .delete(&id)
                    .ok_or_else(|| Error::TaskNotFound(id.clone()))?;
                self.emit_task("rm", "Task deleted", &task, now)
            }

            ShellCommand::Show { id } => {
                let id = self.board.resolve_id(&id)?;
                let task = self
                    .board
                    .store()
                    .find(&id)
                    .cloned()
                    .ok_or_else(|| Error::TaskNotFound(id.clone()))?;
                self.emit_task("show", &task.title, &task, now)
            }

            ShellCommand::List => self.emit_list("list", now),

            ShellCommand::Stats => {
                let stats = self.board.stats();
                let mut human = HumanOutput::new(format!("taskflow: {}", output::format_stats(&stats)));
                human.push_summary("total", stats.total.to_string());
                human.push_summary("active", stats.active.to_string());
                human.push_summary("completed", stats.completed.to_string());
                human.push_summary("overdue", stats.overdue.to_string());
                human.push_summary("completion", format!("{}%", stats.completion_rate()));
                emit_success(self.output, "stats", &StatsReport::from(stats), Some(&human))
            }

            ShellCommand::Search { query } => {
                self.board.set_search_query(query.join(" "));
                self.emit_list("search", now)
            }

            ShellCommand::Status { value } => {
                self.board.set_filter_status(value.parse()?);
                self.emit_list("status", now)
            }

            ShellCommand::Category { value } => {
                self.board.set_filter_category(view::parse_filter(&value)?);
                self.emit_list("category", now)
            }

            ShellCommand::Priority { value } => {
                self.board.set_filter_priority(view::parse_filter(&value)?);
                self.emit_list("priority", now)
            }

            ShellCommand::Sort { value } => {
                self.board.set_sort(value.parse()?);
                self.emit_list("sort", now)
            }

            ShellCommand::Reset => {
                self.board.reset_criteria();
                self.emit_list("reset", now)
            }

            ShellCommand::Ask { question } => self.ask(&question.join(" ")),

            ShellCommand::History => {
                let messages = self.conversation.messages();
                let mut human = HumanOutput::new(format!("taskflow history: {} messages", messages.len()));
                if messages.is_empty() {
                    human.push_detail("No messages yet");
                }
                for message in messages {
                    human.push_detail(format!("{}: {}", role_label(message.role), message.content));
                }
                emit_success(self.output, "history", &HistoryReport { messages }, Some(&human))
            }

            ShellCommand::Quit => Ok(()),
        }
    }

    fn emit_task(&self, command: &str, message: &str, task: &Task, now: DateTime<Utc>) -> Result<()> {
        let mut human = HumanOutput::new(message);
        human.push_detail(output::format_task_line(task, now));
        human.push_summary("id", task.id.clone());
        if let Some(description) = &task.description {
            human.push_summary("description", description.clone());
        }
        if let Some(due) = task.due_date {
            human.push_summary("due", due.to_rfc3339());
        }
        if command == "add" {
            human.push_next_step(format!("done {}", short_id(&task.id)));
        }
        emit_success(self.output, command, &TaskReport { message, task }, Some(&human))
    }

    fn emit_list(&self, command: &str, now: DateTime<Utc>) -> Result<()> {
        let projection = self.board.projection_at(now);
        let criteria = self.board.criteria();
        let has_filters = criteria.has_filters();

        let mut human = output::projection_human(&projection, has_filters, now);
        human.push_summary("sort", criteria.sort.label());
        if has_filters {
            human.push_summary("status", criteria.status.to_string());
            human.push_summary("category", view::filter_label(criteria.category));
            human.push_summary("priority", view::filter_label(criteria.priority));
            if !criteria.search_query.is_empty() {
                human.push_summary("search", criteria.search_query.clone());
            }
        }

        let report = ListReport {
            tasks: &projection.tasks,
            stats: StatsReport::from(projection.stats),
            criteria,
            has_filters,
            empty_message: projection
                .tasks
                .is_empty()
                .then(|| output::empty_state(has_filters)),
        };
        emit_success(self.output, command, &report, Some(&human))
    }

    fn ask(&mut self, question: &str) -> Result<()> {
        let (Some(client), Some(runtime)) = (self.assistant.as_ref(), self.runtime.as_ref()) else {
            return Err(Error::InvalidConfig(
                "assistant endpoint is not configured".to_string(),
            ));
        };

        let stream_to_stdout = !self.output.json && !self.output.quiet;
        let conversation = &mut self.conversation;
        let tasks = self.board.tasks();
        let on_fragment = |fragment: &str| {
            if stream_to_stdout {
                print!("{fragment}");
                let _ = io::stdout().flush();
            }
        };

        let interrupts = &self.interrupts;
        interrupts.begin_ask();
        let finished = runtime.block_on(async {
            let cancelled = interrupts.cancelled();
            tokio::select! {
                outcome = client.ask(conversation, question, tasks, on_fragment) => Some(outcome),
                _ = cancelled => None,
            }
        });
        interrupts.end_ask();
        let outcome = match finished {
            Some(outcome) => outcome,
            None => AskOutcome::Failed(self.conversation.fail(CANCELLED_DETAIL)),
        };

        let report = match &outcome {
            AskOutcome::Ignored => AskReport {
                question,
                status: "ignored",
                reply: None,
                error: None,
            },
            AskOutcome::Answered(reply) => AskReport {
                question,
                status: "answered",
                reply: Some(reply),
                error: None,
            },
            AskOutcome::Failed(message) => AskReport {
                question,
                status: "failed",
                reply: None,
                error: Some(message),
            },
        };

        let human = match &outcome {
            AskOutcome::Answered(_) => {
                if stream_to_stdout {
                    println!();
                }
                None
            }
            AskOutcome::Ignored => Some(HumanOutput::new("Nothing to ask")),
            AskOutcome::Failed(message) => Some(HumanOutput::new(message.clone())),
        };
        emit_success(self.output, "ask", &report, human.as_ref())
    }
}

/// Help requests print and continue; any other clap error becomes a
/// reportable argument error.
fn parse_error_flow(err: clap::Error) -> std::result::Result<Flow, (&'static str, Error)> {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            err.print().map_err(|io_err| ("help", Error::Io(io_err)))?;
            Ok(Flow::Continue)
        }
        _ => {
            let rendered = err.to_string();
            let message = rendered
                .lines()
                .next()
                .unwrap_or_default()
                .trim_start_matches("error: ")
                .to_string();
            Err(("shell", Error::InvalidArgument(message)))
        }
    }
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => "you",
        Role::Assistant => "assistant",
    }
}

fn required_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(Error::InvalidArgument("title cannot be empty".to_string()));
    }
    Ok(title.to_string())
}

// =============================================================================
// Parsing helpers
// =============================================================================

/// Split a line into words with shell-like quoting.
///
/// Single quotes are literal, double quotes allow `\` escapes, and a line
/// starting with `#` is a comment.
fn tokenize(line: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(ch) = chars.next() {
        match quote {
            Some(open) if ch == open => quote = None,
            Some('"') if ch == '\\' => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            Some(_) => current.push(ch),
            None => match ch {
                '"' | '\'' => {
                    quote = Some(ch);
                    in_token = true;
                }
                '\\' => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                        in_token = true;
                    }
                }
                '#' if tokens.is_empty() && !in_token => break,
                c if c.is_whitespace() => {
                    if in_token {
                        tokens.push(std::mem::take(&mut current));
                        in_token = false;
                    }
                }
                c => {
                    current.push(c);
                    in_token = true;
                }
            },
        }
    }

    if quote.is_some() {
        return Err(Error::InvalidArgument("unterminated quote".to_string()));
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Parse a due date: RFC 3339, `YYYY-MM-DD` (midnight UTC), `today` (end of
/// the current UTC day), `tomorrow` (now + 1 day) or `+Nd` (now + N days).
fn parse_due(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let value = input.trim();
    let invalid = || {
        Error::InvalidArgument(format!(
            "invalid due date '{value}' (expected RFC 3339, YYYY-MM-DD, today, tomorrow or +Nd)"
        ))
    };

    let lower = value.to_lowercase();
    match lower.as_str() {
        "today" => {
            return now
                .date_naive()
                .and_hms_opt(23, 59, 59)
                .map(|end| end.and_utc())
                .ok_or_else(invalid)
        }
        "tomorrow" => return Ok(now + Duration::days(1)),
        _ => {}
    }

    if let Some(days) = lower.strip_prefix('+').and_then(|rest| rest.strip_suffix('d')) {
        let days: u32 = days.parse().map_err(|_| invalid())?;
        return Duration::try_days(i64::from(days))
            .and_then(|offset| now.checked_add_signed(offset))
            .ok_or_else(invalid);
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(invalid)
}
