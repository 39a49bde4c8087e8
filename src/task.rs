//! Task model and the in-memory task store.
//!
//! The store exclusively owns the task collection. New tasks are prepended,
//! so the base order (before any sort) is newest-first. Mutations targeting
//! an unknown id are no-ops and never raise.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use ulid::Ulid;

use crate::error::{Error, Result};

// =============================================================================
// Priority
// =============================================================================

/// Task priority, ordered high before medium before low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    /// Sort rank (lower sorts first)
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
            Priority::Low => write!(f, "low"),
        }
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(Error::UnknownOption {
                kind: "priority",
                value: s.to_string(),
                expected: "high, medium, low",
            }),
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

// =============================================================================
// Category
// =============================================================================

/// Task category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Work,
    Personal,
    Health,
    Shopping,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Work,
        Category::Personal,
        Category::Health,
        Category::Shopping,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Work => "Work",
            Category::Personal => "Personal",
            Category::Health => "Health",
            Category::Shopping => "Shopping",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Work => write!(f, "work"),
            Category::Personal => write!(f, "personal"),
            Category::Health => write!(f, "health"),
            Category::Shopping => write!(f, "shopping"),
        }
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "work" => Ok(Category::Work),
            "personal" => Ok(Category::Personal),
            "health" => Ok(Category::Health),
            "shopping" => Ok(Category::Shopping),
            _ => Err(Error::UnknownOption {
                kind: "category",
                value: s.to_string(),
                expected: "work, personal, health, shopping",
            }),
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::Personal
    }
}

// =============================================================================
// Task
// =============================================================================

/// A single to-do item.
///
/// Serialized with camelCase field names; absent optional fields are omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub completed: bool,
    pub priority: Priority,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Incomplete with a due date strictly before `now`.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.due_date.map(|due| due < now).unwrap_or(false)
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.created_at);
    }
}

/// Payload for a new task: everything except id and timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub priority: Priority,
    pub category: Category,
    pub due_date: Option<DateTime<Utc>>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn due(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    fn into_task(self, id: String, now: DateTime<Utc>) -> Task {
        Task {
            id,
            title: self.title,
            description: self.description,
            completed: self.completed,
            priority: self.priority,
            category: self.category,
            due_date: self.due_date,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of the mutable task fields.
///
/// `description` and `due_date` use a nested option: `Some(None)` clears the
/// field, `None` leaves it untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub category: Option<Category>,
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl TaskPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn due(mut self, due_date: Option<DateTime<Utc>>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.completed.is_none()
            && self.priority.is_none()
            && self.category.is_none()
            && self.due_date.is_none()
    }

    fn apply(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(category) = self.category {
            task.category = category;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
    }
}

pub const SHORT_ID_LEN: usize = 6;

/// Generate a fresh task id (lowercase ULID).
pub fn generate_task_id() -> String {
    Ulid::new().to_string().to_lowercase()
}

/// Trailing (random) part of an id used for display.
pub fn short_id(id: &str) -> &str {
    let start = id.len().saturating_sub(SHORT_ID_LEN);
    id.get(start..).unwrap_or(id)
}

// =============================================================================
// Task Store
// =============================================================================

/// The canonical task collection, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskStore {
    tasks: Vec<Task>,
}

impl TaskStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Create a store from existing tasks, kept in the given order.
    ///
    /// Ids stay unique: a task whose id already appeared earlier in `tasks`
    /// is dropped.
    pub fn from_vec(mut tasks: Vec<Task>) -> Self {
        let mut seen = HashSet::with_capacity(tasks.len());
        let before = tasks.len();
        tasks.retain(|task| seen.insert(task.id.clone()));
        if tasks.len() < before {
            warn!(dropped = before - tasks.len(), "duplicate task ids dropped");
        }
        Self { tasks }
    }

    /// All tasks in base (insertion, newest-first) order
    pub fn all(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == id)
    }

    /// Create a task from a draft and prepend it
    pub fn add(&mut self, draft: TaskDraft) -> Task {
        self.add_at(draft, Utc::now())
    }

    /// Create a task using a provided timestamp
    pub fn add_at(&mut self, draft: TaskDraft, now: DateTime<Utc>) -> Task {
        let task = draft.into_task(generate_task_id(), now);
        debug!(id = %task.id, title = %task.title, "task added");
        self.tasks.insert(0, task.clone());
        task
    }

    /// Merge `patch` into the matching task. Returns the updated task, or
    /// `None` when the id is unknown (the store is left untouched).
    pub fn update(&mut self, id: &str, patch: TaskPatch) -> Option<Task> {
        self.update_at(id, patch, Utc::now())
    }

    /// Update using a provided timestamp
    pub fn update_at(&mut self, id: &str, patch: TaskPatch, now: DateTime<Utc>) -> Option<Task> {
        let Some(task) = self.find_mut(id) else {
            debug!(id, "update ignored: unknown task");
            return None;
        };
        patch.apply(task);
        task.touch(now);
        debug!(id, "task updated");
        Some(task.clone())
    }

    /// Remove the matching task permanently. Returns the removed task.
    pub fn delete(&mut self, id: &str) -> Option<Task> {
        let Some(index) = self.tasks.iter().position(|task| task.id == id) else {
            debug!(id, "delete ignored: unknown task");
            return None;
        };
        let removed = self.tasks.remove(index);
        debug!(id, "task deleted");
        Some(removed)
    }

    /// Flip `completed` on the matching task. Returns the updated task.
    pub fn toggle_complete(&mut self, id: &str) -> Option<Task> {
        self.toggle_complete_at(id, Utc::now())
    }

    /// Toggle using a provided timestamp
    pub fn toggle_complete_at(&mut self, id: &str, now: DateTime<Utc>) -> Option<Task> {
        let Some(task) = self.find_mut(id) else {
            debug!(id, "toggle ignored: unknown task");
            return None;
        };
        task.completed = !task.completed;
        task.touch(now);
        debug!(id, completed = task.completed, "task toggled");
        Some(task.clone())
    }

    /// Resolve a full id, or a case-insensitive fragment matching the start
    /// or end of exactly one id.
    pub fn resolve_id(&self, input: &str) -> Result<String> {
        let needle = input.trim().to_lowercase();
        if needle.is_empty() {
            return Err(Error::InvalidArgument("task id cannot be empty".to_string()));
        }
        if let Some(task) = self.tasks.iter().find(|task| task.id == needle) {
            return Ok(task.id.clone());
        }

        let matches: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|task| task.id.starts_with(&needle) || task.id.ends_with(&needle))
            .collect();
        match matches.as_slice() {
            [] => Err(Error::TaskNotFound(input.trim().to_string())),
            [task] => Ok(task.id.clone()),
            _ => Err(Error::AmbiguousTaskId {
                input: input.trim().to_string(),
                matches: matches.len(),
            }),
        }
    }

    pub fn into_vec(self) -> Vec<Task> {
        self.tasks
    }
}
