//! Derived views over the task collection.
//!
//! Projection is a pure function of the tasks, the [`Criteria`] and the
//! current instant. It is recomputed from scratch on every call.
//!
//! # Pipeline
//!
//! 1. search (title or description, case-insensitive substring)
//! 2. status (all / active / completed)
//! 3. category
//! 4. priority
//! 5. stable sort by the selected [`SortOption`]
//!
//! Statistics are computed over the unfiltered collection.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use icu_collator::{Collator, CollatorOptions};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::task::{Category, Priority, Task};

// =============================================================================
// Status Filter
// =============================================================================

/// Completion status filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    All,
    Active,
    Completed,
}

impl StatusFilter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => !task.completed,
            StatusFilter::Completed => task.completed,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => write!(f, "all"),
            StatusFilter::Active => write!(f, "active"),
            StatusFilter::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "active" => Ok(StatusFilter::Active),
            "completed" => Ok(StatusFilter::Completed),
            _ => Err(Error::UnknownOption {
                kind: "status",
                value: s.to_string(),
                expected: "all, active, completed",
            }),
        }
    }
}

impl Default for StatusFilter {
    fn default() -> Self {
        StatusFilter::All
    }
}

// =============================================================================
// Sort Option
// =============================================================================

/// Ordering applied after filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOption {
    /// Newest first
    CreatedAt,
    /// Soonest due first, undated last
    DueDate,
    /// High, medium, low
    Priority,
    /// Title, locale-aware ascending
    Alphabetical,
}

impl SortOption {
    pub fn label(&self) -> &'static str {
        match self {
            SortOption::CreatedAt => "Newest First",
            SortOption::DueDate => "Due Date",
            SortOption::Priority => "Priority",
            SortOption::Alphabetical => "Alphabetical",
        }
    }

    /// Comparator for this ordering. Equal keys compare `Equal` so a stable
    /// sort keeps their input order.
    pub fn compare(&self, left: &Task, right: &Task) -> Ordering {
        match self {
            SortOption::CreatedAt => right.created_at.cmp(&left.created_at),
            SortOption::DueDate => compare_due_dates(left.due_date, right.due_date),
            SortOption::Priority => left.priority.rank().cmp(&right.priority.rank()),
            SortOption::Alphabetical => locale_compare(&left.title, &right.title),
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOption::CreatedAt => write!(f, "createdAt"),
            SortOption::DueDate => write!(f, "dueDate"),
            SortOption::Priority => write!(f, "priority"),
            SortOption::Alphabetical => write!(f, "alphabetical"),
        }
    }
}

impl FromStr for SortOption {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|ch| *ch != '-' && *ch != '_')
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "createdat" | "newest" => Ok(SortOption::CreatedAt),
            "duedate" | "due" => Ok(SortOption::DueDate),
            "priority" => Ok(SortOption::Priority),
            "alphabetical" | "title" => Ok(SortOption::Alphabetical),
            _ => Err(Error::UnknownOption {
                kind: "sort",
                value: s.to_string(),
                expected: "createdAt, dueDate, priority, alphabetical",
            }),
        }
    }
}

impl Default for SortOption {
    fn default() -> Self {
        SortOption::CreatedAt
    }
}

fn compare_due_dates(left: Option<DateTime<Utc>>, right: Option<DateTime<Utc>>) -> Ordering {
    match (left, right) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(left), Some(right)) => left.cmp(&right),
    }
}

thread_local! {
    static COLLATOR: Option<Collator> =
        Collator::try_new(&Default::default(), CollatorOptions::new()).ok();
}

/// Title comparison under the root collation: accents and case are
/// secondary to the base letters, and lowercase sorts first on a case-only
/// difference. Canonically equivalent strings compare equal.
pub fn locale_compare(left: &str, right: &str) -> Ordering {
    COLLATOR
        .with(|collator| {
            collator
                .as_ref()
                .map(|collator| collator.compare(left, right))
        })
        .unwrap_or_else(|| fallback_compare(left, right))
}

fn fallback_compare(left: &str, right: &str) -> Ordering {
    left.chars()
        .flat_map(char::to_lowercase)
        .cmp(right.chars().flat_map(char::to_lowercase))
}

/// Parse a filter value where `all` means no filtering.
pub fn parse_filter<T>(value: &str) -> Result<Option<T>>
where
    T: FromStr<Err = Error>,
{
    if value.trim().eq_ignore_ascii_case("all") {
        return Ok(None);
    }
    value.parse().map(Some)
}

/// Render an optional filter value, `all` when unset.
pub fn filter_label<T: fmt::Display>(value: Option<T>) -> String {
    value
        .map(|value| value.to_string())
        .unwrap_or_else(|| "all".to_string())
}

// =============================================================================
// Criteria
// =============================================================================

/// Search text, filters and sort that determine the projection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criteria {
    #[serde(default)]
    pub search_query: String,
    #[serde(default)]
    pub status: StatusFilter,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub sort: SortOption,
}

impl Criteria {
    /// Whether any search or filter (not sort) is narrowing the view
    pub fn has_filters(&self) -> bool {
        !self.search_query.is_empty()
            || self.status != StatusFilter::All
            || self.category.is_some()
            || self.priority.is_some()
    }

    fn matches_search(&self, task: &Task) -> bool {
        if self.search_query.is_empty() {
            return true;
        }
        let query = self.search_query.to_lowercase();
        task.title.to_lowercase().contains(&query)
            || task
                .description
                .as_ref()
                .map(|description| description.to_lowercase().contains(&query))
                .unwrap_or(false)
    }

    fn matches_category(&self, task: &Task) -> bool {
        self.category.map(|category| task.category == category).unwrap_or(true)
    }

    fn matches_priority(&self, task: &Task) -> bool {
        self.priority.map(|priority| task.priority == priority).unwrap_or(true)
    }

    /// True when `task` satisfies every active predicate
    pub fn matches(&self, task: &Task) -> bool {
        self.matches_search(task)
            && self.status.matches(task)
            && self.matches_category(task)
            && self.matches_priority(task)
    }
}

// =============================================================================
// Statistics
// =============================================================================

/// Aggregate counts over the full, unfiltered collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub active: usize,
    pub overdue: usize,
}

impl TaskStats {
    /// Completed share as a rounded percentage; 0 for an empty collection
    pub fn completion_rate(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed as f64 / self.total as f64) * 100.0).round() as u32
    }
}

pub fn compute_stats(tasks: &[Task]) -> TaskStats {
    compute_stats_at(tasks, Utc::now())
}

pub fn compute_stats_at(tasks: &[Task], now: DateTime<Utc>) -> TaskStats {
    let total = tasks.len();
    let completed = tasks.iter().filter(|task| task.completed).count();
    let overdue = tasks.iter().filter(|task| task.is_overdue(now)).count();
    TaskStats {
        total,
        completed,
        active: total - completed,
        overdue,
    }
}

// =============================================================================
// Projection
// =============================================================================

/// Visible tasks plus statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Projection {
    pub tasks: Vec<Task>,
    pub stats: TaskStats,
}

/// Apply the filter pipeline, preserving input order.
pub fn filter_tasks(tasks: &[Task], criteria: &Criteria) -> Vec<Task> {
    let mut result: Vec<Task> = tasks.to_vec();
    result.retain(|task| criteria.matches_search(task));
    result.retain(|task| criteria.status.matches(task));
    result.retain(|task| criteria.matches_category(task));
    result.retain(|task| criteria.matches_priority(task));
    result
}

/// Stable sort in place.
pub fn sort_tasks(tasks: &mut [Task], sort: SortOption) {
    tasks.sort_by(|left, right| sort.compare(left, right));
}

pub fn project(tasks: &[Task], criteria: &Criteria) -> Projection {
    project_at(tasks, criteria, Utc::now())
}

pub fn project_at(tasks: &[Task], criteria: &Criteria, now: DateTime<Utc>) -> Projection {
    let mut visible = filter_tasks(tasks, criteria);
    sort_tasks(&mut visible, criteria.sort);
    let stats = compute_stats_at(tasks, now);
    debug!(
        total = stats.total,
        visible = visible.len(),
        sort = %criteria.sort,
        "projection computed"
    );
    Projection {
        tasks: visible,
        stats,
    }
}
