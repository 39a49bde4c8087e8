//! Task board: the session object that owns the store and current criteria.
//!
//! Presentation code holds one board and passes it by reference. Reads go
//! through [`TaskBoard::projection`], which recomputes the view each call.

use chrono::{DateTime, Duration, Utc};

use crate::config::ViewConfig;
use crate::error::Result;
use crate::task::{Category, Priority, Task, TaskDraft, TaskPatch, TaskStore};
use crate::view::{self, Criteria, Projection, SortOption, StatusFilter, TaskStats};

#[derive(Debug, Clone, Default)]
pub struct TaskBoard {
    store: TaskStore,
    criteria: Criteria,
}

impl TaskBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(store: TaskStore) -> Self {
        Self {
            store,
            criteria: Criteria::default(),
        }
    }

    /// Board preloaded with the sample tasks
    pub fn with_samples() -> Self {
        Self::with_samples_at(Utc::now())
    }

    pub fn with_samples_at(now: DateTime<Utc>) -> Self {
        Self::with_store(TaskStore::from_vec(sample_tasks(now)))
    }

    /// Apply the initial criteria from configuration
    pub fn apply_view_config(&mut self, view: &ViewConfig) -> Result<()> {
        self.criteria = view.criteria()?;
        Ok(())
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    /// Full, unfiltered task list in base order
    pub fn tasks(&self) -> &[Task] {
        self.store.all()
    }

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    pub fn add(&mut self, draft: TaskDraft) -> Task {
        self.store.add(draft)
    }

    pub fn update(&mut self, id: &str, patch: TaskPatch) -> Option<Task> {
        self.store.update(id, patch)
    }

    pub fn delete(&mut self, id: &str) -> Option<Task> {
        self.store.delete(id)
    }

    pub fn toggle_complete(&mut self, id: &str) -> Option<Task> {
        self.store.toggle_complete(id)
    }

    pub fn resolve_id(&self, input: &str) -> Result<String> {
        self.store.resolve_id(input)
    }

    // -------------------------------------------------------------------------
    // Criteria setters
    // -------------------------------------------------------------------------

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.criteria.search_query = query.into();
    }

    pub fn set_filter_status(&mut self, status: StatusFilter) {
        self.criteria.status = status;
    }

    pub fn set_filter_category(&mut self, category: Option<Category>) {
        self.criteria.category = category;
    }

    pub fn set_filter_priority(&mut self, priority: Option<Priority>) {
        self.criteria.priority = priority;
    }

    pub fn set_sort(&mut self, sort: SortOption) {
        self.criteria.sort = sort;
    }

    pub fn reset_criteria(&mut self) {
        self.criteria = Criteria::default();
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    pub fn projection(&self) -> Projection {
        view::project(self.store.all(), &self.criteria)
    }

    pub fn projection_at(&self, now: DateTime<Utc>) -> Projection {
        view::project_at(self.store.all(), &self.criteria, now)
    }

    pub fn stats(&self) -> TaskStats {
        view::compute_stats(self.store.all())
    }
}

/// The four starter tasks a new board is seeded with.
pub fn sample_tasks(now: DateTime<Utc>) -> Vec<Task> {
    let sample = |draft: TaskDraft, created_at: DateTime<Utc>| Task {
        id: crate::task::generate_task_id(),
        title: draft.title,
        description: draft.description,
        completed: draft.completed,
        priority: draft.priority,
        category: draft.category,
        due_date: draft.due_date,
        created_at,
        updated_at: now,
    };

    vec![
        sample(
            TaskDraft::new("Review project proposal")
                .description("Go through the Q1 project proposal and add comments")
                .priority(Priority::High)
                .category(Category::Work)
                .due(now + Duration::days(1)),
            now,
        ),
        sample(
            TaskDraft::new("Morning workout")
                .description("30 minutes cardio + stretching")
                .completed(true)
                .priority(Priority::Medium)
                .category(Category::Health),
            now - Duration::days(1),
        ),
        sample(
            TaskDraft::new("Buy groceries")
                .description("Milk, eggs, bread, vegetables")
                .priority(Priority::Low)
                .category(Category::Shopping)
                .due(now + Duration::days(2)),
            now,
        ),
        sample(
            TaskDraft::new("Call mom")
                .priority(Priority::Medium)
                .category(Category::Personal),
            now,
        ),
    ]
}
