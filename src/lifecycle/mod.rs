//! Task lifecycle orchestration.
//!
//! Decides *when* a score is recomputed:
//! - **Create**: initial score with zero bumps
//! - **Edit** of a scoring input: full recompute in the same call
//! - **Bump**: counter +1, then recompute
//! - **Complete**: status moves to done and scoring stops
//!
//! Every operation takes a snapshot and returns a new one; persisting the
//! result is the caller's job.

mod bump;
mod orchestrator;

use chrono::{DateTime, Utc};

use crate::domain::{Effort, EventRecord, Task};
use crate::priority::compute_score;

pub use bump::BumpTracker;
pub use orchestrator::LifecycleOrchestrator;

/// Input for creating a task
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    /// Defaults to 50 when absent
    pub user_priority: Option<i32>,
    pub due_date: Option<DateTime<Utc>>,
    pub estimated_effort: Option<Effort>,
}

impl TaskDraft {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Self::default()
        }
    }

    pub fn with_priority(mut self, user_priority: i32) -> Self {
        self.user_priority = Some(user_priority);
        self
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_effort(mut self, effort: Effort) -> Self {
        self.estimated_effort = Some(effort);
        self
    }
}

/// A partial edit. `None` leaves a field alone; for the optional fields
/// `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub user_priority: Option<i32>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub estimated_effort: Option<Option<Effort>>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.user_priority.is_none()
            && self.due_date.is_none()
            && self.estimated_effort.is_none()
    }

    /// True when the edit changes an input of the score
    pub fn touches_score(&self) -> bool {
        self.user_priority.is_some() || self.due_date.is_some() || self.estimated_effort.is_some()
    }
}

/// Result of completing a task.
///
/// `event` is `None` when the task was already done.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub task: Task,
    pub event: Option<EventRecord>,
}

/// Write a fresh score and its timestamp onto the snapshot.
pub(crate) fn apply_score(task: &mut Task, now: DateTime<Utc>) {
    task.priority_score = compute_score(task, now);
    task.score_calculated_at = Some(now);
}
