//! Task-specific storage helpers.

use chrono::{DateTime, Utc};

use super::traits::{Filter, HasId, Storage};
use crate::domain::{EventRecord, Task, TaskStatus};
use crate::error::{Result, TaskrankError};
use crate::priority::compute_score;

/// Collection name for tasks.
pub const TASKS_COLLECTION: &str = "tasks";
/// Collection name for lifecycle events.
pub const EVENTS_COLLECTION: &str = "events";

impl HasId for Task {
    fn id(&self) -> &str {
        &self.id
    }
}

impl HasId for EventRecord {
    fn id(&self) -> &str {
        &self.id
    }
}

fn active_filters() -> [Filter; 2] {
    [
        Filter::ne("status", TaskStatus::Done),
        Filter::eq("deleted_at", serde_json::Value::Null),
    ]
}

fn raw_id(record: &serde_json::Value) -> &str {
    record.get("id").and_then(|v| v.as_str()).unwrap_or_default()
}

/// Missing or null means never scored. An unreadable timestamp counts as
/// stale so the record surfaces when its page is deserialized.
fn score_is_stale(record: &serde_json::Value, cutoff: DateTime<Utc>) -> bool {
    match record.get("score_calculated_at") {
        None | Some(serde_json::Value::Null) => true,
        Some(value) => serde_json::from_value::<DateTime<Utc>>(value.clone())
            .ok()
            .is_none_or(|at| at <= cutoff),
    }
}

/// Helper for task-specific queries and targeted writes.
pub struct TaskStore<'a, S: Storage> {
    storage: &'a S,
}

impl<'a, S: Storage> TaskStore<'a, S> {
    pub fn new(storage: &'a S) -> Self {
        Self { storage }
    }

    pub fn get(&self, id: &str) -> Result<Option<Task>> {
        self.storage.get(TASKS_COLLECTION, id)
    }

    /// Get a task or fail with `TaskNotFound`.
    pub fn require(&self, id: &str) -> Result<Task> {
        self.get(id)?.ok_or_else(|| TaskrankError::TaskNotFound(id.to_string()))
    }

    pub fn create(&self, task: &Task) -> Result<()> {
        self.storage.create(TASKS_COLLECTION, task)
    }

    /// Replace the whole task record.
    pub fn update(&self, task: &Task) -> Result<()> {
        self.storage.update(TASKS_COLLECTION, &task.id, task)
    }

    pub fn list_all(&self) -> Result<Vec<Task>> {
        self.storage.list(TASKS_COLLECTION)
    }

    pub fn find_by_status(&self, status: TaskStatus) -> Result<Vec<Task>> {
        self.storage.query(
            TASKS_COLLECTION,
            &[Filter::eq("status", status), Filter::eq("deleted_at", serde_json::Value::Null)],
        )
    }

    /// All tasks that take part in ranking: not done, not deleted.
    pub fn find_active(&self) -> Result<Vec<Task>> {
        self.storage.query(TASKS_COLLECTION, &active_filters())
    }

    /// One page of active tasks whose score is at least as old as `cutoff`
    /// (or was never computed).
    ///
    /// Pages are keyed on id: pass the last id of the previous page as
    /// `after`. Rescoring a task removes it from the stale set, so offsets
    /// would skip work.
    ///
    /// Each call still scans every active record, but only as raw JSON; just
    /// the returned page is deserialized into `Task`s.
    pub fn find_stale(&self, cutoff: DateTime<Utc>, after: Option<&str>, limit: usize) -> Result<Vec<Task>> {
        let mut stale: Vec<serde_json::Value> = self
            .storage
            .query::<serde_json::Value>(TASKS_COLLECTION, &active_filters())?
            .into_iter()
            .filter(|r| score_is_stale(r, cutoff))
            .filter(|r| after.is_none_or(|last| raw_id(r) > last))
            .collect();

        stale.sort_by(|a, b| raw_id(a).cmp(raw_id(b)));
        stale.truncate(limit);
        stale
            .into_iter()
            .map(|r| serde_json::from_value(r).map_err(TaskrankError::from))
            .collect()
    }

    /// Recompute and store a task's score, only if it is still active.
    ///
    /// The score is computed from the record as it is at write time, so an
    /// edit that landed after the caller's read is never overwritten with a
    /// score from old inputs. Touches `priority_score` and
    /// `score_calculated_at` and nothing else. Returns `None` when the task
    /// was completed, deleted or removed in the meantime.
    pub fn rescore_if_active(&self, id: &str, now: DateTime<Utc>) -> Result<Option<f64>> {
        let mut score = None;
        self.storage.update_with(TASKS_COLLECTION, id, |task: &mut Task| {
            if !task.is_active() {
                return false;
            }
            let fresh = compute_score(task, now);
            task.priority_score = fresh;
            task.score_calculated_at = Some(now);
            score = Some(fresh);
            true
        })?;
        Ok(score)
    }

    /// Mark a task deleted. Returns false if it was already deleted.
    pub fn soft_delete(&self, id: &str, now: DateTime<Utc>) -> Result<bool> {
        if self.get(id)?.is_none() {
            return Err(TaskrankError::TaskNotFound(id.to_string()));
        }
        self.storage.update_with(TASKS_COLLECTION, id, |task: &mut Task| {
            if task.deleted_at.is_some() {
                return false;
            }
            task.deleted_at = Some(now);
            task.touch(now);
            true
        })
    }

    /// Append a lifecycle event to the event log.
    pub fn record_event(&self, event: &EventRecord) -> Result<()> {
        self.storage.create(EVENTS_COLLECTION, event)
    }

    /// Events for one task in the order they were written.
    pub fn events_for(&self, task_id: &str) -> Result<Vec<EventRecord>> {
        self.storage.query(EVENTS_COLLECTION, &[Filter::eq("task_id", task_id)])
    }
}
