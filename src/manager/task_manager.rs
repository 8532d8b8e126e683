//! Task Manager implementation
//!
//! TaskManager ties the lifecycle rules to storage: load the snapshot, let
//! the orchestrator produce the next one, persist it, append the event.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{EventRecord, Task};
use crate::error::{Result, TaskrankError};
use crate::lifecycle::{Completion, LifecycleOrchestrator, TaskDraft, TaskUpdate};
use crate::priority::{Page, filter_at_risk, order_tasks, paginate, rank_active};
use crate::storage::{Storage, TaskStore};

/// Which tasks a listing should include
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Only tasks flagged at risk
    pub at_risk: bool,
    /// Include done tasks after the active ones
    pub include_done: bool,
    /// 1-based
    pub page: usize,
    pub per_page: usize,
}

/// Persists task lifecycle operations
pub struct TaskManager<S: Storage> {
    storage: Arc<S>,
    lifecycle: LifecycleOrchestrator,
}

impl<S: Storage> TaskManager<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            lifecycle: LifecycleOrchestrator::new(),
        }
    }

    fn store(&self) -> TaskStore<'_, S> {
        TaskStore::new(self.storage.as_ref())
    }

    /// Load a task that has not been deleted.
    pub fn get(&self, id: &str) -> Result<Task> {
        let task = self.store().require(id)?;
        if task.deleted_at.is_some() {
            return Err(TaskrankError::TaskNotFound(id.to_string()));
        }
        Ok(task)
    }

    /// Create, score and persist a new task.
    pub fn add(&self, draft: TaskDraft, now: DateTime<Utc>) -> Result<Task> {
        let task = self.lifecycle.create(draft, now)?;
        let store = self.store();
        store.create(&task)?;
        store.record_event(&EventRecord::task_created(&task, now))?;
        Ok(task)
    }

    pub fn edit(&self, id: &str, changes: &TaskUpdate, now: DateTime<Utc>) -> Result<Task> {
        let task = self.get(id)?;
        let updated = self.lifecycle.update(&task, changes, now)?;
        if updated != task {
            self.store().update(&updated)?;
        }
        Ok(updated)
    }

    pub fn bump(&self, id: &str, now: DateTime<Utc>) -> Result<Task> {
        let task = self.get(id)?;
        let bumped = self.lifecycle.bump(&task, now)?;
        if bumped == task {
            return Ok(bumped);
        }
        let store = self.store();
        store.update(&bumped)?;
        store.record_event(&EventRecord::task_bumped(&bumped, now))?;
        Ok(bumped)
    }

    pub fn start(&self, id: &str, now: DateTime<Utc>) -> Result<Task> {
        let task = self.get(id)?;
        let started = self.lifecycle.start(&task, now)?;
        self.store().update(&started)?;
        Ok(started)
    }

    pub fn pause(&self, id: &str, now: DateTime<Utc>) -> Result<Task> {
        let task = self.get(id)?;
        let paused = self.lifecycle.pause(&task, now)?;
        self.store().update(&paused)?;
        Ok(paused)
    }

    /// Complete a task; completing a done task writes nothing.
    pub fn complete(&self, id: &str, now: DateTime<Utc>) -> Result<Completion> {
        let task = self.get(id)?;
        let completion = self.lifecycle.complete(&task, now)?;
        if let Some(event) = &completion.event {
            let store = self.store();
            store.update(&completion.task)?;
            store.record_event(event)?;
        }
        Ok(completion)
    }

    pub fn reopen(&self, id: &str, now: DateTime<Utc>) -> Result<Task> {
        let task = self.get(id)?;
        if !task.status.is_terminal() {
            return Ok(task);
        }
        let reopened = self.lifecycle.reopen(&task, now)?;
        let store = self.store();
        store.update(&reopened)?;
        store.record_event(&EventRecord::task_reopened(&reopened, now))?;
        Ok(reopened)
    }

    /// Rescore one task now instead of waiting for the sweep.
    pub fn recalculate(&self, id: &str, now: DateTime<Utc>) -> Result<Task> {
        let task = self.get(id)?;
        let rescored = self.lifecycle.recalculate(&task, now)?;
        if rescored != task {
            self.store().update(&rescored)?;
        }
        Ok(rescored)
    }

    /// Soft-delete a task. Returns false if it was already gone.
    pub fn remove(&self, id: &str, now: DateTime<Utc>) -> Result<bool> {
        let removed = self.store().soft_delete(id, now)?;
        if removed {
            log::info!("Deleted task {}", id);
        }
        Ok(removed)
    }

    /// Ordered, paginated listing. Reads stored scores, never rescoring.
    pub fn list(&self, query: ListQuery, now: DateTime<Utc>) -> Result<Page> {
        let store = self.store();
        let mut tasks = rank_active(store.find_active()?);

        if query.at_risk {
            tasks = filter_at_risk(tasks, now);
        }

        if query.include_done && !query.at_risk {
            let done: Vec<Task> = store
                .list_all()?
                .into_iter()
                .filter(|t| t.deleted_at.is_none() && t.status.is_terminal())
                .collect();
            tasks.extend(order_tasks(done));
            return Ok(paginate_in_order(tasks, query.page, query.per_page));
        }

        Ok(paginate(tasks, query.page, query.per_page))
    }

    pub fn events(&self, id: &str) -> Result<Vec<EventRecord>> {
        self.store().events_for(id)
    }
}

/// Paginate a list that is already in display order.
fn paginate_in_order(tasks: Vec<Task>, page: usize, per_page: usize) -> Page {
    let mut page = paginate(Vec::new(), page, per_page);
    page.total_items = tasks.len();
    page.total_pages = tasks.len().div_ceil(page.per_page);
    page.items = tasks
        .into_iter()
        .skip((page.page - 1) * page.per_page)
        .take(page.per_page)
        .collect();
    page
}
