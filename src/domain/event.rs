//! Lifecycle events emitted for downstream consumers.
//!
//! The streak/gamification subsystem listens for `task.completed`; the other
//! event types exist for the audit log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::task::Task;
use crate::id::generate_event_id;

/// Event type constants
pub mod event_types {
    pub const TASK_CREATED: &str = "task.created";
    pub const TASK_BUMPED: &str = "task.bumped";
    pub const TASK_COMPLETED: &str = "task.completed";
    pub const TASK_REOPENED: &str = "task.reopened";
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventRecord {
    /// Unique event identifier
    pub id: String,
    /// Event type (e.g., "task.completed")
    pub event_type: String,
    pub task_id: String,
    /// Event-specific payload data
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

impl EventRecord {
    pub fn new(event_type: &str, task_id: &str, payload: Value, now: DateTime<Utc>) -> Self {
        Self {
            id: generate_event_id(now),
            event_type: event_type.to_string(),
            task_id: task_id.to_string(),
            payload,
            created_at: now,
        }
    }

    pub fn task_created(task: &Task, now: DateTime<Utc>) -> Self {
        Self::new(
            event_types::TASK_CREATED,
            &task.id,
            serde_json::json!({ "priority_score": task.priority_score }),
            now,
        )
    }

    pub fn task_bumped(task: &Task, now: DateTime<Utc>) -> Self {
        Self::new(
            event_types::TASK_BUMPED,
            &task.id,
            serde_json::json!({
                "bump_count": task.bump_count,
                "priority_score": task.priority_score
            }),
            now,
        )
    }

    /// Completion payload consumed by the streak tracker.
    ///
    /// `on_time` is null when the task had no due date.
    pub fn task_completed(task: &Task, was_at_risk: bool, now: DateTime<Utc>) -> Self {
        let on_time = task.due_date.map(|due| now <= due);
        Self::new(
            event_types::TASK_COMPLETED,
            &task.id,
            serde_json::json!({
                "bump_count": task.bump_count,
                "priority_score": task.priority_score,
                "was_at_risk": was_at_risk,
                "on_time": on_time
            }),
            now,
        )
    }

    pub fn task_reopened(task: &Task, now: DateTime<Utc>) -> Self {
        Self::new(
            event_types::TASK_REOPENED,
            &task.id,
            serde_json::json!({ "bump_count": task.bump_count }),
            now,
        )
    }

    pub fn is_completion(&self) -> bool {
        self.event_type == event_types::TASK_COMPLETED
    }
}
